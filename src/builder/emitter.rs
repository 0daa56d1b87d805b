//! Per-package makefile emission.
//!
//! Generation is linear: header, default `CONFIG`, one conditional block per
//! configuration, object and resource lists, directory helpers, the primary
//! and clean targets, one explicit rule per file, and the dependency include.

use crate::core::{BuildFlag, Configuration, Package, PackageKind, Platform, Project, Toolchain};

use super::classify::{self, FileRole, SourceKind};
use super::makefile::{Assignment, Conditional, Makefile, Rule, Statement, Test};
use super::siblings::SiblingResolver;

const OUTPUT_DIRS: [(&str, &str); 4] = [
    ("CMD_MKBINDIR", "BINDIR"),
    ("CMD_MKLIBDIR", "LIBDIR"),
    ("CMD_MKOUTDIR", "OUTDIR"),
    ("CMD_MKOBJDIR", "OBJDIR"),
];

/// Builds the makefile of one package.
pub struct MakefileEmitter<'a> {
    project: &'a Project,
    package: &'a Package,
    verbose: bool,
}

impl<'a> MakefileEmitter<'a> {
    pub fn new(project: &'a Project, package: &'a Package) -> Self {
        MakefileEmitter {
            project,
            package,
            verbose: false,
        }
    }

    /// Echo every command instead of short progress lines.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn emit(&self) -> Makefile {
        let mut mk = Makefile::new();

        self.emit_header(&mut mk);
        for cfg in &self.package.configurations {
            mk.conditional(self.config_block(cfg));
        }
        self.emit_object_lists(&mut mk);
        self.emit_dir_helpers(&mut mk);
        mk.phony(["clean"]);
        self.emit_main_target(&mut mk);
        self.emit_clean_target(&mut mk);
        self.emit_file_rules(&mut mk);

        if !self.is_harness() {
            mk.include(true, "$(OBJECTS:%.o=%.d)");
        }

        mk
    }

    fn platform(&self) -> Platform {
        self.project.platform
    }

    fn toolchain(&self) -> Toolchain {
        self.project.toolchain
    }

    fn is_harness(&self) -> bool {
        self.package.is_kind(PackageKind::HarnessGenerator)
    }

    /// Windowed executables on macOS are laid out as an application bundle.
    fn is_app_bundle(&self) -> bool {
        self.platform().is_macosx() && self.package.is_kind(PackageKind::WinExe)
    }

    /// Recipe line that make doesn't echo unless verbose.
    fn quiet(&self, command: impl AsRef<str>) -> String {
        if self.verbose {
            command.as_ref().to_string()
        } else {
            format!("@{}", command.as_ref())
        }
    }

    /// Quiet recipe line whose failure is ignored.
    fn tolerant(&self, command: impl AsRef<str>) -> String {
        format!("-{}", self.quiet(command))
    }

    /// Progress line, only in non-verbose mode.
    fn echo(&self, message: impl AsRef<str>) -> Option<String> {
        (!self.verbose).then(|| format!("@echo {}", message.as_ref()))
    }

    fn emit_header(&self, mk: &mut Makefile) {
        mk.comment([
            format!(
                "{} {} Makefile autogenerated by slipway",
                self.package.language.display_name(),
                self.package.kind.description()
            ),
            format!(
                "Don't edit this file! Instead edit `{}` then rerun `slipway generate`",
                self.project.project_file
            ),
        ]);

        if let Some(first) = self.package.default_configuration() {
            mk.conditional(
                Conditional::new(Test::IfNdef("CONFIG".into()))
                    .then(Assignment::simple("CONFIG", &first.name)),
            );
        }
    }

    fn config_block(&self, cfg: &Configuration) -> Conditional {
        let siblings = SiblingResolver::new(self.project, self.package, cfg);

        let mut block = Conditional::new(Test::IfEq("$(CONFIG)".into(), cfg.name.clone()))
            .then(Assignment::simple("BINDIR", &cfg.bindir))
            .then(Assignment::simple("LIBDIR", &cfg.libdir))
            .then(Assignment::simple("OBJDIR", &cfg.objdir))
            .then(Assignment::simple("OUTDIR", &cfg.outdir))
            .then(Assignment::simple("CPPFLAGS", self.cppflags(cfg)))
            .then(Assignment::append("CFLAGS", self.cflags(cfg)))
            .then(Assignment::simple("CXXFLAGS", self.cxxflags(cfg)))
            .then(Assignment::append("LDFLAGS", self.ldflags(cfg, &siblings)))
            .then(Assignment::simple(
                "LDDEPS",
                siblings.linker_dependencies().join(" "),
            ));

        let target = if self.is_harness() {
            "$(OBJECTS)".to_string()
        } else {
            cfg.target_name().to_string()
        };
        block = block.then(Assignment::simple("TARGET", target));

        if self.is_app_bundle() {
            block = block.then(Assignment::simple(
                "MACAPP",
                format!("{}.app/Contents", cfg.target_name()),
            ));
        }

        block.then(Assignment::recursive("BLDCMD", self.build_command()))
    }

    fn cppflags(&self, cfg: &Configuration) -> String {
        let mut flags = Vec::new();
        if self.toolchain().generates_dependencies() {
            flags.push("-MD".to_string());
        }
        flags.extend(cfg.defines.iter().map(|d| format!("-D \"{}\"", d)));
        flags.extend(cfg.include_paths.iter().map(|p| format!("-I \"{}\"", p)));
        flags.join(" ")
    }

    fn cflags(&self, cfg: &Configuration) -> String {
        let mut flags = vec!["$(CPPFLAGS)".to_string()];

        let pic = self.package.is_kind(PackageKind::Dll) || cfg.has_flag(BuildFlag::PositionIndependent);
        if pic && !self.platform().is_windows() {
            flags.push("-fPIC".into());
        }
        if cfg.has_symbols() {
            flags.push("-g".into());
        }
        if let Some(opt) = cfg.optimization() {
            flags.push(opt.gcc_flag().into());
        }
        if cfg.has_flag(BuildFlag::ExtraWarnings) {
            flags.push("-Wall".into());
        }
        if cfg.has_flag(BuildFlag::FatalWarnings) {
            flags.push("-Werror".into());
        }
        if cfg.has_flag(BuildFlag::NoFramePointer) {
            flags.push("-fomit-frame-pointer".into());
        }
        flags.extend(cfg.build_options.iter().cloned());

        flags.join(" ")
    }

    fn cxxflags(&self, cfg: &Configuration) -> String {
        let mut flags = vec!["$(CFLAGS)"];
        if cfg.has_flag(BuildFlag::NoExceptions) {
            flags.push("-fno-exceptions");
        }
        if cfg.has_flag(BuildFlag::NoRtti) {
            flags.push("-fno-rtti");
        }
        flags.join(" ")
    }

    fn ldflags(&self, cfg: &Configuration, siblings: &SiblingResolver<'_>) -> String {
        let mut flags = vec!["-L$(BINDIR)".to_string(), "-L$(LIBDIR)".to_string()];

        if self.package.is_kind(PackageKind::Dll) && self.toolchain().has_shared_flag() {
            flags.push("-shared".into());
        }
        if cfg.strips_symbols() {
            flags.push("-s".into());
        }
        if self.platform().is_macosx() && cfg.has_flag(BuildFlag::Dylib) {
            flags.push("-dynamiclib".into());
            flags.push("-flat_namespace".into());
        }
        flags.extend(cfg.link_options.iter().cloned());
        flags.extend(cfg.delay_loads.iter().map(|dll| format!("/DELAYLOAD:{}", dll)));
        flags.extend(cfg.lib_paths.iter().map(|p| format!("-L\"{}\"", p)));

        let groups = self.platform().needs_link_groups();
        if groups {
            flags.push("-Xlinker --start-group".into());
        }
        flags.extend(siblings.link_args().iter().map(|arg| arg.to_string()));
        if groups {
            flags.push("-Xlinker --end-group".into());
        }

        flags.join(" ")
    }

    /// Chosen by package kind alone; configured link flags never change it.
    fn build_command(&self) -> String {
        match self.package.kind {
            PackageKind::Lib => {
                "ar -cr $(OUTDIR)/$(TARGET) $(OBJECTS); ranlib $(OUTDIR)/$(TARGET)".to_string()
            }
            PackageKind::HarnessGenerator => "true".to_string(),
            PackageKind::Run => "for a in $(LDDEPS); do echo Running $$a; $$a; done".to_string(),
            PackageKind::Exe | PackageKind::WinExe | PackageKind::Dll => format!(
                "$({}) -o {} $(OBJECTS) $(LDFLAGS) $(RESOURCES)",
                self.package.language.driver_variable(),
                self.link_output()
            ),
        }
    }

    fn link_output(&self) -> &'static str {
        if self.is_app_bundle() {
            "$(OUTDIR)/$(MACAPP)/MacOS/$(TARGET)"
        } else {
            "$(OUTDIR)/$(TARGET)"
        }
    }

    fn emit_object_lists(&self, mk: &mut Makefile) {
        let mut objects = Vec::new();
        let mut resources = Vec::new();

        for file in &self.package.files {
            match classify::classify(file) {
                FileRole::HarnessHeader if self.is_harness() => {
                    objects.push(classify::harness_output(file));
                }
                FileRole::Source(_) if !self.is_harness() => {
                    objects.push(format!("$(OBJDIR)/{}", classify::object_name(file)));
                }
                FileRole::Resource => {
                    resources.push(format!("$(OBJDIR)/{}", classify::resource_name(file)));
                }
                FileRole::Ignored => {
                    tracing::debug!("`{}`: ignoring {}", self.package.name, file);
                }
                _ => {}
            }
        }

        if !self.is_harness() {
            for (object, sources) in classify::object_collisions(&self.package.files) {
                tracing::warn!(
                    "`{}`: {} all compile to $(OBJDIR)/{}; only one object will be linked",
                    self.package.name,
                    sources.join(", "),
                    object
                );
            }
        }

        mk.list("OBJECTS", objects);
        if self.platform().is_windows() {
            mk.list("RESOURCES", resources);
        }
    }

    fn emit_dir_helpers(&self, mk: &mut Makefile) {
        let mut detect = Conditional::new(Test::IfEq(String::new(), "$(CMD)".into()));
        for (helper, dir) in OUTPUT_DIRS {
            detect = detect.then(Assignment::simple(helper, format!("mkdir -p $({})", dir)));
        }
        for (helper, dir) in OUTPUT_DIRS {
            let native = format!("$(subst /,\\\\,$({}))", dir);
            detect = detect.otherwise(Assignment::simple(
                helper,
                format!("$(CMD) /c if not exist {} mkdir {}", native, native),
            ));
        }

        mk.statements(vec![
            Statement::Assign(Assignment::simple(
                "CMD",
                "$(subst \\,\\\\,$(ComSpec)$(COMSPEC))",
            )),
            Statement::Conditional(detect),
        ]);
    }

    fn emit_main_target(&self, mk: &mut Makefile) {
        let prerequisites = ["$(OBJECTS)", "$(LDDEPS)", "$(RESOURCES)"];

        if self.is_harness() {
            let harness = self.package.harness();
            let mut command = format!("{} --root", harness.generator);
            if !harness.root_options.is_empty() {
                command.push(' ');
                command.push_str(&harness.root_options);
            }
            command.push_str(" -o ");
            command.push_str(&harness.root_file);

            mk.rule(
                Rule::new("all")
                    .prerequisites(prerequisites)
                    .command(self.quiet(command)),
            );
            return;
        }

        if self.package.is_kind(PackageKind::Run) {
            mk.rule(
                Rule::new("$(OUTDIR)/$(TARGET)")
                    .prerequisites(prerequisites)
                    .command(self.quiet("$(BLDCMD)")),
            );
            return;
        }

        if self.is_app_bundle() {
            mk.rule(Rule::new("all").prerequisites([
                "$(OUTDIR)/$(MACAPP)/PkgInfo",
                "$(OUTDIR)/$(MACAPP)/Info.plist",
                "$(OUTDIR)/$(MACAPP)/MacOS/$(TARGET)",
            ]));
        }

        let mut rule = Rule::new(self.link_output()).prerequisites(prerequisites);
        rule = rule.commands(self.echo(format!("Linking {}", self.package.name)));
        for (helper, _) in &OUTPUT_DIRS[..3] {
            rule = rule.command(self.tolerant(format!("$({})", helper)));
        }
        if self.is_app_bundle() {
            rule = rule.command(self.tolerant(
                "if [ ! -d $(OUTDIR)/$(MACAPP)/MacOS ]; then mkdir -p $(OUTDIR)/$(MACAPP)/MacOS; fi",
            ));
        }
        mk.rule(rule.command(self.quiet("$(BLDCMD)")));

        if self.is_app_bundle() {
            mk.rule(Rule::new("$(OUTDIR)/$(MACAPP)/PkgInfo"));
            mk.rule(Rule::new("$(OUTDIR)/$(MACAPP)/Info.plist"));
        }
    }

    fn emit_clean_target(&self, mk: &mut Makefile) {
        let remove = if self.is_app_bundle() {
            "rm -rf $(OUTDIR)/$(TARGET).app $(OBJDIR)"
        } else if self.is_harness() {
            "rm -f $(OBJECTS)"
        } else {
            "rm -rf $(OUTDIR)/$(TARGET) $(OBJDIR)"
        };

        mk.rule(
            Rule::new("clean")
                .commands(self.echo(format!("Cleaning {}", self.package.name)))
                .command(self.tolerant(remove)),
        );
    }

    fn emit_file_rules(&self, mk: &mut Makefile) {
        for file in &self.package.files {
            match classify::classify(file) {
                FileRole::Source(kind) => mk.rule(self.object_rule(file, kind)),
                FileRole::HarnessHeader if self.is_harness() => mk.rule(self.harness_rule(file)),
                _ => {}
            }
        }

        if self.platform().is_windows() {
            for file in &self.package.files {
                if classify::classify(file) == FileRole::Resource {
                    mk.rule(self.resource_rule(file));
                }
            }
        }
    }

    fn object_rule(&self, file: &str, kind: SourceKind) -> Rule {
        let rule = Rule::new(format!("$(OBJDIR)/{}", classify::object_name(file)))
            .prerequisite(file)
            .command(self.tolerant("$(CMD_MKOBJDIR)"))
            .commands(self.echo("$(notdir $<)"));

        let commands = match self.toolchain() {
            Toolchain::Gcc => self.gcc_commands(file, kind),
            Toolchain::Dmc => self.dmc_commands(file, kind),
        };
        rule.commands(commands.into_iter().map(|c| self.quiet(c)))
    }

    fn gcc_commands(&self, file: &str, kind: SourceKind) -> Vec<String> {
        let depfile = format!("$(OBJDIR)/{}.d", classify::basename(file));
        match kind {
            SourceKind::C => vec![format!("$(CC) $(CFLAGS) -MF {} -o $@ -c $<", depfile)],
            SourceKind::Cxx => vec![format!("$(CXX) $(CXXFLAGS) -MF {} -o $@ -c $<", depfile)],
            SourceKind::Assembly => {
                vec!["$(CC) -x assembler-with-cpp $(CPPFLAGS) -o $@ -c $<".to_string()]
            }
            SourceKind::Nasm => {
                // NASM has no -MD: build, then run it again in dependency mode.
                let nasm = self.nasm_invocation(file);
                vec![
                    format!("{} -o $@ $<", nasm),
                    format!("{} -M -o $@ $< >{}", nasm, depfile),
                ]
            }
        }
    }

    fn nasm_invocation(&self, file: &str) -> String {
        let dir = match classify::dirname(file) {
            "" => ".",
            dir => dir,
        };
        let format = match self.platform() {
            Platform::Windows => "win32",
            Platform::MacOsX => "macho",
            Platform::Linux | Platform::Bsd => "elf",
        };

        let mut nasm = "nasm".to_string();
        if !self.platform().is_windows() {
            nasm.push_str(" -dDONT_USE_UNDERLINE=1");
        }
        nasm.push_str(&format!(" -i{}/ -f {}", dir, format));
        nasm
    }

    fn dmc_commands(&self, file: &str, kind: SourceKind) -> Vec<String> {
        match kind {
            SourceKind::C => vec!["dmc $(CFLAGS) -o $@ -c $<".to_string()],
            SourceKind::Cxx => vec!["dmc -cpp -Ae -Ar -mn $(CXXFLAGS) -o $@ -c $<".to_string()],
            SourceKind::Assembly | SourceKind::Nasm => {
                tracing::warn!(
                    "`{}`: dmc has no assembler rule, {} will not be built",
                    self.package.name,
                    file
                );
                Vec::new()
            }
        }
    }

    fn harness_rule(&self, header: &str) -> Rule {
        let harness = self.package.harness();
        let output = classify::harness_output(header);

        let mut command = format!("{} --part", harness.generator);
        if !harness.options.is_empty() {
            command.push(' ');
            command.push_str(&harness.options);
        }
        command.push_str(&format!(" -o {} {}", output, header));

        Rule::new(output)
            .prerequisite(header)
            .commands(self.echo("$(notdir $<)"))
            .command(self.quiet(command))
    }

    fn resource_rule(&self, file: &str) -> Rule {
        Rule::new(format!("$(OBJDIR)/{}", classify::resource_name(file)))
            .prerequisite(file)
            .command(self.tolerant("$(CMD_MKOBJDIR)"))
            .commands(self.echo("$(notdir $<)"))
            .command(self.quiet("windres $< -O coff -o $@"))
    }
}

/// Emit the makefile of `package` within `project`.
pub fn emit_package(project: &Project, package: &Package, verbose: bool) -> Makefile {
    MakefileEmitter::new(project, package).verbose(verbose).emit()
}

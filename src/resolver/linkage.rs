//! Applying external library definitions to a package.
//!
//! Resolution mutates the package's configurations in place: include and
//! library search paths go to every configuration, link names and
//! delay-load directives go to the configurations of the matching variant.
//! It must complete before any build script for the package is written.

use crate::core::{BuildVariant, Configuration, Package, Platform};

use super::errors::LinkageError;
use super::library::{DefaultLibrary, ExternalLibrary, LibraryTable};

/// Mutable view of one package handed to linkage code.
///
/// Custom hooks receive this instead of the package itself, so everything a
/// hook can change is listed here.
pub struct LinkageContext<'a> {
    package: &'a mut Package,
    platform: Platform,
    libraries_root: &'a str,
    library: &'a str,
}

impl<'a> LinkageContext<'a> {
    pub fn new(
        package: &'a mut Package,
        platform: Platform,
        libraries_root: &'a str,
        library: &'a str,
    ) -> Self {
        LinkageContext {
            package,
            platform,
            libraries_root,
            library,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn package_name(&self) -> &str {
        &self.package.name
    }

    /// Identifier of the library being resolved.
    pub fn library(&self) -> &str {
        self.library
    }

    pub fn libraries_root(&self) -> &str {
        self.libraries_root
    }

    /// `<libraries-root>/<id>`
    pub fn library_dir(&self) -> String {
        join(self.libraries_root, self.library)
    }

    /// Substitute `{root}` and `{id}` placeholders.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{root}", self.libraries_root)
            .replace("{id}", self.library)
    }

    /// Append an include path to every configuration.
    pub fn add_include_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        for cfg in &mut self.package.configurations {
            push_unique(&mut cfg.include_paths, &path);
        }
    }

    /// Append a library search path to every configuration.
    pub fn add_library_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        for cfg in &mut self.package.configurations {
            push_unique(&mut cfg.lib_paths, &path);
        }
    }

    /// Link `name` in every configuration of `variant`.
    pub fn add_link(&mut self, variant: BuildVariant, name: impl AsRef<str>) {
        for cfg in self.configs_of(variant) {
            push_unique(&mut cfg.links, name.as_ref());
        }
    }

    /// Delay-load `dll` in every configuration of `variant`.
    pub fn add_delay_load(&mut self, variant: BuildVariant, dll: impl AsRef<str>) {
        for cfg in self.configs_of(variant) {
            push_unique(&mut cfg.delay_loads, dll.as_ref());
        }
    }

    /// Delay-load `dll` in every configuration.
    pub fn add_delay_load_everywhere(&mut self, dll: impl AsRef<str>) {
        for cfg in &mut self.package.configurations {
            push_unique(&mut cfg.delay_loads, dll.as_ref());
        }
    }

    fn configs_of(
        &mut self,
        variant: BuildVariant,
    ) -> impl Iterator<Item = &mut Configuration> + '_ {
        self.package
            .configurations
            .iter_mut()
            .filter(move |c| c.variant == variant)
    }
}

/// Resolves library identifiers against a definition table.
pub struct LinkageResolver<'a> {
    table: &'a LibraryTable,
    platform: Platform,
    libraries_root: &'a str,
}

impl<'a> LinkageResolver<'a> {
    pub fn new(table: &'a LibraryTable, platform: Platform, libraries_root: &'a str) -> Self {
        LinkageResolver {
            table,
            platform,
            libraries_root,
        }
    }

    /// Resolve `libraries` into `package`'s configurations.
    ///
    /// Every identifier is looked up before anything is mutated, so an
    /// undefined library leaves the package untouched.
    pub fn resolve(&self, package: &mut Package, libraries: &[String]) -> Result<(), LinkageError> {
        let mut resolved: Vec<(&str, &ExternalLibrary)> = Vec::new();
        for id in libraries {
            if resolved.iter().any(|(seen, _)| *seen == id.as_str()) {
                continue;
            }
            let def = self
                .table
                .get(id)
                .ok_or_else(|| LinkageError::UndefinedLibrary {
                    library: id.clone(),
                    package: package.name.clone(),
                    known: self.table.ids().map(String::from).collect(),
                })?;
            resolved.push((id.as_str(), def));
        }

        for (id, def) in resolved {
            let mut ctx = LinkageContext::new(package, self.platform, self.libraries_root, id);
            match def {
                ExternalLibrary::Custom(hook) => {
                    tracing::debug!("linking `{}` into `{}` via custom hook", id, ctx.package_name());
                    hook(&mut ctx).map_err(|e| LinkageError::CustomHook {
                        library: id.to_string(),
                        message: format!("{:#}", e),
                    })?;
                }
                ExternalLibrary::Default(def) => apply_default(&mut ctx, def),
            }
        }

        Ok(())
    }
}

fn apply_default(ctx: &mut LinkageContext<'_>, def: &DefaultLibrary) {
    let dir = ctx.library_dir();
    ctx.add_include_path(format!("{}/include", dir));
    ctx.add_library_path(format!("{}/lib", dir));

    let platform = ctx.platform();
    let suffix = def.debug_suffix(platform);
    let delay_load = !def.no_delayload && platform.supports_delay_load();

    let names = def.names_for(platform);
    if names.is_empty() {
        tracing::debug!("`{}` has no link names on {}", ctx.library(), platform);
    }

    for name in names {
        let debug_name = format!("{}{}", name, suffix);
        for variant in [BuildVariant::Debug, BuildVariant::Testing, BuildVariant::Release] {
            let link = if variant.uses_debug_libraries() {
                debug_name.as_str()
            } else {
                name.as_str()
            };
            ctx.add_link(variant, link);
            if delay_load && !suffix.is_empty() {
                ctx.add_delay_load(variant, format!("{}.dll", link));
            }
        }

        if delay_load && suffix.is_empty() {
            ctx.add_delay_load_everywhere(format!("{}.dll", name));
        }
    }
}

fn join(root: &str, id: &str) -> String {
    if root.is_empty() {
        id.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches('/'), id)
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{matrix_package, vorbis_table};

    fn links(package: &Package, config: &str) -> Vec<String> {
        package.configuration(config).unwrap().links.clone()
    }

    fn delay_loads(package: &Package, config: &str) -> Vec<String> {
        package.configuration(config).unwrap().delay_loads.clone()
    }

    #[test]
    fn test_debug_and_testing_mirror_on_windows() {
        let table = vorbis_table();
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Windows, "../libraries")
            .resolve(&mut pkg, &["vorbis".to_string()])
            .unwrap();

        assert_eq!(links(&pkg, "Debug"), ["vorbisfile_d"]);
        assert_eq!(links(&pkg, "Testing"), ["vorbisfile_d"]);
        assert_eq!(links(&pkg, "Release"), ["vorbisfile"]);

        assert_eq!(delay_loads(&pkg, "Debug"), ["vorbisfile_d.dll"]);
        assert_eq!(delay_loads(&pkg, "Testing"), ["vorbisfile_d.dll"]);
        assert_eq!(delay_loads(&pkg, "Release"), ["vorbisfile.dll"]);

        for cfg in &pkg.configurations {
            assert_eq!(cfg.include_paths, ["../libraries/vorbis/include"]);
            assert_eq!(cfg.lib_paths, ["../libraries/vorbis/lib"]);
        }
    }

    #[test]
    fn test_no_suffix_off_windows() {
        let mut table = LibraryTable::new();
        table.define(
            "sdl",
            DefaultLibrary {
                unix_names: Some(vec!["SDL".into()]),
                dbg_suffix: Some("_dbg".into()),
                ..Default::default()
            },
        );
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Linux, "libraries")
            .resolve(&mut pkg, &["sdl".to_string()])
            .unwrap();

        for cfg in &pkg.configurations {
            assert_eq!(cfg.links, ["SDL"]);
            assert!(cfg.delay_loads.is_empty());
        }
    }

    #[test]
    fn test_default_suffix_and_shared_delay_load() {
        let mut table = LibraryTable::new();
        table.define(
            "zlib",
            DefaultLibrary {
                windows_names: Some(vec!["zlib1".into()]),
                ..Default::default()
            },
        );
        table.define(
            "xerces",
            DefaultLibrary {
                windows_names: Some(vec!["xerces-c_2".into()]),
                dbg_suffix: Some(String::new()),
                ..Default::default()
            },
        );
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Windows, "libs")
            .resolve(&mut pkg, &["zlib".to_string(), "xerces".to_string()])
            .unwrap();

        assert_eq!(links(&pkg, "Debug"), ["zlib1d", "xerces-c_2"]);
        assert_eq!(links(&pkg, "Release"), ["zlib1", "xerces-c_2"]);
        for cfg in &pkg.configurations {
            assert!(cfg.delay_loads.contains(&"xerces-c_2.dll".to_string()));
        }
    }

    #[test]
    fn test_no_delayload_opt_out() {
        let mut table = LibraryTable::new();
        table.define(
            "opengl",
            DefaultLibrary {
                windows_names: Some(vec!["opengl32".into()]),
                dbg_suffix: Some(String::new()),
                no_delayload: true,
                ..Default::default()
            },
        );
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Windows, "libs")
            .resolve(&mut pkg, &["opengl".to_string()])
            .unwrap();

        for cfg in &pkg.configurations {
            assert_eq!(cfg.links, ["opengl32"]);
            assert!(cfg.delay_loads.is_empty());
        }
    }

    #[test]
    fn test_missing_platform_names_contribute_paths_only() {
        let mut table = LibraryTable::new();
        table.define(
            "boost",
            DefaultLibrary {
                windows_names: Some(vec!["boost_filesystem".into()]),
                ..Default::default()
            },
        );
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Linux, "libs")
            .resolve(&mut pkg, &["boost".to_string()])
            .unwrap();

        for cfg in &pkg.configurations {
            assert!(cfg.links.is_empty());
            assert_eq!(cfg.include_paths, ["libs/boost/include"]);
        }
    }

    #[test]
    fn test_undefined_library_leaves_package_untouched() {
        let table = vorbis_table();
        let mut pkg = matrix_package("engine");
        let before = pkg.clone();

        let err = LinkageResolver::new(&table, Platform::Windows, "libs")
            .resolve(&mut pkg, &["vorbis".to_string(), "fmod".to_string()])
            .unwrap_err();

        assert!(matches!(
            err,
            LinkageError::UndefinedLibrary { ref library, .. } if library == "fmod"
        ));
        assert_eq!(pkg, before);
    }

    #[test]
    fn test_custom_hook_supersedes_default() {
        let mut table = LibraryTable::new();
        table.register_custom("wxwidgets", |ctx| {
            let dir = ctx.library_dir();
            ctx.add_include_path(format!("{}/include/msvc", dir));
            ctx.add_link(BuildVariant::Debug, "wxmsw28ud");
            ctx.add_link(BuildVariant::Release, "wxmsw28u");
            Ok(())
        });
        let mut pkg = matrix_package("editor");

        LinkageResolver::new(&table, Platform::Windows, "libs")
            .resolve(&mut pkg, &["wxwidgets".to_string()])
            .unwrap();

        assert_eq!(links(&pkg, "Debug"), ["wxmsw28ud"]);
        assert!(links(&pkg, "Testing").is_empty());
        assert_eq!(links(&pkg, "Release"), ["wxmsw28u"]);
        for cfg in &pkg.configurations {
            assert_eq!(cfg.include_paths, ["libs/wxwidgets/include/msvc"]);
            assert!(cfg.lib_paths.is_empty());
        }
    }

    #[test]
    fn test_custom_hook_error() {
        let mut table = LibraryTable::new();
        table.register_custom("broken", |_| anyhow::bail!("no SDK found"));
        let mut pkg = matrix_package("engine");

        let err = LinkageResolver::new(&table, Platform::Linux, "libs")
            .resolve(&mut pkg, &["broken".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("no SDK found"));
    }

    #[test]
    fn test_duplicate_identifiers_resolve_once() {
        let table = vorbis_table();
        let mut pkg = matrix_package("engine");

        LinkageResolver::new(&table, Platform::Windows, "libs")
            .resolve(&mut pkg, &["vorbis".to_string(), "vorbis".to_string()])
            .unwrap();

        assert_eq!(links(&pkg, "Debug"), ["vorbisfile_d"]);
    }
}

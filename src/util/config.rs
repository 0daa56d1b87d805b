//! Project file (`Slipway.toml`) loading.
//!
//! The project file declares the project, its packages and optionally the
//! external library definitions. Loading it produces the fully resolved
//! [`Project`] model the generator consumes: every configuration has its
//! directories and target path filled in, and file globs are expanded.
//!
//! ```toml
//! [project]
//! name = "demo"
//! libraries_root = "../libraries"
//!
//! [[package]]
//! name = "engine"
//! kind = "lib"
//! files = ["src/*.cpp"]
//! libraries = ["vorbis"]
//!
//! [[package.configuration]]
//! name = "Debug"
//! defines = ["ENGINE_DEBUG"]
//!
//! [libraries.vorbis]
//! unix_names = ["vorbisfile"]
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::core::{
    BuildFlag, BuildVariant, Configuration, HarnessSettings, Language, Package, PackageKind,
    Platform, Project, Toolchain,
};
use crate::resolver::LibraryTable;
use crate::util::fs;

/// Name of the project file searched for by the CLI.
pub const PROJECT_FILE_NAME: &str = "Slipway.toml";

/// Configurations every package gets when the project names none.
pub const DEFAULT_CONFIGURATIONS: [&str; 3] = ["Debug", "Testing", "Release"];

/// Errors in the structure of a project file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find `Slipway.toml` in `{}` or any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("package `{0}` is declared more than once")]
    DuplicatePackage(String),

    #[error("package `{package}` overrides configuration `{config}` more than once")]
    DuplicateConfiguration { package: String, config: String },

    #[error("package `{package}` overrides unknown configuration `{config}`")]
    UnknownConfiguration { package: String, config: String },

    #[error("the project declares an empty configuration list")]
    NoConfigurations,

    #[error("harness package `{package}` has no `[package.harness]` table")]
    MissingHarness { package: String },
}

/// Command line overrides applied on top of the project file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub platform: Option<Platform>,
    pub toolchain: Option<Toolchain>,
}

/// On-disk shape of `Slipway.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectFile {
    pub project: ProjectSection,

    #[serde(default, rename = "package")]
    pub packages: Vec<PackageSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,
    pub platform: Option<Platform>,
    pub toolchain: Option<Toolchain>,
    #[serde(default = "default_libraries_root")]
    pub libraries_root: String,
    /// Extra TOML file of `[libraries.<id>]` tables, relative to the project root
    pub library_definitions: Option<String>,
    /// Configuration names shared by every package, in `CONFIG` default order
    pub configurations: Option<Vec<String>>,
}

fn default_libraries_root() -> String {
    "libraries".to_string()
}

/// Settings that can be given per package and refined per configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bindir: Option<String>,
    pub libdir: Option<String>,
    pub objdir: Option<String>,
    pub outdir: Option<String>,
    pub target: Option<String>,
    pub defines: Vec<String>,
    pub include_paths: Vec<String>,
    pub lib_paths: Vec<String>,
    pub links: Vec<String>,
    pub build_options: Vec<String>,
    pub link_options: Vec<String>,
    pub flags: BTreeSet<BuildFlag>,
}

impl Settings {
    /// Layer `other` on top: scalars replace, lists append, flags union.
    fn layer(&mut self, other: &Settings) {
        for (mine, theirs) in [
            (&mut self.bindir, &other.bindir),
            (&mut self.libdir, &other.libdir),
            (&mut self.objdir, &other.objdir),
            (&mut self.outdir, &other.outdir),
            (&mut self.target, &other.target),
        ] {
            if theirs.is_some() {
                mine.clone_from(theirs);
            }
        }
        self.defines.extend(other.defines.iter().cloned());
        self.include_paths.extend(other.include_paths.iter().cloned());
        self.lib_paths.extend(other.lib_paths.iter().cloned());
        self.links.extend(other.links.iter().cloned());
        self.build_options.extend(other.build_options.iter().cloned());
        self.link_options.extend(other.link_options.iter().cloned());
        self.flags.extend(other.flags.iter().copied());
    }
}

#[derive(Debug, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub kind: PackageKind,
    #[serde(default)]
    pub language: Language,
    /// Defaults to the package name
    pub path: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<String>,
    pub harness: Option<HarnessSettings>,
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default, rename = "configuration")]
    pub configurations: Vec<ConfigurationSection>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationSection {
    pub name: String,
    pub variant: Option<BuildVariant>,
    #[serde(flatten)]
    pub settings: Settings,
}

/// A project file turned into its model plus its library definitions.
#[derive(Debug)]
pub struct LoadedProject {
    pub project: Project,
    pub libraries: LibraryTable,
    /// The project file it was read from
    pub path: PathBuf,
}

/// Walk up from `start` looking for the project file.
pub fn find_project_file(start: &Path) -> Result<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        dir = current.parent();
    }
    Err(ConfigError::NotFound(start.to_path_buf()).into())
}

/// Load a project file and resolve it into a [`Project`].
pub fn load_project(path: &Path, overrides: &Overrides) -> Result<LoadedProject> {
    let contents = fs::read_to_string(path)?;
    let file: ProjectFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse project file: {}", path.display()))?;

    let root = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => fs::normalize_path(p),
        _ => fs::normalize_path(Path::new(".")),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PROJECT_FILE_NAME.to_string());

    let mut project = file
        .to_project(&root, overrides)
        .with_context(|| format!("in project file: {}", path.display()))?;
    project.project_file = file_name;

    let mut libraries = match &file.project.library_definitions {
        Some(rel) => LibraryTable::load(&root.join(rel))?,
        None => LibraryTable::new(),
    };
    libraries.merge(
        LibraryTable::from_toml_str(&contents)
            .with_context(|| format!("in project file: {}", path.display()))?,
    );

    tracing::debug!(
        "loaded `{}`: {} package(s), {} library definition(s)",
        project.name,
        project.packages.len(),
        libraries.len()
    );

    Ok(LoadedProject {
        project,
        libraries,
        path: path.to_path_buf(),
    })
}

impl ProjectFile {
    /// Build the project model rooted at `root`.
    pub fn to_project(&self, root: &Path, overrides: &Overrides) -> Result<Project> {
        let platform = overrides
            .platform
            .or(self.project.platform)
            .unwrap_or_else(Platform::host);

        let mut project = Project::new(&self.project.name, root, platform);
        project.toolchain = overrides
            .toolchain
            .or(self.project.toolchain)
            .unwrap_or_default();
        project.libraries_root = self.project.libraries_root.clone();

        let config_names: Vec<String> = match &self.project.configurations {
            Some(names) if names.is_empty() => return Err(ConfigError::NoConfigurations.into()),
            Some(names) => names.clone(),
            None => DEFAULT_CONFIGURATIONS.iter().map(|s| s.to_string()).collect(),
        };

        let mut seen = HashSet::new();
        for section in &self.packages {
            if !seen.insert(section.name.as_str()) {
                return Err(ConfigError::DuplicatePackage(section.name.clone()).into());
            }
            let package = section.to_package(&project, &config_names)?;
            project.packages.push(package);
        }

        Ok(project)
    }
}

impl PackageSection {
    fn to_package(&self, project: &Project, config_names: &[String]) -> Result<Package> {
        if self.kind == PackageKind::HarnessGenerator && self.harness.is_none() {
            return Err(ConfigError::MissingHarness {
                package: self.name.clone(),
            }
            .into());
        }

        let mut package = Package::new(&self.name, self.kind, self.language);
        package.path = self.path.clone().unwrap_or_else(|| self.name.clone());
        package.libraries = self.libraries.clone();
        package.harness = self.harness.clone();
        package.files = expand_files(&project.package_dir(&package), &self.files)?;

        let mut overridden = HashSet::new();
        for cfg in &self.configurations {
            if !overridden.insert(cfg.name.as_str()) {
                return Err(ConfigError::DuplicateConfiguration {
                    package: self.name.clone(),
                    config: cfg.name.clone(),
                }
                .into());
            }
            if !config_names.contains(&cfg.name) {
                return Err(ConfigError::UnknownConfiguration {
                    package: self.name.clone(),
                    config: cfg.name.clone(),
                }
                .into());
            }
        }

        let configurations = config_names
            .iter()
            .map(|name| {
                let mut settings = Settings {
                    flags: default_flags(name).iter().copied().collect(),
                    ..Settings::default()
                };
                settings.layer(&self.settings);

                let section = self.configurations.iter().find(|c| &c.name == name);
                if let Some(section) = section {
                    settings.layer(&section.settings);
                }

                let variant = section.and_then(|s| s.variant);
                build_configuration(name, variant, settings, project, &package)
            })
            .collect();
        package.configurations = configurations;

        Ok(package)
    }
}

/// Flags implied by the well-known configuration names.
fn default_flags(name: &str) -> &'static [BuildFlag] {
    match name {
        "Testing" => &[BuildFlag::Optimize],
        "Release" => &[BuildFlag::Optimize, BuildFlag::NoSymbols],
        _ => &[],
    }
}

/// Paths in the project file are relative to the project root, except
/// `objdir` which is private to the package. The model holds every path
/// relative to the package directory.
fn build_configuration(
    name: &str,
    variant: Option<BuildVariant>,
    settings: Settings,
    project: &Project,
    package: &Package,
) -> Configuration {
    let rebase = |path: &str| project.rebase(package, path);
    let mut cfg = Configuration::new(name);

    cfg.bindir = rebase(settings.bindir.as_deref().unwrap_or("."));
    cfg.libdir = rebase(settings.libdir.as_deref().unwrap_or("."));
    if let Some(objdir) = settings.objdir {
        cfg.objdir = objdir;
    }
    cfg.outdir = match &settings.outdir {
        Some(outdir) => rebase(outdir.as_str()),
        None if package.kind == PackageKind::Lib => cfg.libdir.clone(),
        None => cfg.bindir.clone(),
    };

    cfg.target = match &settings.target {
        Some(target) => rebase(target.as_str()),
        None => {
            let dylib = settings.flags.contains(&BuildFlag::Dylib);
            let file = package.kind.output_filename(&package.name, project.platform, dylib);
            if cfg.outdir == "." {
                file
            } else {
                format!("{}/{}", cfg.outdir.trim_end_matches('/'), file)
            }
        }
    };

    cfg.defines = settings.defines;
    cfg.include_paths = settings.include_paths.iter().map(|p| rebase(p.as_str())).collect();
    cfg.lib_paths = settings.lib_paths.iter().map(|p| rebase(p.as_str())).collect();
    cfg.links = settings.links;
    cfg.build_options = settings.build_options;
    cfg.link_options = settings.link_options;
    cfg.variant = variant.unwrap_or_else(|| BuildVariant::infer(name, &settings.flags));
    cfg.flags = settings.flags;
    cfg
}

/// Expand glob patterns relative to the package directory; plain paths are
/// kept verbatim and in place.
fn expand_files(package_dir: &Path, patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !fs::is_glob(pattern) {
            files.push(pattern.clone());
            continue;
        }
        let matches = fs::glob_files(package_dir, pattern)?;
        if matches.is_empty() {
            tracing::warn!("pattern `{}` matched no files in {}", pattern, package_dir.display());
        }
        for m in matches {
            if !files.contains(&m) {
                files.push(m);
            }
        }
    }
    Ok(files)
}

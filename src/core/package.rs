//! Packages - what gets built.
//!
//! A Package is one buildable unit of a project: an executable, a library,
//! a generated test harness or a run target, together with its source files
//! and its configuration matrix.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::configuration::Configuration;
use super::platform::Platform;

/// The kind of package being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Console executable
    #[serde(alias = "console-app")]
    Exe,

    /// Windowed (GUI) executable
    #[serde(alias = "windowed-app")]
    WinExe,

    /// Shared/dynamic library
    #[serde(alias = "shared-lib")]
    Dll,

    /// Static library
    #[serde(alias = "static-lib")]
    Lib,

    /// Test harness generator: headers in, generated `.cpp` files out
    #[serde(rename = "cxxtestgen", alias = "harness-generator")]
    HarnessGenerator,

    /// Runs every sibling it depends on
    #[serde(alias = "run-target")]
    Run,
}

impl PackageKind {
    /// Human readable kind used in script headers.
    pub fn description(&self) -> &'static str {
        match self {
            PackageKind::Exe => "Console Executable",
            PackageKind::WinExe => "Windowed Executable",
            PackageKind::Dll => "Shared Library",
            PackageKind::Lib => "Static Library",
            PackageKind::HarnessGenerator => "CxxTest Generator",
            PackageKind::Run => "Run Target",
        }
    }

    /// Whether other packages can link against this one's artifact.
    pub fn is_linkable(&self) -> bool {
        !matches!(self, PackageKind::HarnessGenerator)
    }

    /// Get the typical file prefix for this kind.
    pub fn prefix(&self, platform: Platform) -> &'static str {
        match self {
            PackageKind::Lib => "lib",
            PackageKind::Dll if !platform.is_windows() => "lib",
            _ => "",
        }
    }

    /// Get the typical file extension for this kind.
    pub fn extension(&self, platform: Platform, dylib: bool) -> &'static str {
        match self {
            PackageKind::Exe | PackageKind::WinExe | PackageKind::Run => {
                if platform.is_windows() {
                    "exe"
                } else {
                    ""
                }
            }
            PackageKind::Lib => "a",
            PackageKind::Dll => match platform {
                Platform::Windows => "dll",
                Platform::MacOsX if dylib => "dylib",
                _ => "so",
            },
            PackageKind::HarnessGenerator => "",
        }
    }

    /// Get the output file name for a package.
    pub fn output_filename(&self, name: &str, platform: Platform, dylib: bool) -> String {
        let prefix = self.prefix(platform);
        let ext = self.extension(platform, dylib);
        if ext.is_empty() {
            format!("{}{}", prefix, name)
        } else {
            format!("{}{}.{}", prefix, name, ext)
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Source language for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    #[default]
    #[serde(rename = "c++", alias = "cpp", alias = "cxx")]
    Cxx,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }

    /// Name used in script headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C++",
        }
    }

    /// Make variable holding the driver that links this language.
    pub fn driver_variable(&self) -> &'static str {
        match self {
            Language::C => "CC",
            Language::Cxx => "CXX",
        }
    }
}

/// Settings for the harness-generator kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Path to the generator executable
    pub generator: String,
    /// Options passed when generating each part
    pub options: String,
    /// Options passed when generating the root runner
    pub root_options: String,
    /// Output path of the root runner
    pub root_file: String,
}

/// A package with its files and configuration matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub kind: PackageKind,
    pub language: Language,

    /// Directory the build script is written to, relative to the project root
    pub path: String,

    /// Source files in declaration order, relative to `path`
    pub files: Vec<String>,

    /// Never empty
    pub configurations: Vec<Configuration>,

    /// External library identifiers to resolve before generation
    #[serde(default)]
    pub libraries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harness: Option<HarnessSettings>,
}

impl Package {
    pub fn new(name: impl Into<String>, kind: PackageKind, language: Language) -> Self {
        Package {
            name: name.into(),
            kind,
            language,
            path: ".".to_string(),
            files: Vec::new(),
            configurations: Vec::new(),
            libraries: Vec::new(),
            harness: None,
        }
    }

    pub fn is_kind(&self, kind: PackageKind) -> bool {
        self.kind == kind
    }

    /// Look up a configuration by name.
    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name == name)
    }

    /// The configuration `CONFIG` defaults to.
    pub fn default_configuration(&self) -> Option<&Configuration> {
        self.configurations.first()
    }

    /// Artifact path this package produces under the configuration named
    /// `config`, falling back to its default configuration.
    pub fn artifact_for(&self, config: &str) -> Option<&str> {
        self.configuration(config)
            .or_else(|| self.default_configuration())
            .map(|c| c.target.as_str())
    }

    pub fn harness(&self) -> HarnessSettings {
        self.harness.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filename() {
        assert_eq!(
            PackageKind::Lib.output_filename("engine", Platform::Linux, false),
            "libengine.a"
        );
        assert_eq!(
            PackageKind::Lib.output_filename("engine", Platform::Windows, false),
            "libengine.a"
        );
        assert_eq!(
            PackageKind::Dll.output_filename("gfx", Platform::Windows, false),
            "gfx.dll"
        );
        assert_eq!(
            PackageKind::Dll.output_filename("gfx", Platform::MacOsX, true),
            "libgfx.dylib"
        );
        assert_eq!(
            PackageKind::Exe.output_filename("game", Platform::Linux, false),
            "game"
        );
        assert_eq!(
            PackageKind::WinExe.output_filename("game", Platform::Windows, false),
            "game.exe"
        );
    }

    #[test]
    fn test_kind_serde_names() {
        #[derive(Deserialize)]
        struct Holder {
            kind: PackageKind,
        }

        let parse = |s: &str| toml::from_str::<Holder>(&format!("kind = \"{}\"", s)).unwrap().kind;
        assert_eq!(parse("lib"), PackageKind::Lib);
        assert_eq!(parse("static-lib"), PackageKind::Lib);
        assert_eq!(parse("winexe"), PackageKind::WinExe);
        assert_eq!(parse("cxxtestgen"), PackageKind::HarnessGenerator);
        assert_eq!(parse("run-target"), PackageKind::Run);
    }

    #[test]
    fn test_only_harness_is_unlinkable() {
        assert!(!PackageKind::HarnessGenerator.is_linkable());
        assert!(PackageKind::Lib.is_linkable());
        assert!(PackageKind::Run.is_linkable());
    }

    #[test]
    fn test_artifact_falls_back_to_default_configuration() {
        let mut pkg = Package::new("engine", PackageKind::Lib, Language::Cxx);
        let mut debug = Configuration::new("Debug");
        debug.target = "lib/libengine_d.a".into();
        let mut release = Configuration::new("Release");
        release.target = "lib/libengine.a".into();
        pkg.configurations = vec![debug, release];

        assert_eq!(pkg.artifact_for("Release"), Some("lib/libengine.a"));
        assert_eq!(pkg.artifact_for("Profile"), Some("lib/libengine_d.a"));
    }
}

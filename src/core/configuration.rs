//! Build configurations (Debug, Testing, Release, ...).
//!
//! A Configuration is one column of a package's configuration matrix: its
//! output directories, preprocessor and linker inputs, and feature flags.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Named boolean feature toggles a configuration can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildFlag {
    /// Do not generate debug symbols (also strips at link time)
    NoSymbols,
    /// Balanced optimization, used when neither size nor speed is chosen
    #[serde(alias = "optimize-balanced")]
    Optimize,
    OptimizeSize,
    OptimizeSpeed,
    ExtraWarnings,
    FatalWarnings,
    NoFramePointer,
    NoExceptions,
    NoRtti,
    /// Position-independent code for every kind, not only shared libraries
    #[serde(alias = "pic")]
    PositionIndependent,
    /// Build a macOS dynamic library instead of a bundle
    #[serde(alias = "dynamic-library")]
    Dylib,
    StripSymbols,
}

/// Which binary-compatibility class a configuration belongs to.
///
/// External libraries ship debug and release builds; `Testing` links the
/// debug builds just like `Debug` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildVariant {
    Debug,
    Testing,
    Release,
}

impl BuildVariant {
    /// Infer a variant from a configuration name and its flags.
    pub fn infer(name: &str, flags: &BTreeSet<BuildFlag>) -> Self {
        if name.eq_ignore_ascii_case("debug") {
            BuildVariant::Debug
        } else if name.eq_ignore_ascii_case("testing") {
            BuildVariant::Testing
        } else if name.eq_ignore_ascii_case("release") || optimizes(flags) {
            BuildVariant::Release
        } else {
            BuildVariant::Debug
        }
    }

    /// Debug and Testing link against the debug builds of external libraries.
    pub fn uses_debug_libraries(&self) -> bool {
        matches!(self, BuildVariant::Debug | BuildVariant::Testing)
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildVariant::Debug => write!(f, "Debug"),
            BuildVariant::Testing => write!(f, "Testing"),
            BuildVariant::Release => write!(f, "Release"),
        }
    }
}

fn optimizes(flags: &BTreeSet<BuildFlag>) -> bool {
    flags.contains(&BuildFlag::Optimize)
        || flags.contains(&BuildFlag::OptimizeSize)
        || flags.contains(&BuildFlag::OptimizeSpeed)
}

/// Optimization level selected by a configuration's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimization {
    Size,
    Speed,
    Balanced,
}

impl Optimization {
    pub fn gcc_flag(&self) -> &'static str {
        match self {
            Optimization::Size => "-Os",
            Optimization::Speed => "-O3",
            Optimization::Balanced => "-O2",
        }
    }
}

/// One build configuration of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub variant: BuildVariant,

    pub bindir: String,
    pub libdir: String,
    pub objdir: String,
    pub outdir: String,

    /// Path of the artifact this configuration produces
    pub target: String,

    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub lib_paths: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub build_options: Vec<String>,
    #[serde(default)]
    pub link_options: Vec<String>,

    /// DLLs whose loading is deferred to first use (windows only)
    #[serde(default)]
    pub delay_loads: Vec<String>,

    #[serde(default)]
    pub flags: BTreeSet<BuildFlag>,
}

impl Configuration {
    /// Create a configuration whose directories all point at `.` and whose
    /// object directory is `obj/<name>`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let objdir = format!("obj/{}", name);
        let flags = BTreeSet::new();
        Configuration {
            variant: BuildVariant::infer(&name, &flags),
            bindir: ".".to_string(),
            libdir: ".".to_string(),
            objdir,
            outdir: ".".to_string(),
            target: String::new(),
            defines: Vec::new(),
            include_paths: Vec::new(),
            lib_paths: Vec::new(),
            links: Vec::new(),
            build_options: Vec::new(),
            link_options: Vec::new(),
            delay_loads: Vec::new(),
            flags,
            name,
        }
    }

    pub fn has_flag(&self, flag: BuildFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Size wins over speed; balanced applies only when neither was chosen.
    pub fn optimization(&self) -> Option<Optimization> {
        if self.has_flag(BuildFlag::OptimizeSize) {
            Some(Optimization::Size)
        } else if self.has_flag(BuildFlag::OptimizeSpeed) {
            Some(Optimization::Speed)
        } else if self.has_flag(BuildFlag::Optimize) {
            Some(Optimization::Balanced)
        } else {
            None
        }
    }

    /// Whether debug information is generated.
    pub fn has_symbols(&self) -> bool {
        !self.has_flag(BuildFlag::NoSymbols)
    }

    /// Whether the linker strips symbols from the output.
    pub fn strips_symbols(&self) -> bool {
        self.has_flag(BuildFlag::NoSymbols) || self.has_flag(BuildFlag::StripSymbols)
    }

    /// File name component of the artifact path.
    pub fn target_name(&self) -> &str {
        self.target
            .rsplit(&['/', '\\'][..])
            .next()
            .unwrap_or(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(list: &[BuildFlag]) -> BTreeSet<BuildFlag> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_variant_inference() {
        let none = BTreeSet::new();
        assert_eq!(BuildVariant::infer("Debug", &none), BuildVariant::Debug);
        assert_eq!(BuildVariant::infer("TESTING", &none), BuildVariant::Testing);
        assert_eq!(BuildVariant::infer("Release", &none), BuildVariant::Release);
        assert_eq!(BuildVariant::infer("Profile", &none), BuildVariant::Debug);
        assert_eq!(
            BuildVariant::infer("Profile", &flags(&[BuildFlag::OptimizeSpeed])),
            BuildVariant::Release
        );
    }

    #[test]
    fn test_testing_mirrors_debug() {
        assert!(BuildVariant::Debug.uses_debug_libraries());
        assert!(BuildVariant::Testing.uses_debug_libraries());
        assert!(!BuildVariant::Release.uses_debug_libraries());
    }

    #[test]
    fn test_optimization_selects_exactly_one() {
        let mut cfg = Configuration::new("Release");
        assert_eq!(cfg.optimization(), None);

        cfg.flags.insert(BuildFlag::Optimize);
        assert_eq!(cfg.optimization(), Some(Optimization::Balanced));

        cfg.flags.insert(BuildFlag::OptimizeSpeed);
        assert_eq!(cfg.optimization(), Some(Optimization::Speed));

        cfg.flags.insert(BuildFlag::OptimizeSize);
        assert_eq!(cfg.optimization(), Some(Optimization::Size));
    }

    #[test]
    fn test_symbols_and_stripping() {
        let mut cfg = Configuration::new("Debug");
        assert!(cfg.has_symbols());
        assert!(!cfg.strips_symbols());

        cfg.flags.insert(BuildFlag::StripSymbols);
        assert!(cfg.has_symbols());
        assert!(cfg.strips_symbols());

        cfg.flags.insert(BuildFlag::NoSymbols);
        assert!(!cfg.has_symbols());
    }

    #[test]
    fn test_target_name() {
        let mut cfg = Configuration::new("Debug");
        cfg.target = "../lib/libengine.a".to_string();
        assert_eq!(cfg.target_name(), "libengine.a");

        cfg.target = "game.exe".to_string();
        assert_eq!(cfg.target_name(), "game.exe");
    }

    #[test]
    fn test_flag_names() {
        let parsed: Vec<BuildFlag> =
            toml::from_str::<std::collections::HashMap<String, Vec<BuildFlag>>>(
                "flags = [\"optimize-balanced\", \"no-rtti\", \"dynamic-library\"]",
            )
            .unwrap()
            .remove("flags")
            .unwrap();
        assert_eq!(
            parsed,
            vec![BuildFlag::Optimize, BuildFlag::NoRtti, BuildFlag::Dylib]
        );
    }
}

//! Target platform and toolchain identifiers.
//!
//! Both are chosen once per run and never change while scripts are being
//! generated. Every platform- or toolchain-conditional decision the emitter
//! and the linkage resolver make goes through the predicates here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system the generated build scripts target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    #[serde(alias = "macos", alias = "darwin")]
    MacOsX,
    Linux,
    Bsd,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOsX
        } else if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            Platform::Bsd
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOsX => "macosx",
            Platform::Linux => "linux",
            Platform::Bsd => "bsd",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn is_macosx(&self) -> bool {
        matches!(self, Platform::MacOsX)
    }

    /// Debug and release runtimes are not binary compatible on windows, so
    /// third-party libraries ship separate debug builds there.
    pub fn has_debug_abi_split(&self) -> bool {
        self.is_windows()
    }

    /// Whether the native linker understands delay-load directives.
    pub fn supports_delay_load(&self) -> bool {
        self.is_windows()
    }

    /// GNU ld resolves archives in a single pass; everything but the macOS
    /// linker needs `--start-group`/`--end-group` around mutually dependent
    /// archives.
    pub fn needs_link_groups(&self) -> bool {
        !self.is_macosx()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Platform::Windows),
            "macosx" | "macos" | "darwin" => Ok(Platform::MacOsX),
            "linux" => Ok(Platform::Linux),
            "bsd" | "freebsd" | "openbsd" | "netbsd" => Ok(Platform::Bsd),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown platform name.
#[derive(Debug, Clone)]
pub struct PlatformParseError(pub String);

impl fmt::Display for PlatformParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid platform '{}', valid values: windows, macosx, linux, bsd",
            self.0
        )
    }
}

impl std::error::Error for PlatformParseError {}

/// Compiler family the generated rules invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    /// GNU GCC (or anything driver-compatible with it)
    #[default]
    Gcc,
    /// Digital Mars C/C++
    Dmc,
}

impl Toolchain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Toolchain::Gcc => "gcc",
            Toolchain::Dmc => "dmc",
        }
    }

    /// Whether the compiler can write `.d` dependency fragments via `-MD`.
    pub fn generates_dependencies(&self) -> bool {
        matches!(self, Toolchain::Gcc)
    }

    /// Whether the driver links shared libraries with `-shared`.
    pub fn has_shared_flag(&self) -> bool {
        matches!(self, Toolchain::Gcc)
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Toolchain {
    type Err = ToolchainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcc" | "gnu" => Ok(Toolchain::Gcc),
            "dmc" => Ok(Toolchain::Dmc),
            _ => Err(ToolchainParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown toolchain name.
#[derive(Debug, Clone)]
pub struct ToolchainParseError(pub String);

impl fmt::Display for ToolchainParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid toolchain '{}', valid values: gcc, dmc", self.0)
    }
}

impl std::error::Error for ToolchainParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!("windows".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!("MacOS".parse::<Platform>().unwrap(), Platform::MacOsX);
        assert_eq!("freebsd".parse::<Platform>().unwrap(), Platform::Bsd);
        assert!("plan9".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_capabilities() {
        assert!(Platform::Windows.has_debug_abi_split());
        assert!(!Platform::Linux.has_debug_abi_split());
        assert!(Platform::Windows.supports_delay_load());
        assert!(!Platform::MacOsX.supports_delay_load());
        assert!(Platform::Linux.needs_link_groups());
        assert!(!Platform::MacOsX.needs_link_groups());
    }

    #[test]
    fn test_toolchain_capabilities() {
        assert_eq!(Toolchain::default(), Toolchain::Gcc);
        assert!(Toolchain::Gcc.generates_dependencies());
        assert!(!Toolchain::Dmc.generates_dependencies());
        assert!(!Toolchain::Dmc.has_shared_flag());
        assert!("icc".parse::<Toolchain>().is_err());
    }
}

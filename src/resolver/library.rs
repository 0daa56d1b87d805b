//! External library definitions.
//!
//! Definitions are static data loaded once per process. Most libraries
//! follow the common installation template (`<root>/<id>/{include,lib}` plus
//! platform link names); the ones that don't carry a custom hook that does
//! all of the work itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{BuildVariant, Platform};

use super::linkage::LinkageContext;

/// Suffix appended to debug link names when a definition doesn't override it.
pub const DEFAULT_DEBUG_SUFFIX: &str = "d";

/// Hook that replaces the default linkage algorithm for one library.
pub type LinkageHook = Box<dyn Fn(&mut LinkageContext<'_>) -> Result<()> + Send + Sync>;

/// A library following the common installation template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultLibrary {
    /// Link names on windows
    pub windows_names: Option<Vec<String>>,
    /// Link names everywhere else
    pub unix_names: Option<Vec<String>>,
    /// Debug-build suffix; `Some("")` means there is no separate debug build
    pub dbg_suffix: Option<String>,
    /// Never delay-load this library's DLLs
    pub no_delayload: bool,
}

impl DefaultLibrary {
    /// Link names for `platform`. No names is valid (header-only libraries).
    pub fn names_for(&self, platform: Platform) -> &[String] {
        let names = if platform.is_windows() {
            &self.windows_names
        } else {
            &self.unix_names
        };
        names.as_deref().unwrap_or(&[])
    }

    /// Suffix for Debug/Testing link names on `platform`.
    pub fn debug_suffix(&self, platform: Platform) -> &str {
        if !platform.has_debug_abi_split() {
            return "";
        }
        self.dbg_suffix.as_deref().unwrap_or(DEFAULT_DEBUG_SUFFIX)
    }
}

/// Data-driven custom linkage, for libraries whose layout doesn't fit the
/// template but whose needs can still be written down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomRecipe {
    /// Platforms the recipe applies to; empty means all
    pub platforms: Vec<Platform>,
    pub include_paths: Vec<String>,
    pub library_paths: Vec<String>,
    /// Link names for Debug and Testing
    pub debug_links: Vec<String>,
    /// Link names for Release
    pub release_links: Vec<String>,
    /// DLLs delay-loaded by Debug and Testing
    pub debug_delay_loads: Vec<String>,
    /// DLLs delay-loaded by Release
    pub release_delay_loads: Vec<String>,
}

impl CustomRecipe {
    pub fn apply(&self, ctx: &mut LinkageContext<'_>) {
        if !self.platforms.is_empty() && !self.platforms.contains(&ctx.platform()) {
            return;
        }

        for path in &self.include_paths {
            ctx.add_include_path(ctx.expand(path));
        }
        for path in &self.library_paths {
            ctx.add_library_path(ctx.expand(path));
        }
        for name in &self.debug_links {
            ctx.add_link(BuildVariant::Debug, name);
            ctx.add_link(BuildVariant::Testing, name);
        }
        for name in &self.release_links {
            ctx.add_link(BuildVariant::Release, name);
        }
        for dll in &self.debug_delay_loads {
            ctx.add_delay_load(BuildVariant::Debug, dll);
            ctx.add_delay_load(BuildVariant::Testing, dll);
        }
        for dll in &self.release_delay_loads {
            ctx.add_delay_load(BuildVariant::Release, dll);
        }
    }
}

/// One external library definition.
pub enum ExternalLibrary {
    Default(DefaultLibrary),
    Custom(LinkageHook),
}

impl fmt::Debug for ExternalLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalLibrary::Default(def) => f.debug_tuple("Default").field(def).finish(),
            ExternalLibrary::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// On-disk shape of a definition: template fields, or a `custom` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawLibrary {
    windows_names: Option<Vec<String>>,
    unix_names: Option<Vec<String>>,
    dbg_suffix: Option<String>,
    no_delayload: bool,
    custom: Option<CustomRecipe>,
}

impl RawLibrary {
    fn into_parts(self) -> (DefaultLibrary, Option<CustomRecipe>) {
        let template = DefaultLibrary {
            windows_names: self.windows_names,
            unix_names: self.unix_names,
            dbg_suffix: self.dbg_suffix,
            no_delayload: self.no_delayload,
        };
        (template, self.custom)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTable {
    #[serde(default)]
    libraries: BTreeMap<String, RawLibrary>,
}

/// Lookup table from library identifier to definition.
#[derive(Debug, Default)]
pub struct LibraryTable {
    libraries: BTreeMap<String, ExternalLibrary>,
}

impl LibraryTable {
    pub fn new() -> Self {
        LibraryTable::default()
    }

    /// Add (or replace) a template definition.
    pub fn define(&mut self, id: impl Into<String>, library: DefaultLibrary) -> &mut Self {
        self.libraries
            .insert(id.into(), ExternalLibrary::Default(library));
        self
    }

    /// Add (or replace) a definition whose hook does all the work.
    pub fn register_custom<F>(&mut self, id: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&mut LinkageContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.libraries
            .insert(id.into(), ExternalLibrary::Custom(Box::new(hook)));
        self
    }

    /// Move every definition of `other` into this table, replacing entries
    /// with the same identifier.
    pub fn merge(&mut self, other: LibraryTable) {
        self.libraries.extend(other.libraries);
    }

    pub fn get(&self, id: &str) -> Option<&ExternalLibrary> {
        self.libraries.get(id)
    }

    /// All identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Parse a `[libraries.<id>]` TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawTable =
            toml::from_str(contents).context("failed to parse library definitions")?;

        let mut table = LibraryTable::new();
        for (id, lib) in raw.libraries {
            let (template, custom) = lib.into_parts();
            match custom {
                Some(recipe) => {
                    if template != DefaultLibrary::default() {
                        tracing::warn!(
                            "library `{}` has a custom recipe; its template fields are ignored",
                            id
                        );
                    }
                    table.register_custom(id, move |ctx| {
                        recipe.apply(ctx);
                        Ok(())
                    });
                }
                None => {
                    table.define(id, template);
                }
            }
        }
        Ok(table)
    }

    /// Load definitions from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read library definitions: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("in library definitions: {}", path.display()))
    }

    /// Load definitions, or an empty table if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no library definitions at {}", path.display());
            Ok(LibraryTable::new())
        }
    }
}

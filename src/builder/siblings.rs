//! Sibling package links.
//!
//! A link name can refer to another package generated in the same run. Such
//! names are replaced by the sibling's artifact path on the link line, and
//! the artifact is also listed as a make prerequisite: link flags alone don't
//! make `make` build the dependency first.

use std::fmt;

use serde::Serialize;

use crate::core::{Configuration, Package, Project};

/// One entry on a link line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum LinkArg {
    /// Artifact built by a sibling package
    Artifact(String),
    /// Library found on the search path
    Library(String),
}

impl fmt::Display for LinkArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkArg::Artifact(path) => f.write_str(path),
            LinkArg::Library(name) => write!(f, "-l{}", name),
        }
    }
}

/// Filters link names of one configuration of `package` against the
/// project's packages. Artifact paths come out relative to `package`'s
/// directory.
pub struct SiblingResolver<'a> {
    project: &'a Project,
    package: &'a Package,
    config: &'a Configuration,
}

impl<'a> SiblingResolver<'a> {
    pub fn new(project: &'a Project, package: &'a Package, config: &'a Configuration) -> Self {
        SiblingResolver {
            project,
            package,
            config,
        }
    }

    /// What `name` contributes to the link line, if anything.
    pub fn filter_link(&self, name: &str) -> Option<LinkArg> {
        match self.project.find_package(name) {
            Some(sibling) if !sibling.kind.is_linkable() => None,
            Some(sibling) => sibling
                .artifact_for(&self.config.name)
                .map(|path| LinkArg::Artifact(self.project.relocate(self.package, sibling, path))),
            None => Some(LinkArg::Library(name.to_string())),
        }
    }

    /// Artifact `name` must be built before this package links.
    pub fn linker_dependency(&self, name: &str) -> Option<String> {
        let sibling = self.project.find_package(name)?;
        if !sibling.kind.is_linkable() {
            return None;
        }
        sibling
            .artifact_for(&self.config.name)
            .map(|path| self.project.relocate(self.package, sibling, path))
    }

    /// The configuration's link names, filtered.
    pub fn link_args(&self) -> Vec<LinkArg> {
        self.config
            .links
            .iter()
            .filter_map(|name| self.filter_link(name))
            .collect()
    }

    /// The configuration's ordering prerequisites.
    pub fn linker_dependencies(&self) -> Vec<String> {
        self.config
            .links
            .iter()
            .filter_map(|name| self.linker_dependency(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sibling_project;

    #[test]
    fn test_sibling_becomes_artifact() {
        let project = sibling_project();
        let game = project.find_package("game").unwrap();
        let debug = game.configuration("Debug").unwrap();
        let siblings = SiblingResolver::new(&project, game, debug);

        assert_eq!(
            siblings.filter_link("engine"),
            Some(LinkArg::Artifact("../lib/libengine_dbg.a".into()))
        );
        assert_eq!(
            siblings.linker_dependency("engine").as_deref(),
            Some("../lib/libengine_dbg.a")
        );
    }

    #[test]
    fn test_external_name_becomes_library_flag() {
        let project = sibling_project();
        let game = project.find_package("game").unwrap();
        let siblings = SiblingResolver::new(&project, game, game.configuration("Release").unwrap());

        let arg = siblings.filter_link("png").unwrap();
        assert_eq!(arg, LinkArg::Library("png".into()));
        assert_eq!(arg.to_string(), "-lpng");
        assert_eq!(siblings.linker_dependency("png"), None);
    }

    #[test]
    fn test_harness_sibling_contributes_nothing() {
        let project = sibling_project();
        let game = project.find_package("game").unwrap();
        let siblings = SiblingResolver::new(&project, game, game.configuration("Debug").unwrap());

        assert_eq!(siblings.filter_link("test_gen"), None);
        assert_eq!(siblings.linker_dependency("test_gen"), None);
    }

    #[test]
    fn test_lists_follow_declaration_order() {
        let project = sibling_project();
        let game = project.find_package("game").unwrap();
        let siblings = SiblingResolver::new(&project, game, game.configuration("Release").unwrap());

        let rendered: Vec<String> = siblings.link_args().iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, ["../lib/libengine.a", "-lpng"]);
        assert_eq!(siblings.linker_dependencies(), ["../lib/libengine.a"]);
    }

    #[test]
    fn test_artifact_paths_follow_the_linking_package() {
        let mut project = sibling_project();
        project.find_package_mut("game").unwrap().path = "apps/game".into();
        let game = project.find_package("game").unwrap();
        let siblings = SiblingResolver::new(&project, game, game.configuration("Debug").unwrap());

        assert_eq!(
            siblings.linker_dependency("engine").as_deref(),
            Some("../../lib/libengine_dbg.a")
        );
    }
}

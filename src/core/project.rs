//! The project model: every package generated in one run.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::package::Package;
use super::platform::{Platform, Toolchain};
use crate::util::fs::relative_path;

/// A fully resolved project, ready for script generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,

    /// Directory containing the project file
    pub root: PathBuf,

    pub platform: Platform,
    pub toolchain: Toolchain,

    /// Root of the external library installations (`<root>/<id>/include`)
    pub libraries_root: String,

    /// File name shown in the "don't edit" banner
    pub project_file: String,

    pub packages: Vec<Package>,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, platform: Platform) -> Self {
        Project {
            name: name.into(),
            root: root.into(),
            platform,
            toolchain: Toolchain::default(),
            libraries_root: "libraries".to_string(),
            project_file: crate::util::config::PROJECT_FILE_NAME.to_string(),
            packages: Vec::new(),
        }
    }

    /// Find a sibling package by name.
    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn find_package_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.iter_mut().find(|p| p.name == name)
    }

    /// Directory a package's build script lives in.
    pub fn package_dir(&self, package: &Package) -> PathBuf {
        normalize(&self.root.join(&package.path))
    }

    /// A package owns its directory when no other package shares it and it
    /// is not the project root. Owned directories get a plain `Makefile`.
    pub fn package_owns_path(&self, package: &Package) -> bool {
        let dir = self.package_dir(package);
        if dir == normalize(&self.root) {
            return false;
        }
        !self
            .packages
            .iter()
            .any(|p| p.name != package.name && self.package_dir(p) == dir)
    }

    /// File name of a package's build script.
    pub fn script_name(&self, package: &Package) -> String {
        if self.package_owns_path(package) {
            "Makefile".to_string()
        } else {
            format!("{}.make", package.name)
        }
    }

    /// Full path of a package's build script.
    pub fn script_path(&self, package: &Package) -> PathBuf {
        self.package_dir(package).join(self.script_name(package))
    }

    /// Full path of the workspace makefile.
    pub fn workspace_script_path(&self) -> PathBuf {
        self.root.join("Makefile")
    }

    /// Re-express `path`, written relative to the project root, relative to
    /// the directory `package`'s script runs in.
    pub fn rebase(&self, package: &Package, path: &str) -> String {
        if is_absolute(path) {
            return path.to_string();
        }
        self.relative_to(package, &self.root.join(path))
    }

    /// Re-express `path`, relative to `owner`'s directory, relative to
    /// `from`'s directory.
    pub fn relocate(&self, from: &Package, owner: &Package, path: &str) -> String {
        if is_absolute(path) || from.path == owner.path {
            return path.to_string();
        }
        self.relative_to(from, &self.package_dir(owner).join(path))
    }

    fn relative_to(&self, package: &Package, target: &Path) -> String {
        let rel = relative_path(&self.package_dir(package), &normalize(target));
        let rel = rel.to_string_lossy().replace('\\', "/");
        if rel.is_empty() {
            ".".to_string()
        } else {
            rel
        }
    }
}

/// Absolute paths and make variable references are never rebased.
fn is_absolute(path: &str) -> bool {
    path.starts_with(&['/', '\\', '$'][..]) || path.get(1..2) == Some(":")
}

/// Lexically drop `.` and fold `..` into its parent, so `root/./engine`,
/// `root/engine` and `root/x/../engine` compare equal.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::{Language, PackageKind};

    fn project() -> Project {
        let mut project = Project::new("demo", "/work", Platform::Linux);
        let mut engine = Package::new("engine", PackageKind::Lib, Language::Cxx);
        engine.path = "engine".into();
        let mut game = Package::new("game", PackageKind::Exe, Language::Cxx);
        game.path = "game".into();
        let mut tests = Package::new("tests", PackageKind::Exe, Language::Cxx);
        tests.path = "./game".into();
        let root = Package::new("tools", PackageKind::Exe, Language::C);
        project.packages = vec![engine, game, tests, root];
        project
    }

    #[test]
    fn test_find_package() {
        let project = project();
        assert!(project.find_package("engine").is_some());
        assert!(project.find_package("missing").is_none());
    }

    #[test]
    fn test_script_names() {
        let project = project();
        let engine = project.find_package("engine").unwrap();
        let game = project.find_package("game").unwrap();
        let tools = project.find_package("tools").unwrap();

        assert_eq!(project.script_name(engine), "Makefile");
        assert_eq!(project.script_name(game), "game.make");
        assert_eq!(project.script_name(tools), "tools.make");
        assert_eq!(
            project.script_path(engine),
            PathBuf::from("/work/engine/Makefile")
        );
    }

    #[test]
    fn test_rebase() {
        let mut project = project();
        project.packages[0].path = "src/engine".into();
        let engine = project.find_package("engine").unwrap();
        let game = project.find_package("game").unwrap();
        let tools = project.find_package("tools").unwrap();

        assert_eq!(project.rebase(game, "."), "..");
        assert_eq!(project.rebase(game, "lib"), "../lib");
        assert_eq!(project.rebase(engine, "./include"), "../../include");
        assert_eq!(project.rebase(tools, "lib"), "lib");
        assert_eq!(project.rebase(tools, "."), ".");
        assert_eq!(project.rebase(game, "/opt/lib"), "/opt/lib");
        assert_eq!(project.rebase(game, "$(SDK)/lib"), "$(SDK)/lib");
        assert_eq!(project.rebase(game, "C:/sdk"), "C:/sdk");
    }

    #[test]
    fn test_rebase_outside_project_root() {
        let mut project = Project::new("demo", "/work/demo", Platform::Linux);
        let mut ext = Package::new("ext", PackageKind::Lib, Language::C);
        ext.path = "../ext".into();
        project.packages.push(ext);
        let ext = project.find_package("ext").unwrap();

        assert_eq!(project.package_dir(ext), PathBuf::from("/work/ext"));
        assert_eq!(project.rebase(ext, "lib"), "../demo/lib");
        assert_eq!(project.rebase(ext, "."), "../demo");
        assert_eq!(project.rebase(ext, "../ext/include"), "include");
    }

    #[test]
    fn test_relocate_between_packages() {
        let mut project = project();
        project.packages[0].path = "libs/engine".into();
        let engine = project.find_package("engine").unwrap();
        let game = project.find_package("game").unwrap();

        assert_eq!(project.relocate(game, engine, "../../libengine.a"), "../libengine.a");
        assert_eq!(project.relocate(game, engine, "out/libengine.a"), "../libs/engine/out/libengine.a");
        assert_eq!(project.relocate(engine, engine, "x.a"), "x.a");
        assert_eq!(project.relocate(game, engine, "/opt/lib/x.a"), "/opt/lib/x.a");
    }

    #[test]
    fn test_relocate_from_outside_project_root() {
        let mut project = project();
        let mut ext = Package::new("ext", PackageKind::Exe, Language::C);
        ext.path = "../ext".into();
        project.packages.push(ext);
        let engine = project.find_package("engine").unwrap();
        let ext = project.find_package("ext").unwrap();

        assert_eq!(project.relocate(ext, engine, "libengine.a"), "../work/engine/libengine.a");
        assert_eq!(project.relocate(ext, engine, "../libengine.a"), "../work/libengine.a");
    }
}

//! Pre-built projects, packages and library tables.

use crate::core::{Configuration, Language, Package, PackageKind, Platform, Project};
use crate::resolver::{DefaultLibrary, LibraryTable};

/// A configuration named `name` producing `target`.
pub fn configuration(name: &str, target: &str) -> Configuration {
    let mut cfg = Configuration::new(name);
    cfg.target = target.to_string();
    cfg
}

/// A package with the given files and configurations.
pub fn package_with(
    name: &str,
    kind: PackageKind,
    language: Language,
    files: &[&str],
    configurations: Vec<Configuration>,
) -> Package {
    let mut pkg = Package::new(name, kind, language);
    pkg.path = name.to_string();
    pkg.files = files.iter().map(|f| f.to_string()).collect();
    pkg.configurations = configurations;
    pkg
}

/// A static library with the full Debug/Testing/Release matrix.
pub fn matrix_package(name: &str) -> Package {
    let target = format!("lib{}.a", name);
    package_with(
        name,
        PackageKind::Lib,
        Language::Cxx,
        &[],
        vec![
            configuration("Debug", &target),
            configuration("Testing", &target),
            configuration("Release", &target),
        ],
    )
}

/// Definitions table holding vorbis with an explicit `_d` debug suffix.
pub fn vorbis_table() -> LibraryTable {
    let mut table = LibraryTable::new();
    table.define(
        "vorbis",
        DefaultLibrary {
            windows_names: Some(vec!["vorbisfile".into()]),
            unix_names: Some(vec!["vorbisfile".into()]),
            dbg_suffix: Some("_d".into()),
            no_delayload: false,
        },
    );
    table
}

/// `engine`: a C++ static library with a C file and a stray text file.
pub fn engine_project() -> Project {
    let mut project = Project::new("demo", "/work", Platform::Linux);
    project.packages.push(package_with(
        "engine",
        PackageKind::Lib,
        Language::Cxx,
        &["a.cpp", "b.c", "notes.txt"],
        vec![
            configuration("Debug", "../lib/libengine_dbg.a"),
            configuration("Release", "../lib/libengine.a"),
        ],
    ));
    project
}

/// `game` links the `engine` sibling, the `test_gen` harness and libpng.
pub fn sibling_project() -> Project {
    let mut project = engine_project();

    let mut harness = package_with(
        "test_gen",
        PackageKind::HarnessGenerator,
        Language::Cxx,
        &["tests/test_engine.h"],
        vec![configuration("Debug", "")],
    );
    harness.path = "tests".into();
    project.packages.push(harness);

    let links = ["engine", "test_gen", "png"];
    let mut debug = configuration("Debug", "../bin/game_dbg");
    let mut release = configuration("Release", "../bin/game");
    for cfg in [&mut debug, &mut release] {
        cfg.links = links.iter().map(|l| l.to_string()).collect();
    }
    project.packages.push(package_with(
        "game",
        PackageKind::Exe,
        Language::Cxx,
        &["main.cpp"],
        vec![debug, release],
    ));

    project
}

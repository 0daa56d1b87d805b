//! File classification by extension.

use std::path::Path;

/// What a project file contributes to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Compiled into an object file
    Source(SourceKind),
    /// Windows resource script, compiled with `windres`
    Resource,
    /// Header fed to the test-harness generator
    HarnessHeader,
    /// Not part of the build (headers, docs, data)
    Ignored,
}

/// How a compiled source is turned into an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    C,
    Cxx,
    /// `.s`: assembled by the C driver after preprocessing
    Assembly,
    /// `.asm`: assembled by NASM
    Nasm,
}

/// Classify a project file by its extension (case-insensitive, except that
/// an upper-case `.C` is C++ as Unix compilers treat it).
pub fn classify(path: &str) -> FileRole {
    let ext = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("C") => return FileRole::Source(SourceKind::Cxx),
        Some(ext) => ext.to_ascii_lowercase(),
        None => return FileRole::Ignored,
    };

    match ext.as_str() {
        "c" => FileRole::Source(SourceKind::C),
        "cpp" | "cc" | "cxx" | "c++" => FileRole::Source(SourceKind::Cxx),
        "s" => FileRole::Source(SourceKind::Assembly),
        "asm" => FileRole::Source(SourceKind::Nasm),
        "rc" => FileRole::Resource,
        "h" => FileRole::HarnessHeader,
        _ => FileRole::Ignored,
    }
}

/// File name without directory or extension.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}

/// Directory part of a path, `""` for bare file names.
pub fn dirname(path: &str) -> &str {
    match path.rfind(&['/', '\\'][..]) {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Object file name for a compiled source: `src/a.cpp` -> `a.o`.
pub fn object_name(path: &str) -> String {
    format!("{}.o", basename(path))
}

/// Object names produced by more than one compiled source, with the
/// sources that produce them, in first-seen order.
pub fn object_collisions<'a>(files: &'a [String]) -> Vec<(String, Vec<&'a str>)> {
    let mut seen: Vec<(String, Vec<&str>)> = Vec::new();
    for file in files.iter().map(String::as_str) {
        if !matches!(classify(file), FileRole::Source(_)) {
            continue;
        }
        let object = object_name(file);
        match seen.iter_mut().find(|(o, _)| *o == object) {
            Some((_, sources)) => sources.push(file),
            None => seen.push((object, vec![file])),
        }
    }
    seen.retain(|(_, sources)| sources.len() > 1);
    seen
}

/// Compiled resource name: `res/icon.rc` -> `icon.res`.
pub fn resource_name(path: &str) -> String {
    format!("{}.res", basename(path))
}

/// Generated companion of a harness header: `tests/a.h` -> `tests/a.cpp`.
pub fn harness_output(path: &str) -> String {
    match path.strip_suffix(".h").or_else(|| path.strip_suffix(".H")) {
        Some(stem) => format!("{}.cpp", stem),
        None => format!("{}.cpp", path),
    }
}

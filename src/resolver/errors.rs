//! Linkage resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while resolving external libraries for a package.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum LinkageError {
    #[error("external library `{library}` not defined (required by `{package}`)")]
    #[diagnostic(
        code(slipway::linkage::undefined_library),
        help("add a [libraries.{library}] entry to the library definitions")
    )]
    UndefinedLibrary {
        library: String,
        package: String,
        known: Vec<String>,
    },

    #[error("custom linkage for `{library}` failed: {message}")]
    #[diagnostic(code(slipway::linkage::custom_hook))]
    CustomHook { library: String, message: String },
}

impl LinkageError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LinkageError::UndefinedLibrary {
                library,
                package,
                known,
            } => {
                let mut diag =
                    Diagnostic::error(format!("external library `{}` not defined", library))
                        .with_context(format!("package `{}` requires it", package));

                let close: Vec<&str> = known
                    .iter()
                    .map(String::as_str)
                    .filter(|k| similar(k, library))
                    .collect();
                if !close.is_empty() {
                    diag = diag.with_context(format!("similar definitions: {}", close.join(", ")));
                }

                diag.with_suggestion(suggestions::DEFINE_LIBRARY)
                    .with_suggestion(format!(
                        "Remove `{}` from the libraries of `{}`",
                        library, package
                    ))
            }

            LinkageError::CustomHook { library, message } => {
                Diagnostic::error(format!("custom linkage for `{}` failed", library))
                    .with_context(message.clone())
            }
        }
    }
}

/// Cheap typo check: same name ignoring case, or one is a prefix of the other.
fn similar(a: &str, b: &str) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    a == b || a.starts_with(&b) || b.starts_with(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_library_diagnostic() {
        let err = LinkageError::UndefinedLibrary {
            library: "vorbis".into(),
            package: "engine".into(),
            known: vec!["vorbisfile".into(), "zlib".into()],
        };

        assert_eq!(
            err.to_string(),
            "external library `vorbis` not defined (required by `engine`)"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: external library `vorbis` not defined"));
        assert!(output.contains("similar definitions: vorbisfile"));
        assert!(!output.contains("zlib"));
        assert!(output.contains("help: consider:"));
    }
}

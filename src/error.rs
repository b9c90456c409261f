use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using this crate's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the mutation pipeline.
///
/// The pipeline distinguishes two classes: fatal errors abort the whole run,
/// recoverable ones are caught at the mutant boundary, logged, and folded
/// into the run statistics so one bad mutant never sinks the batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading, writing, or copying files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The front end could not parse a source file.
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// No front end for the file's extension.
    #[error("unsupported language for file: {path}")]
    UnsupportedLanguage { path: PathBuf },

    /// Invalid or incomplete run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The build command exited non-zero on a mutant copy.
    #[error("build command failed with exit code {code:?}: {output}")]
    Build { code: Option<i32>, output: String },

    /// A mutant directory already exists and overwrite is disabled.
    #[error("mutant directory already exists: {path} (pass overwrite to replace it)")]
    MutantConflict { path: PathBuf },

    /// Invariant violation inside the pipeline.
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must abort the whole run rather than being folded
    /// into the statistics at the mutant boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Parse { .. }
                | Error::UnsupportedLanguage { .. }
                | Error::Config(_)
                | Error::Build { .. }
                | Error::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failures_are_fatal() {
        let err = Error::Build {
            code: Some(2),
            output: "linker error".into(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn io_and_conflict_errors_are_recoverable() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!err.is_fatal());

        let err = Error::MutantConflict {
            path: PathBuf::from("mutants/lib.rs.branch-if.0"),
        };
        assert!(!err.is_fatal());
    }
}

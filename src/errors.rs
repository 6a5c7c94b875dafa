use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the brain extraction driver.
///
/// Each variant carries the context of its domain (filesystem, dataset metadata,
/// filename parsing, the container runtime) so callers never have to parse
/// error strings.
#[derive(Error, Debug)]
pub enum BrainExtractError {
    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset description {path:?}: {reason}")]
    DatasetDescription { path: PathBuf, reason: String },

    #[error("Anatomical image {path:?} does not match <prefix>_<suffix>.nii.gz")]
    FilenamePattern { path: String },

    #[error("{name} executable not found on PATH")]
    RuntimeNotFound { name: String },

    #[error("Brain extraction failed for {count} image(s): {images:?}")]
    ToolFailed { count: usize, images: Vec<String> },

    #[error("Serialization error: {operation} failed")]
    Serialization {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, BrainExtractError>;

impl BrainExtractError {
    /// Shorthand for wrapping an I/O error with its path and operation.
    pub fn file_system(path: impl Into<PathBuf>, operation: &str, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }
}

/// Fallback conversion for I/O errors raised without path context.
///
/// Code that knows the path and operation should build
/// `BrainExtractError::FileSystem` directly.
impl From<std::io::Error> for BrainExtractError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BrainExtractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            operation: "json".to_string(),
            source: err,
        }
    }
}

use std::path::PathBuf;

use thiserror::Error;

use crate::image::ImageError;
use crate::undo::StackKind;

/// Failure of a single edit. The edit is aborted without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ImageError),

    #[error("Nothing to {0}")]
    EmptyStack(StackKind),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors at the I/O boundary: puzzle loading, settings, submission
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to write TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("Dataset not found: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("Task '{task}' not found in dataset '{dataset}'")]
    TaskNotFound { dataset: String, task: String },

    #[error("Task '{0}' has no test pairs")]
    NoTests(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("{0}")]
    InvalidArgument(String),
}

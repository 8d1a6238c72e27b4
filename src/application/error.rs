//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{ModelError, TreeError};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Analysis(#[from] TreeError),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("no type named '{name}' in {}", model.display())]
    RootNotFound { name: String, model: PathBuf },

    #[error("invalid model file {}: {message}", path.display())]
    ModelFile { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

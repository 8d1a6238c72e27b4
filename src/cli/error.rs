//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// Top-level error type; these are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Infra(e) => match e {
                InfraError::Serialize(_) => exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::ModelNotFound(_) => exitcode::NOINPUT,
                    ApplicationError::RootNotFound { .. } => exitcode::USAGE,
                    ApplicationError::ModelFile { .. } => exitcode::DATAERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                    ApplicationError::Model(_) | ApplicationError::Analysis(_) => {
                        exitcode::SOFTWARE
                    }
                },
            },
        }
    }
}

//! Infrastructure layer: I/O implementations, model files and DI container

pub mod di;
pub mod error;
pub mod model_file;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use model_file::{ModelDocument, ModelFileError};

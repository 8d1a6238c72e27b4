//! Error conversion helpers for I/O with path context

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// ```ignore
    /// fs.read_to_string(&model).with_path_context("read model", &model)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{action}: {}", path.display()),
            source: Box::new(e),
        })
    }
}

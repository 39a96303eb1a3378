//! Error conversion helpers for store and file operations
//!
//! Provides extension traits for cleaner error handling with location context.

use std::fmt::Display;
use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add location context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// store.load()
    ///     .with_context("load parts", store.location())?;
    /// ```
    fn with_context(self, action: &str, location: impl Display) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_context(self, action: &str, location: impl Display) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, location),
            source: Box::new(e),
        })
    }
}

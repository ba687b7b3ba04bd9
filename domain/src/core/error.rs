//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Check if this error was caused by rejected user input
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }
}

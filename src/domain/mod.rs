/// Domain module containing core business logic and data types
///
/// This module defines the habit record, the typed candidate built from
/// requests, and the rules every candidate must pass before it is stored.

pub mod habit;
pub mod rules;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use rules::*;
pub use types::*;

use thiserror::Error;

/// Errors raised while coercing request values into a typed candidate
///
/// These are type and shape problems found before any rule runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid time '{0}', expected HH:MM:SS")]
    InvalidTime(String),

    #[error("Invalid related habit id: {0}")]
    InvalidReference(String),
}

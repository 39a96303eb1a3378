//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the part hierarchy rules.
/// These are independent of storage concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("part not found: {0}")]
    NotFound(String),

    #[error("parent {parent_id} of part {id} does not exist")]
    UnknownParent { id: String, parent_id: String },

    #[error("moving part {id} under {parent_id} would create a cycle")]
    ParentCycle { id: String, parent_id: String },

    #[error("invalid part: {message}")]
    InvalidPart { message: String },
}

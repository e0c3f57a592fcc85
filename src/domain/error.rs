//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::Category;

/// Domain errors represent violations of the document model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    #[error("duplicate identifier in {category}: {identifier}")]
    DuplicateIdentifier {
        category: Category,
        identifier: String,
    },

    #[error("node has no identifier: <{tag}>")]
    MissingIdentifier { tag: String },

    #[error("node not found in document")]
    NodeNotFound,

    #[error("node is not a child of the given parent")]
    NotAChild,

    #[error("node is not an element")]
    NotAnElement,
}

impl DomainError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

//! Domain error types

use thiserror::Error;

use crate::validate::ValidationErrors;

/// A string did not name any variant of a closed enum
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Rejections produced by the policy and validation layers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// The actor may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// The actor may manage the project but not change this field
    #[error("{0}")]
    FieldLocked(String),

    /// Structural violations, reported together
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A business rule rejected an otherwise well-formed value
    #[error("{0}")]
    Rule(String),

    /// A unique key is already taken
    #[error("{0}")]
    Conflict(String),
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

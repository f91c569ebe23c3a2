use std::path::PathBuf;

use thiserror::Error;

/// A rule violation found while adding or editing members and relationships.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is a required field")]
    MissingName,

    #[error("Both members must be selected for a relationship")]
    MissingEndpoint,

    #[error("Cannot create a relationship with the same person")]
    SelfRelationship,

    #[error("This relationship already exists")]
    Duplicate,

    #[error("Member {0} does not exist")]
    UnknownMember(String),

    #[error("A member with id {0} already exists")]
    DuplicateMemberId(String),

    #[error("A relationship with id {0} already exists")]
    DuplicateRelationshipId(String),
}

impl ValidationError {
    /// Short, stable key for the violated rule.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingName => "missing name",
            ValidationError::MissingEndpoint => "missing endpoint",
            ValidationError::SelfRelationship => "self relationship",
            ValidationError::Duplicate => "duplicate relationship",
            ValidationError::UnknownMember(_) => "unknown member",
            ValidationError::DuplicateMemberId(_) => "duplicate member id",
            ValidationError::DuplicateRelationshipId(_) => "duplicate relationship id",
        }
    }
}

#[derive(Debug, Error)]
pub enum GenogramError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Relationship {0} not found")]
    RelationshipNotFound(String),

    #[error("No relationship at row {0}")]
    RowOutOfRange(usize),

    #[error("Invalid JSON format: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, GenogramError>;

impl GenogramError {
    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            GenogramError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

//! Core error types.
//!
//! Every store and engine operation reports failures through [`MasteryError`]
//! so callers can branch on the kind of failure without string matching.
//! File and config loading wrap these with `anyhow` context at the edges.

use std::fmt;

use thiserror::Error;

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Question,
    Topic,
    Unit,
    Student,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Question => write!(f, "question"),
            EntityKind::Topic => write!(f, "topic"),
            EntityKind::Unit => write!(f, "unit"),
            EntityKind::Student => write!(f, "student"),
        }
    }
}

/// Errors returned by catalog, store, and engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MasteryError {
    /// An unknown question, topic, unit, or student was referenced.
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    /// A question with this id already exists.
    #[error("question already exists: {0}")]
    Conflict(String),

    /// The question category is not one of the recognized kinds.
    #[error("invalid question type: {0}")]
    InvalidType(String),

    /// The curriculum definition is malformed.
    #[error("invalid catalog: {0}")]
    Catalog(String),

    /// A numeric or identifier input was out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl MasteryError {
    pub fn question_not_found(id: impl Into<String>) -> Self {
        MasteryError::NotFound {
            kind: EntityKind::Question,
            key: id.into(),
        }
    }

    pub fn topic_not_found(topic: impl Into<String>) -> Self {
        MasteryError::NotFound {
            kind: EntityKind::Topic,
            key: topic.into(),
        }
    }

    pub fn unit_not_found(unit: impl Into<String>) -> Self {
        MasteryError::NotFound {
            kind: EntityKind::Unit,
            key: unit.into(),
        }
    }

    pub fn student_not_found(id: impl Into<String>) -> Self {
        MasteryError::NotFound {
            kind: EntityKind::Student,
            key: id.into(),
        }
    }

    /// Returns `true` if this is a `NotFound` error of any entity kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MasteryError::NotFound { .. })
    }

    /// Returns the entity kind for `NotFound` errors.
    pub fn not_found_kind(&self) -> Option<EntityKind> {
        match self {
            MasteryError::NotFound { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

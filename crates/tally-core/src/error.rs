use std::fmt;

use tally_domain::{JournalEditError, Money};
use thiserror::Error;
use uuid::Uuid;

/// Kinds of entities an operation can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Budget,
    Category,
    JournalEntry,
    JournalLine,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Company => "Company",
            EntityKind::Budget => "Budget",
            EntityKind::Category => "Category",
            EntityKind::JournalEntry => "Journal entry",
            EntityKind::JournalLine => "Journal line",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Unbalanced entry: debits {total_debits} vs credits {total_credits}")]
    Imbalance {
        total_debits: Money,
        total_credits: Money,
    },
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("Journal entry {0} is already posted")]
    AlreadyPosted(Uuid),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<JournalEditError> for CoreError {
    fn from(err: JournalEditError) -> Self {
        match err {
            JournalEditError::AlreadyPosted(id) => CoreError::AlreadyPosted(id),
            JournalEditError::LineOutOfRange { index, .. } => {
                CoreError::not_found(EntityKind::JournalLine, index)
            }
            JournalEditError::Unbalanced(totals) => CoreError::Imbalance {
                total_debits: totals.total_debits,
                total_credits: totals.total_credits,
            },
        }
    }
}

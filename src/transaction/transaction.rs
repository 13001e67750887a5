//! A single recorded step of a tracked operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress of a tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    InProgress,
    Finished,
    Failed,
}

impl TransactionState {
    /// Whether no further state may follow this one.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

// == Transaction ==
/// One state of an operation identified by `id`.
///
/// Every record gets its own `uuid`; records of the same operation share `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub uuid: Uuid,
    pub created: DateTime<Utc>,
    pub state: TransactionState,
}

impl Transaction {
    pub fn new(id: impl Into<String>, state: TransactionState, created: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            uuid: Uuid::new_v4(),
            created,
            state,
        }
    }

    /// Starts a new operation with a fresh id.
    pub fn begin() -> Self {
        Self::new(Uuid::new_v4().to_string(), TransactionState::InProgress, Utc::now())
    }

    /// Next record of the same operation.
    pub fn with_state(&self, state: TransactionState, created: DateTime<Utc>) -> Self {
        Self::new(self.id.clone(), state, created)
    }
}

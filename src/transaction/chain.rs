//! Transaction Chain
//!
//! The ordered history of one operation. A chain is never empty, shares one id
//! across all its records, and only moves from in-progress to a terminal state.

use serde::{Deserialize, Serialize};

use super::{Transaction, TransactionState};
use crate::error::ChainError;

/// Append-only, validated list of the records of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Transaction>", into = "Vec<Transaction>")]
pub struct TransactionChain {
    chain: Vec<Transaction>,
}

impl TransactionChain {
    /// Starts a chain with its first record.
    pub fn new(transaction: Transaction) -> Self {
        Self {
            chain: vec![transaction],
        }
    }

    /// Id shared by every record.
    pub fn id(&self) -> &str {
        &self.chain[0].id
    }

    /// State of the latest record.
    pub fn state(&self) -> TransactionState {
        self.transaction().state
    }

    /// Latest record.
    pub fn transaction(&self) -> &Transaction {
        &self.chain[self.chain.len() - 1]
    }

    /// Every record, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// A chain always holds at least one record.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    // == Append ==
    /// Returns a new chain with `transaction` appended, leaving `self` as is.
    ///
    /// # Errors
    /// - [`ChainError::NotEqualId`] if `transaction` belongs to another operation
    /// - [`ChainError::DuplicatedTransaction`] if it equals the latest record
    /// - [`ChainError::IncorrectCreationTime`] if it predates the latest record
    /// - [`ChainError::InvalidTransactionState`] unless the chain moves from
    ///   in-progress to a terminal state
    pub fn append(&self, transaction: &Transaction) -> Result<TransactionChain, ChainError> {
        let last = self.transaction();

        if last.id != transaction.id {
            return Err(ChainError::NotEqualId);
        }
        if last == transaction {
            return Err(ChainError::DuplicatedTransaction);
        }
        if last.created > transaction.created {
            return Err(ChainError::IncorrectCreationTime);
        }
        if last.state.is_terminal() || !transaction.state.is_terminal() {
            return Err(ChainError::InvalidTransactionState);
        }

        let mut chain = self.chain.clone();
        chain.push(transaction.clone());
        Ok(Self { chain })
    }
}

impl TryFrom<Vec<Transaction>> for TransactionChain {
    type Error = ChainError;

    /// Restores a stored chain as is. Only [`TransactionChain::append`] checks
    /// history rules; decoding just requires at least one record.
    fn try_from(chain: Vec<Transaction>) -> Result<Self, Self::Error> {
        if chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(Self { chain })
    }
}

impl From<TransactionChain> for Vec<Transaction> {
    fn from(chain: TransactionChain) -> Self {
        chain.chain
    }
}

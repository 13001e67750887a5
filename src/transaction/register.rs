//! Transaction Register
//!
//! Persistent index of transaction chains keyed by operation id, stored through
//! a [`PersistentKeyValueStore`] like any other mapping.

use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use super::{Transaction, TransactionChain, TransactionState};
use crate::codec::CompressionAlgorithm;
use crate::error::ChainError;
use crate::persistent::{PersistentKeyValueStore, PersistentStorage, Snapshot};

/// Storage slot holding every chain of a register.
pub type TransactionStorage = PersistentStorage<Snapshot<String, TransactionChain>>;

// == Transaction Register ==
/// Records the progress of operations and answers queries over it.
///
/// Changes stay in memory until [`TransactionRegister::synchronize`].
#[derive(Debug)]
pub struct TransactionRegister {
    chains: PersistentKeyValueStore<String, TransactionChain>,
}

impl TransactionRegister {
    pub fn new(storage: TransactionStorage) -> Self {
        Self {
            chains: PersistentKeyValueStore::new(storage),
        }
    }

    /// Register persisted to the file at `path`.
    pub fn file(path: impl Into<PathBuf>, compression: Option<CompressionAlgorithm>) -> Self {
        Self::new(PersistentStorage::file(path, compression))
    }

    // == Append ==
    /// Records `transaction`, starting a chain for an unknown id.
    ///
    /// # Errors
    /// Returns the [`ChainError`] of [`TransactionChain::append`] when the record
    /// does not extend its chain; the register is left unchanged.
    pub fn append(&mut self, transaction: Transaction) -> Result<(), ChainError> {
        let chain = match self.chains.get(transaction.id.as_str()) {
            Some(chain) => chain.append(&transaction)?,
            None => TransactionChain::new(transaction.clone()),
        };

        debug!(id = %transaction.id, state = ?transaction.state, "Recorded transaction");
        self.chains.set(transaction.id, Some(chain));
        Ok(())
    }

    // == Lookup ==
    /// Latest record of the operation `id`.
    pub fn get(&mut self, id: &str) -> Option<&Transaction> {
        self.chains.get(id).map(TransactionChain::transaction)
    }

    /// Any record, latest or not, with the given `uuid`.
    pub fn find(&mut self, uuid: Uuid) -> Option<&Transaction> {
        self.chains
            .iter()
            .flat_map(|(_, chain)| chain.transactions())
            .find(|transaction| transaction.uuid == uuid)
    }

    pub fn contains_id(&mut self, id: &str) -> bool {
        self.chains.contains_key(id)
    }

    /// Whether some operation currently is in `state`.
    pub fn contains_state(&mut self, state: TransactionState) -> bool {
        self.contains_any_state(&[state])
    }

    /// Whether some operation currently is in one of `states`.
    pub fn contains_any_state(&mut self, states: &[TransactionState]) -> bool {
        self.chains.iter().any(|(_, chain)| states.contains(&chain.state()))
    }

    pub fn len(&mut self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.chains.is_empty()
    }

    // == Removal ==
    /// Forgets every operation currently in `state`. Returns how many.
    pub fn remove_transactions(&mut self, state: TransactionState) -> usize {
        let ids: Vec<String> = self
            .chains
            .iter()
            .filter(|(_, chain)| chain.state() == state)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            self.chains.remove(id);
        }
        if !ids.is_empty() {
            debug!(removed = ids.len(), ?state, "Removed transactions");
        }
        ids.len()
    }

    pub fn remove_finished(&mut self) -> usize {
        self.remove_transactions(TransactionState::Finished)
    }

    pub fn remove_failed(&mut self) -> usize {
        self.remove_transactions(TransactionState::Failed)
    }

    // == Listing ==
    /// Latest record of every operation, oldest first.
    pub fn transactions(&mut self) -> Vec<Transaction> {
        self.latest_where(|_| true)
    }

    /// Latest record of every operation currently in one of `states`, oldest first.
    pub fn transactions_in(&mut self, states: &[TransactionState]) -> Vec<Transaction> {
        self.latest_where(|state| states.contains(&state))
    }

    /// Every record of every operation, oldest first.
    pub fn history(&mut self) -> Vec<Transaction> {
        let mut history: Vec<Transaction> = self
            .chains
            .iter()
            .flat_map(|(_, chain)| chain.transactions().iter().cloned())
            .collect();
        history.sort_by_key(|transaction| transaction.created);
        history
    }

    fn latest_where(&mut self, keep: impl Fn(TransactionState) -> bool) -> Vec<Transaction> {
        let mut latest: Vec<Transaction> = self
            .chains
            .iter()
            .filter(|(_, chain)| keep(chain.state()))
            .map(|(_, chain)| chain.transaction().clone())
            .collect();
        latest.sort_by_key(|transaction| transaction.created);
        latest
    }

    /// Writes the register if it changed. Returns whether storage is up to date.
    pub fn synchronize(&mut self) -> bool {
        self.chains.synchronize()
    }
}

//! Transaction Module
//!
//! Tracks multi-step operations as validated chains of state records, persisted
//! through the same key-value layer as the cache.

mod chain;
mod register;
#[allow(clippy::module_inception)]
mod transaction;

pub use chain::TransactionChain;
pub use register::{TransactionRegister, TransactionStorage};
pub use transaction::{Transaction, TransactionState};

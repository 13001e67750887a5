//! Error types for the cache stack
//!
//! Storage and codec failures are described by `StoreError`. They never leave the
//! persistent storage boundary: `PersistentStorage` logs them and reports a miss
//! or a failed write instead. `ChainError` is the only error callers see, and
//! only from the transaction register.

use thiserror::Error;

// == Store Error Enum ==
/// Failure raised by a byte storage backend, a codec or a compression transform.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading, writing or deleting the backing slot failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be turned into bytes
    #[error("Encode error: {0}")]
    Encode(String),

    /// The stored bytes could not be turned back into a value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Compressing or decompressing the encoded bytes failed
    #[error("Compression error: {0}")]
    Compression(String),
}

// == Chain Error Enum ==
/// Reasons a transaction cannot be appended to its chain.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    /// The transaction belongs to another chain
    #[error("transaction id does not match the chain id")]
    NotEqualId,

    /// The transaction was created before the chain's latest entry
    #[error("transaction is older than the latest entry in the chain")]
    IncorrectCreationTime,

    /// The transaction is identical to the chain's latest entry
    #[error("transaction duplicates the latest entry in the chain")]
    DuplicatedTransaction,

    /// The chain's latest state does not allow this transition
    #[error("invalid transaction state transition")]
    InvalidTransactionState,

    /// A decoded chain held no transactions
    #[error("transaction chain is empty")]
    EmptyChain,
}

// == Result Type Alias ==
/// Convenience Result type for storage and codec operations.
pub type Result<T> = std::result::Result<T, StoreError>;

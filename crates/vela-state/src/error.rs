use thiserror::Error;
use vela_storage::StorageError;
use vela_types::{Address, Signature, TypesError};

/// Errors that can occur applying blocks to the state.
///
/// Block application is transactional: an error means no write took place
/// and the store is unchanged.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Transaction {0} already included")]
    DuplicateTransaction(Signature),

    #[error("Block would leave account {address} with balance {balance}")]
    NegativeBalance { address: Address, balance: i128 },

    #[error("Block would overflow the balance of account {address}")]
    BalanceOverflow { address: Address },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] TypesError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Substrate failure: {0}")]
    Storage(#[from] StorageError),
}

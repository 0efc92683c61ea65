use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("Invalid public key length: expected {expected}, got {actual}")]
    InvalidPublicKeyLength { expected: usize, actual: usize },

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),

    #[error("Invalid fee: {0}")]
    InvalidFee(u64),

    #[error("Amount plus fee overflows the transfer range")]
    AmountOverflow,

    #[error("Invalid base58: {0}")]
    InvalidBase58(String),

    #[error("Bech32 error: {0}")]
    Bech32Error(String),
}

impl From<bs58::decode::Error> for TypesError {
    fn from(e: bs58::decode::Error) -> Self {
        TypesError::InvalidBase58(e.to_string())
    }
}

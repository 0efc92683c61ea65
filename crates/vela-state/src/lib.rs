//! Vela State - The account-balance state store.
//!
//! Maintains per-account balances across a linear chain of blocks over the
//! versioned substrate, with per-height change records enabling historical
//! balance queries and deterministic rollback to any prior height.

pub mod error;
pub mod records;
pub mod store;

pub use error::StateError;
pub use records::{AccountState, ChangeReason, ChangeRow};
pub use store::LedgerState;

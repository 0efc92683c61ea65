//! Vela Types - Core type definitions for the Vela blockchain.
//!
//! This crate provides the fundamental types used throughout the Vela node:
//! - Addresses (20-byte, Bech32m encoded)
//! - Ed25519 public keys and signatures (base58 encoded)
//! - Transactions (payment and genesis variants)

pub mod address;
pub mod error;
pub mod keys;
pub mod transaction;

mod serialization;

pub use address::{Address, ADDRESS_HRP, ADDRESS_LENGTH};
pub use error::TypesError;
pub use keys::{PublicKey, Signature};
pub use transaction::{GenesisTransaction, PaymentTransaction, Transaction};

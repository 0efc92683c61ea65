//! Vela Consensus - SPoS block metadata and fee distribution.
//!
//! SPoS (Supernode Proof-of-Stake) blocks carry a fixed-layout consensus
//! field binding the forger's stake proof: mint time, mint balance and the
//! generation signature. This crate owns that field's binary and JSON
//! encodings, the block structure sealed by it, and the consensus-defined
//! mapping from a block to the accounts credited with its fees.

pub mod block;
pub mod error;
pub mod fees;
pub mod spos;

pub use block::Block;
pub use error::ConsensusError;
pub use fees::{FeesDistribution, ForgerFees};
pub use spos::{SposData, GENERATION_SIGNATURE_LENGTH};

//! Vela Txpool - Transaction admission filter.
//!
//! The iterative validation pipeline that removes double-spends,
//! stale-timestamped transactions and over-draft senders from a candidate
//! set before block inclusion.

pub mod filter;

pub use filter::{filter_valid, TIMESTAMP_CHECK_EPOCH};

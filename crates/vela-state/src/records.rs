//! Persisted per-height change records.

use borsh::{BorshDeserialize, BorshSerialize};
use vela_types::Transaction;

/// An account's balance as of one height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AccountState {
    pub balance: u64,
}

/// Why an account's balance changed at a given height.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ChangeReason {
    /// Block fee credited by the consensus fee distribution
    FeeCredit(u64),
    /// A transaction the account took part in
    Transaction(Transaction),
}

/// The per-height record of an account's new balance, the reasons that
/// produced it, and a link to the previous height at which the account
/// changed (`0` when there is none). Written once on block apply, erased
/// on rollback past its height.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ChangeRow {
    pub state: AccountState,
    pub reasons: Vec<ChangeReason>,
    pub prev_height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_types::{Address, GenesisTransaction};

    #[test]
    fn test_change_row_borsh_roundtrip() {
        let row = ChangeRow {
            state: AccountState { balance: 1_000 },
            reasons: vec![
                ChangeReason::Transaction(Transaction::Genesis(GenesisTransaction::new(
                    Address::from_bytes([1u8; 20]),
                    1_000,
                    0,
                ))),
                ChangeReason::FeeCredit(25),
            ],
            prev_height: 7,
        };

        let encoded = borsh::to_vec(&row).unwrap();
        let decoded: ChangeRow = borsh::from_slice(&encoded).unwrap();
        assert_eq!(row, decoded);
    }
}

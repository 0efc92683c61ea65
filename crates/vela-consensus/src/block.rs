use crate::spos::{SposData, GENERATION_SIGNATURE_LENGTH};
use vela_types::{Address, GenesisTransaction, PublicKey, Transaction};

/// A set of transactions sealed with an SPoS consensus field, applied
/// atomically to the ledger state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Stake-proof metadata bound to the forger at block-build time
    pub consensus: SposData,
    /// The forger's public key
    pub generator: PublicKey,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(consensus: SposData, generator: PublicKey, transactions: Vec<Transaction>) -> Self {
        Self {
            consensus,
            generator,
            transactions,
        }
    }

    /// The forger's account address.
    pub fn generator_address(&self) -> Address {
        self.generator.to_address()
    }

    /// Sum of all transaction fees in this block.
    pub fn total_fee(&self) -> u64 {
        self.transactions
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.fee()))
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Build the first block of a chain from an allocation list.
    ///
    /// The genesis block carries no stake proof: mint balance and the
    /// generation signature are zeroed, and the generator key is zero.
    pub fn genesis(allocations: &[(Address, u64)], timestamp: u64) -> Self {
        let transactions = allocations
            .iter()
            .map(|(recipient, amount)| {
                Transaction::Genesis(GenesisTransaction::new(*recipient, *amount, timestamp))
            })
            .collect();

        Self {
            consensus: SposData::new(timestamp, 0, vec![0u8; GENERATION_SIGNATURE_LENGTH]),
            generator: PublicKey::default(),
            transactions,
        }
    }
}

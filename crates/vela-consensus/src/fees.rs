use crate::block::Block;
use std::collections::BTreeMap;
use vela_types::Address;

/// Consensus-defined mapping from a block to the accounts credited with
/// its fees. Injected into block application so the ledger core stays
/// independent of the consensus flavor.
pub trait FeesDistribution {
    fn fees(&self, block: &Block) -> BTreeMap<Address, u64>;
}

/// The SPoS distribution: the whole fee goes to the block's forger.
/// A fee-free block distributes nothing.
pub struct ForgerFees;

impl FeesDistribution for ForgerFees {
    fn fees(&self, block: &Block) -> BTreeMap<Address, u64> {
        let mut distribution = BTreeMap::new();
        let total = block.total_fee();
        if total > 0 {
            distribution.insert(block.generator_address(), total);
        }
        distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spos::{SposData, GENERATION_SIGNATURE_LENGTH};
    use vela_types::{PaymentTransaction, PublicKey, Transaction};

    #[test]
    fn test_forger_receives_block_fees() {
        let key = ed25519_dalek::SigningKey::from_bytes(&[1u8; 32]);
        let generator = PublicKey::from_bytes([3u8; 32]);
        let block = Block::new(
            SposData::new(1, 2, vec![0u8; GENERATION_SIGNATURE_LENGTH]),
            generator,
            vec![
                Transaction::Payment(PaymentTransaction::sign(
                    &key,
                    Address::from_bytes([2u8; 20]),
                    100,
                    7,
                    10,
                )),
                Transaction::Payment(PaymentTransaction::sign(
                    &key,
                    Address::from_bytes([2u8; 20]),
                    50,
                    3,
                    11,
                )),
            ],
        );

        let dist = ForgerFees.fees(&block);
        assert_eq!(dist.len(), 1);
        assert_eq!(dist.get(&generator.to_address()), Some(&10));
    }

    #[test]
    fn test_fee_free_block_distributes_nothing() {
        let block = Block::genesis(&[(Address::from_bytes([1u8; 20]), 100)], 0);
        assert!(ForgerFees.fees(&block).is_empty());
    }
}

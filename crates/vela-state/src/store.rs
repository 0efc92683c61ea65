//! The ledger state store.
//!
//! Four logical maps over the substrate: `last-states` (address to latest
//! change height), `included-tx` (transaction signature to inclusion
//! height), `height` (the state height), and one map per observed address
//! holding its borsh-encoded change rows keyed by height.
//!
//! All writes run under a single writer lock and commit as one substrate
//! transaction. Readers share the read guard and see a coherent snapshot.

use crate::error::StateError;
use crate::records::{AccountState, ChangeReason, ChangeRow};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};
use vela_consensus::{Block, FeesDistribution};
use vela_storage::{MapRef, StorageError, VersionedDb};
use vela_types::{Address, PaymentTransaction, Signature, Transaction};

const LAST_STATES_MAP: &str = "last-states";
const INCLUDED_TX_MAP: &str = "included-tx";
const HEIGHT_MAP: &str = "height";
const HEIGHT_KEY: &[u8] = b"height";

fn account_map_name(addr: &Address) -> String {
    format!("acct-{}", addr)
}

fn encode_height(height: u32) -> [u8; 4] {
    height.to_be_bytes()
}

fn decode_height(map: &str, raw: &[u8]) -> Result<u32, StorageError> {
    let bytes: [u8; 4] = raw.try_into().map_err(|_| StorageError::Corrupted {
        map: map.to_string(),
        detail: format!("height record of {} bytes", raw.len()),
    })?;
    Ok(u32::from_be_bytes(bytes))
}

/// The account-balance database of the node. Exclusively owns the
/// substrate handle; all maps are derived from it.
pub struct LedgerState {
    inner: RwLock<StateInner>,
}

struct StateInner {
    db: VersionedDb,
    last_states: MapRef,
    included_tx: MapRef,
    meta: MapRef,
    /// Lazily opened per-address map handles
    account_maps: HashMap<Address, MapRef>,
}

impl StateInner {
    fn account_map(&self, addr: &Address) -> Result<MapRef, StorageError> {
        match self.account_maps.get(addr) {
            Some(map) => Ok(map.clone()),
            None => self.db.map(&account_map_name(addr)),
        }
    }

    fn open_account_map(&mut self, addr: &Address) -> Result<MapRef, StorageError> {
        if let Some(map) = self.account_maps.get(addr) {
            return Ok(map.clone());
        }
        let map = self.db.map(&account_map_name(addr))?;
        self.account_maps.insert(*addr, map.clone());
        Ok(map)
    }

    fn height(&self) -> Result<u32, StateError> {
        match self.db.get(&self.meta, HEIGHT_KEY)? {
            Some(raw) => Ok(decode_height(HEIGHT_MAP, &raw)?),
            None => Ok(0),
        }
    }

    fn last_state_height(&self, addr: &Address) -> Result<u32, StateError> {
        match self.db.get(&self.last_states, addr.as_bytes())? {
            Some(raw) => Ok(decode_height(LAST_STATES_MAP, &raw)?),
            None => Ok(0),
        }
    }

    fn load_row(&self, addr: &Address, height: u32) -> Result<Option<ChangeRow>, StateError> {
        let map = self.account_map(addr)?;
        match self.db.get(&map, &encode_height(height))? {
            Some(raw) => {
                let row = borsh::from_slice(&raw).map_err(|e| StorageError::Corrupted {
                    map: account_map_name(addr),
                    detail: e.to_string(),
                })?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn require_row(&self, addr: &Address, height: u32) -> Result<ChangeRow, StateError> {
        self.load_row(addr, height)?
            .ok_or_else(|| {
                StateError::Storage(StorageError::Corrupted {
                    map: account_map_name(addr),
                    detail: format!("missing change row at height {}", height),
                })
            })
    }

    fn included_height(&self, signature: &Signature) -> Result<Option<u32>, StateError> {
        match self.db.get(&self.included_tx, signature.as_bytes())? {
            Some(raw) => Ok(Some(decode_height(INCLUDED_TX_MAP, &raw)?)),
            None => Ok(None),
        }
    }

    /// The balance as of the latest change row, without the confirmation
    /// minimum.
    fn current_balance(&self, addr: &Address) -> Result<u64, StateError> {
        let height = self.last_state_height(addr)?;
        if height == 0 {
            return Ok(0);
        }
        Ok(self.require_row(addr, height)?.state.balance)
    }

    /// The effective balance at `at_height`: the minimum of `balance` over
    /// the rows from the latest down to and including the first row at or
    /// below `at_height`. Funds received inside the unconfirmed window are
    /// not yet spendable, hence the minimum.
    fn effective_balance(&self, addr: &Address, at_height: u32) -> Result<u64, StateError> {
        let mut height = self.last_state_height(addr)?;
        if height == 0 {
            return Ok(0);
        }

        let mut minimum = u64::MAX;
        loop {
            let row = self.require_row(addr, height)?;
            minimum = minimum.min(row.state.balance);
            if height <= at_height {
                return Ok(minimum);
            }
            if row.prev_height == 0 {
                // the account did not exist at `at_height`
                return Ok(0);
            }
            height = row.prev_height;
        }
    }

    fn transactions_of(&self, addr: &Address) -> Result<Vec<Transaction>, StateError> {
        let mut seen: HashSet<Signature> = HashSet::new();
        let mut transactions = Vec::new();

        let mut height = self.last_state_height(addr)?;
        while height > 0 {
            let row = self.require_row(addr, height)?;
            for reason in &row.reasons {
                if let ChangeReason::Transaction(tx) = reason {
                    if seen.insert(*tx.signature()) {
                        transactions.push(tx.clone());
                    }
                }
            }
            height = row.prev_height;
        }

        Ok(transactions)
    }

    /// The most recent payment *sent* by `addr` (not merely received):
    /// walking backward row by row, the first row containing such a payment
    /// yields the one with the greatest timestamp.
    fn last_sent_by(&self, addr: &Address) -> Result<Option<PaymentTransaction>, StateError> {
        let mut height = self.last_state_height(addr)?;
        while height > 0 {
            let row = self.require_row(addr, height)?;

            let mut best: Option<&PaymentTransaction> = None;
            for reason in &row.reasons {
                if let ChangeReason::Transaction(Transaction::Payment(payment)) = reason {
                    if payment.sender_address() != *addr {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some(current) => {
                            (payment.timestamp, payment.signature.as_bytes())
                                > (current.timestamp, current.signature.as_bytes())
                        }
                    };
                    if better {
                        best = Some(payment);
                    }
                }
            }
            if let Some(payment) = best {
                return Ok(Some(payment.clone()));
            }

            height = row.prev_height;
        }
        Ok(None)
    }

    /// Non-zero balances ordered by address text form.
    fn non_zero_balances(&self) -> Result<BTreeMap<String, u64>, StateError> {
        let mut balances = BTreeMap::new();
        for raw in self.db.keys(&self.last_states)? {
            let addr = Address::from_slice(&raw).map_err(|_| StorageError::Corrupted {
                map: LAST_STATES_MAP.to_string(),
                detail: format!("address key of {} bytes", raw.len()),
            })?;
            let balance = self.current_balance(&addr)?;
            if balance > 0 {
                balances.insert(addr.to_string(), balance);
            }
        }
        Ok(balances)
    }

    fn set_height(&mut self, height: u32) {
        let meta = self.meta.clone();
        self.db.put(&meta, HEIGHT_KEY, encode_height(height).to_vec());
    }

    /// Stage and commit one applied block: the new height, one change row
    /// per touched account, the updated latest-change index and the
    /// inclusion index.
    fn write_block(
        &mut self,
        new_height: u32,
        new_balances: &BTreeMap<Address, (i128, Vec<ChangeReason>)>,
    ) -> Result<(), StateError> {
        self.set_height(new_height);
        let last_states = self.last_states.clone();
        let included_tx = self.included_tx.clone();

        for (addr, (balance, reasons)) in new_balances {
            let prev_height = self.last_state_height(addr)?;
            let row = ChangeRow {
                state: AccountState {
                    balance: *balance as u64,
                },
                reasons: reasons.clone(),
                prev_height,
            };
            let encoded = borsh::to_vec(&row).map_err(|e| StateError::Serialization(e.to_string()))?;

            let map = self.open_account_map(addr)?;
            self.db.put(&map, &encode_height(new_height), encoded);
            self.db
                .put(&last_states, addr.as_bytes(), encode_height(new_height).to_vec());

            for reason in reasons {
                if let ChangeReason::Transaction(tx) = reason {
                    self.db.put(
                        &included_tx,
                        tx.signature().as_bytes(),
                        encode_height(new_height).to_vec(),
                    );
                }
            }
        }

        self.db.commit()?;
        Ok(())
    }

    /// Stage and commit the rewind of every account to `target`.
    fn unwind_to(&mut self, target: u32) -> Result<(), StateError> {
        let last_states = self.last_states.clone();
        let included_tx = self.included_tx.clone();

        for raw in self.db.keys(&last_states)? {
            let addr = Address::from_slice(&raw).map_err(|_| StorageError::Corrupted {
                map: LAST_STATES_MAP.to_string(),
                detail: format!("address key of {} bytes", raw.len()),
            })?;

            let mut height = self.last_state_height(&addr)?;
            if height <= target {
                continue;
            }

            let map = self.open_account_map(&addr)?;
            while height > target {
                let row = self.require_row(&addr, height)?;
                for reason in &row.reasons {
                    if let ChangeReason::Transaction(tx) = reason {
                        self.db.remove(&included_tx, tx.signature().as_bytes());
                    }
                }
                self.db.remove(&map, &encode_height(height));
                height = row.prev_height;
            }

            if height == 0 {
                self.db.remove(&last_states, addr.as_bytes());
            } else {
                self.db
                    .put(&last_states, addr.as_bytes(), encode_height(height).to_vec());
            }
        }

        self.set_height(target);
        self.db.commit()?;
        Ok(())
    }
}

impl LedgerState {
    /// Open the state store over the given substrate handle.
    pub fn open(db: VersionedDb) -> Result<Self, StateError> {
        let last_states = db.map(LAST_STATES_MAP)?;
        let included_tx = db.map(INCLUDED_TX_MAP)?;
        let meta = db.map(HEIGHT_MAP)?;

        let state = Self {
            inner: RwLock::new(StateInner {
                db,
                last_states,
                included_tx,
                meta,
                account_maps: HashMap::new(),
            }),
        };
        info!(height = state.state_height()?, "ledger state opened");
        Ok(state)
    }

    /// Number of applied blocks.
    pub fn state_height(&self) -> Result<u32, StateError> {
        self.inner.read().height()
    }

    /// Commit counter of the underlying substrate.
    pub fn store_version(&self) -> u64 {
        self.inner.read().db.store_version()
    }

    /// Balance at the current height.
    pub fn balance(&self, addr: &Address) -> Result<u64, StateError> {
        let inner = self.inner.read();
        let height = inner.height()?;
        inner.effective_balance(addr, height)
    }

    /// Effective balance at `at_height` (historical minimum semantics).
    pub fn balance_at(&self, addr: &Address, at_height: u32) -> Result<u64, StateError> {
        self.inner.read().effective_balance(addr, at_height)
    }

    /// Balance spendable with `confirmations` confirmations at `height`
    /// (current height when `None`).
    pub fn balance_with_confirmations(
        &self,
        addr: &Address,
        confirmations: u32,
        height: Option<u32>,
    ) -> Result<u64, StateError> {
        let inner = self.inner.read();
        let reference = match height {
            Some(h) => h,
            None => inner.height()?,
        };
        let at_height = reference.saturating_sub(confirmations).max(1);
        inner.effective_balance(addr, at_height)
    }

    /// All transactions an account took part in, newest first,
    /// deduplicated by signature.
    pub fn account_transactions(&self, addr: &Address) -> Result<Vec<Transaction>, StateError> {
        self.inner.read().transactions_of(addr)
    }

    /// The most recent payment sent by `addr`, if any.
    pub fn last_transaction_of(
        &self,
        addr: &Address,
    ) -> Result<Option<PaymentTransaction>, StateError> {
        self.inner.read().last_sent_by(addr)
    }

    /// The height a transaction was included at, if it was and that height
    /// is below `before`.
    pub fn included(
        &self,
        signature: &Signature,
        before: Option<u32>,
    ) -> Result<Option<u32>, StateError> {
        let height = self.inner.read().included_height(signature)?;
        Ok(height.filter(|h| match before {
            Some(bound) => *h < bound,
            None => true,
        }))
    }

    /// Apply a block: distribute fees, fold transaction deltas, enforce
    /// non-negative balances and commit atomically. On error the store is
    /// unchanged.
    pub fn process_block(
        &self,
        block: &Block,
        fees: &dyn FeesDistribution,
    ) -> Result<(), StateError> {
        let mut inner = self.inner.write();

        for tx in &block.transactions {
            if inner.included_height(tx.signature())?.is_some() {
                return Err(StateError::DuplicateTransaction(*tx.signature()));
            }
            tx.verify()?;
        }

        // Fold fee credits and transaction deltas into the new balances,
        // each account seeded from its current balance.
        let mut new_balances: BTreeMap<Address, (i128, Vec<ChangeReason>)> = BTreeMap::new();

        for (addr, amount) in fees.fees(block) {
            let base = inner.current_balance(&addr)? as i128;
            let entry = new_balances.entry(addr).or_insert((base, Vec::new()));
            entry.0 += amount as i128;
            entry.1.push(ChangeReason::FeeCredit(amount));
        }

        for tx in &block.transactions {
            for (addr, delta) in tx.balance_changes() {
                let base = inner.current_balance(&addr)? as i128;
                let entry = new_balances.entry(addr).or_insert((base, Vec::new()));
                entry.0 += delta as i128;
                entry.1.insert(0, ChangeReason::Transaction(tx.clone()));
            }
        }

        for (addr, (balance, _)) in &new_balances {
            if *balance < 0 {
                return Err(StateError::NegativeBalance {
                    address: *addr,
                    balance: *balance,
                });
            }
            if *balance > u64::MAX as i128 {
                return Err(StateError::BalanceOverflow { address: *addr });
            }
        }

        let new_height = inner.height()? + 1;
        match inner.write_block(new_height, &new_balances) {
            Ok(()) => {
                info!(
                    height = new_height,
                    transactions = block.transactions.len(),
                    accounts = new_balances.len(),
                    "block applied"
                );
                Ok(())
            }
            Err(e) => {
                inner.db.rollback();
                Err(e)
            }
        }
    }

    /// Rewind the state to the exact snapshot that existed at `target`.
    /// A no-op when `target` is at or above the current height.
    pub fn rollback_to(&self, target: u32) -> Result<(), StateError> {
        let mut inner = self.inner.write();
        let current = inner.height()?;
        if target >= current {
            debug!(target, current, "rollback target at or above current height");
            return Ok(());
        }

        match inner.unwind_to(target) {
            Ok(()) => {
                info!(from = current, to = target, "state rolled back");
                Ok(())
            }
            Err(e) => {
                inner.db.rollback();
                Err(e)
            }
        }
    }

    /// Coarse checksum of the textual dump of non-zero balances.
    /// For logging only; not a consensus hash.
    pub fn state_hash(&self) -> Result<u64, StateError> {
        let balances = self.inner.read().non_zero_balances()?;
        let mut hasher = blake3::Hasher::new();
        for (addr, balance) in &balances {
            hasher.update(addr.as_bytes());
            hasher.update(b":");
            hasher.update(&balance.to_be_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        Ok(u64::from_be_bytes(word))
    }

    /// Dump of non-zero balances as a JSON object.
    pub fn to_json(&self) -> Result<serde_json::Value, StateError> {
        let balances = self.inner.read().non_zero_balances()?;
        let mut object = serde_json::Map::new();
        for (addr, balance) in balances {
            object.insert(addr, serde_json::Value::from(balance));
        }
        Ok(serde_json::Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vela_consensus::{ForgerFees, SposData, GENERATION_SIGNATURE_LENGTH};
    use vela_types::PublicKey;

    fn signing_key(seed: u8) -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&[seed; 32])
    }

    fn address_of(key: &ed25519_dalek::SigningKey) -> Address {
        PublicKey::from_bytes(key.verifying_key().to_bytes()).to_address()
    }

    fn forged_block(forger: &ed25519_dalek::SigningKey, transactions: Vec<Transaction>) -> Block {
        Block::new(
            SposData::new(0, 0, vec![0u8; GENERATION_SIGNATURE_LENGTH]),
            PublicKey::from_bytes(forger.verifying_key().to_bytes()),
            transactions,
        )
    }

    fn payment(
        sender: &ed25519_dalek::SigningKey,
        recipient: Address,
        amount: u64,
        fee: u64,
        timestamp: u64,
    ) -> Transaction {
        Transaction::Payment(PaymentTransaction::sign(
            sender, recipient, amount, fee, timestamp,
        ))
    }

    fn temp_ledger() -> (LedgerState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = VersionedDb::open(dir.path()).unwrap();
        (LedgerState::open(db).unwrap(), dir)
    }

    #[test]
    fn test_empty_store() {
        let (state, _dir) = temp_ledger();
        let anyone = Address::from_bytes([9u8; 20]);

        assert_eq!(state.state_height().unwrap(), 0);
        assert_eq!(state.balance(&anyone).unwrap(), 0);
        assert!(state.account_transactions(&anyone).unwrap().is_empty());
        assert!(state.last_transaction_of(&anyone).unwrap().is_none());
    }

    #[test]
    fn test_genesis_and_one_payment() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();
        assert_eq!(state.state_height().unwrap(), 1);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 1_000);

        let tx = payment(&alice, bob, 100, 10, 1_000);
        let sig = *tx.signature();
        state
            .process_block(&forged_block(&forger, vec![tx]), &ForgerFees)
            .unwrap();

        assert_eq!(state.state_height().unwrap(), 2);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 890);
        assert_eq!(state.balance(&bob).unwrap(), 100);
        assert_eq!(state.balance(&address_of(&forger)).unwrap(), 10);
        assert_eq!(state.included(&sig, None).unwrap(), Some(2));
        assert_eq!(state.included(&sig, Some(2)).unwrap(), None);
        assert_eq!(state.included(&sig, Some(3)).unwrap(), Some(2));
    }

    #[test]
    fn test_rollback_restores_previous_snapshot() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();

        let before_json = state.to_json().unwrap();
        let before_hash = state.state_hash().unwrap();

        let tx = payment(&alice, bob, 100, 10, 1_000);
        let sig = *tx.signature();
        state
            .process_block(&forged_block(&forger, vec![tx]), &ForgerFees)
            .unwrap();

        state.rollback_to(1).unwrap();

        assert_eq!(state.state_height().unwrap(), 1);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 1_000);
        assert_eq!(state.balance(&bob).unwrap(), 0);
        assert_eq!(state.balance(&address_of(&forger)).unwrap(), 0);
        assert_eq!(state.included(&sig, None).unwrap(), None);
        assert_eq!(state.to_json().unwrap(), before_json);
        assert_eq!(state.state_hash().unwrap(), before_hash);
        assert!(state.account_transactions(&bob).unwrap().is_empty());
    }

    #[test]
    fn test_rollback_is_idempotent_at_or_above_height() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();

        state.rollback_to(1).unwrap();
        state.rollback_to(5).unwrap();

        assert_eq!(state.state_height().unwrap(), 1);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 1_000);
    }

    #[test]
    fn test_overdrafting_block_is_rejected_unchanged() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 50)], 0), &ForgerFees)
            .unwrap();

        let block = forged_block(
            &forger,
            vec![
                payment(&alice, bob, 40, 5, 1_000),
                payment(&alice, bob, 30, 5, 1_001),
            ],
        );

        let err = state.process_block(&block, &ForgerFees).unwrap_err();
        assert!(matches!(
            err,
            StateError::NegativeBalance { address, balance: -30 } if address == address_of(&alice)
        ));

        assert_eq!(state.state_height().unwrap(), 1);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 50);
        assert_eq!(state.balance(&bob).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_transaction_is_rejected() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();

        let tx = payment(&alice, bob, 100, 10, 1_000);
        state
            .process_block(&forged_block(&forger, vec![tx.clone()]), &ForgerFees)
            .unwrap();

        let err = state
            .process_block(&forged_block(&forger, vec![tx.clone()]), &ForgerFees)
            .unwrap_err();
        assert!(matches!(err, StateError::DuplicateTransaction(sig) if sig == *tx.signature()));
        assert_eq!(state.state_height().unwrap(), 2);
    }

    #[test]
    fn test_invalid_transaction_in_block_is_rejected() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();

        let mut tx = PaymentTransaction::sign(&alice, bob, 100, 10, 1_000);
        tx.amount = 200; // breaks the signature
        let err = state
            .process_block(
                &forged_block(&forger, vec![Transaction::Payment(tx)]),
                &ForgerFees,
            )
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidTransaction(_)));
        assert_eq!(state.state_height().unwrap(), 1);
    }

    #[test]
    fn test_confirmation_window() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();
        state
            .process_block(
                &forged_block(&forger, vec![payment(&alice, bob, 100, 10, 1_000)]),
                &ForgerFees,
            )
            .unwrap();
        for _ in 0..5 {
            state
                .process_block(&forged_block(&forger, vec![]), &ForgerFees)
                .unwrap();
        }

        assert_eq!(state.state_height().unwrap(), 7);
        assert_eq!(state.balance(&bob).unwrap(), 100);
        // the receiving row has persisted 5 blocks, more than 3 confirmations
        assert_eq!(
            state.balance_with_confirmations(&bob, 3, None).unwrap(),
            100
        );
        // before the funds arrived the historical minimum was zero
        assert_eq!(state.balance_with_confirmations(&bob, 10, None).unwrap(), 0);
    }

    #[test]
    fn test_effective_balance_tracks_historical_minimum() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();
        // h2: alice spends down to 450
        state
            .process_block(
                &forged_block(&forger, vec![payment(&alice, bob, 500, 50, 1_000)]),
                &ForgerFees,
            )
            .unwrap();
        // h3: alice receives 300 back
        let bob_key = signing_key(2);
        state
            .process_block(
                &forged_block(
                    &forger,
                    vec![payment(&bob_key, address_of(&alice), 300, 10, 2_000)],
                ),
                &ForgerFees,
            )
            .unwrap();

        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 750);
        // at height 2 the minimum over [h3: 750, h2: 450] is 450
        assert_eq!(state.balance_at(&address_of(&alice), 2).unwrap(), 450);
        // at height 1 the minimum includes the genesis row as well
        assert_eq!(state.balance_at(&address_of(&alice), 1).unwrap(), 450);
    }

    #[test]
    fn test_account_transactions_walks_all_rows() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();
        let first = payment(&alice, bob, 100, 10, 1_000);
        let second = payment(&alice, bob, 50, 10, 2_000);
        state
            .process_block(&forged_block(&forger, vec![first.clone()]), &ForgerFees)
            .unwrap();
        state
            .process_block(&forged_block(&forger, vec![second.clone()]), &ForgerFees)
            .unwrap();

        let txs = state.account_transactions(&address_of(&alice)).unwrap();
        assert_eq!(txs.len(), 3); // two payments plus the genesis grant
        assert_eq!(txs[0], second);
        assert_eq!(txs[1], first);

        let bob_txs = state.account_transactions(&bob).unwrap();
        assert_eq!(bob_txs, vec![second, first]);
    }

    #[test]
    fn test_last_transaction_of_only_counts_sent() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);
        let forger = signing_key(7);
        let bob = address_of(&signing_key(2));

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();
        assert!(state
            .last_transaction_of(&address_of(&alice))
            .unwrap()
            .is_none());

        state
            .process_block(
                &forged_block(&forger, vec![payment(&alice, bob, 100, 10, 1_000)]),
                &ForgerFees,
            )
            .unwrap();
        state
            .process_block(
                &forged_block(&forger, vec![payment(&alice, bob, 50, 10, 2_000)]),
                &ForgerFees,
            )
            .unwrap();

        let last = state
            .last_transaction_of(&address_of(&alice))
            .unwrap()
            .unwrap();
        assert_eq!(last.timestamp, 2_000);

        // bob only ever received
        assert!(state.last_transaction_of(&bob).unwrap().is_none());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let alice = signing_key(1);

        {
            let db = VersionedDb::open(dir.path()).unwrap();
            let state = LedgerState::open(db).unwrap();
            state
                .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
                .unwrap();
        }

        let db = VersionedDb::open(dir.path()).unwrap();
        let state = LedgerState::open(db).unwrap();
        assert_eq!(state.state_height().unwrap(), 1);
        assert_eq!(state.balance(&address_of(&alice)).unwrap(), 1_000);
    }

    #[test]
    fn test_to_json_dumps_non_zero_balances() {
        let (state, _dir) = temp_ledger();
        let alice = signing_key(1);

        state
            .process_block(&Block::genesis(&[(address_of(&alice), 1_000)], 0), &ForgerFees)
            .unwrap();

        let json = state.to_json().unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(
            object.get(&address_of(&alice).to_string()),
            Some(&serde_json::Value::from(1_000u64))
        );
    }
}

//! The admission filter pipeline.
//!
//! Three passes iterate to a fixed point over the candidate set:
//! structural validity, within-batch per-sender timestamp monotonicity,
//! and greedy overdraft elimination. Deterministic over its inputs: all
//! sorts are stable with (timestamp, signature) tie-breaking, so two
//! honest nodes admit the same set.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;
use vela_state::LedgerState;
use vela_types::{Address, PaymentTransaction, Signature, Transaction};

/// Hard-fork activation point (milliseconds since epoch). Payments
/// timestamped before it are exempt from the per-sender timestamp check.
pub const TIMESTAMP_CHECK_EPOCH: u64 = 1_474_035_253_835;

/// Return the subset of `candidates` admissible against the state snapshot
/// at `height` (current height when `None`). Never errors; a substrate
/// failure conservatively drops the affected transaction. Input order is
/// preserved.
pub fn filter_valid(
    state: &LedgerState,
    candidates: &[Transaction],
    height: Option<u32>,
) -> Vec<Transaction> {
    let at_height = match height {
        Some(h) => h,
        None => state.state_height().unwrap_or(0),
    };

    let mut survivors: Vec<Transaction> = candidates.to_vec();
    // Each round either reaches the fixed point or strictly shrinks the
    // set, so the candidate count bounds the iterations.
    for _ in 0..=candidates.len() {
        let structural = pass_structural(state, survivors, at_height);
        let monotonic = pass_monotonic(state, structural);
        let solvent = pass_overdraft(state, monotonic.clone(), at_height);
        if solvent.len() == monotonic.len() {
            debug!(
                candidates = candidates.len(),
                admitted = solvent.len(),
                "admission filter settled"
            );
            return solvent;
        }
        survivors = solvent;
    }
    survivors
}

/// Pass A: drop already-included and structurally invalid transactions.
fn pass_structural(
    state: &LedgerState,
    transactions: Vec<Transaction>,
    at_height: u32,
) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter(|tx| {
            match state.included(tx.signature(), None) {
                Ok(None) => {}
                // already included, or the substrate failed: drop
                _ => return false,
            }
            match tx {
                Transaction::Payment(payment) => {
                    payment.verify().is_ok() && timestamp_correct(state, payment)
                }
                Transaction::Genesis(genesis) => at_height == 0 && genesis.verify().is_ok(),
            }
        })
        .collect()
}

/// A payment's timestamp is correct when it predates the fork activation,
/// or strictly exceeds the sender's last committed payment.
fn timestamp_correct(state: &LedgerState, payment: &PaymentTransaction) -> bool {
    if payment.timestamp < TIMESTAMP_CHECK_EPOCH {
        return true;
    }
    match state.last_transaction_of(&payment.sender_address()) {
        Ok(None) => true,
        Ok(Some(last)) => last.timestamp < payment.timestamp,
        Err(_) => false,
    }
}

/// Pass B: scanning payments in ascending timestamp order, each sender's
/// timestamps must strictly increase within the batch, seeded from the
/// sender's last committed payment.
fn pass_monotonic(state: &LedgerState, transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut order: Vec<&PaymentTransaction> = transactions
        .iter()
        .filter_map(|tx| match tx {
            Transaction::Payment(payment) => Some(payment),
            Transaction::Genesis(_) => None,
        })
        .collect();
    order.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.signature.as_bytes().cmp(b.signature.as_bytes()))
    });

    let mut latest: HashMap<Address, u64> = HashMap::new();
    let mut rejected: HashSet<Signature> = HashSet::new();

    for payment in order {
        let sender = payment.sender_address();
        if !latest.contains_key(&sender) {
            let seed = state
                .last_transaction_of(&sender)
                .ok()
                .flatten()
                .map(|last| last.timestamp)
                .unwrap_or(0);
            latest.insert(sender, seed);
        }
        let seen = latest[&sender];
        if payment.timestamp > seen {
            latest.insert(sender, payment.timestamp);
        } else {
            rejected.insert(payment.signature);
        }
    }

    transactions
        .into_iter()
        .filter(|tx| !rejected.contains(tx.signature()))
        .collect()
}

/// Pass C: aggregate the balance deltas of the surviving set; for every
/// account driven negative, remove that sender's payments largest-amount
/// first while the running balance stays negative, each removal restoring
/// `amount + fee`. Greedily drops the fewest transactions that make the
/// set solvent.
fn pass_overdraft(
    state: &LedgerState,
    transactions: Vec<Transaction>,
    at_height: u32,
) -> Vec<Transaction> {
    let mut balances: BTreeMap<Address, i128> = BTreeMap::new();
    for tx in &transactions {
        for (addr, delta) in tx.balance_changes() {
            let entry = balances
                .entry(addr)
                .or_insert_with(|| state.balance_at(&addr, at_height).unwrap_or(0) as i128);
            *entry += delta as i128;
        }
    }

    let mut removed: HashSet<Signature> = HashSet::new();
    for (addr, balance) in &balances {
        if *balance >= 0 {
            continue;
        }

        let mut spenders: Vec<&PaymentTransaction> = transactions
            .iter()
            .filter_map(|tx| match tx {
                Transaction::Payment(payment) if payment.sender_address() == *addr => {
                    Some(payment)
                }
                _ => None,
            })
            .collect();
        spenders.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
                .then_with(|| a.signature.as_bytes().cmp(b.signature.as_bytes()))
        });

        let mut running = *balance;
        for payment in spenders {
            if running >= 0 {
                break;
            }
            running += payment.amount as i128 + payment.fee as i128;
            removed.insert(payment.signature);
        }
    }

    transactions
        .into_iter()
        .filter(|tx| !removed.contains(tx.signature()))
        .collect()
}

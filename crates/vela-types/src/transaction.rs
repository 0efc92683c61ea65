use crate::address::Address;
use crate::error::TypesError;
use crate::keys::{PublicKey, Signature};
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;

/// Upper bound on the funds a single transaction may move (`amount + fee`
/// for payments, the granted amount for genesis). Keeps every balance
/// delta representable as a signed 64-bit integer.
pub const MAX_TRANSFER: u64 = i64::MAX as u64;

/// A signed transfer of funds between two accounts.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PaymentTransaction {
    /// Sender's ed25519 public key
    pub sender: PublicKey,
    /// Recipient address
    pub recipient: Address,
    /// Transferred amount
    pub amount: u64,
    /// Fee credited to the block forger
    pub fee: u64,
    /// Sender-assigned timestamp (milliseconds since epoch)
    pub timestamp: u64,
    /// Ed25519 signature over [`PaymentTransaction::signed_bytes`]
    pub signature: Signature,
}

impl PaymentTransaction {
    /// Create and sign a payment with the given key.
    pub fn sign(
        key: &ed25519_dalek::SigningKey,
        recipient: Address,
        amount: u64,
        fee: u64,
        timestamp: u64,
    ) -> Self {
        use ed25519_dalek::Signer;

        let sender = PublicKey::from_bytes(key.verifying_key().to_bytes());
        let mut tx = Self {
            sender,
            recipient,
            amount,
            fee,
            timestamp,
            signature: Signature::default(),
        };
        tx.signature = Signature::from_bytes(key.sign(&tx.signed_bytes()).to_bytes());
        tx
    }

    /// The byte string covered by the signature:
    /// sender key, recipient, amount, fee and timestamp (big-endian).
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + 20 + 8 + 8 + 8);
        data.extend_from_slice(self.sender.as_bytes());
        data.extend_from_slice(self.recipient.as_bytes());
        data.extend_from_slice(&self.amount.to_be_bytes());
        data.extend_from_slice(&self.fee.to_be_bytes());
        data.extend_from_slice(&self.timestamp.to_be_bytes());
        data
    }

    /// Sender's account address.
    pub fn sender_address(&self) -> Address {
        self.sender.to_address()
    }

    /// Full cost to the sender.
    pub fn total_cost(&self) -> u64 {
        self.amount.saturating_add(self.fee)
    }

    /// Structural self-validation: positive amount and fee, transfer within
    /// the signed-delta range, and a valid signature.
    pub fn verify(&self) -> Result<(), TypesError> {
        if self.amount == 0 {
            return Err(TypesError::InvalidAmount(self.amount));
        }
        if self.fee == 0 {
            return Err(TypesError::InvalidFee(self.fee));
        }
        match self.amount.checked_add(self.fee) {
            Some(total) if total <= MAX_TRANSFER => {}
            _ => return Err(TypesError::AmountOverflow),
        }
        self.sender.verify(&self.signed_bytes(), &self.signature)
    }
}

impl fmt::Display for PaymentTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Payment {{ {} -> {}, amount: {}, fee: {} }}",
            self.sender_address(),
            self.recipient,
            self.amount,
            self.fee
        )
    }
}

/// Initial distribution of funds, only valid in the first block.
///
/// Carries a deterministic content-derived signature so that every
/// transaction in the ledger has a unique identifier.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct GenesisTransaction {
    pub recipient: Address,
    pub amount: u64,
    pub timestamp: u64,
    pub signature: Signature,
}

impl GenesisTransaction {
    pub fn new(recipient: Address, amount: u64, timestamp: u64) -> Self {
        let signature = Self::derive_signature(&recipient, amount, timestamp);
        Self {
            recipient,
            amount,
            timestamp,
            signature,
        }
    }

    /// The content-derived signature: two chained blake3 digests over the
    /// recipient, amount and timestamp.
    fn derive_signature(recipient: &Address, amount: u64, timestamp: u64) -> Signature {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vela-genesis");
        hasher.update(recipient.as_bytes());
        hasher.update(&amount.to_be_bytes());
        hasher.update(&timestamp.to_be_bytes());
        let first = hasher.finalize();
        let second = blake3::hash(first.as_bytes());

        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(first.as_bytes());
        bytes[32..].copy_from_slice(second.as_bytes());
        Signature::from_bytes(bytes)
    }

    /// Structural self-validation: the granted amount must stay within the
    /// signed-delta range, and the signature must match the content it was
    /// derived from.
    pub fn verify(&self) -> Result<(), TypesError> {
        if self.amount > MAX_TRANSFER {
            return Err(TypesError::AmountOverflow);
        }
        let expected = Self::derive_signature(&self.recipient, self.amount, self.timestamp);
        if self.signature != expected {
            return Err(TypesError::InvalidSignature);
        }
        Ok(())
    }
}

/// The closed set of transaction kinds the ledger understands.
/// Adding a kind is a source change; every match is exhaustive.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Transaction {
    Payment(PaymentTransaction),
    Genesis(GenesisTransaction),
}

impl Transaction {
    /// Unique transaction identifier.
    pub fn signature(&self) -> &Signature {
        match self {
            Transaction::Payment(p) => &p.signature,
            Transaction::Genesis(g) => &g.signature,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Transaction::Payment(p) => p.timestamp,
            Transaction::Genesis(g) => g.timestamp,
        }
    }

    pub fn fee(&self) -> u64 {
        match self {
            Transaction::Payment(p) => p.fee,
            Transaction::Genesis(_) => 0,
        }
    }

    /// The spending account, if this kind has one.
    pub fn sender_address(&self) -> Option<Address> {
        match self {
            Transaction::Payment(p) => Some(p.sender_address()),
            Transaction::Genesis(_) => None,
        }
    }

    /// Per-account signed balance deltas this transaction causes.
    pub fn balance_changes(&self) -> Vec<(Address, i64)> {
        match self {
            Transaction::Payment(p) => {
                let cost = p.total_cost().min(MAX_TRANSFER) as i64;
                let amount = p.amount.min(MAX_TRANSFER) as i64;
                vec![(p.sender_address(), -cost), (p.recipient, amount)]
            }
            Transaction::Genesis(g) => {
                vec![(g.recipient, g.amount.min(MAX_TRANSFER) as i64)]
            }
        }
    }

    /// Structural self-validation of the variant.
    pub fn verify(&self) -> Result<(), TypesError> {
        match self {
            Transaction::Payment(p) => p.verify(),
            Transaction::Genesis(g) => g.verify(),
        }
    }
}

//! The SPoS consensus block field.
//!
//! Wire layout, bit-identical for network and storage:
//!
//! ```text
//! | mint_time             | 8 bytes, big-endian u64 |
//! | mint_balance          | 8 bytes, big-endian u64 |
//! | generation_signature  | N bytes                 |
//! ```

use crate::error::ConsensusError;
use serde::{Deserialize, Serialize};

/// Generation signature length used by block validation.
/// The codec itself is length-agnostic.
pub const GENERATION_SIGNATURE_LENGTH: usize = 32;

/// Proof-of-stake metadata sealed into every block header. Immutable once
/// the block is built. The generation signature is never interpreted here;
/// downstream consensus logic verifies it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SposData {
    #[serde(rename = "mintTime")]
    pub mint_time: u64,
    #[serde(rename = "mintBalance")]
    pub mint_balance: u64,
    #[serde(rename = "generationSignature", with = "base58_bytes")]
    pub generation_signature: Vec<u8>,
}

impl SposData {
    pub fn new(mint_time: u64, mint_balance: u64, generation_signature: Vec<u8>) -> Self {
        Self {
            mint_time,
            mint_balance,
            generation_signature,
        }
    }

    /// Total encoded length: 16 bytes of stake proof plus the signature.
    pub fn encoded_len(&self) -> usize {
        16 + self.generation_signature.len()
    }

    /// Encode to the fixed wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.encoded_len());
        data.extend_from_slice(&self.mint_time.to_be_bytes());
        data.extend_from_slice(&self.mint_balance.to_be_bytes());
        data.extend_from_slice(&self.generation_signature);
        data
    }

    /// Decode from the fixed wire layout; exact inverse of `to_bytes`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ConsensusError> {
        if data.len() < 16 {
            return Err(ConsensusError::TruncatedField {
                expected: 16,
                actual: data.len(),
            });
        }
        let mut field = [0u8; 8];
        field.copy_from_slice(&data[0..8]);
        let mint_time = u64::from_be_bytes(field);
        field.copy_from_slice(&data[8..16]);
        let mint_balance = u64::from_be_bytes(field);
        Ok(Self {
            mint_time,
            mint_balance,
            generation_signature: data[16..].to_vec(),
        })
    }

    /// Structured-document form:
    /// `{"SPOSConsensus": {"mintTime", "mintBalance", "generationSignature"}}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "SPOSConsensus": self })
    }

    /// Exact inverse of `to_json`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConsensusError> {
        let inner = value
            .get("SPOSConsensus")
            .ok_or(ConsensusError::MissingField("SPOSConsensus"))?;
        Ok(serde_json::from_value(inner.clone())?)
    }
}

mod base58_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&bs58::encode(bytes).into_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        bs58::decode(&s)
            .into_vec()
            .map_err(serde::de::Error::custom)
    }
}

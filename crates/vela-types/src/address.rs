use crate::error::TypesError;
use crate::keys::PublicKey;
use bech32::{Bech32m, Hrp};
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in an account address.
pub const ADDRESS_LENGTH: usize = 20;

/// Bech32m human-readable prefix of the address text form.
pub const ADDRESS_HRP: &str = "vela";

/// Account address: the leading [`ADDRESS_LENGTH`] bytes of
/// `blake3(public_key)`.
///
/// The Bech32m text form is the only encoding an address has; it is what
/// appears on the wire, in config files, and as the name of the account's
/// change-row map in the state store.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, BorshSerialize, BorshDeserialize,
)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Create from a byte slice of exactly [`ADDRESS_LENGTH`] bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; ADDRESS_LENGTH] = slice
            .try_into()
            .map_err(|_| TypesError::InvalidAddressLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Derive the address owned by an ed25519 public key.
    pub fn from_public_key(pubkey: &PublicKey) -> Self {
        let digest = blake3::hash(pubkey.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    fn hrp() -> Hrp {
        Hrp::parse_unchecked(ADDRESS_HRP)
    }

    /// The canonical `vela1...` text form.
    pub fn to_text(&self) -> Result<String, TypesError> {
        bech32::encode::<Bech32m>(Self::hrp(), &self.0)
            .map_err(|e| TypesError::Bech32Error(e.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => write!(f, "Address({})", text),
            Err(_) => write!(f, "Address(<unencodable>)"),
        }
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) = bech32::decode(s).map_err(|e| TypesError::Bech32Error(e.to_string()))?;
        if hrp != Self::hrp() {
            return Err(TypesError::InvalidAddressFormat(format!(
                "unexpected address prefix '{}'",
                hrp
            )));
        }
        Self::from_slice(&data)
    }
}

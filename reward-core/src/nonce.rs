use core::fmt;

use rand::{rngs::OsRng, RngCore};

use crate::constants::NONCE_LEN;
use crate::error::NonceError;

/// Single-use 32-byte claim identifier. Uniqueness is enforced by the vault at
/// redemption; issuance relies on 256 bits of OS entropy.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn generate() -> Result<Self, NonceError> {
        let mut bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| NonceError::EntropyUnavailable {
                reason: err.to_string(),
            })?;
        Ok(Self(bytes))
    }

    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(value: &str) -> Result<Self, NonceError> {
        let digits = value.strip_prefix("0x").ok_or(NonceError::InvalidEncoding)?;
        let mut bytes = [0u8; NONCE_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| NonceError::InvalidEncoding)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({self})")
    }
}

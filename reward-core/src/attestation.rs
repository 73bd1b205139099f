//! Oracle attestation: canonical preimage, personal-sign digest, and
//! recoverable secp256k1 signatures the vault checks on-chain.
//!
//! The preimage is the packed concatenation
//!
//! ```text
//! vault (20) | chain_id (32, BE) | user (20) | quest_id (utf-8, unprefixed) | reward (32, BE) | nonce (32)
//! ```
//!
//! `quest_id` is the only variable-length field and is immediately followed by
//! fixed-width data, so the layout decodes unambiguously. Any further
//! variable-length field must carry an explicit length prefix.

use core::fmt;

use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};
use sha3::{Digest, Keccak256};

use crate::address::Address;
use crate::constants::{ADDRESS_LEN, PERSONAL_SIGN_PREFIX, SECP256K1_HALF_ORDER, SIGNATURE_LEN};
use crate::error::SignerError;
use crate::nonce::Nonce;

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    Keccak256::digest(bytes).into()
}

/// Digest produced by a wallet's `personal_sign` over `message`.
pub fn eth_signed_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

fn u256_be(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Everything the vault binds a payout to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationPayload {
    pub vault: Address,
    pub chain_id: u64,
    pub user: Address,
    pub quest_id: String,
    pub reward_amount: u128,
    pub nonce: Nonce,
}

impl AttestationPayload {
    pub fn canonical_preimage(&self) -> Vec<u8> {
        let mut preimage =
            Vec::with_capacity(ADDRESS_LEN * 2 + 32 * 3 + self.quest_id.len());
        preimage.extend_from_slice(self.vault.as_bytes());
        preimage.extend_from_slice(&u256_be(u128::from(self.chain_id)));
        preimage.extend_from_slice(self.user.as_bytes());
        preimage.extend_from_slice(self.quest_id.as_bytes());
        preimage.extend_from_slice(&u256_be(self.reward_amount));
        preimage.extend_from_slice(self.nonce.as_bytes());
        preimage
    }

    pub fn message_hash(&self) -> [u8; 32] {
        keccak256(&self.canonical_preimage())
    }

    /// The digest that is actually signed: the message hash wrapped in the
    /// personal-sign envelope (`"\x19Ethereum Signed Message:\n32" || hash`).
    pub fn signing_digest(&self) -> [u8; 32] {
        eth_signed_message_hash(&self.message_hash())
    }
}

/// 65-byte `r || s || v` signature with `v` in {27, 28}.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn from_hex(value: &str) -> Result<Self, SignerError> {
        let digits = value
            .strip_prefix("0x")
            .ok_or(SignerError::InvalidSignatureEncoding)?;
        let mut bytes = [0u8; SIGNATURE_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| SignerError::InvalidSignatureEncoding)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, SignerError> {
        let v = self.0[64];
        let recovery = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            _ => return Err(SignerError::InvalidRecoveryId { v }),
        };
        let recovery_id = RecoveryId::from_i32(i32::from(recovery))
            .map_err(|_| SignerError::InvalidRecoveryId { v })?;
        RecoverableSignature::from_compact(&self.0[..64], recovery_id)
            .map_err(|_| SignerError::InvalidSignatureEncoding)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    Address::from_bytes(bytes)
}

/// Holds the oracle key for the lifetime of the process.
pub struct OracleSigner {
    secret: SecretKey,
    address: Address,
}

impl OracleSigner {
    pub fn from_hex_key(value: &str) -> Result<Self, SignerError> {
        let digits = value
            .trim()
            .strip_prefix("0x")
            .ok_or(SignerError::InvalidKeyEncoding)?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| SignerError::InvalidKeyEncoding)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SignerError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| SignerError::InvalidKey)?;
        let address = address_of(&PublicKey::from_secret_key(SECP256K1, &secret));
        Ok(Self { secret, address })
    }

    /// Address the vault is configured to trust.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs `digest` with RFC 6979 deterministic ECDSA.
    pub fn sign_digest(&self, digest: [u8; 32]) -> Signature {
        let message = Message::from_digest(digest);
        let (recovery_id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&message, &self.secret)
            .serialize_compact();

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&compact);
        // recovery ids are 0..=3 and only 0/1 occur for valid keys
        bytes[64] = 27 + recovery_id.to_i32() as u8;
        Signature(bytes)
    }

    pub fn sign(&self, payload: &AttestationPayload) -> Signature {
        self.sign_digest(payload.signing_digest())
    }

    /// Equivalent of a wallet `personal_sign` over an arbitrary message.
    pub fn sign_personal_message(&self, message: &[u8]) -> Signature {
        self.sign_digest(eth_signed_message_hash(message))
    }
}

impl fmt::Debug for OracleSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

pub fn recover_signer(digest: [u8; 32], signature: &Signature) -> Result<Address, SignerError> {
    let recoverable = signature.to_recoverable()?;
    let public_key = SECP256K1
        .recover_ecdsa(&Message::from_digest(digest), &recoverable)
        .map_err(|_| SignerError::Recovery)?;
    Ok(address_of(&public_key))
}

pub fn recover_personal_signer(
    message: &[u8],
    signature: &Signature,
) -> Result<Address, SignerError> {
    recover_signer(eth_signed_message_hash(message), signature)
}

/// Recovery under the rules the vault contract enforces: `v` must be 27 or 28
/// and `s` must lie in the lower half of the curve order.
pub fn recover_signer_canonical(
    digest: [u8; 32],
    signature: &Signature,
) -> Result<Address, SignerError> {
    let v = signature.0[64];
    if v != 27 && v != 28 {
        return Err(SignerError::InvalidRecoveryId { v });
    }
    if signature.0[32..64] > SECP256K1_HALF_ORDER[..] {
        return Err(SignerError::HighS);
    }
    recover_signer(digest, signature)
}

/// True when `signature` over `payload` recovers to `expected`.
pub fn verify_attestation(
    payload: &AttestationPayload,
    signature: &Signature,
    expected: Address,
) -> bool {
    recover_signer(payload.signing_digest(), signature).is_ok_and(|signer| signer == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn payload() -> AttestationPayload {
        AttestationPayload {
            vault: Address::from_bytes([0x11; 20]),
            chain_id: 44_787,
            user: Address::from_bytes([0xaa; 20]),
            quest_id: "celo-basics".to_string(),
            reward_amount: 100_000_000_000_000_000,
            nonce: Nonce::from_bytes([0x42; 32]),
        }
    }

    #[test]
    fn keccak_of_empty_input_matches_reference() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn derives_well_known_addresses() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let signer = OracleSigner::from_bytes(&one).unwrap();
        assert_eq!(
            signer.address().to_canonical(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );

        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        assert_eq!(
            signer.address().to_canonical(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn preimage_layout_is_packed_in_field_order() {
        let payload = payload();
        let preimage = payload.canonical_preimage();
        assert_eq!(preimage.len(), 20 + 32 + 20 + "celo-basics".len() + 32 + 32);

        assert_eq!(&preimage[..20], &[0x11; 20]);
        let chain_word = &preimage[20..52];
        assert!(chain_word[..24].iter().all(|b| *b == 0));
        assert_eq!(&chain_word[24..], &44_787u64.to_be_bytes());
        assert_eq!(&preimage[52..72], &[0xaa; 20]);
        assert_eq!(&preimage[72..83], b"celo-basics");
        assert_eq!(
            &preimage[83..115][16..],
            &100_000_000_000_000_000u128.to_be_bytes()
        );
        assert_eq!(&preimage[115..], &[0x42; 32]);
    }

    #[test]
    fn signature_recovers_to_oracle_address() {
        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        let payload = payload();
        let signature = signer.sign(&payload);

        let v = signature.as_bytes()[64];
        assert!(v == 27 || v == 28);
        assert!(verify_attestation(&payload, &signature, signer.address()));
    }

    #[test]
    fn signing_is_deterministic() {
        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        let payload = payload();
        assert_eq!(signer.sign(&payload), signer.sign(&payload));
    }

    #[test]
    fn raw_hash_signature_does_not_pass_as_attestation() {
        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        let payload = payload();
        let unprefixed = signer.sign_digest(payload.message_hash());
        assert!(!verify_attestation(&payload, &unprefixed, signer.address()));
    }

    #[test]
    fn signature_hex_round_trips_and_rejects_bad_v() {
        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        let signature = signer.sign(&payload());
        let encoded = signature.to_hex();
        assert_eq!(encoded.len(), 2 + 130);
        assert_eq!(Signature::from_hex(&encoded).unwrap(), signature);

        let mut bytes = *signature.as_bytes();
        bytes[64] = 5;
        assert_eq!(
            recover_signer(payload().signing_digest(), &Signature::from_bytes(bytes)),
            Err(SignerError::InvalidRecoveryId { v: 5 })
        );
    }

    #[test]
    fn personal_message_recovery() {
        let signer = OracleSigner::from_hex_key(HARDHAT_KEY).unwrap();
        let signature = signer.sign_personal_message(b"Admin authentication for quest oracle");
        assert_eq!(
            recover_personal_signer(b"Admin authentication for quest oracle", &signature).unwrap(),
            signer.address()
        );
        assert_ne!(
            recover_personal_signer(b"something else", &signature).ok(),
            Some(signer.address())
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(
            OracleSigner::from_hex_key("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap_err(),
            SignerError::InvalidKeyEncoding
        );
        assert_eq!(
            OracleSigner::from_hex_key(&format!("0x{}", "00".repeat(32))).unwrap_err(),
            SignerError::InvalidKey
        );
        assert!(format!("{:?}", OracleSigner::from_hex_key(HARDHAT_KEY).unwrap())
            .contains("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
    }
}

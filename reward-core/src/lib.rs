pub mod address;
pub mod attestation;
pub mod constants;
pub mod error;
pub mod nonce;
pub mod policy;
pub mod session;
pub mod stats;
pub mod units;
pub mod vault;

pub use address::Address;
pub use attestation::{AttestationPayload, OracleSigner, Signature};
pub use error::{AddressError, AmountError, ClaimRejection, NonceError, SignerError, VaultError};
pub use nonce::Nonce;
pub use policy::{ClaimFields, ClaimRequest, CooldownActive, ReplayStatus, RewardCatalog};
pub use session::{CompletionSession, SessionStatus};
pub use stats::{Achievement, PlayerStats};
pub use vault::RewardVault;

use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressError {
    MissingPrefix,
    InvalidLength { actual: usize },
    InvalidHex,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "address must start with 0x"),
            Self::InvalidLength { actual } => {
                write!(f, "address must be 40 hex chars after 0x, got {actual}")
            }
            Self::InvalidHex => write!(f, "address contains non-hex characters"),
        }
    }
}

impl std::error::Error for AddressError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AmountError {
    Empty,
    Malformed { value: String },
    TooManyDecimals { value: String },
    NotPositive,
    AboveMaximum { value: String },
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "reward amount is empty"),
            Self::Malformed { value } => write!(f, "reward amount is not a decimal: {value}"),
            Self::TooManyDecimals { value } => {
                write!(f, "reward amount has more than 2 decimal places: {value}")
            }
            Self::NotPositive => write!(f, "reward amount must be positive"),
            Self::AboveMaximum { value } => write!(f, "reward amount exceeds 10 tokens: {value}"),
        }
    }
}

impl std::error::Error for AmountError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NonceError {
    EntropyUnavailable { reason: String },
    InvalidEncoding,
}

impl fmt::Display for NonceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntropyUnavailable { reason } => write!(f, "entropy source unavailable: {reason}"),
            Self::InvalidEncoding => write!(f, "nonce must be 0x followed by 64 hex chars"),
        }
    }
}

impl std::error::Error for NonceError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignerError {
    InvalidKeyEncoding,
    InvalidKey,
    InvalidSignatureEncoding,
    InvalidRecoveryId { v: u8 },
    HighS,
    Recovery,
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyEncoding => {
                write!(f, "private key must be 0x followed by 64 hex chars")
            }
            Self::InvalidKey => write!(f, "private key is not a valid secp256k1 scalar"),
            Self::InvalidSignatureEncoding => {
                write!(f, "signature must be 0x followed by 130 hex chars")
            }
            Self::InvalidRecoveryId { v } => write!(f, "invalid signature recovery byte v={v}"),
            Self::HighS => write!(f, "signature s value is above half the curve order"),
            Self::Recovery => write!(f, "failed to recover signer from signature"),
        }
    }
}

impl std::error::Error for SignerError {}

/// Request-level rejection, raised before any nonce or signature exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimRejection {
    InvalidAddress,
    InvalidLevelId,
    DurationTooShort,
    UnrealisticMoves,
}

impl ClaimRejection {
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::InvalidLevelId => "INVALID_LEVEL_ID",
            Self::DurationTooShort => "DURATION_TOO_SHORT",
            Self::UnrealisticMoves => "UNREALISTIC_MOVES",
        }
    }
}

impl fmt::Display for ClaimRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for ClaimRejection {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultError {
    InvalidSigner,
    NonceAlreadyUsed,
    InsufficientBalance { requested: u128, available: u128 },
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSigner => write!(f, "invalid signer"),
            Self::NonceAlreadyUsed => write!(f, "nonce already used"),
            Self::InsufficientBalance {
                requested,
                available,
            } => write!(
                f,
                "insufficient vault balance: requested {requested}, available {available}"
            ),
        }
    }
}

impl std::error::Error for VaultError {}

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::address::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
        }
    }
}

/// One successful, rewarded quest attempt. Append-only.
///
/// `reward_amount_wei` is the amount embedded in the signed attestation at
/// issuance time, independent of later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSession {
    pub session_id: Uuid,
    pub wallet: Address,
    pub quest_id: String,
    pub status: SessionStatus,
    pub duration_seconds: u32,
    pub move_count: u32,
    #[serde(serialize_with = "u128_as_string")]
    pub reward_amount_wei: u128,
    pub created_at: DateTime<Utc>,
}

impl CompletionSession {
    pub fn completed(
        wallet: Address,
        quest_id: impl Into<String>,
        duration_seconds: u32,
        move_count: u32,
        reward_amount_wei: u128,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            wallet,
            quest_id: quest_id.into(),
            status: SessionStatus::Completed,
            duration_seconds,
            move_count,
            reward_amount_wei,
            created_at,
        }
    }
}

fn u128_as_string<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

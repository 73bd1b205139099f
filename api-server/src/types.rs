use reward_core::{
    stats::Achievement, units::format_token_amount, ClaimFields, CompletionSession, CooldownActive,
    ReplayStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claims::IssuedReward;

/// Body of `POST /api/verify-game`. Unknown fields are rejected. Field values
/// stay untyped here so a missing, null or wrong-typed value is reported with
/// that field's code by `ClaimRequest::validate`, in gate order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct VerifyGameRequest {
    #[serde(default)]
    pub(crate) user_address: Option<Value>,
    #[serde(default)]
    pub(crate) level_id: Option<Value>,
    #[serde(default)]
    pub(crate) duration: Option<Value>,
    #[serde(default)]
    pub(crate) moves: Option<Value>,
}

fn as_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

impl From<VerifyGameRequest> for ClaimFields {
    fn from(value: VerifyGameRequest) -> Self {
        Self {
            duration: as_number(value.duration.as_ref()),
            moves: as_number(value.moves.as_ref()),
            user_address: as_string(value.user_address),
            quest_id: as_string(value.level_id),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyGameResponse {
    pub(crate) signature: String,
    pub(crate) reward_amount: String,
    pub(crate) nonce: String,
    pub(crate) level_id: String,
}

impl From<IssuedReward> for VerifyGameResponse {
    fn from(value: IssuedReward) -> Self {
        Self {
            signature: value.signature.to_hex(),
            reward_amount: value.reward_amount_wei.to_string(),
            nonce: value.nonce.to_hex(),
            level_id: value.quest_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CooldownResponse {
    pub(crate) error: &'static str,
    pub(crate) message: String,
    pub(crate) hours_remaining: u32,
}

impl From<CooldownActive> for CooldownResponse {
    fn from(value: CooldownActive) -> Self {
        Self {
            error: "REPLAY_COOLDOWN",
            message: value.message(),
            hours_remaining: value.hours_remaining,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WalletQuery {
    #[serde(default)]
    pub(crate) user_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestStatusResponse {
    pub(crate) completed: bool,
    pub(crate) can_replay: bool,
    pub(crate) last_completed: Option<String>,
    pub(crate) hours_until_replay: u32,
}

impl From<ReplayStatus> for QuestStatusResponse {
    fn from(value: ReplayStatus) -> Self {
        Self {
            completed: value.completed,
            can_replay: value.can_replay,
            last_completed: value
                .last_completed
                .map(|at| at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            hours_until_replay: value.hours_until_replay,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserStatsResponse {
    pub(crate) quests_completed: usize,
    pub(crate) total_earned: String,
    pub(crate) current_streak: u32,
    pub(crate) best_streak: u32,
    pub(crate) total_moves: u64,
    pub(crate) average_time: String,
    pub(crate) achievements: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) oracle_address: String,
    pub(crate) vault_address: String,
    pub(crate) chain_id: u64,
    pub(crate) stored_sessions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogEntry {
    pub(crate) level_id: String,
    pub(crate) reward_amount: String,
    pub(crate) reward: String,
}

impl CatalogEntry {
    pub(crate) fn new(level_id: &str, reward_wei: u128) -> Self {
        Self {
            level_id: level_id.to_string(),
            reward_amount: reward_wei.to_string(),
            reward: format_token_amount(reward_wei),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminOracleResponse {
    pub(crate) admin: String,
    pub(crate) signer_address: String,
    pub(crate) vault_address: String,
    pub(crate) chain_id: u64,
    pub(crate) cooldown_hours: i64,
    pub(crate) default_reward_amount: String,
    pub(crate) catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminSessionsResponse {
    pub(crate) wallet: String,
    pub(crate) sessions: Vec<CompletionSession>,
}

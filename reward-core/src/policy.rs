use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::address::Address;
use crate::constants::{
    BUILTIN_CATALOG, COOLDOWN_MS, DEFAULT_REWARD_WEI, MAX_MOVES, MIN_DURATION_SECONDS, MIN_MOVES,
    MS_PER_HOUR,
};
use crate::error::ClaimRejection;

/// Reward per quest id, in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardCatalog {
    entries: BTreeMap<String, u128>,
    default_reward_wei: u128,
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self {
            entries: BUILTIN_CATALOG
                .iter()
                .map(|(quest_id, wei)| ((*quest_id).to_string(), *wei))
                .collect(),
            default_reward_wei: DEFAULT_REWARD_WEI,
        }
    }
}

impl RewardCatalog {
    pub fn new(default_reward_wei: u128) -> Self {
        Self {
            entries: BTreeMap::new(),
            default_reward_wei,
        }
    }

    pub fn with_reward(mut self, quest_id: impl Into<String>, reward_wei: u128) -> Self {
        self.entries.insert(quest_id.into(), reward_wei);
        self
    }

    pub fn default_reward_wei(&self) -> u128 {
        self.default_reward_wei
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u128)> {
        self.entries.iter().map(|(id, wei)| (id.as_str(), *wei))
    }

    /// Unknown quests fall back to the default reward so catalog drift never
    /// blocks play; operators see a warning instead.
    pub fn reward_for(&self, quest_id: &str) -> u128 {
        match self.entries.get(quest_id) {
            Some(wei) => *wei,
            None => {
                tracing::warn!(
                    quest_id,
                    default_reward_wei = %self.default_reward_wei,
                    "unknown quest id, using default reward"
                );
                self.default_reward_wei
            }
        }
    }
}

/// Untrusted claim fields as they arrive at the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimFields {
    pub user_address: Option<String>,
    pub quest_id: Option<String>,
    pub duration: Option<f64>,
    pub moves: Option<f64>,
}

/// A claim that passed every request-level gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub wallet: Address,
    pub quest_id: String,
    pub duration_seconds: u32,
    pub move_count: u32,
}

impl ClaimRequest {
    /// Heuristic anti-cheat gates, checked in order; the first failure wins.
    pub fn validate(fields: ClaimFields) -> Result<Self, ClaimRejection> {
        let wallet = fields
            .user_address
            .as_deref()
            .and_then(|value| Address::parse(value).ok())
            .ok_or(ClaimRejection::InvalidAddress)?;

        let quest_id = fields
            .quest_id
            .filter(|quest_id| !quest_id.is_empty())
            .ok_or(ClaimRejection::InvalidLevelId)?;

        let duration = fields
            .duration
            .filter(|duration| duration.is_finite() && *duration >= MIN_DURATION_SECONDS)
            .ok_or(ClaimRejection::DurationTooShort)?;

        let moves = fields
            .moves
            .filter(|moves| moves.fract() == 0.0 && (MIN_MOVES..=MAX_MOVES).contains(moves))
            .ok_or(ClaimRejection::UnrealisticMoves)?;

        Ok(Self {
            wallet,
            quest_id,
            // saturating float-to-int cast; fractional seconds are dropped
            duration_seconds: duration as u32,
            move_count: moves as u32,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownActive {
    pub hours_remaining: u32,
}

impl CooldownActive {
    pub fn message(&self) -> String {
        format!(
            "You can replay this quest in {} hour(s) for revision.",
            self.hours_remaining
        )
    }
}

fn remaining_cooldown_ms(last_completed: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let elapsed = now
        .signed_duration_since(last_completed)
        .num_milliseconds();
    (elapsed < COOLDOWN_MS).then(|| COOLDOWN_MS - elapsed)
}

fn ceil_hours(ms: i64) -> u32 {
    u32::try_from((ms + MS_PER_HOUR - 1) / MS_PER_HOUR).unwrap_or(u32::MAX)
}

/// Rejects a claim when the same wallet completed the same quest less than
/// 24 hours ago. Replays after the window earn the full reward again.
pub fn check_cooldown(
    last_completed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), CooldownActive> {
    match last_completed.and_then(|last| remaining_cooldown_ms(last, now)) {
        Some(remaining) => Err(CooldownActive {
            hours_remaining: ceil_hours(remaining),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStatus {
    pub completed: bool,
    pub can_replay: bool,
    pub last_completed: Option<DateTime<Utc>>,
    pub hours_until_replay: u32,
}

pub fn replay_status(last_completed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ReplayStatus {
    let hours_until_replay = match check_cooldown(last_completed, now) {
        Ok(()) => 0,
        Err(active) => active.hours_remaining,
    };
    ReplayStatus {
        completed: last_completed.is_some(),
        can_replay: hours_until_replay == 0,
        last_completed,
        hours_until_replay,
    }
}

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::constants::WEI_PER_TOKEN;
use crate::session::CompletionSession;
use crate::units::format_token_amount_2dp;

const SPEED_DEMON_SECONDS: u32 = 120;
const PERFECT_MEMORY_MOVES: u32 = 8;
const STREAK_TARGET: u32 = 3;
const QUEST_MASTER_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

/// Counts runs of consecutive UTC calendar days with at least one completion.
///
/// `sessions` must be sorted ascending by `created_at`. The current streak is
/// only live when the last completion fell on `today` or the day before.
pub fn compute_streaks(sessions: &[CompletionSession], today: NaiveDate) -> Streaks {
    let mut best = 0;
    let mut run = 0;
    let mut last_day: Option<NaiveDate> = None;

    for session in sessions {
        let day = session.created_at.date_naive();
        match last_day {
            None => run = 1,
            Some(previous) if previous == day => {}
            Some(previous) => {
                if (day - previous).num_days() == 1 {
                    run += 1;
                } else {
                    best = best.max(run);
                    run = 1;
                }
            }
        }
        last_day = Some(day);
    }
    best = best.max(run);

    let yesterday = today.checked_sub_days(Days::new(1));
    let current = match last_day {
        Some(day) if day == today || Some(day) == yesterday => run,
        _ => 0,
    };
    Streaks { current, best }
}

/// Aggregate view over every completion of one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub quests_completed: usize,
    pub total_earned_wei: u128,
    pub total_moves: u64,
    pub total_duration_seconds: u64,
    pub streaks: Streaks,
    pub achievements: Vec<Achievement>,
}

impl PlayerStats {
    /// Folds `sessions` (ascending by creation time) into totals, streaks and
    /// achievements as of `now`.
    pub fn from_sessions(sessions: &[CompletionSession], now: DateTime<Utc>) -> Self {
        let quests_completed = sessions.len();
        let total_earned_wei = sessions
            .iter()
            .fold(0u128, |sum, s| sum.saturating_add(s.reward_amount_wei));
        let total_moves = sessions.iter().map(|s| u64::from(s.move_count)).sum();
        let total_duration_seconds = sessions.iter().map(|s| u64::from(s.duration_seconds)).sum();
        let streaks = compute_streaks(sessions, now.date_naive());

        let achievements = vec![
            Achievement {
                id: "first-quest",
                name: "First Steps",
                description: "Complete your first quest",
                earned: quests_completed >= 1,
            },
            Achievement {
                id: "speed-demon",
                name: "Speed Demon",
                description: "Complete a quest under 2 minutes",
                earned: sessions
                    .iter()
                    .any(|s| s.duration_seconds < SPEED_DEMON_SECONDS),
            },
            Achievement {
                id: "perfect-memory",
                name: "Perfect Memory",
                description: "Complete a quest in minimum moves (8 moves for 4 pairs)",
                earned: sessions.iter().any(|s| s.move_count <= PERFECT_MEMORY_MOVES),
            },
            Achievement {
                id: "streak-3",
                name: "On Fire",
                description: "Maintain a 3-day streak",
                earned: streaks.best >= STREAK_TARGET,
            },
            Achievement {
                id: "quest-master",
                name: "Quest Master",
                description: "Complete 5 quests",
                earned: quests_completed >= QUEST_MASTER_COUNT,
            },
            Achievement {
                id: "scholar",
                name: "Scholar",
                description: "Earn 1.0 token total",
                earned: total_earned_wei >= WEI_PER_TOKEN,
            },
        ];

        Self {
            quests_completed,
            total_earned_wei,
            total_moves,
            total_duration_seconds,
            streaks,
            achievements,
        }
    }

    /// Mean play time in whole seconds, rounded half-up.
    pub fn average_seconds(&self) -> u64 {
        if self.quests_completed == 0 {
            return 0;
        }
        let count = self.quests_completed as u64;
        (self.total_duration_seconds * 2 + count) / (count * 2)
    }

    /// `M:SS`, e.g. `2:05`.
    pub fn average_time(&self) -> String {
        let average = self.average_seconds();
        format!("{}:{:02}", average / 60, average % 60)
    }

    pub fn total_earned(&self) -> String {
        format_token_amount_2dp(self.total_earned_wei)
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }
}

use chrono::{DateTime, TimeZone, Utc};
use reward_core::{Address, CompletionSession, SessionStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::*;

const SESSION_COLUMNS: &str = "session_id, wallet_address, quest_id, status,
     duration_seconds, move_count, reward_amount_wei, created_at";

impl SessionStore {
    /// Insert one session row into SQLite.
    pub(super) fn insert_row(conn: &Connection, session: &CompletionSession) -> Result<(), String> {
        conn.execute(
            "INSERT INTO sessions (
                session_id, wallet_address, quest_id, status,
                duration_seconds, move_count, reward_amount_wei, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                session.session_id.to_string(),
                session.wallet.to_canonical(),
                session.quest_id,
                session.status.as_str(),
                i64::from(session.duration_seconds),
                i64::from(session.move_count),
                session.reward_amount_wei.to_string(),
                session.created_at.timestamp_millis(),
            ],
        )
        .map_err(|e| format!("insert session failed: {e}"))?;
        Ok(())
    }

    pub(super) fn latest_completed_at(
        conn: &Connection,
        wallet: &Address,
        quest_id: &str,
    ) -> Result<Option<DateTime<Utc>>, String> {
        let millis: Option<i64> = conn
            .query_row(
                "SELECT created_at FROM sessions
                 WHERE wallet_address = ?1 AND quest_id = ?2 AND status = 'COMPLETED'
                 ORDER BY created_at DESC
                 LIMIT 1",
                params![wallet.to_canonical(), quest_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("latest completion lookup failed: {e}"))?;
        millis.map(millis_to_utc).transpose()
    }

    /// Most recent completion of `quest_id` by `wallet`.
    pub fn latest_completion(
        &self,
        wallet: &Address,
        quest_id: &str,
    ) -> Result<Option<CompletionSession>, String> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE wallet_address = ?1 AND quest_id = ?2 AND status = 'COMPLETED'
                     ORDER BY created_at DESC
                     LIMIT 1"
                ),
                params![wallet.to_canonical(), quest_id],
                RawSessionRow::from_row,
            )
            .optional()
            .map_err(|e| format!("latest_completion failed: {e}"))?
        };

        row.map(RawSessionRow::into_session).transpose()
    }

    /// Every completion by `wallet`, oldest first.
    pub fn sessions_for_wallet(&self, wallet: &Address) -> Result<Vec<CompletionSession>, String> {
        let rows: Vec<RawSessionRow> = {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE wallet_address = ?1 AND status = 'COMPLETED'
                     ORDER BY created_at ASC, rowid ASC"
                ))
                .map_err(|e| format!("sessions_for_wallet prepare failed: {e}"))?;
            let rows: Vec<RawSessionRow> = stmt
                .query_map(params![wallet.to_canonical()], RawSessionRow::from_row)
                .map_err(|e| format!("sessions_for_wallet query failed: {e}"))?
                .collect::<Result<_, _>>()
                .map_err(|e| format!("sessions_for_wallet row failed: {e}"))?;
            rows
        };

        rows.into_iter().map(RawSessionRow::into_session).collect()
    }
}

struct RawSessionRow {
    session_id: String,
    wallet_address: String,
    quest_id: String,
    status: String,
    duration_seconds: i64,
    move_count: i64,
    reward_amount_wei: String,
    created_at: i64,
}

impl RawSessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            session_id: row.get(0)?,
            wallet_address: row.get(1)?,
            quest_id: row.get(2)?,
            status: row.get(3)?,
            duration_seconds: row.get(4)?,
            move_count: row.get(5)?,
            reward_amount_wei: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_session(self) -> Result<CompletionSession, String> {
        Ok(CompletionSession {
            session_id: Uuid::parse_str(&self.session_id)
                .map_err(|e| format!("bad uuid in db: {e}"))?,
            wallet: Address::parse(&self.wallet_address)
                .map_err(|e| format!("bad wallet address in db: {e}"))?,
            quest_id: self.quest_id,
            status: status_from_str(&self.status)?,
            duration_seconds: u32::try_from(self.duration_seconds)
                .map_err(|e| format!("bad duration in db: {e}"))?,
            move_count: u32::try_from(self.move_count)
                .map_err(|e| format!("bad move count in db: {e}"))?,
            reward_amount_wei: self
                .reward_amount_wei
                .parse()
                .map_err(|e| format!("bad reward amount in db: {e}"))?,
            created_at: millis_to_utc(self.created_at)?,
        })
    }
}

fn millis_to_utc(millis: i64) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| format!("bad created_at in db: {millis}"))
}

fn status_from_str(s: &str) -> Result<SessionStatus, String> {
    match s {
        "COMPLETED" => Ok(SessionStatus::Completed),
        _ => Err(format!("unknown session status in db: {s}")),
    }
}

mod db;

use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use reward_core::{policy::check_cooldown, Address, CompletionSession, CooldownActive};
use rusqlite::{Connection, TransactionBehavior};

/// Result of an atomic check-then-issue.
#[derive(Debug)]
pub enum IssueOutcome<T> {
    /// The closure ran and its session row was committed.
    Issued(T),
    /// A completion inside the cooldown window already exists; nothing ran.
    Cooldown(CooldownActive),
}

/// SQLite-backed, append-only ledger of completed quest sessions.
///
/// Rows are never updated or deleted. Cooldown lookups use the
/// `(wallet_address, quest_id, created_at DESC)` index; statistics scan a
/// wallet's rows in chronological order.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (or create) `sessions.db` under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, String> {
        fs::create_dir_all(data_dir)
            .map_err(|e| format!("failed to create data dir {}: {e}", data_dir.display()))?;

        let db_path = data_dir.join("sessions.db");
        let conn = Connection::open(&db_path)
            .map_err(|e| format!("failed to open SQLite at {}: {e}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;",
        )
        .map_err(|e| format!("failed to set pragmas: {e}"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id          TEXT PRIMARY KEY,
                wallet_address      TEXT NOT NULL,
                quest_id            TEXT NOT NULL,
                status              TEXT NOT NULL,
                duration_seconds    INTEGER NOT NULL,
                move_count          INTEGER NOT NULL,
                reward_amount_wei   TEXT NOT NULL,
                created_at          INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_sessions_cooldown
                ON sessions(wallet_address, quest_id, created_at DESC);
             CREATE INDEX IF NOT EXISTS idx_sessions_wallet
                ON sessions(wallet_address, created_at);",
        )
        .map_err(|e| format!("failed to create schema: {e}"))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        tracing::info!(
            path = %db_path.display(),
            sessions = store.count()?,
            "session ledger opened"
        );
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "session store mutex poisoned".to_string())
    }

    pub fn insert(&self, session: &CompletionSession) -> Result<(), String> {
        let conn = self.lock()?;
        Self::insert_row(&conn, session)
    }

    /// Runs the cooldown check, `issue` and the insert of the session it
    /// returns inside one `BEGIN IMMEDIATE` transaction, so two claims for the
    /// same wallet and quest cannot both pass the check. If `issue` fails the
    /// transaction rolls back and nothing is recorded.
    pub fn issue_once<T>(
        &self,
        wallet: &Address,
        quest_id: &str,
        now: DateTime<Utc>,
        issue: impl FnOnce() -> Result<(T, CompletionSession), String>,
    ) -> Result<IssueOutcome<T>, String> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| format!("issue_once begin: {e}"))?;

        let last_completed = Self::latest_completed_at(&tx, wallet, quest_id)?;
        if let Err(active) = check_cooldown(last_completed, now) {
            return Ok(IssueOutcome::Cooldown(active));
        }

        let (issued, session) = issue()?;
        Self::insert_row(&tx, &session)?;
        tx.commit().map_err(|e| format!("issue_once commit: {e}"))?;
        Ok(IssueOutcome::Issued(issued))
    }

    pub fn count(&self) -> Result<usize, String> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .map_err(|e| format!("count failed: {e}"))?;
        Ok(count as usize)
    }
}

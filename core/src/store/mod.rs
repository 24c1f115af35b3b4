//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The pipeline stages never execute SQL; the SQL engine lives in
//! store/retention.rs and reads only the activity_event table.

use crate::{
    error::{RetentionError, RetentionResult},
    event::{check_events, parse_activity_date, ActivityEvent},
    month::CalendarMonth,
};
use rusqlite::{params, Connection};

mod results;
mod retention;

pub use results::RateRole;
pub use retention::SqlRetention;

/// Dates are stored as ISO `YYYY-MM-DD` text so string order is date order.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct RetentionStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl RetentionStore {
    pub fn open(path: &str) -> RetentionResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RetentionResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RetentionResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        baseline: CalendarMonth,
        comparison: CalendarMonth,
        version: &str,
    ) -> RetentionResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, baseline_month, comparison_month, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                version,
                baseline.to_string(),
                comparison.to_string(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn run_count(&self) -> RetentionResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))
            .map_err(Into::into)
    }

    // ── Activity events ────────────────────────────────────────

    /// Append events in a single transaction. Either all rows land or none do.
    pub fn insert_events(&self, events: &[ActivityEvent]) -> RetentionResult<usize> {
        check_events(events)?;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO activity_event (account_id, user_id, activity_date)
                 VALUES (?1, ?2, ?3)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.account_id,
                    event.user_id,
                    event.activity_date.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("store: inserted {} activity events", events.len());
        Ok(events.len())
    }

    pub fn event_count(&self) -> RetentionResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM activity_event", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Every stored event, in insertion order.
    pub fn load_events(&self) -> RetentionResult<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, user_id, activity_date
             FROM activity_event ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, account_id, user_id, raw_date)| {
                let activity_date = parse_activity_date(&raw_date).ok_or_else(|| {
                    RetentionError::InvalidRecord {
                        line: id as u64,
                        reason: format!("stored activity_date '{raw_date}' is malformed"),
                    }
                })?;
                Ok(ActivityEvent {
                    account_id,
                    user_id,
                    activity_date,
                })
            })
            .collect()
    }

    pub fn clear_events(&self) -> RetentionResult<()> {
        self.conn.execute("DELETE FROM activity_event", [])?;
        Ok(())
    }
}

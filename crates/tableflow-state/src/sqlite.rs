//! `SQLite`-backed implementation of [`StateBackend`].
//!
//! Uses a single `Mutex<Connection>` for thread safety.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tableflow_types::checkpoint::InitialValues;
use tableflow_types::state::{CheckpointRecord, FunctionId, RunStats, RunStatus};

use crate::backend::StateBackend;
use crate::error::{self, StateError};

/// `SQLite` datetime format (UTC, no timezone suffix).
const SQLITE_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Idempotent DDL for state tables.
const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS function_checkpoints (
    function TEXT PRIMARY KEY NOT NULL,
    values_json TEXT NOT NULL,
    run_id INTEGER,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS function_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    function TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL DEFAULT (datetime('now')),
    finished_at TEXT,
    frames_read INTEGER DEFAULT 0,
    rows_read INTEGER DEFAULT 0,
    results_written INTEGER DEFAULT 0,
    checkpoint_committed INTEGER DEFAULT 0,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_function_runs_function ON function_runs (function);
";

/// `SQLite`-backed state storage.
///
/// Create with [`SqliteStateBackend::open`] for file-backed persistence
/// or [`SqliteStateBackend::in_memory`] for tests.
pub struct SqliteStateBackend {
    conn: Mutex<Connection>,
}

impl SqliteStateBackend {
    /// Open or create a `SQLite` state database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if the directory can't be created,
    /// or [`StateError::Sqlite`] if the database can't be opened.
    pub fn open(path: &Path) -> error::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory `SQLite` backend (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Sqlite`] if the in-memory database can't
    /// be initialized.
    pub fn in_memory() -> error::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection lock.
    fn lock_conn(&self) -> error::Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StateError::LockPoisoned)
    }

    /// Format current UTC time for `SQLite` storage.
    fn now_sqlite() -> String {
        Utc::now().format(SQLITE_DATETIME_FMT).to_string()
    }

    /// Convert a `SQLite` datetime string to ISO-8601.
    fn sqlite_to_iso8601(raw: &str) -> String {
        NaiveDateTime::parse_from_str(raw, SQLITE_DATETIME_FMT).map_or_else(
            |_| raw.to_string(),
            |ndt| format!("{}Z", ndt.format("%Y-%m-%dT%H:%M:%S")),
        )
    }

    #[cfg(test)]
    fn get_run_row(&self, run_id: i64) -> error::Result<(String, i64, Option<String>, bool)> {
        let conn = self.lock_conn()?;
        let row = conn.query_row(
            "SELECT status, frames_read, finished_at, checkpoint_committed \
             FROM function_runs WHERE id = ?1",
            [run_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
        Ok(row)
    }
}

impl StateBackend for SqliteStateBackend {
    fn get_checkpoint(&self, function: &FunctionId) -> error::Result<Option<CheckpointRecord>> {
        let conn = self.lock_conn()?;
        let row: Option<(String, Option<i64>, String)> = conn
            .query_row(
                "SELECT values_json, run_id, updated_at \
                 FROM function_checkpoints WHERE function = ?1",
                [function.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((values_json, run_id, updated_at)) = row else {
            return Ok(None);
        };
        let values: InitialValues =
            serde_json::from_str(&values_json).map_err(|source| StateError::CorruptCheckpoint {
                function: function.to_string(),
                source,
            })?;
        Ok(Some(CheckpointRecord {
            values,
            run_id,
            updated_at: Self::sqlite_to_iso8601(&updated_at),
        }))
    }

    fn set_checkpoint(
        &self,
        function: &FunctionId,
        values: &InitialValues,
        run_id: Option<i64>,
    ) -> error::Result<()> {
        let values_json =
            serde_json::to_string(values).map_err(|source| StateError::EncodeCheckpoint {
                function: function.to_string(),
                source,
            })?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO function_checkpoints (function, values_json, run_id, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(function) \
             DO UPDATE SET values_json = ?2, run_id = ?3, updated_at = ?4",
            rusqlite::params![function.as_str(), values_json, run_id, Self::now_sqlite()],
        )?;
        Ok(())
    }

    fn clear_checkpoint(&self, function: &FunctionId) -> error::Result<bool> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute(
            "DELETE FROM function_checkpoints WHERE function = ?1",
            [function.as_str()],
        )?;
        Ok(deleted > 0)
    }

    fn start_run(&self, function: &FunctionId) -> error::Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO function_runs (function, status) VALUES (?1, ?2)",
            rusqlite::params![function.as_str(), RunStatus::Running.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn complete_run(&self, run_id: i64, status: RunStatus, stats: &RunStats) -> error::Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE function_runs SET status = ?1, finished_at = datetime('now'), \
             frames_read = ?2, rows_read = ?3, results_written = ?4, \
             checkpoint_committed = ?5, error_message = ?6 \
             WHERE id = ?7",
            rusqlite::params![
                status.as_str(),
                stats.frames_read as i64,
                stats.rows_read as i64,
                stats.results_written as i64,
                stats.checkpoint_committed,
                stats.error_message,
                run_id,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(name: &str) -> FunctionId {
        FunctionId::new(name)
    }

    #[test]
    fn checkpoint_roundtrip() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        assert!(backend.get_checkpoint(&fid("f")).unwrap().is_none());

        let values = InitialValues::from([("last_id", "42")]);
        backend.set_checkpoint(&fid("f"), &values, Some(7)).unwrap();

        let record = backend.get_checkpoint(&fid("f")).unwrap().unwrap();
        assert_eq!(record.values, values);
        assert_eq!(record.run_id, Some(7));
        assert!(record.updated_at.ends_with('Z'), "got: {}", record.updated_at);
    }

    #[test]
    fn checkpoint_replaces_without_merging() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        backend
            .set_checkpoint(
                &fid("f"),
                &InitialValues::from([("last_id", "5"), ("page", "3")]),
                None,
            )
            .unwrap();
        backend
            .set_checkpoint(&fid("f"), &InitialValues::from([("last_id", "9")]), None)
            .unwrap();

        let record = backend.get_checkpoint(&fid("f")).unwrap().unwrap();
        assert_eq!(record.values, InitialValues::from([("last_id", "9")]));
    }

    #[test]
    fn different_functions_independent() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        backend
            .set_checkpoint(&fid("a"), &InitialValues::from([("k", "aaa")]), None)
            .unwrap();
        backend
            .set_checkpoint(&fid("b"), &InitialValues::from([("k", "bbb")]), None)
            .unwrap();

        let a = backend.get_checkpoint(&fid("a")).unwrap().unwrap();
        let b = backend.get_checkpoint(&fid("b")).unwrap().unwrap();
        assert_eq!(a.values.get("k"), Some("aaa"));
        assert_eq!(b.values.get("k"), Some("bbb"));
    }

    #[test]
    fn clear_checkpoint_reports_presence() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        assert!(!backend.clear_checkpoint(&fid("f")).unwrap());
        backend
            .set_checkpoint(&fid("f"), &InitialValues::from([("k", "v")]), None)
            .unwrap();
        assert!(backend.clear_checkpoint(&fid("f")).unwrap());
        assert!(backend.get_checkpoint(&fid("f")).unwrap().is_none());
    }

    #[test]
    fn corrupt_checkpoint_is_surfaced() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        {
            let conn = backend.lock_conn().unwrap();
            conn.execute(
                "INSERT INTO function_checkpoints (function, values_json) VALUES ('f', '{\"k\": 1}')",
                [],
            )
            .unwrap();
        }
        let err = backend.get_checkpoint(&fid("f")).unwrap_err();
        assert!(matches!(err, StateError::CorruptCheckpoint { .. }), "got: {err}");
    }

    #[test]
    fn run_lifecycle() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        let run_id = backend.start_run(&fid("f")).unwrap();
        assert!(run_id > 0);

        let (status, _, finished_at, _) = backend.get_run_row(run_id).unwrap();
        assert_eq!(status, "running");
        assert!(finished_at.is_none());

        backend
            .complete_run(
                run_id,
                RunStatus::Completed,
                &RunStats {
                    frames_read: 3,
                    rows_read: 30,
                    results_written: 2,
                    checkpoint_committed: true,
                    error_message: None,
                },
            )
            .unwrap();

        let (status, frames_read, finished_at, committed) = backend.get_run_row(run_id).unwrap();
        assert_eq!(status, "completed");
        assert_eq!(frames_read, 3);
        assert!(finished_at.is_some());
        assert!(committed);
    }

    #[test]
    fn run_ids_increment() {
        let backend = SqliteStateBackend::in_memory().unwrap();
        let first = backend.start_run(&fid("f")).unwrap();
        let second = backend.start_run(&fid("f")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn file_backed_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        {
            let backend = SqliteStateBackend::open(&path).unwrap();
            backend
                .set_checkpoint(&fid("f"), &InitialValues::from([("last_id", "9")]), None)
                .unwrap();
        }
        let backend = SqliteStateBackend::open(&path).unwrap();
        let record = backend.get_checkpoint(&fid("f")).unwrap().unwrap();
        assert_eq!(record.values.get("last_id"), Some("9"));
    }
}

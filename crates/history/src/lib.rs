// Run history using SQLite. Stores the full serialized result plus a
// timestamp and derived summary counts; bounded to the most recent runs.

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use ledgermatch_engine::model::{ComparisonResult, Summary};
use ledgermatch_engine::summary::compute_summary;

/// Runs kept per store; saving past this evicts the oldest entries.
pub const HISTORY_CAPACITY: usize = 10;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_at TEXT NOT NULL,
    first_label TEXT NOT NULL,
    second_label TEXT NOT NULL,
    matched INTEGER NOT NULL,
    mismatched INTEGER NOT NULL,
    missing_in_first INTEGER NOT NULL,
    missing_in_second INTEGER NOT NULL,
    result_json TEXT NOT NULL
);
"#;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum HistoryError {
    /// SQLite open/query failure.
    Storage(String),
    /// Result payload could not be (de)serialized.
    Serialize(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(msg) => write!(f, "history storage error: {msg}"),
            Self::Serialize(msg) => write!(f, "history serialization error: {msg}"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Listing row: everything but the stored result itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunEntry {
    pub id: i64,
    pub run_at: String,
    pub first_label: String,
    pub second_label: String,
    pub summary: Summary,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (creating if needed) the store at `path`. The parent directory
    /// is created and the schema applied idempotently.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| HistoryError::Storage(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Platform data-dir location of the default store.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgermatch")
            .join("history.db")
    }

    /// Save a run: timestamp, summary counts, and the full result, then
    /// prune to `HISTORY_CAPACITY` newest rows. Returns the new run id.
    pub fn save(
        &self,
        first_label: &str,
        second_label: &str,
        result: &ComparisonResult,
    ) -> Result<i64, HistoryError> {
        let summary = compute_summary(result);
        let run_at = chrono::Utc::now().to_rfc3339();
        let result_json =
            serde_json::to_string(result).map_err(|e| HistoryError::Serialize(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO runs (run_at, first_label, second_label, matched, mismatched, missing_in_first, missing_in_second, result_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_at,
                first_label,
                second_label,
                summary.matched as i64,
                summary.mismatched as i64,
                summary.missing_in_first as i64,
                summary.missing_in_second as i64,
                result_json,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        self.conn.execute(
            "DELETE FROM runs WHERE id NOT IN (SELECT id FROM runs ORDER BY id DESC LIMIT ?1)",
            params![HISTORY_CAPACITY as i64],
        )?;

        Ok(id)
    }

    /// All retained runs, newest first.
    pub fn list(&self) -> Result<Vec<RunEntry>, HistoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_at, first_label, second_label, matched, mismatched, missing_in_first, missing_in_second
             FROM runs ORDER BY id DESC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                let matched: i64 = row.get(4)?;
                let mismatched: i64 = row.get(5)?;
                let missing_in_first: i64 = row.get(6)?;
                let missing_in_second: i64 = row.get(7)?;
                Ok(RunEntry {
                    id: row.get(0)?,
                    run_at: row.get(1)?,
                    first_label: row.get(2)?,
                    second_label: row.get(3)?,
                    summary: Summary {
                        matched: matched as usize,
                        mismatched: mismatched as usize,
                        missing_in_first: missing_in_first as usize,
                        missing_in_second: missing_in_second as usize,
                        total: (matched + mismatched + missing_in_first + missing_in_second)
                            as usize,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// One stored run with its result, exactly as saved. None if evicted
    /// or never saved.
    pub fn load(&self, id: i64) -> Result<Option<(RunEntry, ComparisonResult)>, HistoryError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, run_at, first_label, second_label, matched, mismatched, missing_in_first, missing_in_second, result_json
                 FROM runs WHERE id = ?1",
                params![id],
                |row| {
                    let matched: i64 = row.get(4)?;
                    let mismatched: i64 = row.get(5)?;
                    let missing_in_first: i64 = row.get(6)?;
                    let missing_in_second: i64 = row.get(7)?;
                    let result_json: String = row.get(8)?;
                    Ok((
                        RunEntry {
                            id: row.get(0)?,
                            run_at: row.get(1)?,
                            first_label: row.get(2)?,
                            second_label: row.get(3)?,
                            summary: Summary {
                                matched: matched as usize,
                                mismatched: mismatched as usize,
                                missing_in_first: missing_in_first as usize,
                                missing_in_second: missing_in_second as usize,
                                total: (matched + mismatched + missing_in_first
                                    + missing_in_second)
                                    as usize,
                            },
                        },
                        result_json,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((entry, result_json)) => {
                let result = serde_json::from_str(&result_json)
                    .map_err(|e| HistoryError::Serialize(e.to_string()))?;
                Ok(Some((entry, result)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgermatch_engine::model::CanonicalRecord;
    use ledgermatch_engine::reconcile::reconcile;

    fn rec(invoice_no: &str, amount: f64) -> CanonicalRecord {
        CanonicalRecord {
            invoice_no: invoice_no.into(),
            amount,
            date: "2024-01-01".into(),
        }
    }

    fn sample_result(n: usize) -> ComparisonResult {
        let first: Vec<_> = (0..n).map(|i| rec(&format!("INV-{i}"), i as f64)).collect();
        reconcile(&first, &first)
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = reconcile(
            &[rec("A", 1.0), rec("B", 2.0)],
            &[rec("B", 9.0), rec("C", 3.0)],
        );
        let id = store.save("a.csv", "b.csv", &result).unwrap();

        let (entry, loaded) = store.load(id).unwrap().unwrap();
        assert_eq!(entry.first_label, "a.csv");
        assert_eq!(entry.summary.mismatched, 1);
        assert_eq!(loaded, result);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let store = HistoryStore::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(store.save(&format!("run-{i}"), "b.csv", &sample_result(i)).unwrap());
        }

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        // Newest first.
        assert_eq!(entries[0].first_label, "run-11");
        assert_eq!(entries.last().unwrap().first_label, "run-2");

        // The two oldest are gone.
        assert!(store.load(ids[0]).unwrap().is_none());
        assert!(store.load(ids[1]).unwrap().is_none());
        assert!(store.load(ids[11]).unwrap().is_some());
    }

    #[test]
    fn list_summary_matches_saved_result() {
        let store = HistoryStore::open_in_memory().unwrap();
        let result = reconcile(&[rec("A", 1.0)], &[rec("A", 5.0), rec("B", 2.0)]);
        store.save("x.csv", "y.csv", &result).unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries[0].summary.mismatched, 1);
        assert_eq!(entries[0].summary.missing_in_first, 1);
        assert_eq!(entries[0].summary.total, 2);
    }

    #[test]
    fn open_creates_file_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let store = HistoryStore::open(&path).unwrap();
            store.save("a.csv", "b.csv", &sample_result(3)).unwrap();
        }
        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}

//! Label Index: a durable, thread-safe key/value store mapping file
//! identities (absolute path or content hash, caller's choice) to label
//! sets and their scoring results.
//!
//! Backend: SQLite via `rusqlite`, WAL journaling, explicit transactions
//! per write with an explicit commit and a logged rollback path on every
//! error branch -- mirrors the PRAGMA/transaction discipline of the
//! pack's `storage_ballast_helper` SQLite logger, applied to label
//! persistence instead of activity logging.

use crate::error::{OpenRiskError, Result};
use crate::label::LabelSet;
use crate::scoring::ScoringResult;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

/// Current on-disk schema version for the `labels` table's JSON payload.
/// Bumped whenever the `LabelSet`/`ScoringResult` wire shape changes in a
/// way that isn't backward compatible.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// One persisted record: the label set, its scoring result, and the
/// modification time recorded at write time (unix seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub label_set: LabelSet,
    pub scoring_result: ScoringResult,
    pub mtime: i64,
}

/// A small per-thread-checkout connection pool: each `checkout()` either
/// reuses a previously-returned, heartbeat-validated connection or opens
/// a fresh one. Invalid connections (heartbeat failure) are discarded
/// rather than returned to the caller.
struct ConnectionPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        Ok(ConnectionPool { path: path.to_path_buf(), idle: Mutex::new(vec![conn]) })
    }

    fn checkout(&self) -> Result<Connection> {
        if let Some(conn) = self.idle.lock().pop() {
            if heartbeat(&conn) {
                return Ok(conn);
            }
            warn!("discarding invalid label index connection on checkout");
        }
        open_connection(&self.path)
    }

    fn checkin(&self, conn: Connection) {
        self.idle.lock().push(conn);
    }
}

fn heartbeat(conn: &Connection) -> bool {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| OpenRiskError::DatabaseError(e.to_string()))?;
        }
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    apply_pragmas(&conn)?;
    apply_schema(&conn)?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS labels (
            id TEXT PRIMARY KEY,
            schema_version INTEGER NOT NULL,
            label_set TEXT NOT NULL,
            scoring_result TEXT NOT NULL,
            mtime INTEGER NOT NULL
        );",
    )?;
    Ok(())
}

/// Durable, thread-safe label index. No global default instance exists:
/// every caller explicitly constructs and owns one.
pub struct LabelIndex {
    pool: ConnectionPool,
    closed: AtomicBool,
}

impl LabelIndex {
    /// Opens (creating if needed) the index database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = ConnectionPool::open(path.as_ref())?;
        Ok(LabelIndex { pool, closed: AtomicBool::new(false) })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OpenRiskError::Closed);
        }
        Ok(())
    }

    /// Point lookup by file identity.
    pub fn get(&self, id: &str) -> Result<Option<Entry>> {
        self.ensure_open()?;
        let conn = self.pool.checkout()?;
        let result = (|| -> Result<Option<Entry>> {
            let mut stmt = conn.prepare_cached("SELECT schema_version, label_set, scoring_result, mtime FROM labels WHERE id = ?1")?;
            let row = stmt
                .query_row(params![id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, i64>(3)?))
                })
                .map(Some)
                .or_else(|e| if matches!(e, rusqlite::Error::QueryReturnedNoRows) { Ok(None) } else { Err(e) })?;
            match row {
                None => Ok(None),
                Some((schema_version, label_set_json, scoring_json, mtime)) => {
                    if schema_version != CURRENT_SCHEMA_VERSION {
                        return Err(OpenRiskError::SchemaMismatch { found: schema_version, expected: CURRENT_SCHEMA_VERSION });
                    }
                    let label_set: LabelSet = serde_json::from_str(&label_set_json)?;
                    let scoring_result: ScoringResult = serde_json::from_str(&scoring_json)?;
                    Ok(Some(Entry { label_set, scoring_result, mtime }))
                }
            }
        })();
        self.pool.checkin(conn);
        result
    }

    /// Atomic upsert under a single explicit transaction. On crash
    /// mid-write the prior value remains readable (WAL + explicit
    /// commit); on any in-process error the transaction rolls back, and
    /// rollback failures are themselves logged rather than swallowed.
    pub fn put(&self, id: &str, entry: &Entry) -> Result<()> {
        self.ensure_open()?;
        let mut conn = self.pool.checkout()?;
        let result = (|| -> Result<()> {
            let label_set_json = serde_json::to_string(&entry.label_set)?;
            let scoring_json = serde_json::to_string(&entry.scoring_result)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO labels (id, schema_version, label_set, scoring_result, mtime) VALUES (?1,?2,?3,?4,?5)",
                params![id, CURRENT_SCHEMA_VERSION, label_set_json, scoring_json, entry.mtime],
            )?;
            tx.commit()?;
            Ok(())
        })();
        if result.is_err() {
            // the transaction guard already rolled back on drop if commit
            // was never reached; nothing further to undo here, but a
            // failed commit is exactly the case callers need to see as a
            // typed, retryable error rather than a silent `false`.
            error!(id, "label index put failed");
        }
        self.pool.checkin(conn);
        result
    }

    /// Deletes the entry for `id`, returning whether one existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.ensure_open()?;
        let mut conn = self.pool.checkout()?;
        let result = (|| -> Result<bool> {
            let tx = conn.transaction()?;
            let deleted = tx.execute("DELETE FROM labels WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(deleted > 0)
        })();
        self.pool.checkin(conn);
        result
    }

    /// Lazily enumerates entries whose id starts with `path_prefix`,
    /// ordered by id. Runs inside its own read transaction so concurrent
    /// writers cannot produce a torn view (snapshot semantics under WAL).
    pub fn prefix_scan(&self, path_prefix: &str) -> Result<Vec<(String, Entry)>> {
        self.ensure_open()?;
        let conn = self.pool.checkout()?;
        let result = (|| -> Result<Vec<(String, Entry)>> {
            let tx = conn.unchecked_transaction()?;
            let mut stmt = tx.prepare(
                "SELECT id, schema_version, label_set, scoring_result, mtime FROM labels
                 WHERE substr(id, 1, ?1) = ?2 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![path_prefix.len() as i64, path_prefix], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            tx.commit()?;

            let mut out = Vec::with_capacity(rows.len());
            for (id, schema_version, label_set_json, scoring_json, mtime) in rows {
                if schema_version != CURRENT_SCHEMA_VERSION {
                    return Err(OpenRiskError::SchemaMismatch { found: schema_version, expected: CURRENT_SCHEMA_VERSION });
                }
                let label_set: LabelSet = serde_json::from_str(&label_set_json)?;
                let scoring_result: ScoringResult = serde_json::from_str(&scoring_json)?;
                out.push((id, Entry { label_set, scoring_result, mtime }));
            }
            Ok(out)
        })();
        self.pool.checkin(conn);
        result
    }

    /// Idempotent close: marks the index closed so subsequent operations
    /// return `Closed` rather than touching the database again. Waiting
    /// for in-flight writes is implicit here because every write already
    /// holds its connection for the duration of its own transaction.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Encryption, Exposure, NormalizedContext};
    use crate::label::Label;
    use crate::scoring::Tier;
    use std::sync::Arc;
    use std::thread;

    fn sample_entry(entity: &str) -> Entry {
        let mut label_set = LabelSet::new("gen:0.1", 1_700_000_000);
        label_set.insert(Label { entity_type: entity.into(), count: 1, confidence_avg: 0.9, detector_kind: "checksum".into(), value_hash: "a1b2c3".into() });
        let context = NormalizedContext::new(Exposure::Private, Encryption::Platform);
        let scoring_result = ScoringResult {
            score: 42,
            tier: Tier::Medium,
            content_score: 10.0,
            exposure_multiplier: 1.0,
            co_occurrence_rules: Vec::new(),
            entities: label_set.labels.clone(),
            context,
            triggers: Vec::new(),
        };
        Entry { label_set, scoring_result, mtime: 1_700_000_000 }
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        let entry = sample_entry("SSN");
        index.put("/data/file.txt", &entry).unwrap();
        let fetched = index.get("/data/file.txt").unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        assert!(index.get("/does/not/exist").unwrap().is_none());
    }

    #[test]
    fn put_is_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        index.put("/data/file.txt", &sample_entry("SSN")).unwrap();
        index.put("/data/file.txt", &sample_entry("EMAIL")).unwrap();
        let fetched = index.get("/data/file.txt").unwrap().unwrap();
        assert_eq!(fetched.label_set.labels[0].entity_type, "EMAIL");
    }

    #[test]
    fn delete_reports_prior_existence() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        index.put("/data/file.txt", &sample_entry("SSN")).unwrap();
        assert!(index.delete("/data/file.txt").unwrap());
        assert!(!index.delete("/data/file.txt").unwrap());
        assert!(index.get("/data/file.txt").unwrap().is_none());
    }

    #[test]
    fn prefix_scan_is_ordered_and_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        index.put("/data/b.txt", &sample_entry("SSN")).unwrap();
        index.put("/data/a.txt", &sample_entry("SSN")).unwrap();
        index.put("/other/c.txt", &sample_entry("SSN")).unwrap();
        let scanned = index.prefix_scan("/data/").unwrap();
        let ids: Vec<&str> = scanned.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["/data/a.txt", "/data/b.txt"]);
    }

    #[test]
    fn operations_after_close_return_closed_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = LabelIndex::open(dir.path().join("labels.db")).unwrap();
        index.close();
        index.close(); // idempotent
        assert!(matches!(index.get("/x").unwrap_err(), OpenRiskError::Closed));
        assert!(matches!(index.put("/x", &sample_entry("SSN")).unwrap_err(), OpenRiskError::Closed));
    }

    #[test]
    fn concurrent_writes_to_distinct_ids_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(LabelIndex::open(dir.path().join("labels.db")).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let id = format!("/data/file_{i}.txt");
                    index.put(&id, &sample_entry("SSN")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..8 {
            let id = format!("/data/file_{i}.txt");
            assert!(index.get(&id).unwrap().is_some());
        }
    }
}

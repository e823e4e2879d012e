//! Durable segment store backed by SQLite and the sqlite-vec extension.
//!
//! Layout: a `segments` table carrying the record columns (with an index on
//! the document fingerprint, so the re-upload existence check is a keyed
//! lookup rather than a scan over identifiers) and a `segment_embeddings`
//! vec0 virtual table joined by rowid. Similarity search runs through
//! `vec_distance_cosine`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use tokio_rusqlite::{Connection, ffi};

use super::{ScoredSegment, SegmentRecord, VectorBackend};
use crate::types::RagError;

/// Persistent vector backend shared across uploads.
///
/// Cloning shares the underlying connection; reads are safe concurrently.
#[derive(Clone)]
pub struct SqliteSegmentStore {
    conn: Connection,
    dims: usize,
}

fn storage_err(err: impl std::fmt::Display) -> RagError {
    RagError::Storage(err.to_string())
}

impl SqliteSegmentStore {
    /// Opens (or creates) the store at `path` for vectors of `dims`
    /// dimensions.
    pub async fn open(path: impl AsRef<Path>, dims: usize) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path).await.map_err(storage_err)?;

        // Confirm the extension actually loaded before touching vec0 tables.
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(storage_err)?;

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS segments (
                     id          TEXT PRIMARY KEY,
                     fingerprint TEXT NOT NULL,
                     page        INTEGER NOT NULL,
                     ordinal     INTEGER NOT NULL,
                     content     TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_segments_fingerprint
                     ON segments(fingerprint);
                 CREATE VIRTUAL TABLE IF NOT EXISTS segment_embeddings
                     USING vec0(embedding float[{dims}]);"
            ))
            .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(storage_err)?;

        Ok(Self { conn, dims })
    }

    /// Vector dimensionality the store was opened with.
    pub fn dims(&self) -> usize {
        self.dims
    }
}

#[async_trait]
impl VectorBackend for SqliteSegmentStore {
    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, RagError> {
        let fingerprint = fingerprint.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM segments WHERE fingerprint = ?)",
                    [&fingerprint],
                    |row| row.get::<_, bool>(0),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_err)
    }

    async fn insert_segments(
        &self,
        records: Vec<(SegmentRecord, Vec<f32>)>,
    ) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }
        for (record, embedding) in &records {
            if embedding.len() != self.dims {
                return Err(RagError::Storage(format!(
                    "segment {} has {} dims, store expects {}",
                    record.id,
                    embedding.len(),
                    self.dims
                )));
            }
        }

        let rows: Vec<(SegmentRecord, String)> = records
            .into_iter()
            .map(|(record, embedding)| {
                let encoded = serde_json::to_string(&embedding).map_err(storage_err)?;
                Ok((record, encoded))
            })
            .collect::<Result<_, RagError>>()?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for (record, embedding_json) in rows {
                    tx.execute(
                        "INSERT INTO segments (id, fingerprint, page, ordinal, content)
                         VALUES (?, ?, ?, ?, ?)",
                        (
                            &record.id,
                            &record.fingerprint,
                            record.page as i64,
                            record.ordinal as i64,
                            &record.content,
                        ),
                    )?;
                    let rowid = tx.last_insert_rowid();
                    tx.execute(
                        "INSERT INTO segment_embeddings (rowid, embedding) VALUES (?, ?)",
                        (rowid, &embedding_json),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredSegment>, RagError> {
        let query_json = serde_json::to_string(query).map_err(storage_err)?;
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT s.id, s.fingerprint, s.page, s.ordinal, s.content,
                            vec_to_json(e.embedding),
                            vec_distance_cosine(e.embedding, vec_f32(?)) AS distance
                     FROM segments s
                     JOIN segment_embeddings e ON e.rowid = s.rowid
                     ORDER BY distance ASC
                     LIMIT {limit}"
                ))?;
                let rows = stmt.query_map([&query_json], |row| {
                    let record = SegmentRecord {
                        id: row.get(0)?,
                        fingerprint: row.get(1)?,
                        page: row.get::<_, i64>(2)? as u32,
                        ordinal: row.get::<_, i64>(3)? as usize,
                        content: row.get(4)?,
                    };
                    let embedding_json: String = row.get(5)?;
                    let distance: f32 = row.get(6)?;
                    Ok((record, embedding_json, distance))
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(storage_err)?;

        rows.into_iter()
            .map(|(record, embedding_json, distance)| {
                let embedding: Vec<f32> =
                    serde_json::from_str(&embedding_json).map_err(storage_err)?;
                Ok(ScoredSegment {
                    record,
                    embedding,
                    // Cosine distance to similarity.
                    similarity: 1.0 - distance,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM segments", [], |row| {
                    row.get::<_, i64>(0).map(|count| count as usize)
                })
                .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map_err(storage_err)
    }
}

/// Registers sqlite-vec as an auto-loaded extension, once per process.
fn register_sqlite_vec() -> Result<(), RagError> {
    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *const c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc == ffi::SQLITE_OK {
                Ok(())
            } else {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(RagError::Storage)
}

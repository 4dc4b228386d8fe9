//! SQLite implementation of the ArtworkStore trait.
//!
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use proof_of_art_core::{ArtworkRecord, ContentHash, Creator, NewArtwork, PromptHash};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::ArtworkStore;

const RECORD_COLUMNS: &str = "id, content_hash, prompt_hash, creator_address, ipfs_cid, \
     model_used, metadata_uri, certificate_token_id, created_at, updated_at";

/// SQLite-based artwork store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteArtworkStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteArtworkStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to ArtworkRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtworkRecord> {
    let content_hash: String = row.get("content_hash")?;
    let prompt_hash: String = row.get("prompt_hash")?;
    let creator: String = row.get("creator_address")?;
    let token_id: Option<i64> = row.get("certificate_token_id")?;

    Ok(ArtworkRecord {
        id: row.get("id")?,
        content_hash: ContentHash::parse(&content_hash)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
        prompt_hash: PromptHash::parse(&prompt_hash)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        creator_address: Creator::parse(&creator)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        ipfs_cid: row.get("ipfs_cid")?,
        model_used: row.get("model_used")?,
        metadata_uri: row.get("metadata_uri")?,
        certificate_token_id: token_id.map(|t| t as u64),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn token_to_sql(token_id: u64) -> Result<i64> {
    i64::try_from(token_id)
        .map_err(|_| StoreError::InvalidData(format!("certificate token id {token_id} exceeds i64")))
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ArtworkRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_record)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

#[async_trait]
impl ArtworkStore for SqliteArtworkStore {
    async fn upsert(&self, artwork: &NewArtwork) -> Result<ArtworkRecord> {
        let artwork = artwork.clone();
        let token_id = artwork.certificate_token_id.map(token_to_sql).transpose()?;

        self.run(move |conn| {
            let now = now_millis();
            // Single statement, so concurrent writers to one hash serialize on
            // SQLite's write lock and never interleave.
            let sql = format!(
                "INSERT INTO artworks (
                    content_hash, prompt_hash, creator_address, ipfs_cid, model_used,
                    metadata_uri, certificate_token_id, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                ON CONFLICT(content_hash) DO UPDATE SET
                    prompt_hash = excluded.prompt_hash,
                    metadata_uri = excluded.metadata_uri,
                    certificate_token_id = COALESCE(excluded.certificate_token_id, artworks.certificate_token_id),
                    updated_at = excluded.updated_at
                RETURNING {RECORD_COLUMNS}"
            );
            let record = conn.query_row(
                &sql,
                params![
                    artwork.content_hash.to_hex(),
                    artwork.prompt_hash.to_hex(),
                    artwork.creator.as_str(),
                    artwork.ipfs_cid,
                    artwork.model_used,
                    artwork.metadata_uri,
                    token_id,
                    now,
                ],
                row_to_record,
            )?;
            Ok(record)
        })
        .await
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<ArtworkRecord>> {
        let hash = hash.to_hex();
        self.run(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM artworks WHERE content_hash = ?1"),
                    params![hash],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn find_by_creator(&self, creator: &Creator) -> Result<Vec<ArtworkRecord>> {
        self.list_all(Some(creator)).await
    }

    async fn list_all(&self, creator: Option<&Creator>) -> Result<Vec<ArtworkRecord>> {
        let creator = creator.map(|c| c.as_str().to_string());
        self.run(move |conn| match creator {
            Some(addr) => query_records(
                conn,
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM artworks WHERE creator_address = ?1
                     ORDER BY created_at DESC, id DESC"
                ),
                params![addr],
            ),
            None => query_records(
                conn,
                &format!("SELECT {RECORD_COLUMNS} FROM artworks ORDER BY created_at DESC, id DESC"),
                [],
            ),
        })
        .await
    }

    async fn update_certificate_token_id(&self, hash: &ContentHash, token_id: u64) -> Result<bool> {
        let hash = hash.to_hex();
        let token_id = token_to_sql(token_id)?;
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE artworks SET certificate_token_id = ?2, updated_at = ?3
                 WHERE content_hash = ?1",
                params![hash, token_id, now_millis()],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

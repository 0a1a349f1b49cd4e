//! SQLite knowledge store with migrations
//!
//! Vectors are stored as little-endian `f32` BLOBs tagged with the model
//! that produced them. Similarity search is an exact cosine scan.

use super::{KnowledgeChunk, KnowledgeSource, KnowledgeStore, NewChunk, NewSource, ScoredChunk};
use crate::embedding::cosine_similarity;
use crate::error::{HuntError, Result};
use crate::originality::OriginalityPolicy;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;
use uuid::Uuid;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the knowledge database
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HuntError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        // Pragmas are per connection, so every pooled connection runs them
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        {
            let conn = pool.get()?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                ",
            )?;
        }

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let source_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM knowledge_sources", [], |row| {
                row.get(0)
            })?;

        let chunk_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM knowledge_chunks", [], |row| row.get(0))?;

        let total_chars: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(content)), 0) FROM knowledge_chunks",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            source_count: source_count as usize,
            chunk_count: chunk_count as usize,
            total_chunk_chars: total_chars as u64,
            embedding_models: self.embedding_models()?,
        })
    }
}

impl KnowledgeStore for Database {
    fn similarity_search(
        &self,
        query_vector: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, source_id, ordinal, content, embedding, embedding_model
             FROM knowledge_chunks",
        )?;

        let mut scored = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let chunk = chunk_from_row(row)?;

            if chunk.embedding.len() != query_vector.len() {
                return Err(HuntError::VectorDimensionMismatch {
                    chunk_id: chunk.id,
                    expected: query_vector.len(),
                    actual: chunk.embedding.len(),
                });
            }

            let score = cosine_similarity(query_vector, &chunk.embedding);
            if score >= min_similarity {
                scored.push(ScoredChunk { chunk, score });
            }
        }

        // Best first; equal scores fall back to insertion order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);

        Ok(scored)
    }

    fn embedding_models(&self) -> Result<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT embedding_model FROM knowledge_chunks ORDER BY embedding_model",
        )?;
        let models = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(models)
    }

    fn insert_source(
        &self,
        source: &NewSource,
        chunks: &[NewChunk],
        embedding_model: &str,
    ) -> Result<KnowledgeSource> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let stored = KnowledgeSource {
            id: Uuid::new_v4().to_string(),
            title: source.title.clone(),
            origin_url: source.origin_url.clone(),
            license_note: source.license_note.clone(),
            content_hash: source.content_hash.clone(),
            created_at: Utc::now(),
        };

        tx.execute(
            "INSERT INTO knowledge_sources (id, title, origin_url, license_note, content_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id,
                stored.title,
                stored.origin_url,
                stored.license_note,
                stored.content_hash,
                stored.created_at.timestamp(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO knowledge_chunks (source_id, ordinal, content, embedding, embedding_model, dimension)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for (ordinal, chunk) in chunks.iter().enumerate() {
                stmt.execute(params![
                    stored.id,
                    ordinal as i64,
                    chunk.content,
                    encode_vector(&chunk.embedding),
                    embedding_model,
                    chunk.embedding.len() as i64,
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Stored source {} with {} chunks ({})",
            stored.id,
            chunks.len(),
            embedding_model
        );

        Ok(stored)
    }

    fn find_source_by_hash(&self, content_hash: &str) -> Result<Option<KnowledgeSource>> {
        let conn = self.get_conn()?;
        let source = conn
            .query_row(
                "SELECT id, title, origin_url, license_note, content_hash, created_at
                 FROM knowledge_sources WHERE content_hash = ?1",
                params![content_hash],
                source_from_row,
            )
            .optional()?;
        Ok(source)
    }

    fn list_sources(&self) -> Result<Vec<KnowledgeSource>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, origin_url, license_note, content_hash, created_at
             FROM knowledge_sources ORDER BY created_at, title",
        )?;
        let sources = stmt
            .query_map([], source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn delete_source(&self, id: &str) -> Result<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM knowledge_sources WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(HuntError::SourceNotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn chunk_count(&self, source_id: &str) -> Result<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM knowledge_chunks WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn load_policy(&self) -> Result<Option<OriginalityPolicy>> {
        let conn = self.get_conn()?;
        let policy = conn
            .query_row(
                "SELECT max_cosine_similarity, max_jaccard_overlap
                 FROM originality_policy WHERE id = 1",
                [],
                |row| {
                    Ok(OriginalityPolicy {
                        max_cosine_similarity: row.get::<_, f64>(0)? as f32,
                        max_jaccard_overlap: row.get::<_, f64>(1)? as f32,
                    })
                },
            )
            .optional()?;
        Ok(policy)
    }

    fn save_policy(&self, policy: &OriginalityPolicy) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO originality_policy (id, max_cosine_similarity, max_jaccard_overlap, updated_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                max_cosine_similarity = excluded.max_cosine_similarity,
                max_jaccard_overlap = excluded.max_jaccard_overlap,
                updated_at = excluded.updated_at",
            params![
                policy.max_cosine_similarity as f64,
                policy.max_jaccard_overlap as f64,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeSource> {
    let created_at: i64 = row.get(5)?;
    Ok(KnowledgeSource {
        id: row.get(0)?,
        title: row.get(1)?,
        origin_url: row.get(2)?,
        license_note: row.get(3)?,
        content_hash: row.get(4)?,
        created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
    })
}

fn chunk_from_row(row: &Row<'_>) -> Result<KnowledgeChunk> {
    let id: i64 = row.get(0)?;
    let ordinal: i64 = row.get(2)?;
    let blob: Vec<u8> = row.get(4)?;

    Ok(KnowledgeChunk {
        id,
        source_id: row.get(1)?,
        ordinal: ordinal as usize,
        content: row.get(3)?,
        embedding: decode_vector(id, &blob)?,
        embedding_model: row.get(5)?,
    })
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(chunk_id: i64, bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(HuntError::CorruptVector {
            chunk_id,
            len: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Database statistics
#[derive(Debug)]
pub struct DbStats {
    pub source_count: usize,
    pub chunk_count: usize,
    pub total_chunk_chars: u64,
    pub embedding_models: Vec<String>,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Knowledge base
    r#"
    CREATE TABLE knowledge_sources (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        origin_url TEXT,
        license_note TEXT,
        content_hash TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE knowledge_chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_id TEXT NOT NULL,
        ordinal INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        embedding_model TEXT NOT NULL,
        dimension INTEGER NOT NULL,
        FOREIGN KEY (source_id) REFERENCES knowledge_sources(id) ON DELETE CASCADE,
        UNIQUE (source_id, ordinal)
    );

    CREATE INDEX idx_chunks_source ON knowledge_chunks(source_id);
    CREATE INDEX idx_chunks_model ON knowledge_chunks(embedding_model);
    "#,
    // Migration 2: Originality policy (single row)
    r#"
    CREATE TABLE originality_policy (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        max_cosine_similarity REAL NOT NULL,
        max_jaccard_overlap REAL NOT NULL,
        updated_at INTEGER NOT NULL
    );
    "#,
];

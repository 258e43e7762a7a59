//! Durable feedback log.
//!
//! Append-only sqlite table, source of truth for the feedback index. The
//! embedding is persisted alongside the entry so a startup replay rebuilds
//! the index byte-for-byte without re-embedding anything.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::FeedbackEntry;
use crate::core::errors::RagError;
use crate::retrieval::UserRole;

/// One replayed log record: the entry plus the vector it was indexed under.
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub entry: FeedbackEntry,
    pub embedding: Vec<f32>,
}

pub struct FeedbackStore {
    pool: SqlitePool,
}

impl FeedbackStore {
    pub async fn open(db_path: PathBuf) -> Result<Self, RagError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(RagError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), RagError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedback_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                query TEXT NOT NULL,
                response TEXT NOT NULL,
                updated_response TEXT NOT NULL,
                user_role TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(RagError::internal)?;

        Ok(())
    }

    /// Append one entry. The insert is committed before this returns, so a
    /// crash after `append` never loses the record.
    pub async fn append(
        &self,
        entry: &FeedbackEntry,
        embedding: &[f32],
    ) -> Result<(), RagError> {
        let blob = serialize_embedding(embedding);

        sqlx::query(
            "INSERT INTO feedback_log (id, query, response, updated_response, user_role, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(entry.id.to_string())
        .bind(&entry.query)
        .bind(&entry.response)
        .bind(&entry.updated_response)
        .bind(entry.user_role.as_str())
        .bind(&blob)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RagError::internal)?;

        Ok(())
    }

    /// Read the whole log in append order. Rows that fail to decode are
    /// logged and skipped; replay only errors if the log itself is unreadable.
    pub async fn replay(&self) -> Result<Vec<FeedbackRecord>, RagError> {
        let rows = sqlx::query(
            "SELECT id, query, response, updated_response, user_role, embedding, created_at
             FROM feedback_log
             ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RagError::internal)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            match decode_row(row) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!("Skipping corrupt feedback record {}: {}", id, err);
                }
            }
        }

        Ok(records)
    }

    pub async fn count(&self) -> Result<usize, RagError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback_log")
            .fetch_one(&self.pool)
            .await
            .map_err(RagError::internal)?;
        Ok(count as usize)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<FeedbackRecord, RagError> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id).map_err(RagError::internal)?;

    let role: String = row.get("user_role");
    let user_role = UserRole::parse(&role)?;

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(RagError::internal)?
        .with_timezone(&Utc);

    let blob: Vec<u8> = row.get("embedding");
    let embedding = deserialize_embedding(&blob)?;

    Ok(FeedbackRecord {
        entry: FeedbackEntry {
            id,
            query: row.get("query"),
            response: row.get("response"),
            updated_response: row.get("updated_response"),
            user_role,
            created_at,
        },
        embedding,
    })
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Result<Vec<f32>, RagError> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(RagError::Internal(format!(
            "malformed embedding blob of {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

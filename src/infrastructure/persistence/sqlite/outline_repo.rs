//! SQLite Outline Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{OutlineRecord, OutlineRepositoryPort, RepositoryError};
use crate::domain::OutlineStatus;

/// SQLite Outline Repository
pub struct SqliteOutlineRepository {
    pool: DbPool,
}

impl SqliteOutlineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OutlineRow {
    id: String,
    book_id: String,
    content: String,
    status: String,
    editor_notes: Option<String>,
}

impl TryFrom<OutlineRow> for OutlineRecord {
    type Error = RepositoryError;

    fn try_from(row: OutlineRow) -> Result<Self, Self::Error> {
        Ok(OutlineRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            book_id: Uuid::parse_str(&row.book_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            content: row.content,
            status: OutlineStatus::from_str(&row.status).unwrap_or_default(),
            editor_notes: row.editor_notes,
        })
    }
}

#[async_trait]
impl OutlineRepositoryPort for SqliteOutlineRepository {
    async fn save(&self, outline: &OutlineRecord) -> Result<(), RepositoryError> {
        // 按 book_id upsert: 一书一纲，重复保存原地覆盖而非新增行
        sqlx::query(
            r#"
            INSERT INTO outlines (id, book_id, content, status, editor_notes)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(book_id) DO UPDATE SET
                content = excluded.content,
                status = excluded.status,
                editor_notes = excluded.editor_notes
            "#,
        )
        .bind(outline.id.to_string())
        .bind(outline.book_id.to_string())
        .bind(&outline.content)
        .bind(outline.status.as_str())
        .bind(&outline.editor_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_book_id(
        &self,
        book_id: Uuid,
    ) -> Result<Option<OutlineRecord>, RepositoryError> {
        let row: Option<OutlineRow> = sqlx::query_as(
            "SELECT id, book_id, content, status, editor_notes FROM outlines WHERE book_id = ?",
        )
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(OutlineRecord::try_from).transpose()
    }
}

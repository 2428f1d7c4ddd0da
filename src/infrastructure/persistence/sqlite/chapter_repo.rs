//! SQLite Chapter Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{ChapterRecord, ChapterRepositoryPort, RepositoryError};
use crate::domain::ChapterStatus;

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    book_id: String,
    chapter_number: i64,
    title: String,
    content: Option<String>,
    summary: Option<String>,
    status: String,
    editor_notes: Option<String>,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            book_id: Uuid::parse_str(&row.book_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            number: row.chapter_number as u32,
            title: row.title,
            content: row.content,
            summary: row.summary,
            status: ChapterStatus::from_str(&row.status).unwrap_or_default(),
            editor_notes: row.editor_notes,
        })
    }
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError> {
        // 编号与标题解析后不可变，覆盖时不更新
        sqlx::query(
            r#"
            INSERT INTO chapters (id, book_id, chapter_number, title, content, summary, status, editor_notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                summary = excluded.summary,
                status = excluded.status,
                editor_notes = excluded.editor_notes
            "#,
        )
        .bind(chapter.id.to_string())
        .bind(chapter.book_id.to_string())
        .bind(chapter.number as i64)
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(&chapter.summary)
        .bind(chapter.status.as_str())
        .bind(&chapter.editor_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn insert_missing(&self, chapters: &[ChapterRecord]) -> Result<usize, RepositoryError> {
        if chapters.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0usize;
        // 已存在的 (book_id, chapter_number) 跳过，不重复也不重置
        for chapter in chapters {
            let result = sqlx::query(
                r#"
                INSERT INTO chapters (id, book_id, chapter_number, title, content, summary, status, editor_notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(book_id, chapter_number) DO NOTHING
                "#,
            )
            .bind(chapter.id.to_string())
            .bind(chapter.book_id.to_string())
            .bind(chapter.number as i64)
            .bind(&chapter.title)
            .bind(&chapter.content)
            .bind(&chapter.summary)
            .bind(chapter.status.as_str())
            .bind(&chapter.editor_notes)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(
            "SELECT id, book_id, chapter_number, title, content, summary, status, editor_notes FROM chapters WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_by_book_id(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(
            "SELECT id, book_id, chapter_number, title, content, summary, status, editor_notes FROM chapters WHERE book_id = ? ORDER BY chapter_number",
        )
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }
}

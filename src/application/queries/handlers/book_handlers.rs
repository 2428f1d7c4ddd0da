//! Book Query Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRecord, BookRepositoryPort, ChapterRecord, ChapterRepositoryPort, OutlineRecord,
    OutlineRepositoryPort,
};
use crate::application::queries::{GetBook, GetChapter, ListBooks};

// ============================================================================
// Response DTOs
// ============================================================================

/// 书籍列表项
#[derive(Debug, Clone)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: String,
}

impl From<BookRecord> for BookSummary {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            status: record.status.as_str().to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// 大纲视图
#[derive(Debug, Clone)]
pub struct OutlineView {
    pub status: String,
    pub content: String,
    pub editor_notes: Option<String>,
}

impl From<OutlineRecord> for OutlineView {
    fn from(record: OutlineRecord) -> Self {
        Self {
            status: record.status.as_str().to_string(),
            content: record.content,
            editor_notes: record.editor_notes,
        }
    }
}

/// 章节概览（不含全文）
#[derive(Debug, Clone)]
pub struct ChapterOverview {
    pub id: Uuid,
    pub number: u32,
    pub title: String,
    pub status: String,
    pub has_content: bool,
    pub has_summary: bool,
}

impl From<&ChapterRecord> for ChapterOverview {
    fn from(record: &ChapterRecord) -> Self {
        Self {
            id: record.id,
            number: record.number,
            title: record.title.clone(),
            status: record.status.as_str().to_string(),
            has_content: record.content.is_some(),
            has_summary: record.summary.is_some(),
        }
    }
}

/// 书籍详情
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: String,
    pub outline: Option<OutlineView>,
    pub chapters: Vec<ChapterOverview>,
    /// 派生的活跃章节编号（编号最小的未批准章节），读取时现算
    pub active_chapter: Option<u32>,
}

/// 章节全文
#[derive(Debug, Clone)]
pub struct ChapterDetail {
    pub id: Uuid,
    pub book_id: Uuid,
    pub number: u32,
    pub title: String,
    pub status: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub editor_notes: Option<String>,
}

impl From<ChapterRecord> for ChapterDetail {
    fn from(record: ChapterRecord) -> Self {
        Self {
            id: record.id,
            book_id: record.book_id,
            number: record.number,
            title: record.title,
            status: record.status.as_str().to_string(),
            content: record.content,
            summary: record.summary,
            editor_notes: record.editor_notes,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// ListBooks Handler
pub struct ListBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(
        &self,
        _query: ListBooks,
    ) -> Result<Vec<BookSummary>, ApplicationError> {
        let books = self.book_repo.find_all().await?;
        Ok(books.into_iter().map(BookSummary::from).collect())
    }
}

/// GetBook Handler
pub struct GetBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
        }
    }

    pub async fn handle(
        &self,
        query: GetBook,
    ) -> Result<BookDetail, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(query.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        let outline = self.outline_repo.find_by_book_id(book.id).await?;
        let chapters = self.chapter_repo.find_by_book_id(book.id).await?;

        let active_chapter = chapters
            .iter()
            .find(|c| !c.status.is_approved())
            .map(|c| c.number);

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            status: book.status.as_str().to_string(),
            created_at: book.created_at.to_rfc3339(),
            outline: outline.map(OutlineView::from),
            chapters: chapters.iter().map(ChapterOverview::from).collect(),
            active_chapter,
        })
    }
}

/// GetChapter Handler
pub struct GetChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetChapterHandler {
    pub fn new(chapter_repo: Arc<dyn ChapterRepositoryPort>) -> Self {
        Self { chapter_repo }
    }

    pub async fn handle(
        &self,
        query: GetChapter,
    ) -> Result<ChapterDetail, ApplicationError> {
        let chapter = self
            .chapter_repo
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        Ok(ChapterDetail::from(chapter))
    }
}

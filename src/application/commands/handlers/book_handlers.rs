//! Book Command Handlers

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CompileBook, CreateBook, DeleteBook};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRecord, BookRepositoryPort, ChapterRepositoryPort, LlmEnginePort, OutlineRecord,
    OutlineRepositoryPort,
};
use crate::domain::{BookStatus, OutlineStatus};

// ============================================================================
// CreateBook
// ============================================================================

/// 创建书籍响应
#[derive(Debug, Clone)]
pub struct CreateBookResponse {
    pub id: Uuid,
    pub title: String,
    pub status: BookStatus,
    pub outline_status: OutlineStatus,
}

/// CreateBook Handler - 创建 PLANNING 状态的书籍并同步生成大纲初稿
pub struct CreateBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl CreateBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            llm_engine,
        }
    }

    pub async fn handle(&self, command: CreateBook) -> Result<CreateBookResponse, ApplicationError> {
        if command.title.trim().is_empty() {
            return Err(ApplicationError::validation("Book title is required"));
        }

        let book = BookRecord::new(command.title.trim());
        self.book_repo.save(&book).await?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            "Book created, generating outline"
        );

        // 大纲随创建同步生成，失败同样作为内容落库
        let outcome = self
            .llm_engine
            .generate_outline(&book.title, &command.notes)
            .await;

        if outcome.is_failure() {
            tracing::warn!(
                book_id = %book.id,
                "Outline generation returned failure marker; storing as content"
            );
        }

        let outline = OutlineRecord {
            id: Uuid::new_v4(),
            book_id: book.id,
            content: outcome.into_text(),
            status: OutlineStatus::WaitingForReview,
            editor_notes: None,
        };
        self.outline_repo.save(&outline).await?;

        Ok(CreateBookResponse {
            id: book.id,
            title: book.title,
            status: book.status,
            outline_status: outline.status,
        })
    }
}

// ============================================================================
// DeleteBook
// ============================================================================

/// DeleteBook Handler - 级联删除大纲与全部章节
pub struct DeleteBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl DeleteBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, command: DeleteBook) -> Result<(), ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        self.book_repo.delete(book.id).await?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            "Book deleted"
        );

        Ok(())
    }
}

// ============================================================================
// CompileBook
// ============================================================================

/// 编译响应
#[derive(Debug, Clone)]
pub struct CompileBookResponse {
    pub book_id: Uuid,
    pub status: BookStatus,
    pub chapters: usize,
    /// 成品文本文件路径
    pub output_path: PathBuf,
}

/// CompileBook Handler
///
/// 全部章节批准后把整本书拼成单个文本文件，
/// 并应用 WRITING_CHAPTERS -> COMPLETED 转移。
/// 已完成的书可重新编译，不再发生转移。
pub struct CompileBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    books_dir: PathBuf,
}

impl CompileBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        books_dir: PathBuf,
    ) -> Self {
        Self {
            book_repo,
            chapter_repo,
            books_dir,
        }
    }

    pub async fn handle(
        &self,
        command: CompileBook,
    ) -> Result<CompileBookResponse, ApplicationError> {
        let mut book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let chapters = self.chapter_repo.find_by_book_id(book.id).await?;
        if chapters.is_empty() {
            return Err(ApplicationError::invalid_state(
                "Book has no chapters to compile".to_string(),
            ));
        }

        let unapproved = chapters.iter().filter(|c| !c.status.is_approved()).count();
        if unapproved > 0 {
            return Err(ApplicationError::invalid_state(format!(
                "{} of {} chapters not yet approved",
                unapproved,
                chapters.len()
            )));
        }

        let mut text = String::new();
        text.push_str(&book.title);
        text.push_str("\n\n");
        for chapter in &chapters {
            text.push_str(&format!("Chapter {}: {}\n\n", chapter.number, chapter.title));
            if let Some(content) = &chapter.content {
                text.push_str(content);
            }
            text.push_str("\n\n");
        }

        let filename = format!("{}_Final.txt", sanitize_title(&book.title));
        let output_path = self.books_dir.join(filename);

        tokio::fs::create_dir_all(&self.books_dir)
            .await
            .map_err(|e| ApplicationError::internal(format!("Failed to create books dir: {}", e)))?;
        tokio::fs::write(&output_path, &text)
            .await
            .map_err(|e| ApplicationError::internal(format!("Failed to write book file: {}", e)))?;

        if book.status != BookStatus::Completed {
            book.status = book.status.transition(BookStatus::Completed)?;
            book.updated_at = chrono::Utc::now();
            self.book_repo.save(&book).await?;
        }

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            chapters = chapters.len(),
            path = %output_path.display(),
            "Book compiled"
        );

        Ok(CompileBookResponse {
            book_id: book.id,
            status: book.status,
            chapters: chapters.len(),
            output_path,
        })
    }
}

/// 书名 -> 文件系统安全的文件名片段
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("My Great Book"), "My_Great_Book");
        assert_eq!(sanitize_title("a/b\\c: d?"), "a_b_c__d_");
        assert_eq!(sanitize_title("中文书名"), "中文书名");
    }
}

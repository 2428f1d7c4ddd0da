//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    // Command handlers
    ApproveChapterHandler, ApproveOutlineHandler, CompileBookHandler, CreateBookHandler,
    DeleteBookHandler, DraftOutlineHandler, GenerateNextChapterHandler, RegenerateChapterHandler,
    ReparseChaptersHandler, ReviseOutlineHandler,
    // Ports
    ports::{BookRepositoryPort, ChapterRepositoryPort, LlmEnginePort, OutlineRepositoryPort},
    // Query handlers
    queries::handlers::{GetBookHandler, GetChapterHandler, ListBooksHandler},
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub outline_repo: Arc<dyn OutlineRepositoryPort>,
    pub chapter_repo: Arc<dyn ChapterRepositoryPort>,
    pub llm_engine: Arc<dyn LlmEnginePort>,

    // ========== Command Handlers ==========
    pub create_book_handler: CreateBookHandler,
    pub delete_book_handler: DeleteBookHandler,
    pub compile_book_handler: CompileBookHandler,
    pub draft_outline_handler: DraftOutlineHandler,
    pub revise_outline_handler: ReviseOutlineHandler,
    pub approve_outline_handler: ApproveOutlineHandler,
    pub reparse_chapters_handler: ReparseChaptersHandler,
    pub generate_chapter_handler: GenerateNextChapterHandler,
    pub approve_chapter_handler: ApproveChapterHandler,
    pub regenerate_chapter_handler: RegenerateChapterHandler,

    // ========== Query Handlers ==========
    pub list_books_handler: ListBooksHandler,
    pub get_book_handler: GetBookHandler,
    pub get_chapter_handler: GetChapterHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
        books_dir: PathBuf,
    ) -> Self {
        Self {
            // Ports
            book_repo: book_repo.clone(),
            outline_repo: outline_repo.clone(),
            chapter_repo: chapter_repo.clone(),
            llm_engine: llm_engine.clone(),

            // Command handlers
            create_book_handler: CreateBookHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                llm_engine.clone(),
            ),
            delete_book_handler: DeleteBookHandler::new(book_repo.clone()),
            compile_book_handler: CompileBookHandler::new(
                book_repo.clone(),
                chapter_repo.clone(),
                books_dir,
            ),
            draft_outline_handler: DraftOutlineHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                llm_engine.clone(),
            ),
            revise_outline_handler: ReviseOutlineHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                llm_engine.clone(),
            ),
            approve_outline_handler: ApproveOutlineHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
            ),
            reparse_chapters_handler: ReparseChaptersHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
            ),
            generate_chapter_handler: GenerateNextChapterHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
                llm_engine.clone(),
            ),
            approve_chapter_handler: ApproveChapterHandler::new(
                chapter_repo.clone(),
                llm_engine.clone(),
            ),
            regenerate_chapter_handler: RegenerateChapterHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
                llm_engine.clone(),
            ),

            // Query handlers
            list_books_handler: ListBooksHandler::new(book_repo.clone()),
            get_book_handler: GetBookHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
            ),
            get_chapter_handler: GetChapterHandler::new(chapter_repo.clone()),
        }
    }
}

//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LlmEngine、Repositories）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{
        ApproveChapterHandler, ApproveChapterResponse, ApproveOutlineHandler,
        ApproveOutlineResponse, ChapterResponse, CompileBookHandler, CompileBookResponse,
        CreateBookHandler, CreateBookResponse, DeleteBookHandler, DraftOutlineHandler,
        GenerateChapterOutcome, GenerateNextChapterHandler, OutlineResponse,
        RegenerateChapterHandler, ReparseChaptersHandler, ReparseChaptersResponse,
        ReviseOutlineHandler,
    },
    ApproveChapter, ApproveOutline, CompileBook, CreateBook, DeleteBook, DraftOutline,
    GenerateNextChapter, RegenerateChapter, ReparseChapters, ReviseOutline,
};
pub use error::ApplicationError;
pub use ports::RepositoryError;
pub use queries::{GetBook, GetChapter, ListBooks};

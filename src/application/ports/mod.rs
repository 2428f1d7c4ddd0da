//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod llm_engine;
mod repositories;

pub use llm_engine::{ChapterPrompt, GenerationOutcome, LlmEnginePort};
pub use repositories::{
    BookRecord, BookRepositoryPort, ChapterRecord, ChapterRepositoryPort, OutlineRecord,
    OutlineRepositoryPort, RepositoryError,
};

//! Domain Layer - 领域层
//!
//! 纯逻辑，无 I/O:
//! - workflow: Book / Outline / Chapter 状态机与转移表
//! - outline_parser: 大纲文本 -> 章节候选
//! - context: 章节生成上下文压缩

mod context;
mod outline_parser;
mod workflow;

pub use context::{assemble_context, ChapterBrief};
pub use outline_parser::{parse_outline, ParsedChapter};
pub use workflow::{BookStatus, ChapterStatus, OutlineStatus, TransitionError};

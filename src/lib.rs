//! Bookforge - 人机协同的书籍生成工作流
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - workflow: Book / Outline / Chapter 状态机与转移表
//! - outline_parser: 大纲文本启发式解析
//! - context: 章节生成上下文压缩（用摘要替代前文全文）
//!
//! 应用层 (application/):
//! - Ports: 端口定义（LlmEngine, Repositories）
//! - Commands: CQRS 命令处理器（建书、大纲审阅、章节写作、编译）
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Persistence: SQLite 存储
//! - Adapters: LLM Client（HTTP / Fake）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

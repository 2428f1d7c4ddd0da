//! LLM Engine Port - 文本生成后端抽象
//!
//! 定义四种生成操作的抽象接口，具体实现在 infrastructure/adapters 层。
//!
//! 生成失败不走错误通道: 后端把失败折叠为 `GenerationOutcome::Failure`，
//! 编排层照常把它写入实体内容并进入待审阅状态，由审阅人显式要求重写。
//! 对只会说 "Error:" 标记字符串的后端，`from_text` / `into_text`
//! 在边界上做双向转换，内部代码始终基于标签分支，不做字符串前缀判断。

use async_trait::async_trait;

/// 生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// 正常生成的文本
    Text(String),
    /// 生成失败及原因
    Failure(String),
}

impl GenerationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, GenerationOutcome::Failure(_))
    }

    /// 渲染为对外文本，失败以 "Error:" 标记开头
    pub fn into_text(self) -> String {
        match self {
            GenerationOutcome::Text(text) => text,
            GenerationOutcome::Failure(reason) => format!("Error: {}", reason),
        }
    }

    /// 从标记字符串识别失败（"Error:" 或 "Error " 前缀）
    pub fn from_text(text: String) -> Self {
        if text.starts_with("Error:") || text.starts_with("Error ") {
            GenerationOutcome::Failure(
                text.trim_start_matches("Error:")
                    .trim_start_matches("Error")
                    .trim()
                    .to_string(),
            )
        } else {
            GenerationOutcome::Text(text)
        }
    }
}

/// 章节生成请求
#[derive(Debug, Clone)]
pub struct ChapterPrompt {
    pub book_title: String,
    pub chapter_title: String,
    /// 完整大纲文本，作为全书结构参照
    pub outline: String,
    /// 前文摘要上下文，空串表示这是第一章
    pub prior_context: String,
    /// 本章的作者批注
    pub notes: String,
}

/// LLM Engine Port
///
/// 外部文本生成服务的抽象接口。四个方法都不会失败:
/// 传输层错误同样折叠进 `GenerationOutcome::Failure`。
#[async_trait]
pub trait LlmEnginePort: Send + Sync {
    /// 根据书名与构思笔记生成大纲初稿
    async fn generate_outline(&self, title: &str, notes: &str) -> GenerationOutcome;

    /// 根据编辑反馈重写现有大纲
    async fn regenerate_outline(&self, current_outline: &str, feedback: &str) -> GenerationOutcome;

    /// 生成整章内容
    async fn generate_chapter(&self, prompt: ChapterPrompt) -> GenerationOutcome;

    /// 压缩章节内容为简短摘要（供后续章节作为上下文）
    async fn summarize(&self, content: &str) -> GenerationOutcome;

    /// 检查生成服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

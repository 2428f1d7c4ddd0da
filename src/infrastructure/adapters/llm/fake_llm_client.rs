//! Fake LLM Client - 用于测试的生成客户端
//!
//! 确定性输出，不实际调用生成服务；记录收到的请求供测试断言。

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{ChapterPrompt, GenerationOutcome, LlmEnginePort};

/// Fake LLM Client 配置
#[derive(Debug, Clone)]
pub struct FakeLlmClientConfig {
    /// 生成的大纲包含几个章节标题
    pub outline_chapters: usize,
    /// 设置后所有调用返回该失败
    pub fail_with: Option<String>,
}

impl Default for FakeLlmClientConfig {
    fn default() -> Self {
        Self {
            outline_chapters: 3,
            fail_with: None,
        }
    }
}

/// 记录的调用
#[derive(Debug, Clone)]
pub enum LlmCall {
    Outline { title: String, notes: String },
    OutlineRevision { feedback: String },
    Chapter(ChapterPrompt),
    Summary { content_len: usize },
}

/// Fake LLM Client
pub struct FakeLlmClient {
    config: FakeLlmClientConfig,
    calls: Mutex<Vec<LlmCall>>,
}

impl FakeLlmClient {
    pub fn new(config: FakeLlmClientConfig) -> Self {
        Self {
            config,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 默认配置: 3 章大纲，全部调用成功
    pub fn with_defaults() -> Self {
        Self::new(FakeLlmClientConfig::default())
    }

    /// 所有调用都失败的客户端
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new(FakeLlmClientConfig {
            fail_with: Some(reason.into()),
            ..FakeLlmClientConfig::default()
        })
    }

    /// 全部已记录的调用
    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 最近一次章节生成请求
    pub fn last_chapter_prompt(&self) -> Option<ChapterPrompt> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|c| match c {
                LlmCall::Chapter(prompt) => Some(prompt.clone()),
                _ => None,
            })
    }

    fn record(&self, call: LlmCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(&self, text: String) -> GenerationOutcome {
        match &self.config.fail_with {
            Some(reason) => GenerationOutcome::Failure(reason.clone()),
            None => GenerationOutcome::Text(text),
        }
    }
}

#[async_trait]
impl LlmEnginePort for FakeLlmClient {
    async fn generate_outline(&self, title: &str, notes: &str) -> GenerationOutcome {
        self.record(LlmCall::Outline {
            title: title.to_string(),
            notes: notes.to_string(),
        });

        let mut outline = format!("Outline for {}\n", title);
        for n in 1..=self.config.outline_chapters {
            outline.push_str(&format!("Chapter {}: Part {}\nA brief description.\n", n, n));
        }
        self.outcome(outline)
    }

    async fn regenerate_outline(&self, current_outline: &str, feedback: &str) -> GenerationOutcome {
        self.record(LlmCall::OutlineRevision {
            feedback: feedback.to_string(),
        });
        self.outcome(format!("{}\nRevised per: {}", current_outline, feedback))
    }

    async fn generate_chapter(&self, prompt: ChapterPrompt) -> GenerationOutcome {
        let text = format!("Full draft of '{}'.", prompt.chapter_title);
        self.record(LlmCall::Chapter(prompt));
        self.outcome(text)
    }

    async fn summarize(&self, content: &str) -> GenerationOutcome {
        self.record(LlmCall::Summary {
            content_len: content.len(),
        });
        let head: String = content.chars().take(24).collect();
        self.outcome(format!("Summary({})", head))
    }
}

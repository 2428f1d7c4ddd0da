//! HTTP LLM Client - 调用 OpenAI 兼容的对话补全服务
//!
//! 实现 LlmEnginePort trait，通过 HTTP 调用外部生成服务（如 Groq）
//!
//! 外部 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [...], "temperature": ...}  (JSON, Bearer 鉴权)
//! Response: {"choices": [{"message": {"content": "..."}}]}
//!
//! 任何传输/服务错误都折叠为 `GenerationOutcome::Failure`，
//! 由编排层按普通内容落库，这里不抛错。

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{ChapterPrompt, GenerationOutcome, LlmEnginePort};

/// 摘要输入的最大长度（字符），超出部分截断
const SUMMARY_INPUT_LIMIT: usize = 15_000;

/// 对话补全请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// HTTP LLM 客户端配置
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// 服务基础 URL（OpenAI 兼容）
    pub base_url: String,
    /// API Key，空串表示未配置
    pub api_key: String,
    /// 模型名
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 最大重试次数
    pub max_retries: u32,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "openai/gpt-oss-20b".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// HTTP LLM 客户端
pub struct HttpLlmClient {
    client: Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    /// 创建新的 HTTP LLM 客户端
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// 发送一次对话补全请求，带重试
    async fn chat(
        &self,
        system: &str,
        prompt: String,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> GenerationOutcome {
        if self.config.api_key.is_empty() {
            return GenerationOutcome::Failure("LLM API key not configured".to_string());
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let mut last_error = String::new();
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(attempt = attempt, "Retrying chat completion");
            }

            match self.send_once(&request).await {
                Ok(content) => return GenerationOutcome::Text(content),
                Err(e) => {
                    tracing::warn!(attempt = attempt, error = %e, "Chat completion failed");
                    last_error = e;
                }
            }
        }

        GenerationOutcome::Failure(last_error)
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, String> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    "Request timeout".to_string()
                } else if e.is_connect() {
                    format!("Cannot connect to LLM service: {}", e)
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid response: {}", e))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| "Response contained no choices".to_string())
    }
}

#[async_trait]
impl LlmEnginePort for HttpLlmClient {
    async fn generate_outline(&self, title: &str, notes: &str) -> GenerationOutcome {
        let prompt = format!(
            "You are an expert book editor and ghostwriter.\n\
             Create a detailed, chapter-by-chapter outline for a book titled: \"{}\".\n\
             \n\
             Additional Author Notes:\n\
             {}\n\
             \n\
             Format:\n\
             - Provide a list of Chapters (1 to N).\n\
             - For each chapter, provide a Title and a brief 1-sentence description.\n\
             - Do not write the chapters yet.\n\
             - Output ONLY the outline.",
            title, notes
        );

        tracing::debug!(title = %title, "Requesting outline generation");
        self.chat("You are a professional book outliner.", prompt, 0.7, None)
            .await
    }

    async fn regenerate_outline(&self, current_outline: &str, feedback: &str) -> GenerationOutcome {
        let prompt = format!(
            "Current Outline:\n\
             {}\n\
             \n\
             Editor Feedback needed for revisions:\n\
             {}\n\
             \n\
             Please rewrite the outline satisfying the feedback. Keep the structure clear.",
            current_outline, feedback
        );

        tracing::debug!("Requesting outline revision");
        self.chat("You are a professional book editor.", prompt, 0.7, None)
            .await
    }

    async fn generate_chapter(&self, prompt: ChapterPrompt) -> GenerationOutcome {
        // 空上下文必须显式告知这是第一章
        let context = if prompt.prior_context.is_empty() {
            "This is the first chapter.\n".to_string()
        } else {
            format!(
                "STORY SO FAR (Summaries of previous chapters):\n{}\n",
                prompt.prior_context
            )
        };

        let notes = if prompt.notes.is_empty() {
            "None"
        } else {
            prompt.notes.as_str()
        };

        let user_prompt = format!(
            "Book Title: {}\n\
             Current Chapter: {}\n\
             \n\
             Full Book Outline Reference:\n\
             {}\n\
             \n\
             Context:\n\
             {}\n\
             Specific Author Notes for this Chapter:\n\
             {}\n\
             \n\
             Task:\n\
             Write the complete content for '{}'.\n\
             Write in an engaging style suitable for the topic.\n\
             Ensure continuity with previous chapters.",
            prompt.book_title,
            prompt.chapter_title,
            prompt.outline,
            context,
            notes,
            prompt.chapter_title
        );

        tracing::debug!(
            chapter_title = %prompt.chapter_title,
            context_len = prompt.prior_context.len(),
            "Requesting chapter generation"
        );
        // 更高温度换取创造性，长章节需要放宽输出上限
        self.chat("You are a best-selling author.", user_prompt, 0.8, Some(6000))
            .await
    }

    async fn summarize(&self, content: &str) -> GenerationOutcome {
        let truncated: String = content.chars().take(SUMMARY_INPUT_LIMIT).collect();
        let prompt = format!(
            "Summarize the following chapter content into a concise paragraph (approx 150 words).\n\
             Focus on key plot points or information that is necessary for future context.\n\
             \n\
             Content:\n\
             {}",
            truncated
        );

        tracing::debug!(content_len = content.len(), "Requesting summary");
        self.chat("You are a summarizer bot.", prompt, 0.3, None).await
    }

    async fn health_check(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

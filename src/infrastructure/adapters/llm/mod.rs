//! LLM Adapters - 生成服务客户端

mod fake_llm_client;
mod http_llm_client;

pub use fake_llm_client::{FakeLlmClient, FakeLlmClientConfig, LlmCall};
pub use http_llm_client::{HttpLlmClient, HttpLlmClientConfig};

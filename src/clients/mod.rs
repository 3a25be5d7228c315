//! 传输层（Clients）
//!
//! 只负责与远程服务通信，返回带类型的错误，不做重试也不做限流。
//! 限流和"失败即缺失信号"的处理由 `services` 层负责。

use async_trait::async_trait;

use crate::error::AppResult;

pub mod llm_client;
pub mod rerank_client;

pub use llm_client::LlmClient;
pub use rerank_client::RerankClient;

/// 语义相似度评分后端
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// 计算两段文本的相似度
    async fn score(&self, text_1: &str, text_2: &str) -> AppResult<f64>;

    /// 一次请求计算 query 与多个候选的相似度，结果与候选一一对应
    async fn score_many(&self, query: &str, candidates: &[String]) -> AppResult<Vec<f64>>;
}

/// 生成式聊天后端
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 发送单条用户消息，返回模型回复文本
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

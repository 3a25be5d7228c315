//! 评分服务 - 业务能力层
//!
//! 对一对文本（原文, 译文）发起一次远程评分，返回 [`ScoreSignal`]。
//!
//! - 相似度模式：调用 reranker，直接使用返回的分数
//! - 判断模式：调用 LLM 判断正误，正确 1.0，错误或无法判断 0.0
//!
//! 任何网络错误、超时、非 200 状态或无法解析的响应都变成 `None`，
//! 不会向上抛出错误。所有远程调用都要先拿到共享信号量的许可。

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::clients::{ChatBackend, SimilarityBackend};
use crate::error::AppError;
use crate::models::{ScoreMode, ScoreSignal};
use crate::services::judgment::{classify, Verdict};
use crate::services::prompts::{build_judgment_prompt, TargetLanguage};
use crate::utils::text::truncate_text;

/// 评分所用的远程后端
#[derive(Clone)]
pub enum ScoringBackend {
    Similarity(Arc<dyn SimilarityBackend>),
    Judgment(Arc<dyn ChatBackend>),
}

/// 评分服务
///
/// 职责：
/// - 只处理一对文本
/// - 把远程失败转换为缺失信号
/// - 通过共享信号量限制整个运行期间同时进行的远程请求数
#[derive(Clone)]
pub struct ScoringService {
    backend: ScoringBackend,
    gate: Arc<Semaphore>,
    diagnostics: bool,
}

impl ScoringService {
    /// 创建新的评分服务
    ///
    /// `gate` 在整个运行中共享，限制的是最内层的远程调用而不是单词数。
    pub fn new(backend: ScoringBackend, gate: Arc<Semaphore>) -> Self {
        Self {
            backend,
            gate,
            diagnostics: false,
        }
    }

    /// 记录无法判断的 LLM 回复
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn mode(&self) -> ScoreMode {
        match self.backend {
            ScoringBackend::Similarity(_) => ScoreMode::Similarity,
            ScoringBackend::Judgment(_) => ScoreMode::Judgment,
        }
    }

    /// 对一对文本评分
    ///
    /// # 返回
    /// - `Some(score)`：获得结论（判断模式下为 0.0 或 1.0）
    /// - `None`：远程调用失败，不参与汇总
    pub async fn score(&self, source: &str, candidate: &str, language: TargetLanguage) -> ScoreSignal {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("信号量已关闭: {}", e);
                return None;
            }
        };

        match &self.backend {
            ScoringBackend::Similarity(client) => match client.score(source, candidate).await {
                Ok(score) => Some(score),
                Err(e) => {
                    log_failure("相似度评分", source, candidate, &e);
                    None
                }
            },
            ScoringBackend::Judgment(client) => {
                let prompt = build_judgment_prompt(source, candidate, language);
                match client.complete(&prompt).await {
                    Ok(reply) => Some(self.judge(&reply, source, candidate)),
                    Err(e) => {
                        log_failure("LLM 判断", source, candidate, &e);
                        None
                    }
                }
            }
        }
    }

    fn judge(&self, reply: &str, source: &str, candidate: &str) -> f64 {
        let verdict = classify(reply);
        if verdict == Verdict::Ambiguous && self.diagnostics {
            debug!(
                "无法判断的回复，按 incorrect 处理 ({} / {}): {}",
                source,
                candidate,
                truncate_text(reply, 200)
            );
        }
        verdict.signal()
    }
}

/// 远程失败记为 debug，其它错误记为 warn
fn log_failure(what: &str, source: &str, candidate: &str, error: &AppError) {
    if error.is_remote() {
        debug!("{}失败 ({} / {}): {}", what, source, candidate, error);
    } else {
        warn!("{}失败 ({} / {}): {}", what, source, candidate, error);
    }
}

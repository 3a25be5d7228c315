//! 单词重新生成流程 - 流程层
//!
//! 流程顺序：
//! 1. 根据当前（有问题的）内容构建提示词
//! 2. 获取信号量许可后调用 LLM
//! 3. 去掉 markdown 代码块标记，解析为 JSON
//! 4. 请求失败、回复为空或无法解析时整体重试，直到次数用尽

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::clients::ChatBackend;
use crate::models::{RegeneratedContent, RegenerationOutcome, VocabularyEntry};
use crate::services::prompts::build_regeneration_prompt;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use crate::utils::text::{strip_code_fence, truncate_text};
use crate::workflow::word_ctx::WordCtx;

/// 单词重新生成流程
///
/// - 只负责"一个单词"，不读写任何文件
/// - 选择哪些单词由编排层根据评估报告决定
#[derive(Clone)]
pub struct RegenerateFlow {
    chat: Arc<dyn ChatBackend>,
    gate: Arc<Semaphore>,
    policy: RetryPolicy,
}

impl RegenerateFlow {
    pub fn new(chat: Arc<dyn ChatBackend>, gate: Arc<Semaphore>, policy: RetryPolicy) -> Self {
        Self { chat, gate, policy }
    }

    /// 为一个单词生成新内容
    ///
    /// # 返回
    /// `content` 为 `None` 表示重试耗尽；`attempts` 为实际调用次数
    pub async fn regenerate(&self, ctx: &WordCtx, entry: &VocabularyEntry) -> RegenerationOutcome {
        let prompt = build_regeneration_prompt(&ctx.word, entry);

        let (content, attempts) =
            retry_with_backoff(self.policy, |attempt| self.attempt(ctx, &prompt, attempt)).await;

        match &content {
            Some(_) => info!("{} ✓ 已生成新内容 (尝试 {} 次)", ctx, attempts),
            None => warn!("{} ❌ {} 次尝试后仍未得到有效回复", ctx, attempts),
        }

        RegenerationOutcome {
            word: ctx.word.clone(),
            content,
            attempts,
        }
    }

    async fn attempt(&self, ctx: &WordCtx, prompt: &str, attempt: usize) -> Option<RegeneratedContent> {
        let reply = {
            let _permit = self.gate.acquire().await.ok()?;
            self.chat.complete(prompt).await
        };

        match reply {
            Ok(reply) => {
                let parsed = parse_regenerated(&reply);
                if parsed.is_none() {
                    warn!(
                        "{} 第 {} 次尝试: 回复无法解析: {}",
                        ctx,
                        attempt,
                        truncate_text(&reply, 200)
                    );
                }
                parsed
            }
            Err(e) => {
                warn!("{} 第 {} 次尝试: 请求失败: {}", ctx, attempt, e);
                None
            }
        }
    }
}

/// 解析 LLM 回复
///
/// 空回复、非 JSON 对象或不含任何已知字段的对象都视为无效。
pub fn parse_regenerated(reply: &str) -> Option<RegeneratedContent> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return None;
    }
    let content: RegeneratedContent = match serde_json::from_str(&body) {
        Ok(content) => content,
        Err(e) => {
            debug!("JSON 解析失败: {}", e);
            return None;
        }
    };
    (!content.is_empty()).then_some(content)
}

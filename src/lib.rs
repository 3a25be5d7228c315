//! # Vocab Quality
//!
//! 日语词汇卡片（俄语 / 英语翻译 + 例句）的质量评估与重新生成工具
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 传输层（Clients）
//! - `clients/` - 只负责与远程服务通信，返回带类型的错误
//! - `RerankClient` - reranker `/score` 接口（单条与批量）
//! - `LlmClient` - OpenAI 兼容的 `/chat/completions` 接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理一对文本
//! - `ScoringService` - 评分能力，失败即缺失信号，受共享信号量限流
//! - `judgment` - 解析 LLM 的正误判断
//! - `prompts` - 判断与重新生成的提示词
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个单词"的完整处理流程
//! - `WordCtx` - 上下文封装（level + word）
//! - `EvaluateFlow` - 拆分评分对 → 并发评分 → 汇总
//! - `RegenerateFlow` - 提示词 → LLM → 解析 → 有限次重试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_evaluator` - 批量评估词汇文件，写出报告
//! - `orchestrator/batch_regenerator` - 按报告选择单词，重新生成并保存
//!
//! 另有 `storage/`（带备份的原子写入）、`tools/`（拆分、合并、精简、
//! 恢复、相关词、统计）与 `utils/`（日志、重试、进度）。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod tools;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ChatBackend, LlmClient, RerankClient, SimilarityBackend};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{EvaluationRecord, ScoreMode, Vocabulary, VocabularyEntry};
pub use orchestrator::{BatchEvaluator, BatchRegenerator, EvaluateOptions, RegenerateOptions, RegenerationStats};
pub use services::{ScoringBackend, ScoringService};
pub use storage::VocabularyStore;
pub use workflow::{EvaluateFlow, RegenerateFlow, WordCtx};

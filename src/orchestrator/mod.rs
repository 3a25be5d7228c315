//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度：选择输入文件、并发提交单词、汇总统计、写出结果。
//!
//! ## 模块划分
//!
//! ### `batch_evaluator` - 批量评估
//! - 按 glob 或显式列表选择词汇文件
//! - 并发评估每个文件中的所有单词（FuturesUnordered）
//! - 按单词排序后写出评估报告
//! - 输出每个文件的统计信息
//!
//! ### `batch_regenerator` - 批量重新生成
//! - 读取评估报告，选出候选单词
//! - 跳过词汇表中不存在的单词
//! - 并发重新生成，合并后带备份保存，或写出对照文件
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_evaluator / batch_regenerator (处理目录中的所有文件)
//!     ↓
//! workflow::EvaluateFlow / RegenerateFlow (处理单个单词)
//!     ↓
//! services (能力层：评分 / 判断解析 / 提示词)
//!     ↓
//! clients (传输层：reranker / LLM)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → clients
//! 2. **唯一的并发闸门**：信号量在入口创建一次，所有远程调用共享
//! 3. **无业务逻辑**：只做调度、持久化和统计

pub mod batch_evaluator;
pub mod batch_regenerator;

pub use batch_evaluator::{select_files, BatchEvaluator, EvaluateOptions, FileSummary};
pub use batch_regenerator::{
    select_candidates, BatchRegenerator, CandidateSet, LevelRecords, RegenerateOptions, RegenerationStats,
};

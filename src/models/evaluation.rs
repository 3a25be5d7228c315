//! 评估结果模型

use serde::{Deserialize, Serialize};

/// 单次远程评分的结果
///
/// `None` 表示远程调用失败（未获得结论），不能按 0 分处理。
pub type ScoreSignal = Option<f64>;

/// 评分模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// 语义相似度（reranker），总分为平均值
    #[default]
    Similarity,
    /// LLM 正误判断，任一字段为 0 则整词为 0
    Judgment,
}

/// 单词的评估记录（评估报告中的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub word: String,
    /// 总分；`null` 表示没有收集到任何信号
    pub score: Option<f64>,
}

impl EvaluationRecord {
    pub fn new(word: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            word: word.into(),
            score,
        }
    }

    /// 是否需要重新生成：无分数或低于阈值
    pub fn needs_regeneration(&self, threshold: f64) -> bool {
        match self.score {
            None => true,
            Some(score) => score < threshold,
        }
    }
}

/// 将收集到的信号汇总为总分
///
/// - 没有信号时返回 `None`
/// - 相似度模式：算术平均
/// - 判断模式：任一信号为 0.0 时总分为 0.0，否则为平均
pub fn aggregate(mode: ScoreMode, signals: &[f64]) -> Option<f64> {
    if signals.is_empty() {
        return None;
    }
    if mode == ScoreMode::Judgment && signals.iter().any(|s| *s == 0.0) {
        return Some(0.0);
    }
    Some(signals.iter().sum::<f64>() / signals.len() as f64)
}

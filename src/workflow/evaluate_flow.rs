//! 单词评估流程 - 流程层
//!
//! 核心职责：把一个词条拆成若干 (原文, 译文) 对，并发评分后汇总。
//!
//! 评分对：
//! 1. (单词, 俄语翻译)
//! 2. (单词, 英语翻译)
//! 3. 每个俄语例句 (原句, 译文)
//! 4. 每个英语例句 (原句, 译文)
//!
//! 缺失或为空的字段不参与评分。

use futures::future::join_all;
use tracing::debug;

use crate::models::{aggregate, EvaluationRecord, VocabularyEntry};
use crate::services::prompts::TargetLanguage;
use crate::services::ScoringService;

/// 单词评估流程
///
/// - 不持有任何文件
/// - 只依赖评分服务
#[derive(Clone)]
pub struct EvaluateFlow {
    scoring: ScoringService,
}

impl EvaluateFlow {
    pub fn new(scoring: ScoringService) -> Self {
        Self { scoring }
    }

    /// 评估一个单词
    ///
    /// 所有评分对同时发出，每一对独立完成；失败的评分不计入总分。
    pub async fn evaluate(&self, word: &str, entry: &VocabularyEntry) -> EvaluationRecord {
        let pairs = scoring_pairs(word, entry);
        let calls = pairs
            .iter()
            .map(|(source, candidate, language)| self.scoring.score(source, candidate, *language));
        let signals: Vec<f64> = join_all(calls).await.into_iter().flatten().collect();

        let score = aggregate(self.scoring.mode(), &signals);
        debug!(
            "[{}] {}/{} 个评分对有结果，总分 {:?}",
            word,
            signals.len(),
            pairs.len(),
            score
        );
        EvaluationRecord::new(word, score)
    }
}

/// 列出词条中可评分的文本对
pub fn scoring_pairs<'a>(word: &'a str, entry: &'a VocabularyEntry) -> Vec<(&'a str, &'a str, TargetLanguage)> {
    let mut pairs = Vec::new();
    if let Some(russian) = entry.russian() {
        pairs.push((word, russian, TargetLanguage::Russian));
    }
    if let Some(english) = entry.english() {
        pairs.push((word, english, TargetLanguage::English));
    }
    for (examples, language) in [
        (entry.russian_examples(), TargetLanguage::Russian),
        (entry.english_examples(), TargetLanguage::English),
    ] {
        pairs.extend(
            examples
                .iter()
                .filter_map(|example| example.scorable_pair())
                .map(|(text, translation)| (text, translation, language)),
        );
    }
    pairs
}

//! 重新生成相关模型

use serde::{Deserialize, Serialize};

use crate::models::part_of_speech::PartOfSpeech;
use crate::models::vocabulary::{Example, VocabularyEntry};

/// LLM 返回的新内容
///
/// 所有字段可选：LLM 省略的字段在合并时保留原值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegeneratedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub russian_translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<PartOfSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub russian_examples: Option<Vec<Example>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_examples: Option<Vec<Example>>,
}

impl RegeneratedContent {
    /// 取出词条中可被重新生成的字段（用于输出文件中的 old_content）
    pub fn snapshot(entry: &VocabularyEntry) -> Self {
        Self {
            russian_translation: entry.russian_translation.clone(),
            english_translation: entry.english_translation.clone(),
            part_of_speech: entry.part_of_speech.clone(),
            russian_examples: entry.russian_examples.clone(),
            english_examples: entry.english_examples.clone(),
        }
    }

    /// 逐字段合并到词条中，只覆盖存在的字段
    pub fn apply_to(self, entry: &mut VocabularyEntry) {
        if let Some(value) = self.russian_translation {
            entry.russian_translation = Some(value);
        }
        if let Some(value) = self.english_translation {
            entry.english_translation = Some(value);
        }
        if let Some(value) = self.part_of_speech {
            entry.part_of_speech = Some(value);
        }
        if let Some(value) = self.russian_examples {
            entry.russian_examples = Some(value);
        }
        if let Some(value) = self.english_examples {
            entry.english_examples = Some(value);
        }
    }

    /// 一个字段都没有的回复视为无效
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// 单个单词的重新生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationStatus {
    /// 等待处理
    Pending,
    /// 已更新
    Updated,
    /// 重试耗尽
    Failed,
    /// 词汇表中不存在该单词
    Skipped,
}

/// 单个单词的重新生成结果
#[derive(Debug, Clone)]
pub struct RegenerationOutcome {
    pub word: String,
    /// 新内容；`None` 表示重试耗尽
    pub content: Option<RegeneratedContent>,
    /// 实际发起的尝试次数
    pub attempts: usize,
}

impl RegenerationOutcome {
    pub fn status(&self) -> RegenerationStatus {
        if self.content.is_some() {
            RegenerationStatus::Updated
        } else {
            RegenerationStatus::Failed
        }
    }

    /// 超出首次尝试的次数
    pub fn retries(&self) -> usize {
        self.attempts.saturating_sub(1)
    }
}

/// 输出文件中的一条记录：`{level: {word: RegenerationRecord}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerationRecord {
    pub level: String,
    pub old_score: Option<f64>,
    pub old_content: RegeneratedContent,
    pub new_content: RegeneratedContent,
}

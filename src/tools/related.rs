//! 相关词计算
//!
//! 对每个单词，用 reranker 把所有文件中的其它单词与查询文本比较，
//! 保留分数不低于阈值的候选（降序，保留 4 位小数），写入 `related_words`。
//!
//! 单词按批处理，每批完成后原子地保存一次文件，中断后可配合
//! `skip_existing` 继续。

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::clients::SimilarityBackend;
use crate::error::{AppError, AppResult};
use crate::models::{RelatedWord, Vocabulary, VocabularyEntry};
use crate::storage::{load_vocabulary, write_json, JsonStyle};

/// 相关词计算选项
#[derive(Debug, Clone)]
pub struct RelatedOptions {
    /// 最低分数
    pub threshold: f64,
    /// 跳过已有 `related_words` 的单词
    pub skip_existing: bool,
    /// 每批单词数，每批结束后保存一次
    pub batch_size: usize,
}

impl Default for RelatedOptions {
    fn default() -> Self {
        Self {
            threshold: 0.98,
            skip_existing: false,
            batch_size: 50,
        }
    }
}

/// 候选池：所有文件中的单词及其描述文本
struct CandidatePool {
    words: Vec<String>,
    texts: Vec<String>,
}

pub struct RelatedWordsBuilder {
    backend: Arc<dyn SimilarityBackend>,
    gate: Arc<Semaphore>,
    options: RelatedOptions,
}

impl RelatedWordsBuilder {
    pub fn new(backend: Arc<dyn SimilarityBackend>, gate: Arc<Semaphore>, options: RelatedOptions) -> Self {
        Self { backend, gate, options }
    }

    /// 处理一组文件，候选来自全部文件
    ///
    /// # 返回
    /// 写入了 `related_words` 的单词数
    pub async fn enrich_files(&self, files: &[PathBuf]) -> AppResult<usize> {
        let mut loaded = Vec::with_capacity(files.len());
        for path in files {
            loaded.push((path, load_vocabulary(path).await?));
        }

        let pool = CandidatePool {
            words: loaded.iter().flat_map(|(_, v)| v.keys().cloned()).collect(),
            texts: loaded
                .iter()
                .flat_map(|(_, v)| v.iter().map(|(w, e)| candidate_text(w, e)))
                .collect(),
        };
        info!("✓ 已加载 {} 个候选单词", pool.words.len());

        let mut updated = 0;
        for (path, mut vocabulary) in loaded {
            info!("📄 正在处理 {}", path.display());
            updated += self.enrich_vocabulary(&mut vocabulary, &pool, path).await?;
            info!("💾 {} 已保存", path.display());
        }
        Ok(updated)
    }

    async fn enrich_vocabulary(
        &self,
        vocabulary: &mut Vocabulary,
        pool: &CandidatePool,
        path: &Path,
    ) -> AppResult<usize> {
        let pending: Vec<String> = vocabulary
            .iter()
            .filter(|(_, entry)| !(self.options.skip_existing && entry.related_words.is_some()))
            .map(|(word, _)| word.clone())
            .collect();
        let total = pending.len();
        let mut updated = 0;

        for (batch_index, batch) in pending.chunks(self.options.batch_size.max(1)).enumerate() {
            let results = {
                let vocabulary = &*vocabulary;
                let calls = batch.iter().filter_map(|word| {
                    let entry = vocabulary.get(word)?;
                    Some(async move { (word, self.related_for(word, entry, pool).await) })
                });
                join_all(calls).await
            };

            for (word, result) in results {
                match result {
                    Ok(related) => {
                        if let Some(entry) = vocabulary.get_mut(word) {
                            entry.related_words = Some(related);
                            updated += 1;
                        }
                    }
                    Err(e) => warn!("[{}] 相关词计算失败: {}", word, e),
                }
            }

            write_json(path, &*vocabulary, JsonStyle::Pretty).await?;
            let done = (batch_index * self.options.batch_size.max(1) + batch.len()).min(total);
            info!("⏳ {}/{}", done, total);
        }

        if total == 0 {
            info!("没有需要处理的单词");
        }
        Ok(updated)
    }

    /// 计算一个单词的相关词
    async fn related_for(&self, word: &str, entry: &VocabularyEntry, pool: &CandidatePool) -> AppResult<Vec<RelatedWord>> {
        let scores = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| AppError::malformed("semaphore", e.to_string()))?;
            self.backend.score_many(&build_query(word, entry), &pool.texts).await?
        };

        let mut related: Vec<RelatedWord> = pool
            .words
            .iter()
            .zip(scores)
            .filter(|(candidate, score)| candidate.as_str() != word && *score >= self.options.threshold)
            .map(|(candidate, score)| RelatedWord {
                word: candidate.clone(),
                score: round4(score),
            })
            .collect();
        related.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(related)
    }
}

/// 查询文本：说明 + 单词 + 翻译
pub fn build_query(word: &str, entry: &VocabularyEntry) -> String {
    join_parts([
        Some(format!("Find related words (synonyms, antonyms, usage-near) for: {}", word)),
        entry.english().map(str::to_string),
        entry.russian().map(str::to_string),
    ])
}

/// 候选文本："单词 | 英语 | 俄语"，空字段省略
pub fn candidate_text(word: &str, entry: &VocabularyEntry) -> String {
    join_parts([
        Some(word.to_string()),
        entry.english().map(str::to_string),
        entry.russian().map(str::to_string),
    ])
}

fn join_parts<const N: usize>(parts: [Option<String>; N]) -> String {
    parts
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 候选文本包含 "water" 的给高分
    struct WaterLover;

    #[async_trait]
    impl SimilarityBackend for WaterLover {
        async fn score(&self, _: &str, _: &str) -> AppResult<f64> {
            Ok(0.0)
        }

        async fn score_many(&self, _: &str, candidates: &[String]) -> AppResult<Vec<f64>> {
            Ok(candidates
                .iter()
                .map(|c| if c.contains("water") { 0.987654 } else { 0.5 })
                .collect())
        }
    }

    fn entry(english: &str, russian: &str) -> VocabularyEntry {
        VocabularyEntry {
            english_translation: Some(english.to_string()),
            russian_translation: Some(russian.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_texts() {
        let e = entry("water", "вода");
        assert_eq!(candidate_text("水", &e), "水 | water | вода");
        assert_eq!(
            build_query("水", &VocabularyEntry::default()),
            "Find related words (synonyms, antonyms, usage-near) for: 水"
        );
        assert_eq!(round4(0.987654), 0.9877);
    }

    #[tokio::test]
    async fn test_related_words_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("n5_part1.json");
        let second = dir.path().join("n5_part2.json");

        let mut a = Vocabulary::new();
        a.insert("水".to_string(), entry("water", "вода"));
        a.insert("火".to_string(), entry("fire", "огонь"));
        let mut b = Vocabulary::new();
        b.insert("湯".to_string(), entry("hot water", "кипяток"));
        let mut done = entry("tree", "дерево");
        done.related_words = Some(Vec::new());
        b.insert("木".to_string(), done);
        write_json(&first, &a, JsonStyle::Pretty).await.unwrap();
        write_json(&second, &b, JsonStyle::Pretty).await.unwrap();

        let builder = RelatedWordsBuilder::new(
            Arc::new(WaterLover),
            Arc::new(Semaphore::new(2)),
            RelatedOptions {
                skip_existing: true,
                batch_size: 1,
                ..Default::default()
            },
        );
        let updated = builder.enrich_files(&[first.clone(), second.clone()]).await.unwrap();
        assert_eq!(updated, 3);

        let a = load_vocabulary(&first).await.unwrap();
        let related: Vec<_> = a["水"]
            .related_words
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| (r.word.as_str(), r.score))
            .collect();
        assert_eq!(related, vec![("湯", 0.9877)]);
        let b = load_vocabulary(&second).await.unwrap();
        assert_eq!(b["木"].related_words, Some(Vec::new()));
        assert_eq!(b["湯"].related_words.as_ref().unwrap()[0].word, "水");
    }
}

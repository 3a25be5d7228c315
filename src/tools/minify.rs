//! 精简与恢复
//!
//! 精简：去掉例句、词性和级别，紧凑输出，后缀 `_min`。
//! 恢复：从完整的参考词汇表中把这些字段补回来，后缀 `_enriched`。

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{Vocabulary, VocabularyEntry};
use crate::storage::{find_files_nonempty, load_vocabulary, write_json, JsonStyle};
use crate::tools::derived_path;

/// 精简时去掉、恢复时补回的字段
pub const OPTIONAL_FIELDS: [&str; 4] = ["russian_examples", "english_examples", "part_of_speech", "level"];

fn strip_entry(entry: &VocabularyEntry) -> VocabularyEntry {
    let mut null_fields = entry.null_fields.clone();
    null_fields.retain(|field| !OPTIONAL_FIELDS.contains(field));
    VocabularyEntry {
        russian_examples: None,
        english_examples: None,
        part_of_speech: None,
        level: None,
        null_fields,
        ..entry.clone()
    }
}

/// 参考词条中存在的字段覆盖到 `entry`，参考中显式为 `null` 的字段也恢复为 `null`
fn restore_entry(entry: &VocabularyEntry, reference: &VocabularyEntry) -> VocabularyEntry {
    let mut restored = entry.clone();
    if reference.russian_examples.is_some() {
        restored.russian_examples = reference.russian_examples.clone();
    }
    if reference.english_examples.is_some() {
        restored.english_examples = reference.english_examples.clone();
    }
    if reference.part_of_speech.is_some() {
        restored.part_of_speech = reference.part_of_speech.clone();
    }
    if reference.level.is_some() {
        restored.level = reference.level.clone();
    }
    for field in OPTIONAL_FIELDS {
        if reference.null_fields.contains(field) {
            restored.null_fields.insert(field);
        }
    }
    restored
}

pub fn minify_vocabulary(vocabulary: &Vocabulary) -> Vocabulary {
    vocabulary
        .iter()
        .map(|(word, entry)| (word.clone(), strip_entry(entry)))
        .collect()
}

/// 恢复字段
///
/// # 返回
/// `(恢复后的词汇表, 参考数据中找不到的单词)`；找不到的词条原样保留
pub fn enrich_vocabulary(vocabulary: &Vocabulary, reference: &Vocabulary) -> (Vocabulary, Vec<String>) {
    let mut missing = Vec::new();
    let enriched = vocabulary
        .iter()
        .map(|(word, entry)| {
            let restored = match reference.get(word) {
                Some(reference_entry) => restore_entry(entry, reference_entry),
                None => {
                    missing.push(word.clone());
                    entry.clone()
                }
            };
            (word.clone(), restored)
        })
        .collect();
    (enriched, missing)
}

/// 加载参考数据，多个文件中同一单词以第一次出现的为准
pub async fn load_reference(dir: &Path, pattern: &str) -> AppResult<Vocabulary> {
    let mut reference = Vocabulary::new();
    for path in find_files_nonempty(dir, pattern)? {
        for (word, entry) in load_vocabulary(&path).await? {
            reference.entry(word).or_insert(entry);
        }
    }
    info!("已加载参考数据: {} 个单词", reference.len());
    Ok(reference)
}

pub async fn minify_file(path: &Path, output_dir: Option<&Path>, suffix: &str) -> AppResult<PathBuf> {
    let vocabulary = load_vocabulary(path).await?;
    let target = derived_path(path, output_dir, suffix);
    write_json(&target, &minify_vocabulary(&vocabulary), JsonStyle::Compact).await?;
    info!("{} -> {}", path.display(), target.display());
    Ok(target)
}

pub async fn enrich_file(
    path: &Path,
    reference: &Vocabulary,
    output_dir: Option<&Path>,
    suffix: &str,
) -> AppResult<PathBuf> {
    let vocabulary = load_vocabulary(path).await?;
    let (enriched, missing) = enrich_vocabulary(&vocabulary, reference);
    let target = derived_path(path, output_dir, suffix);
    write_json(&target, &enriched, JsonStyle::Pretty).await?;

    if !missing.is_empty() {
        warn!("⚠️ {}: {} 个单词在参考数据中不存在", path.display(), missing.len());
    }
    info!("{} -> {}", path.display(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Example, PartOfSpeech, RelatedWord};

    fn full_entry() -> VocabularyEntry {
        VocabularyEntry {
            russian_translation: Some("вода".to_string()),
            english_translation: Some("water".to_string()),
            part_of_speech: Some(PartOfSpeech::Noun),
            russian_examples: Some(vec![Example::new("水を飲む。", "Пью воду.")]),
            english_examples: Some(vec![Example::new("水を飲む。", "I drink water.")]),
            level: Some("N5".to_string()),
            related_words: Some(vec![RelatedWord {
                word: "湯".to_string(),
                score: 0.99,
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_minify_then_enrich_restores_entry() {
        let mut original = Vocabulary::new();
        original.insert("水".to_string(), full_entry());

        let minified = minify_vocabulary(&original);
        let stripped = &minified["水"];
        assert!(stripped.russian_examples.is_none());
        assert!(stripped.level.is_none());
        assert_eq!(stripped.related_words, full_entry().related_words);

        let (enriched, missing) = enrich_vocabulary(&minified, &original);
        assert!(missing.is_empty());
        assert_eq!(enriched, original);
    }

    #[test]
    fn test_explicit_nulls_survive_minify_and_enrich() {
        let raw = r#"{"水": {"english_translation": "water", "russian_translation": null, "level": null}}"#;
        let original: Vocabulary = serde_json::from_str(raw).unwrap();

        let minified = minify_vocabulary(&original);
        let compact = serde_json::to_value(&minified).unwrap();
        assert_eq!(compact, serde_json::json!({"水": {"english_translation": "water", "russian_translation": null}}));

        let (enriched, _) = enrich_vocabulary(&minified, &original);
        assert_eq!(enriched, original);
        assert_eq!(
            serde_json::to_value(&enriched).unwrap(),
            serde_json::from_str::<serde_json::Value>(raw).unwrap()
        );
    }

    #[test]
    fn test_missing_reference_entries_are_kept_and_counted() {
        let mut minified = Vocabulary::new();
        minified.insert("火".to_string(), strip_entry(&full_entry()));
        let (enriched, missing) = enrich_vocabulary(&minified, &Vocabulary::new());
        assert_eq!(missing, vec!["火".to_string()]);
        assert_eq!(enriched, minified);
    }

    #[tokio::test]
    async fn test_minify_file_is_compact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("vocabulary_n5.json");
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("水".to_string(), full_entry());
        write_json(&source, &vocabulary, JsonStyle::Pretty).await.unwrap();

        let target = minify_file(&source, None, "_min").await.unwrap();

        assert_eq!(target, dir.path().join("vocabulary_n5_min.json"));
        let raw = std::fs::read_to_string(&target).unwrap();
        assert!(!raw.contains("\n  "));
        for field in OPTIONAL_FIELDS {
            assert!(!raw.contains(field), "{field}");
        }
    }

    #[tokio::test]
    async fn test_reference_first_occurrence_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = Vocabulary::new();
        first.insert("水".to_string(), full_entry());
        let mut second = Vocabulary::new();
        second.insert(
            "水".to_string(),
            VocabularyEntry {
                level: Some("N1".to_string()),
                ..Default::default()
            },
        );
        write_json(&dir.path().join("vocabulary_n4.json"), &first, JsonStyle::Pretty)
            .await
            .unwrap();
        write_json(&dir.path().join("vocabulary_n5.json"), &second, JsonStyle::Pretty)
            .await
            .unwrap();

        let reference = load_reference(dir.path(), "vocabulary_*.json").await.unwrap();

        assert_eq!(reference["水"].level.as_deref(), Some("N5"));
    }
}

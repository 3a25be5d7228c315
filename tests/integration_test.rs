use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use vocab_quality::clients::{ChatBackend, SimilarityBackend};
use vocab_quality::error::{AppError, AppResult};
use vocab_quality::models::{EvaluationRecord, Vocabulary};
use vocab_quality::orchestrator::{
    BatchEvaluator, BatchRegenerator, EvaluateOptions, RegenerateOptions, RegenerationStats,
};
use vocab_quality::services::{ScoringBackend, ScoringService};
use vocab_quality::storage::{read_report, VocabularyStore};
use vocab_quality::utils::RetryPolicy;
use vocab_quality::workflow::{EvaluateFlow, RegenerateFlow};

/// 按译文返回分数，未登记的译文视为远程失败
struct TableSimilarity(HashMap<&'static str, f64>);

#[async_trait]
impl SimilarityBackend for TableSimilarity {
    async fn score(&self, _: &str, candidate: &str) -> AppResult<f64> {
        self.0
            .get(candidate)
            .copied()
            .ok_or_else(|| AppError::malformed("stub", "unavailable"))
    }

    async fn score_many(&self, _: &str, candidates: &[String]) -> AppResult<Vec<f64>> {
        Ok(vec![0.0; candidates.len()])
    }
}

/// 提示词中含 `'B'` 时返回有效 JSON，否则返回无法解析的文本
struct PickyChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatBackend for PickyChat {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("'B'") {
            Ok("```json\n{\"russian_translation\": \"новый\", \"english_examples\": [{\"text\": \"Bです。\", \"translation\": \"It is B.\"}]}\n```".to_string())
        } else {
            Ok("Sorry, I cannot help with that.".to_string())
        }
    }
}

fn write(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn sample_vocabulary() -> Value {
    json!({
        "A": {"russian_translation": "ра", "english_translation": "ea", "level": "N5"},
        "B": {"russian_translation": "рб", "english_translation": "eb", "part_of_speech": "Noun", "custom": 7},
        "C": {"russian_translation": "рв", "english_translation": "ec"}
    })
}

fn evaluator() -> BatchEvaluator {
    let table: HashMap<&'static str, f64> =
        [("ра", 0.9), ("ea", 0.95), ("рб", 0.6), ("eb", 0.6)].into_iter().collect();
    let scoring = ScoringService::new(
        ScoringBackend::Similarity(Arc::new(TableSimilarity(table))),
        Arc::new(Semaphore::new(3)),
    );
    BatchEvaluator::new(EvaluateFlow::new(scoring), 3)
}

fn regenerator(chat: Arc<PickyChat>, options: RegenerateOptions) -> BatchRegenerator {
    let flow = RegenerateFlow::new(
        chat,
        Arc::new(Semaphore::new(2)),
        RetryPolicy::new(3, Duration::from_millis(1)),
    );
    BatchRegenerator::new(flow, options, 2)
}

/// 评估 words/vocabulary_n5.json，返回 (words 目录, evaluations 目录)
async fn evaluate_sample(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let words_dir = root.join("words");
    let evaluation_dir = root.join("evaluations");
    write(&words_dir.join("vocabulary_n5.json"), &sample_vocabulary());

    let options = EvaluateOptions {
        words_dir: words_dir.clone(),
        output_dir: evaluation_dir.clone(),
        ..Default::default()
    };
    evaluator().run(&options).await.unwrap();
    (words_dir, evaluation_dir)
}

#[tokio::test]
async fn test_evaluation_report_scores() {
    let dir = tempfile::tempdir().unwrap();
    let (_, evaluation_dir) = evaluate_sample(dir.path()).await;

    let records = read_report(&evaluation_dir.join("vocabulary_n5_evaluation.json"))
        .await
        .unwrap();

    let words: Vec<_> = records.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["A", "B", "C"]);
    assert!((records[0].score.unwrap() - 0.925).abs() < 1e-9);
    assert!((records[1].score.unwrap() - 0.6).abs() < 1e-9);
    assert_eq!(records[2].score, None);
}

#[tokio::test]
async fn test_regeneration_updates_store_with_backup() {
    let dir = tempfile::tempdir().unwrap();
    let (words_dir, evaluation_dir) = evaluate_sample(dir.path()).await;

    // 报告中出现词汇表里没有的单词
    let report_path = evaluation_dir.join("vocabulary_n5_evaluation.json");
    let mut records = read_report(&report_path).await.unwrap();
    records.push(EvaluationRecord::new("Z", None));
    write(&report_path, &serde_json::to_value(&records).unwrap());

    let chat = Arc::new(PickyChat {
        calls: AtomicUsize::new(0),
    });
    let options = RegenerateOptions {
        evaluation_dir,
        words_dir: words_dir.clone(),
        threshold: 0.8,
        ..Default::default()
    };

    let stats = regenerator(chat.clone(), options).run().await.unwrap();

    assert_eq!(
        stats,
        RegenerationStats {
            total: 3,
            success: 1,
            failed: 1,
            skipped: 1,
            retries: 2,
        }
    );
    // B 一次成功，C 三次都失败
    assert_eq!(chat.calls.load(Ordering::SeqCst), 4);

    let backup: Value = serde_json::from_str(
        &std::fs::read_to_string(words_dir.join("vocabulary_n5.json.backup")).unwrap(),
    )
    .unwrap();
    assert_eq!(backup, sample_vocabulary());

    let store = VocabularyStore::new(&words_dir);
    let vocabulary: Vocabulary = store.load("N5").await.unwrap();
    let b = &vocabulary["B"];
    assert_eq!(b.russian_translation.as_deref(), Some("новый"));
    assert_eq!(b.english_translation.as_deref(), Some("eb"));
    assert_eq!(b.english_examples().len(), 1);
    assert_eq!(b.extra.get("custom"), Some(&json!(7)));
    assert_eq!(vocabulary["C"].russian_translation.as_deref(), Some("рв"));
    assert_eq!(vocabulary["A"].level.as_deref(), Some("N5"));
}

#[tokio::test]
async fn test_output_file_mode_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (words_dir, evaluation_dir) = evaluate_sample(dir.path()).await;
    let output_file = dir.path().join("regenerated.json");
    write(&output_file, &json!({"N4": {"本": {"level": "N4"}}}));
    let before = std::fs::read(words_dir.join("vocabulary_n5.json")).unwrap();

    let options = RegenerateOptions {
        evaluation_dir,
        words_dir: words_dir.clone(),
        threshold: 0.8,
        output_file: Some(output_file.clone()),
        ..Default::default()
    };
    let chat = Arc::new(PickyChat {
        calls: AtomicUsize::new(0),
    });
    let stats = regenerator(chat, options).run().await.unwrap();

    assert_eq!(stats.success, 1);
    assert_eq!(std::fs::read(words_dir.join("vocabulary_n5.json")).unwrap(), before);
    assert!(!words_dir.join("vocabulary_n5.json.backup").exists());

    let output: Value = serde_json::from_str(&std::fs::read_to_string(&output_file).unwrap()).unwrap();
    assert_eq!(output["N4"]["本"]["level"], "N4");
    let b = &output["N5"]["B"];
    assert_eq!(b["level"], "N5");
    assert_eq!(b["old_score"], 0.6);
    assert_eq!(b["old_content"]["russian_translation"], "рб");
    assert_eq!(b["new_content"]["russian_translation"], "новый");
    assert!(output["N5"].get("C").is_none());
}

#[tokio::test]
async fn test_dry_run_makes_no_calls_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (words_dir, evaluation_dir) = evaluate_sample(dir.path()).await;
    let before = std::fs::read(words_dir.join("vocabulary_n5.json")).unwrap();
    let output_file = dir.path().join("regenerated.json");

    let chat = Arc::new(PickyChat {
        calls: AtomicUsize::new(0),
    });
    let options = RegenerateOptions {
        evaluation_dir,
        words_dir: words_dir.clone(),
        threshold: 1.0,
        dry_run: true,
        output_file: Some(output_file.clone()),
    };
    let stats = regenerator(chat.clone(), options).run().await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.success + stats.failed + stats.skipped, 0);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(words_dir.join("vocabulary_n5.json")).unwrap(), before);
    assert!(!output_file.exists());
    assert!(!words_dir.join("vocabulary_n5.json.backup").exists());
}

#[tokio::test]
async fn test_missing_vocabulary_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (words_dir, evaluation_dir) = evaluate_sample(dir.path()).await;
    std::fs::remove_file(words_dir.join("vocabulary_n5.json")).unwrap();

    let chat = Arc::new(PickyChat {
        calls: AtomicUsize::new(0),
    });
    let options = RegenerateOptions {
        evaluation_dir,
        words_dir,
        ..Default::default()
    };

    assert!(regenerator(chat, options).run().await.is_err());
}

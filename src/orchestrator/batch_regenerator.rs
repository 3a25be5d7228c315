//! 批量重新生成器 - 编排层
//!
//! ## 职责
//!
//! 1. **候选选择**：读取评估报告，分数为 `null` 或低于阈值的单词为候选
//! 2. **跳过缺失单词**：报告中有、词汇表中没有的单词只计数不报错
//! 3. **并发生成**：每个级别的候选单词一次性提交，由共享信号量限流
//! 4. **写回结果**：
//!    - 默认：逐字段合并后保存词汇文件（先备份），至少更新一个单词才保存
//!    - `output_file`：不修改词汇文件，写出新旧内容对照
//!    - `dry_run`：只列出候选，不调用远程服务，不写任何文件
//! 5. **全局统计**：总数、成功、失败、跳过、重试次数、成功率

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::{
    EvaluationRecord, RegeneratedContent, RegenerationRecord, RegenerationStatus, Vocabulary,
};
use crate::storage::json_file::{read_json, write_json, JsonStyle};
use crate::storage::{discover_reports, read_report, ReportFile, VocabularyStore};
use crate::utils::logging::{log_finished, log_startup, separator};
use crate::utils::Progress;
use crate::workflow::{RegenerateFlow, WordCtx};

/// 重新生成的输入输出选项
#[derive(Debug, Clone)]
pub struct RegenerateOptions {
    pub evaluation_dir: PathBuf,
    pub words_dir: PathBuf,
    /// 低于该分数的单词需要重新生成
    pub threshold: f64,
    pub dry_run: bool,
    /// 设置后只写对照文件，不修改词汇文件
    pub output_file: Option<PathBuf>,
}

impl Default for RegenerateOptions {
    fn default() -> Self {
        Self {
            evaluation_dir: PathBuf::from("evaluation_results"),
            words_dir: PathBuf::from("words"),
            threshold: 1.0,
            dry_run: false,
            output_file: None,
        }
    }
}

/// 重新生成统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationStats {
    /// 候选单词总数（含跳过的）
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    /// 超出首次尝试的调用次数之和
    pub retries: usize,
}

impl RegenerationStats {
    /// 成功数占实际处理数（不含跳过）的百分比
    pub fn success_rate(&self) -> f64 {
        let attempted = self.success + self.failed;
        if attempted == 0 {
            0.0
        } else {
            self.success as f64 * 100.0 / attempted as f64
        }
    }

    fn absorb(&mut self, other: &RegenerationStats) {
        self.total += other.total;
        self.success += other.success;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.retries += other.retries;
    }
}

/// 候选单词及计数
#[derive(Debug, Default)]
pub struct CandidateSet<'a> {
    pub records: Vec<&'a EvaluationRecord>,
    /// 分数为 0.0 的候选
    pub incorrect: usize,
    /// 分数为 `null` 的候选
    pub unknown: usize,
}

/// 选出分数为 `null` 或低于阈值的记录，同一单词只保留第一条
pub fn select_candidates(records: &[EvaluationRecord], threshold: f64) -> CandidateSet<'_> {
    let mut seen = BTreeSet::new();
    let records: Vec<_> = records
        .iter()
        .filter(|r| r.needs_regeneration(threshold) && seen.insert(r.word.as_str()))
        .collect();
    CandidateSet {
        incorrect: records.iter().filter(|r| r.score == Some(0.0)).count(),
        unknown: records.iter().filter(|r| r.score.is_none()).count(),
        records,
    }
}

/// 一个级别的新旧内容对照：单词 → 记录
pub type LevelRecords = BTreeMap<String, RegenerationRecord>;

/// 批量重新生成器
pub struct BatchRegenerator {
    flow: RegenerateFlow,
    store: VocabularyStore,
    options: RegenerateOptions,
    max_concurrent: usize,
}

impl BatchRegenerator {
    pub fn new(flow: RegenerateFlow, options: RegenerateOptions, max_concurrent: usize) -> Self {
        Self {
            flow,
            store: VocabularyStore::new(&options.words_dir),
            options,
            max_concurrent,
        }
    }

    /// 处理评估目录中的所有报告
    pub async fn run(&self) -> Result<RegenerationStats> {
        log_startup("词汇重新生成", self.max_concurrent);
        if self.options.dry_run {
            info!("🔍 试运行模式：不调用远程服务，不写任何文件");
        }

        let reports = discover_reports(&self.options.evaluation_dir)?;
        if reports.is_empty() {
            warn!(
                "⚠️ {} 中没有评估报告，程序结束",
                self.options.evaluation_dir.display()
            );
            return Ok(RegenerationStats::default());
        }
        info!("✓ 找到 {} 个评估报告", reports.len());

        let mut stats = RegenerationStats::default();
        let mut output: BTreeMap<String, LevelRecords> = BTreeMap::new();

        for report in &reports {
            let (level_stats, records) = self
                .process_report(report)
                .await
                .with_context(|| format!("处理级别 {} 失败", report.level))?;
            stats.absorb(&level_stats);
            if let Some(records) = records.filter(|r| !r.is_empty()) {
                output.insert(report.level.clone(), records);
            }
        }

        if let Some(path) = &self.options.output_file {
            if !self.options.dry_run && !output.is_empty() {
                merge_output_file(path, output).await?;
            }
        }

        print_final_stats(&stats, self.options.dry_run);
        log_finished("词汇重新生成");
        Ok(stats)
    }

    /// 处理一个级别
    ///
    /// # 返回
    /// `(统计, 对照记录)`；只有输出文件模式才有对照记录
    async fn process_report(&self, report: &ReportFile) -> Result<(RegenerationStats, Option<LevelRecords>)> {
        let records = read_report(&report.path).await?;
        let candidates = select_candidates(&records, self.options.threshold);
        log_level_candidates(&report.level, records.len(), &candidates);

        if candidates.records.is_empty() {
            return Ok((RegenerationStats::default(), None));
        }
        if self.options.dry_run {
            log_dry_run(&report.level, &candidates);
            return Ok((
                RegenerationStats {
                    total: candidates.records.len(),
                    ..Default::default()
                },
                None,
            ));
        }

        let mut vocabulary = self.store.load(&report.level).await?;
        let (stats, records) = self
            .regenerate_level(&report.level, &candidates.records, &mut vocabulary)
            .await;

        if self.options.output_file.is_some() {
            return Ok((stats, Some(records)));
        }
        if stats.success > 0 {
            self.store.save(&report.level, &vocabulary).await?;
        } else {
            info!("[{}] 没有单词被更新，不保存词汇文件", report.level);
        }
        Ok((stats, None))
    }

    /// 并发重新生成一个级别的候选单词
    ///
    /// 成功的结果逐字段合并进 `vocabulary`，同时生成新旧内容对照记录。
    pub async fn regenerate_level(
        &self,
        level: &str,
        candidates: &[&EvaluationRecord],
        vocabulary: &mut Vocabulary,
    ) -> (RegenerationStats, LevelRecords) {
        let mut statuses: BTreeMap<&str, RegenerationStatus> = candidates
            .iter()
            .map(|r| (r.word.as_str(), RegenerationStatus::Pending))
            .collect();

        let mut seen = BTreeSet::new();
        let mut present = Vec::new();
        for record in candidates {
            // 报告中重复出现的单词只处理第一次
            if !seen.insert(record.word.as_str()) {
                continue;
            }
            match vocabulary.get(&record.word) {
                Some(entry) => present.push((*record, entry)),
                None => {
                    warn!("{} 词汇表中不存在，跳过", WordCtx::new(level, &record.word));
                    statuses.insert(record.word.as_str(), RegenerationStatus::Skipped);
                }
            }
        }

        let progress = Progress::new(format!("[{}] 重新生成", level), present.len());
        let mut tasks: FuturesUnordered<_> = present
            .into_iter()
            .map(|(record, entry)| {
                let flow = &self.flow;
                let progress = &progress;
                async move {
                    let ctx = WordCtx::new(level, &record.word);
                    let outcome = flow.regenerate(&ctx, entry).await;
                    progress.advance();
                    (record, RegeneratedContent::snapshot(entry), outcome)
                }
            })
            .collect();

        let mut finished = Vec::new();
        while let Some(item) = tasks.next().await {
            finished.push(item);
        }
        drop(tasks);

        let mut stats = RegenerationStats {
            total: statuses.len(),
            ..Default::default()
        };
        let mut records = LevelRecords::new();
        for (record, old_content, outcome) in finished {
            stats.retries += outcome.retries();
            statuses.insert(record.word.as_str(), outcome.status());

            let Some(new_content) = outcome.content else {
                continue;
            };
            records.insert(
                record.word.clone(),
                RegenerationRecord {
                    level: level.to_string(),
                    old_score: record.score,
                    old_content,
                    new_content: new_content.clone(),
                },
            );
            if let Some(entry) = vocabulary.get_mut(&record.word) {
                new_content.apply_to(entry);
            }
        }

        for status in statuses.values() {
            match status {
                RegenerationStatus::Updated => stats.success += 1,
                RegenerationStatus::Failed => stats.failed += 1,
                RegenerationStatus::Skipped => stats.skipped += 1,
                RegenerationStatus::Pending => {}
            }
        }
        log_level_complete(level, &stats);
        (stats, records)
    }
}

/// 把本次结果合并进已有的对照文件，同一级别整体替换
async fn merge_output_file(path: &Path, output: BTreeMap<String, LevelRecords>) -> Result<()> {
    let mut document: BTreeMap<String, Value> = if path.is_file() {
        match read_json(path).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("⚠️ 无法读取已有的输出文件，将重新创建: {}", e);
                BTreeMap::new()
            }
        }
    } else {
        BTreeMap::new()
    };

    for (level, records) in output {
        document.insert(level, serde_json::to_value(records)?);
    }
    write_json(path, &document, JsonStyle::Pretty).await?;
    info!("💾 新旧内容对照已保存至: {}", path.display());
    Ok(())
}

// ========== 日志辅助函数 ==========

fn log_level_candidates(level: &str, total: usize, candidates: &CandidateSet<'_>) {
    info!("\n{}", "─".repeat(60));
    info!("📄 级别 {}: 报告共 {} 个单词", level, total);
    info!(
        "  需要重新生成: {} (错误: {}, 无分数: {})",
        candidates.records.len(),
        candidates.incorrect,
        candidates.unknown
    );
    info!("{}", "─".repeat(60));
}

fn log_dry_run(level: &str, candidates: &CandidateSet<'_>) {
    info!("[{}] 候选示例:", level);
    for record in candidates.records.iter().take(5) {
        match record.score {
            Some(score) => info!("  - {} (分数: {:.4})", record.word, score),
            None => info!("  - {} (分数: null)", record.word),
        }
    }
    if candidates.records.len() > 5 {
        info!("  ... 以及另外 {} 个", candidates.records.len() - 5);
    }
}

fn log_level_complete(level: &str, stats: &RegenerationStats) {
    info!(
        "✓ [{}] 完成: 成功 {}, 失败 {}, 跳过 {}",
        level, stats.success, stats.failed, stats.skipped
    );
}

fn print_final_stats(stats: &RegenerationStats, dry_run: bool) {
    separator('=');
    info!("📊 重新生成统计");
    separator('=');
    info!("📋 候选总数: {}", stats.total);
    if dry_run {
        info!("🔍 试运行，未做任何修改");
        return;
    }
    info!("✅ 成功: {}", stats.success);
    info!("❌ 失败: {}", stats.failed);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("🔁 重试次数: {}", stats.retries);
    info!("📈 成功率: {:.1}%", stats.success_rate());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ChatBackend;
    use crate::error::AppResult;
    use crate::models::VocabularyEntry;
    use crate::utils::RetryPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    fn records() -> Vec<EvaluationRecord> {
        vec![
            EvaluationRecord::new("水", Some(1.0)),
            EvaluationRecord::new("火", Some(0.0)),
            EvaluationRecord::new("木", None),
            EvaluationRecord::new("金", Some(0.95)),
        ]
    }

    #[test]
    fn test_candidates_include_null_and_below_threshold() {
        let records = records();
        let set = select_candidates(&records, 1.0);
        let words: Vec<_> = set.records.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["火", "木", "金"]);
        assert_eq!(set.incorrect, 1);
        assert_eq!(set.unknown, 1);

        let set = select_candidates(&records, 0.5);
        assert_eq!(set.records.len(), 2);
    }

    #[test]
    fn test_success_rate_ignores_skipped() {
        let stats = RegenerationStats {
            total: 5,
            success: 3,
            failed: 1,
            skipped: 1,
            retries: 4,
        };
        assert_eq!(stats.success_rate(), 75.0);
        assert_eq!(RegenerationStats::default().success_rate(), 0.0);
    }

    struct CountingChat(AtomicUsize);

    #[async_trait]
    impl ChatBackend for CountingChat {
        async fn complete(&self, _: &str) -> AppResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"english_translation": "fire"}"#.to_string())
        }
    }

    #[test]
    fn test_duplicate_report_words_are_selected_once() {
        let mut records = records();
        records.push(EvaluationRecord::new("火", None));
        let set = select_candidates(&records, 1.0);
        assert_eq!(set.records.len(), 3);
        assert_eq!(set.records[0].score, Some(0.0));
        assert_eq!(set.unknown, 1);
    }

    #[tokio::test]
    async fn test_duplicate_candidates_are_regenerated_once() {
        let chat = Arc::new(CountingChat(AtomicUsize::new(0)));
        let flow = RegenerateFlow::new(
            chat.clone(),
            Arc::new(Semaphore::new(2)),
            RetryPolicy::new(1, Duration::from_millis(1)),
        );
        let regenerator = BatchRegenerator::new(flow, RegenerateOptions::default(), 2);

        let first = EvaluationRecord::new("火", Some(0.0));
        let again = EvaluationRecord::new("火", None);
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert("火".to_string(), VocabularyEntry::default());

        let (stats, records) = regenerator
            .regenerate_level("N5", &[&first, &again], &mut vocabulary)
            .await;

        assert_eq!(chat.0.load(Ordering::SeqCst), 1);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.success, 1);
        assert_eq!(records["火"].old_score, Some(0.0));
        assert_eq!(vocabulary["火"].english_translation.as_deref(), Some("fire"));
    }
}

//! 批量评估器 - 编排层
//!
//! ## 职责
//!
//! 1. **输入选择**：按 glob 扫描词汇目录，或使用显式给出的文件列表
//! 2. **逐文件处理**：加载 → 并发评估所有单词 → 按单词排序 → 写出报告
//! 3. **进度输出**：所有单词共享一个计数器，约每 10% 输出一次
//! 4. **文件统计**：数量、平均值、最小值、最大值、无分数的单词数
//!
//! 并发上限由评分服务内部的共享信号量控制，这里把所有单词一次性提交。

use anyhow::{bail, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::{EvaluationRecord, ScoreStats, Vocabulary};
use crate::storage::{find_files, load_vocabulary, report_path, write_report};
use crate::utils::logging::{log_file_start, log_finished, log_startup, separator};
use crate::utils::Progress;
use crate::workflow::EvaluateFlow;

/// 评估的输入与输出位置
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub words_dir: PathBuf,
    pub pattern: String,
    /// 显式指定的文件；非空时忽略 `pattern`
    pub files: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            words_dir: PathBuf::from("words"),
            pattern: "vocabulary_*.json".to_string(),
            files: Vec::new(),
            output_dir: PathBuf::from("evaluation_results"),
        }
    }
}

/// 单个文件的评估结果
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub source: PathBuf,
    pub report: PathBuf,
    pub stats: ScoreStats,
}

/// 批量评估器
pub struct BatchEvaluator {
    flow: EvaluateFlow,
    max_concurrent: usize,
}

impl BatchEvaluator {
    pub fn new(flow: EvaluateFlow, max_concurrent: usize) -> Self {
        Self { flow, max_concurrent }
    }

    /// 评估所有选中的词汇文件
    pub async fn run(&self, options: &EvaluateOptions) -> Result<Vec<FileSummary>> {
        log_startup("词汇质量评估", self.max_concurrent);

        let files = select_files(options)?;
        info!("✓ 找到 {} 个待评估的文件", files.len());

        let mut summaries = Vec::with_capacity(files.len());
        for path in &files {
            let summary = self
                .evaluate_file(path, &options.output_dir)
                .await
                .with_context(|| format!("评估 {} 失败", path.display()))?;
            log_file_summary(&summary);
            summaries.push(summary);
        }

        log_finished("词汇质量评估");
        Ok(summaries)
    }

    async fn evaluate_file(&self, path: &Path, output_dir: &Path) -> Result<FileSummary> {
        let vocabulary = load_vocabulary(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        log_file_start(&name, vocabulary.len());

        let mut records = self.evaluate_vocabulary(&name, &vocabulary).await;

        let report = report_path(output_dir, path);
        write_report(&report, &mut records).await?;

        Ok(FileSummary {
            source: path.to_path_buf(),
            report,
            stats: ScoreStats::from_records(&records, 1.0),
        })
    }

    /// 并发评估一个词汇表，结果按单词排序
    pub async fn evaluate_vocabulary(&self, label: &str, vocabulary: &Vocabulary) -> Vec<EvaluationRecord> {
        let progress = Progress::new(format!("评估 {}", label), vocabulary.len());

        let mut tasks: FuturesUnordered<_> = vocabulary
            .iter()
            .map(|(word, entry)| {
                let flow = &self.flow;
                let progress = &progress;
                async move {
                    let record = flow.evaluate(word, entry).await;
                    progress.advance();
                    record
                }
            })
            .collect();

        let mut records = Vec::with_capacity(vocabulary.len());
        while let Some(record) = tasks.next().await {
            records.push(record);
        }

        records.sort_by(|a, b| a.word.cmp(&b.word));
        records
    }
}

/// 选出要评估的文件
///
/// 目录不存在或最终一个文件都没有时报错；显式列出但不存在的文件跳过。
pub fn select_files(options: &EvaluateOptions) -> Result<Vec<PathBuf>> {
    let files = if options.files.is_empty() {
        find_files(&options.words_dir, &options.pattern)?
    } else {
        options
            .files
            .iter()
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    warn!("⚠️ 文件不存在，跳过: {}", path.display());
                }
                exists
            })
            .cloned()
            .collect()
    };

    if files.is_empty() {
        bail!(
            "没有找到待评估的文件 (目录: {}, 模式: {})",
            options.words_dir.display(),
            options.pattern
        );
    }
    Ok(files)
}

// ========== 日志辅助函数 ==========

fn log_file_summary(summary: &FileSummary) {
    let stats = &summary.stats;
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string());

    separator('-');
    info!("📊 {} 评估完成", summary.source.display());
    info!("  单词数: {}", stats.total);
    info!("  平均分: {}", fmt(stats.mean));
    info!("  最低分: {}", fmt(stats.min));
    info!("  最高分: {}", fmt(stats.max));
    info!("  无分数: {}", stats.unknown);
    info!("💾 报告已保存至: {}", summary.report.display());
}

//! 评估报告统计
//!
//! 按级别和总体输出：总数、有分数、无分数、低于 0.8 的数量与比例、
//! 平均值、中位数、最小值、最大值、样本标准差，以及跨级别的最差/最好单词。

use std::path::Path;
use tracing::info;

use crate::error::AppResult;
use crate::models::{EvaluationRecord, ScoreStats};
use crate::storage::{discover_reports, read_report};
use crate::utils::logging::separator;

/// 低分线
pub const LOW_SCORE: f64 = 0.8;

/// 带级别的单词分数
#[derive(Debug, Clone, PartialEq)]
pub struct RankedWord {
    pub level: String,
    pub word: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct LevelAnalysis {
    pub level: String,
    pub stats: ScoreStats,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub levels: Vec<LevelAnalysis>,
    pub overall: ScoreStats,
    /// 分数升序
    pub worst: Vec<RankedWord>,
    /// 分数降序
    pub best: Vec<RankedWord>,
}

/// 统计一组 (级别, 记录)
pub fn analyze_records(reports: &[(String, Vec<EvaluationRecord>)], top_n: usize) -> Analysis {
    let levels = reports
        .iter()
        .map(|(level, records)| LevelAnalysis {
            level: level.clone(),
            stats: ScoreStats::from_records(records, LOW_SCORE),
        })
        .collect();
    let overall = ScoreStats::from_records(reports.iter().flat_map(|(_, records)| records), LOW_SCORE);

    let mut ranked: Vec<RankedWord> = reports
        .iter()
        .flat_map(|(level, records)| {
            records.iter().filter_map(move |r| {
                r.score.map(|score| RankedWord {
                    level: level.clone(),
                    word: r.word.clone(),
                    score,
                })
            })
        })
        .collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));

    let worst = ranked.iter().take(top_n).cloned().collect();
    let best = ranked.iter().rev().take(top_n).cloned().collect();

    Analysis {
        levels,
        overall,
        worst,
        best,
    }
}

/// 读取目录中的所有报告并统计
pub async fn analyze_reports(dir: &Path, top_n: usize) -> AppResult<Analysis> {
    let mut reports = Vec::new();
    for report in discover_reports(dir)? {
        let records = read_report(&report.path).await?;
        reports.push((report.level, records));
    }
    Ok(analyze_records(&reports, top_n))
}

// ========== 日志辅助函数 ==========

fn fmt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

fn log_stats_row(name: &str, stats: &ScoreStats) {
    info!(
        "{:<8} {:>7} {:>7} {:>7} {:>7} {:>7.1} {:>8} {:>8} {:>8} {:>8} {:>8}",
        name,
        stats.total,
        stats.scored,
        stats.unknown,
        stats.below,
        stats.below_percent(),
        fmt(stats.mean),
        fmt(stats.median),
        fmt(stats.min),
        fmt(stats.max),
        fmt(stats.stdev),
    );
}

fn log_ranking(title: &str, words: &[RankedWord]) {
    separator('=');
    info!("{}", title);
    separator('=');
    for item in words {
        info!("{:<8} {:<24} {:.4}", item.level, item.word, item.score);
    }
}

/// 输出统计表
pub fn print_analysis(analysis: &Analysis) {
    if analysis.levels.is_empty() {
        info!("⚠️ 没有评估报告");
        return;
    }

    separator('=');
    info!("📊 翻译与例句质量统计");
    separator('=');
    info!(
        "{:<8} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "级别", "总数", "有分数", "无分数", "<0.8", "%<0.8", "平均", "中位数", "最低", "最高", "标准差"
    );
    separator('-');
    for level in &analysis.levels {
        log_stats_row(&level.level, &level.stats);
    }
    separator('-');
    log_stats_row("总计", &analysis.overall);

    log_ranking(&format!("📉 分数最低的 {} 个单词", analysis.worst.len()), &analysis.worst);
    log_ranking(&format!("📈 分数最高的 {} 个单词", analysis.best.len()), &analysis.best);
}

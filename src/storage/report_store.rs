//! 评估报告读写
//!
//! 每个词汇文件对应一个报告：`<output_dir>/<stem>_evaluation.json`，
//! 内容为按单词排序的 `[{word, score}]`。

use std::path::{Path, PathBuf};

use crate::error::AppResult;
use crate::models::EvaluationRecord;
use crate::storage::discovery::find_files;
use crate::storage::json_file::{read_json, write_json, JsonStyle};

const REPORT_SUFFIX: &str = "_evaluation";
const VOCABULARY_PREFIX: &str = "vocabulary_";

/// 发现的报告文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    /// 大写级别名，例如 `N5`
    pub level: String,
    pub path: PathBuf,
}

/// 词汇文件对应的报告路径
pub fn report_path(output_dir: &Path, vocabulary_path: &Path) -> PathBuf {
    let stem = vocabulary_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    output_dir.join(format!("{}{}.json", stem, REPORT_SUFFIX))
}

/// 按单词排序后写出报告
pub async fn write_report(path: &Path, records: &mut [EvaluationRecord]) -> AppResult<()> {
    records.sort_by(|a, b| a.word.cmp(&b.word));
    write_json(path, records, JsonStyle::Pretty).await
}

pub async fn read_report(path: &Path) -> AppResult<Vec<EvaluationRecord>> {
    read_json(path).await
}

/// `vocabulary_n5_evaluation` → `N5`
pub fn level_from_stem(stem: &str) -> String {
    let stem = stem.strip_suffix(REPORT_SUFFIX).unwrap_or(stem);
    let stem = stem.strip_prefix(VOCABULARY_PREFIX).unwrap_or(stem);
    stem.to_uppercase()
}

/// 查找目录中的全部报告，目录不存在时报错
pub fn discover_reports(dir: &Path) -> AppResult<Vec<ReportFile>> {
    let files = find_files(dir, &format!("*{}.json", REPORT_SUFFIX))?;
    Ok(files
        .into_iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            ReportFile {
                level: level_from_stem(&stem),
                path,
            }
        })
        .collect())
}

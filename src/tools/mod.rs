//! 词汇文件维护工具
//!
//! - `chunking`：按条数拆分、合并
//! - `minify`：去掉例句等字段 / 从完整数据恢复这些字段
//! - `related`：用 reranker 计算相关词
//! - `analyze`：评估报告统计

use std::path::{Path, PathBuf};

pub mod analyze;
pub mod chunking;
pub mod minify;
pub mod related;

pub use analyze::{analyze_records, analyze_reports, print_analysis, Analysis, LevelAnalysis, RankedWord};
pub use chunking::{merge_files, merge_vocabularies, split_file, split_vocabulary};
pub use minify::{enrich_file, enrich_vocabulary, load_reference, minify_file, minify_vocabulary, OPTIONAL_FIELDS};
pub use related::{RelatedOptions, RelatedWordsBuilder};

/// `<dir>/<stem><suffix><.ext>`，`dir` 默认为源文件所在目录
pub fn derived_path(source: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}{}", stem, suffix, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_path() {
        let source = Path::new("words/vocabulary_n5.json");
        assert_eq!(
            derived_path(source, None, "_min"),
            PathBuf::from("words/vocabulary_n5_min.json")
        );
        assert_eq!(
            derived_path(source, Some(Path::new("out")), "_part2"),
            PathBuf::from("out/vocabulary_n5_part2.json")
        );
    }
}

//! 拆分与合并词汇文件

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::Vocabulary;
use crate::storage::{load_vocabulary, write_json, JsonStyle};
use crate::tools::derived_path;

/// 按键顺序每 `chunk_size` 个词条拆成一块
pub fn split_vocabulary(vocabulary: &Vocabulary, chunk_size: usize) -> AppResult<Vec<Vocabulary>> {
    if chunk_size == 0 {
        return Err(AppError::Config(ConfigError::InvalidValue {
            name: "chunk_size".to_string(),
            reason: "必须为正数".to_string(),
        }));
    }

    let entries: Vec<_> = vocabulary.iter().collect();
    Ok(entries
        .chunks(chunk_size)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(word, entry)| ((*word).clone(), (*entry).clone()))
                .collect()
        })
        .collect())
}

/// 拆分一个文件，输出 `<stem>_part<N>.json`（N 从 1 开始）
pub async fn split_file(path: &Path, chunk_size: usize, output_dir: Option<&Path>) -> AppResult<Vec<PathBuf>> {
    let vocabulary = load_vocabulary(path).await?;
    let chunks = split_vocabulary(&vocabulary, chunk_size)?;
    if chunks.is_empty() {
        info!("{}: 没有词条，跳过", path.display());
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let target = derived_path(path, output_dir, &format!("_part{}", index + 1));
        write_json(&target, chunk, JsonStyle::Pretty).await?;
        info!("{} [{} 个词条] -> {}", path.display(), chunk.len(), target.display());
        written.push(target);
    }
    Ok(written)
}

/// 合并多个词汇表，同一单词以第一次出现的为准
pub fn merge_vocabularies<I>(parts: I) -> Vocabulary
where
    I: IntoIterator<Item = Vocabulary>,
{
    let mut merged = Vocabulary::new();
    for part in parts {
        for (word, entry) in part {
            merged.entry(word).or_insert(entry);
        }
    }
    merged
}

/// 按给定顺序合并文件并写出
pub async fn merge_files(paths: &[PathBuf], output: &Path) -> AppResult<usize> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        parts.push(load_vocabulary(path).await?);
    }
    let merged = merge_vocabularies(parts);
    write_json(output, &merged, JsonStyle::Pretty).await?;
    info!("合并 {} 个文件 ({} 个词条) -> {}", paths.len(), merged.len(), output.display());
    Ok(merged.len())
}

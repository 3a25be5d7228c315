/// 输入文件查找
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, FileError};

/// 目录必须存在
pub fn ensure_dir(dir: &Path) -> AppResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AppError::File(FileError::DirectoryNotFound {
            path: dir.display().to_string(),
        }))
    }
}

/// 在目录中按 glob 模式查找文件，按路径排序
pub fn find_files(dir: &Path, pattern: &str) -> AppResult<Vec<PathBuf>> {
    ensure_dir(dir)?;

    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let entries = glob::glob(&full_pattern).map_err(|e| {
        AppError::File(FileError::BadPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// 与 [`find_files`] 相同，但一个文件都没有时报错
pub fn find_files_nonempty(dir: &Path, pattern: &str) -> AppResult<Vec<PathBuf>> {
    let files = find_files(dir, pattern)?;
    if files.is_empty() {
        return Err(AppError::File(FileError::NoMatches {
            dir: dir.display().to_string(),
            pattern: pattern.to_string(),
        }));
    }
    Ok(files)
}

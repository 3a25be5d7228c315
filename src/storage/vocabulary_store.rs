//! 词汇文件存储
//!
//! 每个级别一个文件：`<words_dir>/vocabulary_<level 小写>.json`。
//! 保存时先把旧文件复制为 `<file>.backup`，备份失败则放弃保存；
//! 新内容通过"临时文件 + 重命名"写入。

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError};
use crate::models::Vocabulary;
use crate::storage::json_file::{read_json, with_appended_suffix, write_json, JsonStyle};

/// 加载一个词汇文件
pub async fn load_vocabulary(path: &Path) -> AppResult<Vocabulary> {
    let vocabulary: Vocabulary = read_json(path).await?;
    debug!("已加载 {}: {} 个单词", path.display(), vocabulary.len());
    Ok(vocabulary)
}

/// 按级别读写词汇文件
#[derive(Debug, Clone)]
pub struct VocabularyStore {
    words_dir: PathBuf,
}

impl VocabularyStore {
    pub fn new(words_dir: impl Into<PathBuf>) -> Self {
        Self {
            words_dir: words_dir.into(),
        }
    }

    /// 级别对应的文件路径
    pub fn path_for(&self, level: &str) -> PathBuf {
        self.words_dir
            .join(format!("vocabulary_{}.json", level.to_lowercase()))
    }

    /// 备份文件路径
    pub fn backup_path(path: &Path) -> PathBuf {
        with_appended_suffix(path, "backup")
    }

    /// 加载级别对应的词汇表，文件不存在时返回 `FileError::NotFound`
    pub async fn load(&self, level: &str) -> AppResult<Vocabulary> {
        load_vocabulary(&self.path_for(level)).await
    }

    /// 保存级别对应的词汇表
    ///
    /// # 返回
    /// 成功时返回创建的备份路径（原文件不存在时为 `None`）
    pub async fn save(&self, level: &str, vocabulary: &Vocabulary) -> AppResult<Option<PathBuf>> {
        let path = self.path_for(level);
        let backup = self.backup_existing(&path).await?;
        write_json(&path, vocabulary, JsonStyle::Pretty).await?;
        info!("💾 已保存 {} ({} 个单词)", path.display(), vocabulary.len());
        Ok(backup)
    }

    async fn backup_existing(&self, path: &Path) -> AppResult<Option<PathBuf>> {
        if fs::metadata(path).await.is_err() {
            return Ok(None);
        }
        let backup = Self::backup_path(path);
        fs::copy(path, &backup).await.map_err(|source| {
            AppError::File(FileError::BackupFailed {
                path: backup.display().to_string(),
                source,
            })
        })?;
        info!("  已创建备份: {}", backup.display());
        Ok(Some(backup))
    }
}

/// JSON 文件读写
///
/// 写入时先写 `<file>.tmp`，成功后再重命名覆盖目标文件，
/// 写入失败时原文件保持不变。
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, AppResult};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    /// 两空格缩进
    Pretty,
    /// 无空白
    Compact,
}

/// 读取并解析 JSON 文件
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;
    serde_json::from_str(&content).map_err(|e| AppError::json_failed(&display, e))
}

/// 原子地写入 JSON 文件（非 ASCII 字符原样输出）
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, style: JsonStyle) -> AppResult<()> {
    let display = path.display().to_string();
    let mut body = match style {
        JsonStyle::Pretty => serde_json::to_string_pretty(value),
        JsonStyle::Compact => serde_json::to_string(value),
    }
    .map_err(|e| AppError::json_failed(&display, e))?;
    body.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
    }

    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, body.as_bytes()).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(AppError::file_write_failed(tmp.display().to_string(), e));
    }
    fs::rename(&tmp, path)
        .await
        .map_err(|e| AppError::file_write_failed(&display, e))
}

/// `<file>.tmp`
pub fn tmp_path(path: &Path) -> PathBuf {
    with_appended_suffix(path, "tmp")
}

/// 在完整文件名后追加后缀，例如 `a.json` → `a.json.backup`
pub fn with_appended_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_write_then_read_keeps_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_json(&path, &json!({"水": "вода"}), JsonStyle::Pretty).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"水\": \"вода\""));
        assert!(!tmp_path(&path).exists());
        let back: Value = read_json(&path).await.unwrap();
        assert_eq!(back["水"], "вода");
    }

    #[tokio::test]
    async fn test_compact_style_has_no_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("min.json");
        write_json(&path, &json!({"a": [1, 2]}), JsonStyle::Compact).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":[1,2]}\n");
    }

    #[test]
    fn test_suffix_is_appended_to_full_name() {
        let path = Path::new("words/vocabulary_n5.json");
        assert_eq!(
            with_appended_suffix(path, "backup"),
            PathBuf::from("words/vocabulary_n5.json.backup")
        );
    }
}

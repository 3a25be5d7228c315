//! 单词处理上下文
//!
//! 封装"我正在处理哪个级别的哪个单词"这一信息

use std::fmt::Display;

/// 单词处理上下文（仅用于日志前缀）
#[derive(Debug, Clone)]
pub struct WordCtx {
    /// 级别，例如 `N5`
    pub level: String,

    pub word: String,
}

impl WordCtx {
    pub fn new(level: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            word: word.into(),
        }
    }
}

impl Display for WordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] [{}]", self.level, self.word)
    }
}

/// 文本处理辅助函数
use regex::Regex;
use std::sync::OnceLock;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[A-Za-z]*").expect("fence regex is valid"))
}

/// 去掉 markdown 代码块标记（```json ... ```）
pub fn strip_code_fence(reply: &str) -> String {
    fence_regex().replace_all(reply.trim(), "").trim().to_string()
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

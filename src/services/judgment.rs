//! 判断模式回复解析 - 业务能力层
//!
//! 把 LLM 的自由文本回复归类为"正确 / 错误 / 无法判断"。
//! 无法判断的回复按错误处理（保守策略），由调用方记录日志。

use serde_json::Value;

use crate::utils::text::strip_code_fence;

/// LLM 对一条翻译的判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// 回复中找不到明确结论
    Ambiguous,
}

impl Verdict {
    /// 转换为评分信号；无法判断视为错误
    pub fn signal(self) -> f64 {
        match self {
            Verdict::Correct => 1.0,
            Verdict::Incorrect | Verdict::Ambiguous => 0.0,
        }
    }
}

type VerdictExtractor = fn(&str) -> Option<Verdict>;

/// 按顺序尝试的解析方式：关键字优先，JSON 只处理不含关键字的回复
const VERDICT_EXTRACTORS: &[VerdictExtractor] = &[verdict_from_keywords, verdict_from_json];

/// 解析 LLM 回复
pub fn classify(reply: &str) -> Verdict {
    VERDICT_EXTRACTORS
        .iter()
        .find_map(|extract| extract(reply))
        .unwrap_or(Verdict::Ambiguous)
}

/// 关键字：出现 "incorrect" 即错误，否则出现 "correct" 即正确
fn verdict_from_keywords(reply: &str) -> Option<Verdict> {
    let lower = reply.to_lowercase();
    if lower.contains("incorrect") {
        Some(Verdict::Incorrect)
    } else if lower.contains("correct") {
        Some(Verdict::Correct)
    } else {
        None
    }
}

/// JSON 对象的 `verdict` 字段：布尔值或 right / wrong 之类的字符串
fn verdict_from_json(reply: &str) -> Option<Verdict> {
    let value: Value = serde_json::from_str(&strip_code_fence(reply)).ok()?;
    let object = value.as_object()?;

    let verdict = object.get("verdict")?;
    if let Some(flag) = verdict.as_bool() {
        return Some(if flag { Verdict::Correct } else { Verdict::Incorrect });
    }

    match verdict
        .as_str()
        .map(|v| v.trim().to_lowercase())
        .as_deref()
    {
        Some("correct" | "right" | "yes") => Some(Verdict::Correct),
        Some("incorrect" | "wrong" | "no") => Some(Verdict::Incorrect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_replies() {
        assert_eq!(classify("correct"), Verdict::Correct);
        assert_eq!(classify("Correct."), Verdict::Correct);
        assert_eq!(classify("INCORRECT"), Verdict::Incorrect);
        assert_eq!(classify("The translation is incorrect, it should be..."), Verdict::Incorrect);
    }

    #[test]
    fn test_json_replies_without_keywords() {
        assert_eq!(classify(r#"{"verdict": true}"#), Verdict::Correct);
        assert_eq!(classify("```json\n{\"verdict\": \"wrong\"}\n```"), Verdict::Incorrect);
        assert_eq!(classify(r#"{"verdict": "Yes"}"#), Verdict::Correct);
    }

    #[test]
    fn test_keywords_take_precedence_over_json() {
        // 只要出现 "correct" 且没有 "incorrect"，就按正确处理
        assert_eq!(classify(r#"{"correct": false}"#), Verdict::Correct);
        assert_eq!(classify(r#"{"verdict": "incorrect"}"#), Verdict::Incorrect);
        assert_eq!(classify(r#"{"is_correct": true}"#), Verdict::Correct);
    }

    #[test]
    fn test_ambiguous_defaults_to_incorrect_signal() {
        let verdict = classify("Трудно сказать.");
        assert_eq!(verdict, Verdict::Ambiguous);
        assert_eq!(verdict.signal(), 0.0);
        assert_eq!(classify(r#"{"confidence": 0.5}"#), Verdict::Ambiguous);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// 词性枚举
///
/// 无法识别的标签原样保存在 `Unknown` 中，保证多次处理后数据不丢失。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartOfSpeech {
    /// 名词
    Noun,
    /// 动词
    Verb,
    /// 形容词
    Adjective,
    /// 副词
    Adverb,
    /// 代词
    Pronoun,
    /// 介词
    Preposition,
    /// 连词
    Conjunction,
    /// 感叹词
    Interjection,
    /// 助词
    Particle,
    /// 其他
    Other,
    /// 未识别的标签
    Unknown(String),
}

impl PartOfSpeech {
    /// 所有标准标签（用于构建提示词）
    pub const STANDARD: [PartOfSpeech; 10] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Verb,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Interjection,
        PartOfSpeech::Particle,
        PartOfSpeech::Other,
    ];

    /// 获取标准名称
    pub fn name(&self) -> &str {
        match self {
            PartOfSpeech::Noun => "Noun",
            PartOfSpeech::Verb => "Verb",
            PartOfSpeech::Adjective => "Adjective",
            PartOfSpeech::Adverb => "Adverb",
            PartOfSpeech::Pronoun => "Pronoun",
            PartOfSpeech::Preposition => "Preposition",
            PartOfSpeech::Conjunction => "Conjunction",
            PartOfSpeech::Interjection => "Interjection",
            PartOfSpeech::Particle => "Particle",
            PartOfSpeech::Other => "Other",
            PartOfSpeech::Unknown(raw) => raw,
        }
    }

    /// 从名称解析词性（忽略大小写和首尾空白）
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "noun" => PartOfSpeech::Noun,
            "verb" => PartOfSpeech::Verb,
            "adjective" => PartOfSpeech::Adjective,
            "adverb" => PartOfSpeech::Adverb,
            "pronoun" => PartOfSpeech::Pronoun,
            "preposition" => PartOfSpeech::Preposition,
            "conjunction" => PartOfSpeech::Conjunction,
            "interjection" => PartOfSpeech::Interjection,
            "particle" => PartOfSpeech::Particle,
            "other" => PartOfSpeech::Other,
            _ => PartOfSpeech::Unknown(raw.to_string()),
        }
    }
}

impl From<String> for PartOfSpeech {
    fn from(raw: String) -> Self {
        PartOfSpeech::parse(&raw)
    }
}

impl From<PartOfSpeech> for String {
    fn from(pos: PartOfSpeech) -> Self {
        match pos {
            PartOfSpeech::Unknown(raw) => raw,
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_tags() {
        assert_eq!(PartOfSpeech::parse("Noun"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::parse(" verb "), PartOfSpeech::Verb);
        assert_eq!(PartOfSpeech::parse("PARTICLE"), PartOfSpeech::Particle);
    }

    #[test]
    fn test_unknown_tag_is_preserved_verbatim() {
        let pos: PartOfSpeech = serde_json::from_str("\"Adjective (i)\"").unwrap();
        assert_eq!(pos, PartOfSpeech::Unknown("Adjective (i)".to_string()));
        assert_eq!(serde_json::to_string(&pos).unwrap(), "\"Adjective (i)\"");
    }
}

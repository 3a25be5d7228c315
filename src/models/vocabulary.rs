//! 词汇数据模型
//!
//! 词汇文件是一个以单词为键的 JSON 对象，值为 [`VocabularyEntry`]。
//! 所有字段都是可选的；未知字段通过 `extra` 原样保留，
//! 磁盘上显式为 `null` 的已知字段写回时仍为 `null`。

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::part_of_speech::PartOfSpeech;

/// 单个级别（分区）的词汇表：单词 → 词条
pub type Vocabulary = BTreeMap<String, VocabularyEntry>;

/// 读入时显式为 `null` 的已知字段名
pub type NullFields = BTreeSet<&'static str>;

/// 例句：原文 + 译文
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Example {
    /// 日语原句
    pub text: Option<String>,
    /// 译文
    pub translation: Option<String>,
    pub extra: BTreeMap<String, Value>,
    pub null_fields: NullFields,
}

impl Example {
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            translation: Some(translation.into()),
            ..Default::default()
        }
    }

    /// 两侧都非空时返回 (原文, 译文)，否则该例句不参与评分
    pub fn scorable_pair(&self) -> Option<(&str, &str)> {
        let text = non_empty(self.text.as_deref())?;
        let translation = non_empty(self.translation.as_deref())?;
        Some((text, translation))
    }
}

/// 相关词（由 reranker 计算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedWord {
    pub word: String,
    pub score: f64,
}

/// 词条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyEntry {
    pub russian_translation: Option<String>,
    pub english_translation: Option<String>,
    pub part_of_speech: Option<PartOfSpeech>,
    pub russian_examples: Option<Vec<Example>>,
    pub english_examples: Option<Vec<Example>>,
    /// 级别标签，例如 N5
    pub level: Option<String>,
    pub related_words: Option<Vec<RelatedWord>>,
    /// 未建模的字段
    pub extra: BTreeMap<String, Value>,
    /// 为 `None` 且需要写回 `null` 的字段
    pub null_fields: NullFields,
}

impl VocabularyEntry {
    /// 非空的俄语翻译
    pub fn russian(&self) -> Option<&str> {
        non_empty(self.russian_translation.as_deref())
    }

    /// 非空的英语翻译
    pub fn english(&self) -> Option<&str> {
        non_empty(self.english_translation.as_deref())
    }

    pub fn russian_examples(&self) -> &[Example] {
        self.russian_examples.as_deref().unwrap_or_default()
    }

    pub fn english_examples(&self) -> &[Example] {
        self.english_examples.as_deref().unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ========== 序列化 ==========

/// 取出一个已知字段；值为 `null` 时记入 `nulls`
fn take_field<T: DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &'static str,
    nulls: &mut NullFields,
) -> serde_json::Result<Option<T>> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::Null) => {
            nulls.insert(key);
            Ok(None)
        }
        Some(value) => serde_json::from_value(value).map(Some),
    }
}

/// 写出一个已知字段：有值写值，记为 `null` 的写 `null`，否则省略
fn put_field<M: SerializeMap, T: Serialize>(
    map: &mut M,
    key: &'static str,
    value: &Option<T>,
    nulls: &NullFields,
) -> Result<(), M::Error> {
    match value {
        Some(value) => map.serialize_entry(key, value),
        None if nulls.contains(key) => map.serialize_entry(key, &Value::Null),
        None => Ok(()),
    }
}

impl<'de> Deserialize<'de> for Example {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let mut null_fields = NullFields::new();
        let text = take_field(&mut map, "text", &mut null_fields).map_err(D::Error::custom)?;
        let translation = take_field(&mut map, "translation", &mut null_fields).map_err(D::Error::custom)?;
        Ok(Self {
            text,
            translation,
            extra: map.into_iter().collect(),
            null_fields,
        })
    }
}

impl Serialize for Example {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        put_field(&mut map, "text", &self.text, &self.null_fields)?;
        put_field(&mut map, "translation", &self.translation, &self.null_fields)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VocabularyEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let mut nulls = NullFields::new();
        Ok(Self {
            russian_translation: take_field(&mut map, "russian_translation", &mut nulls).map_err(D::Error::custom)?,
            english_translation: take_field(&mut map, "english_translation", &mut nulls).map_err(D::Error::custom)?,
            part_of_speech: take_field(&mut map, "part_of_speech", &mut nulls).map_err(D::Error::custom)?,
            russian_examples: take_field(&mut map, "russian_examples", &mut nulls).map_err(D::Error::custom)?,
            english_examples: take_field(&mut map, "english_examples", &mut nulls).map_err(D::Error::custom)?,
            level: take_field(&mut map, "level", &mut nulls).map_err(D::Error::custom)?,
            related_words: take_field(&mut map, "related_words", &mut nulls).map_err(D::Error::custom)?,
            extra: map.into_iter().collect(),
            null_fields: nulls,
        })
    }
}

impl Serialize for VocabularyEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nulls = &self.null_fields;
        let mut map = serializer.serialize_map(None)?;
        put_field(&mut map, "russian_translation", &self.russian_translation, nulls)?;
        put_field(&mut map, "english_translation", &self.english_translation, nulls)?;
        put_field(&mut map, "part_of_speech", &self.part_of_speech, nulls)?;
        put_field(&mut map, "russian_examples", &self.russian_examples, nulls)?;
        put_field(&mut map, "english_examples", &self.english_examples, nulls)?;
        put_field(&mut map, "level", &self.level, nulls)?;
        put_field(&mut map, "related_words", &self.related_words, nulls)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

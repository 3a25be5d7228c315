//! 提示词构建 - 业务能力层

use crate::models::{Example, PartOfSpeech, VocabularyEntry};

/// 翻译的目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLanguage {
    Russian,
    English,
}

impl TargetLanguage {
    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::Russian => "Russian",
            TargetLanguage::English => "English",
        }
    }
}

/// 判断模式：让 LLM 判断译文是否正确，只回答一个词
pub fn build_judgment_prompt(source: &str, candidate: &str, language: TargetLanguage) -> String {
    format!(
        r#"You are a strict reviewer of Japanese study materials.

Japanese: {source}
{language} translation: {candidate}

Decide whether the {language} translation conveys the meaning of the Japanese text accurately and naturally.
Answer with exactly one word: "correct" or "incorrect"."#,
        source = source,
        candidate = candidate,
        language = language.name(),
    )
}

/// 重新生成：附带当前（被判定为有问题的）内容，要求返回固定结构的 JSON
pub fn build_regeneration_prompt(word: &str, entry: &VocabularyEntry) -> String {
    let level = entry.level.as_deref().unwrap_or("N5");
    let russian = entry.russian_translation.as_deref().unwrap_or_default();
    let english = entry.english_translation.as_deref().unwrap_or_default();
    let part_of_speech = entry
        .part_of_speech
        .as_ref()
        .map(|pos| pos.name().to_string())
        .unwrap_or_else(|| PartOfSpeech::Other.name().to_string());
    let allowed_tags = PartOfSpeech::STANDARD
        .iter()
        .map(PartOfSpeech::name)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Ты помогаешь студентам изучать японский язык.
Подготовь перевод и примеры употребления слова '{word}' для уровня {level}.

Текущие перевод и примеры получили низкую оценку качества. Сделай их точнее и естественнее.

Текущие данные:
- Русский перевод: "{russian}"
- Английский перевод: "{english}"
- Часть речи: {part_of_speech}

Русские примеры сейчас:
{russian_examples}

Английские примеры сейчас:
{english_examples}

Перевод:
1. Русский перевод: одно предложение на русском языке.
2. Английский перевод: одно предложение на английском языке.
3. Не повторяй само слово: ответ используется как обратная сторона карточки.
4. Не добавляй чтение и транскрипцию.
5. Без вступлений и пояснений.
6. Если слово состоит из одного кандзи, объясни его как слово, а не как иероглиф.
7. Учитывай уровень {level}.

Примеры:
1. По 2 коротких примера для каждого языка, лучше текущих.
2. Самая простая грамматика уровня {level}.

Часть речи: одно из {allowed_tags}. Если "{part_of_speech}" верна, оставь её.

Верни СТРОГО валидный JSON без markdown-разметки:
{{
  "russian_translation": "...",
  "english_translation": "...",
  "part_of_speech": "Noun",
  "russian_examples": [{{"text": "японское предложение", "translation": "перевод на русский"}}],
  "english_examples": [{{"text": "японское предложение", "translation": "English translation"}}]
}}"#,
        word = word,
        level = level,
        russian = russian,
        english = english,
        part_of_speech = part_of_speech,
        russian_examples = examples_json(entry.russian_examples()),
        english_examples = examples_json(entry.english_examples()),
        allowed_tags = allowed_tags,
    )
}

fn examples_json(examples: &[Example]) -> String {
    serde_json::to_string_pretty(examples).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regeneration_prompt_embeds_defective_content() {
        let entry = VocabularyEntry {
            russian_translation: Some("огонь".to_string()),
            english_translation: Some("fire".to_string()),
            part_of_speech: Some(PartOfSpeech::Verb),
            russian_examples: Some(vec![Example::new("水を飲む。", "Пить огонь.")]),
            level: Some("N4".to_string()),
            ..Default::default()
        };

        let prompt = build_regeneration_prompt("水", &entry);

        assert!(prompt.contains("'水'"));
        assert!(prompt.contains("уровня N4"));
        assert!(prompt.contains("\"огонь\""));
        assert!(prompt.contains("Часть речи: Verb"));
        assert!(prompt.contains("Пить огонь."));
        assert!(prompt.contains("\"english_examples\""));
    }

    #[test]
    fn test_regeneration_prompt_defaults() {
        let prompt = build_regeneration_prompt("本", &VocabularyEntry::default());
        assert!(prompt.contains("уровня N5"));
        assert!(prompt.contains("Часть речи: Other"));
        assert!(prompt.contains("Русские примеры сейчас:\n[]"));
    }

    #[test]
    fn test_judgment_prompt_names_language() {
        let prompt = build_judgment_prompt("水", "вода", TargetLanguage::Russian);
        assert!(prompt.contains("Russian translation: вода"));
        assert!(prompt.contains("\"incorrect\""));
    }
}

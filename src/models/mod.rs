pub mod evaluation;
pub mod part_of_speech;
pub mod regeneration;
pub mod statistics;
pub mod vocabulary;

pub use evaluation::{aggregate, EvaluationRecord, ScoreMode, ScoreSignal};
pub use part_of_speech::PartOfSpeech;
pub use regeneration::{RegeneratedContent, RegenerationOutcome, RegenerationRecord, RegenerationStatus};
pub use statistics::ScoreStats;
pub use vocabulary::{Example, RelatedWord, Vocabulary, VocabularyEntry};

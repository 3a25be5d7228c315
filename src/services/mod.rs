pub mod judgment;
pub mod prompts;
pub mod scoring_service;

pub use judgment::{classify, Verdict};
pub use prompts::{build_judgment_prompt, build_regeneration_prompt, TargetLanguage};
pub use scoring_service::{ScoringBackend, ScoringService};

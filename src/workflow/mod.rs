pub mod evaluate_flow;
pub mod regenerate_flow;
pub mod word_ctx;

pub use evaluate_flow::EvaluateFlow;
pub use regenerate_flow::{parse_regenerated, RegenerateFlow};
pub use word_ctx::WordCtx;

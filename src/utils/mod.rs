pub mod logging;
pub mod progress;
pub mod retry;
pub mod text;

pub use progress::Progress;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use text::{strip_code_fence, truncate_text};

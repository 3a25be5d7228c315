//! 有限次数重试

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// 重试策略：最多尝试 `max_attempts` 次，第 n 次失败后等待 `base_delay * n`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul(attempt as u32)
    }
}

/// 反复调用 `attempt` 直到返回 `Some` 或次数用尽
///
/// `attempt` 接收当前尝试序号（从 1 开始），每次调用之间不共享状态。
///
/// # 返回
/// `(结果, 实际尝试次数)`；次数用尽时结果为 `None`，次数等于 `max_attempts`
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut attempt: F) -> (Option<T>, usize)
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for n in 1..=policy.max_attempts {
        if let Some(value) = attempt(n).await {
            return (Some(value), n);
        }
        if n < policy.max_attempts {
            let delay = policy.delay_after(n);
            debug!("第 {} 次尝试失败，{:?} 后重试", n, delay);
            tokio::time::sleep(delay).await;
        }
    }
    (None, policy.max_attempts)
}

//! 进度计数
//!
//! 多个并发任务共享同一个计数器，按约 10% 的间隔输出进度日志。

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

pub struct Progress {
    label: String,
    total: usize,
    step: usize,
    done: AtomicUsize,
}

impl Progress {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            step: (total / 10).max(1),
            done: AtomicUsize::new(0),
        }
    }

    /// 完成一项，返回当前完成数
    pub fn advance(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done == self.total || done % self.step == 0 {
            let percent = if self.total == 0 { 100 } else { done * 100 / self.total };
            info!("⏳ {}: {}/{} ({}%)", self.label, done, self.total, percent);
        }
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

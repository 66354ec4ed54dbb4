//! One-shot debounce deadline.
//!
//! The timer is plain data owned by the reconciler: arming replaces the
//! previous deadline, so at most one publish is ever pending, and dropping
//! the owner drops the pending publish with it. The endpoint task waits on
//! the deadline with [`sleep_until_deadline`].

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start (or restart) the countdown from now.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Resolve at the deadline, or never when there is none.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

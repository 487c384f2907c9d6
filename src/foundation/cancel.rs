use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::error::{HudError, HudResult};

/// Cancellation flag with an optional deadline and an optional parent.
///
/// Clones observe the same flag. A child derived with [`CancelToken::child_with_timeout`] owns
/// a separate flag: it fires when its parent fires, but cancelling or expiring the child never
/// reaches the parent. Workers call [`CancelToken::check`] at every frame boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that additionally expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::default()
        }
    }

    /// Derive a child with its own flag, bounded by `timeout` (the earlier deadline wins).
    pub fn child_with_timeout(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout.map(|t| Instant::now() + t)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
            deadline,
        }
    }

    /// Fire this token and its clones and children.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// `true` once this token or an ancestor is cancelled, or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.expired()
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return [`HudError::Cancelled`] when the token has fired.
    pub fn check(&self, what: &str) -> HudResult<()> {
        if !self.is_cancelled() {
            return Ok(());
        }
        if self.expired() {
            return Err(HudError::cancelled(format!("{what}: job deadline exceeded")));
        }
        Err(HudError::cancelled(what.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cancel.rs"]
mod tests;

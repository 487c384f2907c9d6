//! Line-oriented progress channel: `STATUS:<message>` and `PROGRESS:<percent>`.

use std::io::Write;
use std::sync::Mutex;

use tracing::debug;

/// Percentage sub-range owned by one pipeline phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBand {
    pub start: u8,
    pub end: u8,
}

impl PhaseBand {
    pub const INGEST: Self = Self { start: 5, end: 10 };
    pub const RENDER: Self = Self { start: 15, end: 75 };
    pub const MERGE: Self = Self { start: 75, end: 85 };
    pub const COMPOSE: Self = Self { start: 85, end: 100 };

    /// Percentage at `fraction` of the band (floored, clamped to the band).
    pub fn at(self, fraction: f64) -> u8 {
        let f = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let span = f64::from(self.end - self.start);
        self.start + (f * span).floor() as u8
    }

    /// Percentage after `done` of `total` steps.
    pub fn step(self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.end;
        }
        self.at(done as f64 / total as f64)
    }
}

struct Channel {
    out: Box<dyn Write + Send>,
    last: u8,
}

/// Thread-safe progress writer; percentages never go backwards.
pub struct ProgressReporter {
    inner: Mutex<Channel>,
}

impl ProgressReporter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Channel {
                out: Box::new(out),
                last: 0,
            }),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Reporter that discards everything.
    pub fn silent() -> Self {
        Self::new(std::io::sink())
    }

    pub fn status(&self, message: &str) {
        let mut ch = self.lock();
        let line = format!("STATUS:{}", message.replace('\n', " "));
        write_line(&mut ch, &line);
    }

    /// Emit `pct`, or the last value if `pct` is lower.
    pub fn progress(&self, pct: u8) {
        let mut ch = self.lock();
        ch.last = ch.last.max(pct.min(100));
        let line = format!("PROGRESS:{}", ch.last);
        write_line(&mut ch, &line);
    }

    /// Status line followed by a progress line.
    pub fn report(&self, pct: u8, message: &str) {
        self.status(message);
        self.progress(pct);
    }

    /// Like [`ProgressReporter::report`], but only when `pct` is ahead of the last percentage.
    ///
    /// Returns whether anything was written. Callers racing on several threads use this so a
    /// late status line never follows a newer one.
    pub fn report_advance(&self, pct: u8, message: &str) -> bool {
        let mut ch = self.lock();
        let pct = pct.min(100);
        if pct <= ch.last {
            return false;
        }
        ch.last = pct;
        let status = format!("STATUS:{}", message.replace('\n', " "));
        write_line(&mut ch, &status);
        let line = format!("PROGRESS:{pct}");
        write_line(&mut ch, &line);
        true
    }

    /// Re-emit the last percentage.
    pub fn heartbeat(&self) {
        let last = self.last();
        self.progress(last);
    }

    pub fn last(&self) -> u8 {
        self.lock().last
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Channel> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last", &self.last())
            .finish_non_exhaustive()
    }
}

// A closed progress pipe must not fail the job.
fn write_line(ch: &mut Channel, line: &str) {
    if let Err(e) = writeln!(ch.out, "{line}").and_then(|()| ch.out.flush()) {
        debug!(error = %e, "progress channel write failed");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;

//! Clock implementations

use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;

use super::Clock;
use crate::types::EpochMillis;

/// Wall clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMillis {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same instant, so a test can keep one handle while the
/// tracker owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<EpochMillis>>,
}

impl ManualClock {
    /// Create a clock frozen at `now_ms`
    pub fn new(now_ms: EpochMillis) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Jump to an absolute instant
    pub fn set(&self, now_ms: EpochMillis) {
        self.now.set(now_ms);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        let ms = i64::try_from(ms).unwrap_or(i64::MAX);
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EpochMillis {
        self.now.get()
    }
}

//! Virtual-time timer queue
//!
//! [`TimerQueue`] implements [`Scheduler`] without touching real time.
//! Deadlines are kept relative to the queue's own elapsed counter, which
//! only moves through [`TimerQueue::advance`]. Tests use it to step the
//! tracker tick by tick; the CLI sleeps for [`TimerQueue::next_delay`] and
//! then advances by the same amount.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::Scheduler;

/// Handle of a timer scheduled on a [`TimerQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

struct QueueState {
    /// Virtual milliseconds elapsed since the queue was created
    elapsed_ms: u64,
    next_id: u64,
    /// Keyed by (deadline, id) so equal deadlines fire in scheduling order
    timers: BTreeMap<(u64, TimerId), Box<dyn FnOnce()>>,
    /// Total callbacks run so far
    fired: u64,
}

/// Single-threaded virtual-time scheduler
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    state: Rc<RefCell<QueueState>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                elapsed_ms: 0,
                next_id: 0,
                timers: BTreeMap::new(),
                fired: 0,
            })),
        }
    }

    /// Virtual time elapsed so far
    pub fn elapsed_ms(&self) -> u64 {
        self.state.borrow().elapsed_ms
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Number of callbacks run so far
    pub fn fired(&self) -> u64 {
        self.state.borrow().fired
    }

    /// Time until the earliest pending deadline, `None` when idle
    pub fn next_delay(&self) -> Option<u64> {
        let state = self.state.borrow();
        state
            .timers
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(state.elapsed_ms))
    }

    /// Move virtual time forward by `ms`, running every callback that falls due
    ///
    /// Callbacks run in deadline order with the queue's clock set to their
    /// deadline, so a callback may schedule follow-ups that also fall inside
    /// the window. Returns the number of callbacks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.elapsed_ms().saturating_add(ms);
        let mut ran = 0;

        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next_key = match state.timers.keys().next() {
                    Some(&key) if key.0 <= target => key,
                    _ => break,
                };
                state.elapsed_ms = next_key.0;
                state.fired += 1;
                state.timers.remove(&next_key)
            };
            // The borrow is released before the callback runs so it can reschedule.
            if let Some(callback) = due {
                callback();
                ran += 1;
            }
        }

        self.state.borrow_mut().elapsed_ms = target;
        ran
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimerQueue")
            .field("elapsed_ms", &state.elapsed_ms)
            .field("pending", &state.timers.len())
            .field("fired", &state.fired)
            .finish()
    }
}

impl Scheduler for TimerQueue {
    type Handle = TimerId;

    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let deadline = state.elapsed_ms.saturating_add(delay_ms);
        state.timers.insert((deadline, id), callback);
        log::trace!("Timer {:?} scheduled in {}ms", id, delay_ms);
        id
    }

    fn cancel(&self, handle: TimerId) {
        let mut state = self.state.borrow_mut();
        let key = state.timers.keys().find(|(_, id)| *id == handle).copied();
        if let Some(key) = key {
            state.timers.remove(&key);
            log::trace!("Timer {:?} cancelled", handle);
        }
    }
}

//! The relative-time tracker
//!
//! [`TempoSync`] owns the set of tracked labels, the structural-change
//! subscription and the self-rescheduling refresh timer. Every host
//! capability is injected, so any number of independent trackers can
//! coexist (one per page is the intended usage).
//!
//! Bad input never surfaces as an error: absent nodes, missing marker
//! attributes and unparsable instants are ignored, and nodes that left the
//! document are dropped during the next refresh pass.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::TrackerConfig;
use crate::format::{format_relative, refresh_granularity};
use crate::host::{Clock, Document, MutationRecord, Node, Scheduler};
use crate::types::{EpochMillis, Result, TrackedEntry, IDLE_INTERVAL_MS};

struct State<N, H, W> {
    entries: Vec<TrackedEntry<N>>,
    observing: bool,
    timer: Option<H>,
    watcher: Option<W>,
}

struct Shared<D: Document, S: Scheduler, C: Clock> {
    document: D,
    scheduler: S,
    clock: C,
    config: TrackerConfig,
    state: RefCell<State<D::Node, S::Handle, D::Subscription>>,
}

/// Keeps relative-time labels on marked nodes up to date
///
/// Clones are handles to the same tracker. Timer and mutation callbacks
/// only hold weak references, so dropping the last handle cancels the
/// pending refresh and unsubscribes from the document.
///
/// # Example
/// ```
/// use tempo_sync::{ManualClock, MemoryDocument, MemoryNode, Node, TempoSync, TimerQueue};
///
/// let doc = MemoryDocument::new();
/// let label = MemoryNode::element("time").with_attribute("data-tempo", "2022-01-01T00:00:00Z");
/// doc.append_child(&doc.body(), label.clone());
///
/// let clock = ManualClock::new(1_640_995_200_000 + 3 * 3_600_000);
/// let tracker = TempoSync::new(doc, TimerQueue::new(), clock);
/// tracker.start();
///
/// assert_eq!(tracker.len(), 1);
/// assert_eq!(label.text(), "3 hours ago");
/// ```
pub struct TempoSync<D: Document, S: Scheduler, C: Clock> {
    shared: Rc<Shared<D, S, C>>,
}

impl<D: Document, S: Scheduler, C: Clock> Clone for TempoSync<D, S, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<D: Document, S: Scheduler, C: Clock> TempoSync<D, S, C> {
    /// Create a tracker with the default configuration
    pub fn new(document: D, scheduler: S, clock: C) -> Self {
        Self::build(document, scheduler, clock, TrackerConfig::default())
    }

    /// Create a tracker with a custom configuration
    pub fn with_config(document: D, scheduler: S, clock: C, config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(document, scheduler, clock, config))
    }

    fn build(document: D, scheduler: S, clock: C, config: TrackerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                document,
                scheduler,
                clock,
                config,
                state: RefCell::new(State {
                    entries: Vec::new(),
                    observing: false,
                    timer: None,
                    watcher: None,
                }),
            }),
        }
    }

    /// Begin observing: scan, watch for structural changes, start the timer
    ///
    /// No-op while already observing.
    pub fn start(&self) {
        self.shared.start();
    }

    /// Stop observing: cancel the timer, forget every label, unsubscribe
    ///
    /// Safe to call at any time, including before `start`.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Track a node whose marker attribute holds a valid instant, and render it
    ///
    /// Absent nodes, missing attributes and invalid instants are ignored.
    /// Re-adding a tracked node re-reads its instant. Returns whether the
    /// node is tracked.
    pub fn add<'a>(&self, node: impl Into<Option<&'a D::Node>>) -> bool
    where
        D::Node: 'a,
    {
        match node.into() {
            Some(node) => self.shared.add(node),
            None => false,
        }
    }

    /// Stop tracking a node; returns false when it was not tracked
    pub fn remove<'a>(&self, node: impl Into<Option<&'a D::Node>>) -> bool
    where
        D::Node: 'a,
    {
        match node.into() {
            Some(node) => self.shared.remove(node),
            None => false,
        }
    }

    /// Track every marked element currently in the document
    pub fn scan(&self) {
        self.shared.scan();
    }

    /// Subscribe to structural changes of the document body
    ///
    /// Returns false when watching is disabled or unsupported by the host,
    /// in which case labels are still refreshed by the timer.
    pub fn watch(&self) -> bool {
        self.shared.watch()
    }

    /// Run a refresh pass now and keep refreshing on the adaptive cadence
    ///
    /// No-op while a refresh is already scheduled.
    pub fn start_timer(&self) {
        self.shared.start_timer();
    }

    /// Cancel the scheduled refresh, if any
    pub fn stop_timer(&self) {
        self.shared.stop_timer();
    }

    /// Re-render every tracked label, dropping nodes no longer in the document
    pub fn render_all(&self) {
        self.shared.render_all();
    }

    /// Write the label for `origin_ms` into `node`
    pub fn render(&self, node: &D::Node, origin_ms: EpochMillis) {
        self.shared.render(node, origin_ms);
    }

    /// Delay before the next refresh pass, driven by the youngest label
    pub fn next_interval(&self) -> u64 {
        self.shared.next_interval()
    }

    /// Format a delta the same way labels are rendered
    pub fn format(&self, delta_ms: i64) -> String {
        format_relative(delta_ms)
    }

    /// Number of tracked labels
    pub fn len(&self) -> usize {
        self.shared.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the tracked labels
    pub fn entries(&self) -> Vec<TrackedEntry<D::Node>> {
        self.shared.state.borrow().entries.clone()
    }

    /// Whether `node` is tracked
    pub fn is_tracking(&self, node: &D::Node) -> bool {
        self.shared
            .state
            .borrow()
            .entries
            .iter()
            .any(|entry| entry.node == *node)
    }

    pub fn is_observing(&self) -> bool {
        self.shared.state.borrow().observing
    }

    /// Whether a refresh pass is scheduled
    pub fn has_pending_timer(&self) -> bool {
        self.shared.state.borrow().timer.is_some()
    }

    /// Whether a structural-change subscription is live
    pub fn is_watching(&self) -> bool {
        self.shared.state.borrow().watcher.is_some()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    pub fn document(&self) -> &D {
        &self.shared.document
    }

    pub fn scheduler(&self) -> &S {
        &self.shared.scheduler
    }

    pub fn clock(&self) -> &C {
        &self.shared.clock
    }
}

impl<D: Document, S: Scheduler, C: Clock> fmt::Debug for TempoSync<D, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempoSync")
            .field("config", &self.shared.config)
            .field("tracked", &self.len())
            .field("observing", &self.is_observing())
            .field("pending_timer", &self.has_pending_timer())
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl<D: Document, S: Scheduler, C: Clock> Shared<D, S, C> {
    fn start(self: &Rc<Self>) {
        if self.state.borrow().observing {
            return;
        }
        self.state.borrow_mut().observing = true;

        self.scan();
        self.watch();
        self.start_timer();

        log::info!(
            "Tracking {} label(s) marked with '{}'",
            self.state.borrow().entries.len(),
            self.config.marker_attribute
        );
    }

    fn stop(&self) {
        self.state.borrow_mut().observing = false;
        self.stop_timer();

        let (cleared, watcher) = {
            let mut state = self.state.borrow_mut();
            let cleared = state.entries.len();
            state.entries.clear();
            (cleared, state.watcher.take())
        };
        // Unsubscribe outside the borrow; the host may run code on disconnect.
        drop(watcher);

        log::info!("Stopped tracking ({} label(s) released)", cleared);
    }

    fn add(&self, node: &D::Node) -> bool {
        let attribute = &self.config.marker_attribute;
        let value = match node.attribute(attribute) {
            Some(value) if !value.is_empty() => value,
            _ => return false,
        };
        let origin_ms = match self.clock.parse_instant(&value) {
            Some(origin_ms) => origin_ms,
            None => {
                log::debug!("Ignoring {:?}: '{}' is not a valid instant", node, value);
                return false;
            }
        };

        {
            let mut state = self.state.borrow_mut();
            match state.entries.iter_mut().find(|entry| entry.node == *node) {
                Some(entry) => {
                    log::debug!("Re-read origin of {:?}: {}", node, origin_ms);
                    entry.origin_ms = origin_ms;
                }
                None => {
                    log::debug!("Tracking {:?} from {}", node, origin_ms);
                    state.entries.push(TrackedEntry::new(node.clone(), origin_ms));
                }
            }
        }

        self.render(node, origin_ms);
        true
    }

    fn remove(&self, node: &D::Node) -> bool {
        let mut state = self.state.borrow_mut();
        match state.entries.iter().position(|entry| entry.node == *node) {
            Some(index) => {
                state.entries.swap_remove(index);
                log::debug!("Released {:?}", node);
                true
            }
            None => false,
        }
    }

    fn scan(&self) {
        for node in self.document.query_all(&self.config.marker_attribute) {
            self.add(&node);
        }
    }

    fn watch(self: &Rc<Self>) -> bool {
        if !self.config.watch_mutations {
            log::debug!("Structural-change watching disabled by configuration");
            return false;
        }
        if self.state.borrow().watcher.is_some() {
            return true;
        }

        let weak = Rc::downgrade(self);
        let callback = Box::new(move |records: &[MutationRecord<D::Node>]| {
            if let Some(shared) = weak.upgrade() {
                shared.apply_mutations(records);
            }
        });

        match self.document.observe_mutations(callback) {
            Some(subscription) => {
                self.state.borrow_mut().watcher = Some(subscription);
                true
            }
            None => {
                log::info!("Host cannot report structural changes, refreshing on timer only");
                false
            }
        }
    }

    fn apply_mutations(&self, records: &[MutationRecord<D::Node>]) {
        let attribute = &self.config.marker_attribute;
        for record in records {
            for node in record.added.iter().filter(|node| node.is_element()) {
                self.add(node);
                for descendant in node.descendants_with_attribute(attribute) {
                    self.add(&descendant);
                }
            }
            for node in record.removed.iter().filter(|node| node.is_element()) {
                self.remove(node);
                for descendant in node.descendants_with_attribute(attribute) {
                    self.remove(&descendant);
                }
            }
        }
    }

    fn start_timer(self: &Rc<Self>) {
        if self.state.borrow().timer.is_some() {
            return;
        }
        self.tick();
    }

    fn tick(self: &Rc<Self>) {
        self.render_all();
        let delay = self.next_interval();

        let weak = Rc::downgrade(self);
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.tick();
                }
            }),
        );
        self.state.borrow_mut().timer = Some(handle);
        log::trace!("Next refresh in {}ms", delay);
    }

    fn stop_timer(&self) {
        let timer = self.state.borrow_mut().timer.take();
        if let Some(handle) = timer {
            self.scheduler.cancel(handle);
        }
    }

    fn render_all(&self) {
        let mut state = self.state.borrow_mut();
        state.entries.retain(|entry| {
            if self.document.contains(&entry.node) {
                self.render(&entry.node, entry.origin_ms);
                true
            } else {
                log::debug!("Dropping detached {:?}", entry.node);
                false
            }
        });
    }

    fn render(&self, node: &D::Node, origin_ms: EpochMillis) {
        let delta = self.clock.now_ms().saturating_sub(origin_ms);
        node.set_text(&format_relative(delta));
    }

    fn next_interval(&self) -> u64 {
        let now = self.clock.now_ms();
        self.state
            .borrow()
            .entries
            .iter()
            .map(|entry| refresh_granularity(entry.age_ms(now)))
            .min()
            .unwrap_or(IDLE_INTERVAL_MS)
    }
}

impl<D: Document, S: Scheduler, C: Clock> Drop for Shared<D, S, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().timer.take() {
            self.scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ManualClock, MemoryDocument, MemoryNode, TimerQueue};

    const NOW: EpochMillis = 1_640_995_200_000;

    type Tracker = TempoSync<MemoryDocument, TimerQueue, ManualClock>;

    fn tracker() -> (Tracker, MemoryDocument, TimerQueue, ManualClock) {
        let doc = MemoryDocument::new();
        let queue = TimerQueue::new();
        let clock = ManualClock::new(NOW);
        let tracker = TempoSync::new(doc.clone(), queue.clone(), clock.clone());
        (tracker, doc, queue, clock)
    }

    #[test]
    fn test_with_config_validates() {
        let config = TrackerConfig::new().with_marker_attribute("");
        let result = TempoSync::with_config(
            MemoryDocument::new(),
            TimerQueue::new(),
            ManualClock::new(NOW),
            config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_marker_attribute() {
        let doc = MemoryDocument::new();
        let node = MemoryNode::element("span").with_attribute("data-since", "2022-01-01T00:00:00Z");
        doc.append_child(&doc.body(), node.clone());

        let config = TrackerConfig::new().with_marker_attribute("data-since");
        let tracker =
            TempoSync::with_config(doc, TimerQueue::new(), ManualClock::new(NOW + 60_000), config)
                .unwrap();
        tracker.scan();

        assert!(tracker.is_tracking(&node));
        assert_eq!(node.text(), "1 minute ago");
    }

    #[test]
    fn test_readd_replaces_entry() {
        let (tracker, _doc, _queue, _clock) = tracker();
        let node = MemoryNode::element("span").with_attribute("data-tempo", "2022-01-01T00:00:00Z");

        assert!(tracker.add(&node));
        node.set_attribute("data-tempo", "2021-12-31T00:00:00Z");
        assert!(tracker.add(&node));

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.entries()[0].origin_ms, NOW - 86_400_000);
        assert_eq!(node.text(), "1 day ago");
    }

    #[test]
    fn test_empty_attribute_is_ignored() {
        let (tracker, _doc, _queue, _clock) = tracker();
        let node = MemoryNode::element("span").with_attribute("data-tempo", "");
        assert!(!tracker.add(&node));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_dropping_tracker_cancels_timer_and_unsubscribes() {
        let (tracker, doc, queue, _clock) = tracker();
        tracker.start();
        assert_eq!(queue.pending(), 1);
        assert_eq!(doc.observer_count(), 1);

        drop(tracker);
        assert_eq!(queue.pending(), 0);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let (tracker, _doc, _queue, _clock) = tracker();
        let other = tracker.clone();
        let node = MemoryNode::element("span").with_attribute("data-tempo", "2022-01-01T00:00:00Z");

        tracker.add(&node);
        assert_eq!(other.len(), 1);
        assert_eq!(other.format(-120_000), "in 2 minutes");
    }
}

// End-to-end behaviour of the tracker against the in-memory host
use tempo_sync::{
    EpochMillis, ManualClock, MemoryDocument, MemoryNode, Node, TempoSync, TimerQueue,
};

// 2022-01-01 00:00:00 UTC
const NOW: EpochMillis = 1_640_995_200_000;

type Tracker = TempoSync<MemoryDocument, TimerQueue, ManualClock>;

struct Harness {
    tracker: Tracker,
    doc: MemoryDocument,
    queue: TimerQueue,
    clock: ManualClock,
}

impl Harness {
    fn new() -> Self {
        Self::with_document(MemoryDocument::new())
    }

    fn with_document(doc: MemoryDocument) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let queue = TimerQueue::new();
        let clock = ManualClock::new(NOW);
        let tracker = TempoSync::new(doc.clone(), queue.clone(), clock.clone());
        Self { tracker, doc, queue, clock }
    }

    /// Let `ms` of real time pass, firing each refresh at its own instant
    fn elapse(&self, ms: u64) {
        let mut remaining = ms;
        while let Some(delay) = self.queue.next_delay() {
            if delay > remaining {
                break;
            }
            self.clock.advance(delay);
            self.queue.advance(delay);
            remaining -= delay;
        }
        self.clock.advance(remaining);
        self.queue.advance(remaining);
    }

    fn attach(&self, node: &MemoryNode) {
        self.doc.append_child(&self.doc.body(), node.clone());
    }
}

fn label(origin: &str) -> MemoryNode {
    MemoryNode::element("time").with_attribute("data-tempo", origin)
}

fn iso(ms: EpochMillis) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .unwrap()
        .to_rfc3339()
}

#[test]
fn start_initializes_and_renders() {
    let h = Harness::new();
    let node = label("2022-01-01T00:00:00Z");
    h.attach(&node);

    h.tracker.start();

    assert!(h.tracker.is_observing());
    assert!(h.tracker.is_watching());
    assert!(h.tracker.has_pending_timer());
    assert_eq!(h.tracker.len(), 1);
    assert_eq!(node.text(), "just now");
}

#[test]
fn start_twice_installs_one_timer_and_one_watcher() {
    let h = Harness::new();
    h.tracker.start();
    h.tracker.start();

    assert_eq!(h.queue.pending(), 1);
    assert_eq!(h.doc.observer_count(), 1);
}

#[test]
fn stop_clears_entries_and_cancels_timer() {
    let h = Harness::new();
    h.attach(&label("2022-01-01T00:00:00Z"));
    h.tracker.start();
    assert_eq!(h.tracker.len(), 1);

    h.tracker.stop();

    assert!(!h.tracker.is_observing());
    assert!(!h.tracker.has_pending_timer());
    assert!(!h.tracker.is_watching());
    assert!(h.tracker.is_empty());
    assert_eq!(h.queue.pending(), 0);
    assert_eq!(h.doc.observer_count(), 0);
}

#[test]
fn stop_without_start_is_harmless() {
    let h = Harness::new();
    h.tracker.stop();
    h.tracker.stop();
    assert!(!h.tracker.is_observing());
}

#[test]
fn restart_after_stop() {
    let h = Harness::new();
    h.attach(&label("2022-01-01T00:00:00Z"));

    h.tracker.start();
    h.tracker.stop();
    h.tracker.start();

    assert_eq!(h.tracker.len(), 1);
    assert_eq!(h.queue.pending(), 1);
    assert_eq!(h.doc.observer_count(), 1);
}

#[test]
fn add_valid_invalid_and_absent() {
    let h = Harness::new();

    assert!(h.tracker.add(&label("2022-01-01T00:00:00Z")));
    assert_eq!(h.tracker.len(), 1);

    assert!(!h.tracker.add(&label("invalid-date")));
    assert_eq!(h.tracker.len(), 1);

    assert!(!h.tracker.add(&MemoryNode::element("span")));
    assert_eq!(h.tracker.len(), 1);

    assert!(!h.tracker.add(None::<&MemoryNode>));
    assert!(!h.tracker.add(&MemoryNode::text_node("2022-01-01T00:00:00Z")));
    assert_eq!(h.tracker.len(), 1);
}

#[test]
fn add_renders_past_and_future() {
    let h = Harness::new();
    let past = label(&iso(NOW - 3 * 3_600_000));
    let future = label(&iso(NOW + 2 * 3_600_000));

    h.tracker.add(&past);
    h.tracker.add(&future);

    assert_eq!(past.text(), "3 hours ago");
    assert_eq!(future.text(), "in 2 hours");
}

#[test]
fn remove_tracked_and_untracked() {
    let h = Harness::new();
    let node = label("2022-01-01T00:00:00Z");

    h.tracker.add(&node);
    assert!(h.tracker.remove(&node));
    assert_eq!(h.tracker.len(), 0);

    assert!(!h.tracker.remove(&node));
    assert!(!h.tracker.remove(&label("2022-01-01T00:00:00Z")));
    assert!(!h.tracker.remove(None::<&MemoryNode>));
}

#[test]
fn next_interval_follows_youngest_label() {
    let h = Harness::new();
    assert_eq!(h.tracker.next_interval(), 60_000);

    let hours_old = label(&iso(NOW - 2 * 3_600_000));
    h.tracker.add(&hours_old);
    assert_eq!(h.tracker.next_interval(), 3_600_000);

    let minutes_old = label(&iso(NOW - 5 * 60_000));
    h.tracker.add(&minutes_old);
    assert_eq!(h.tracker.next_interval(), 60_000);

    let seconds_old = label(&iso(NOW - 30_000));
    h.tracker.add(&seconds_old);
    assert_eq!(h.tracker.next_interval(), 1_000);

    h.tracker.remove(&seconds_old);
    h.tracker.remove(&minutes_old);
    assert_eq!(h.tracker.next_interval(), 3_600_000);

    let days_old = label(&iso(NOW - 3 * 86_400_000));
    h.tracker.remove(&hours_old);
    h.tracker.add(&days_old);
    assert_eq!(h.tracker.next_interval(), 86_400_000);
}

#[test]
fn future_labels_drive_cadence_by_distance() {
    let h = Harness::new();
    h.tracker.add(&label(&iso(NOW + 30_000)));
    assert_eq!(h.tracker.next_interval(), 1_000);
}

#[test]
fn render_all_drops_detached_nodes() {
    let h = Harness::new();
    let attached = label("2022-01-01T00:00:00Z");
    let detached = label("2022-01-01T00:00:00Z");
    h.attach(&attached);

    h.tracker.add(&attached);
    h.tracker.add(&detached);
    assert_eq!(h.tracker.len(), 2);

    h.clock.advance(5 * 60_000);
    h.tracker.render_all();

    assert_eq!(h.tracker.len(), 1);
    assert!(h.tracker.is_tracking(&attached));
    assert_eq!(attached.text(), "5 minutes ago");
    // the dropped node keeps whatever it last showed
    assert_eq!(detached.text(), "just now");
}

#[test]
fn timer_refreshes_on_adaptive_cadence() {
    let h = Harness::new();
    let node = label("2022-01-01T00:00:00Z");
    h.attach(&node);
    h.tracker.start();

    // young label: one-second ticks
    assert_eq!(h.queue.next_delay(), Some(1_000));
    h.elapse(1_000);
    assert_eq!(h.queue.fired(), 1);
    assert_eq!(h.queue.next_delay(), Some(1_000));

    // past the minute mark the cadence relaxes to a minute
    h.elapse(59_000);
    assert_eq!(node.text(), "1 minute ago");
    assert_eq!(h.queue.next_delay(), Some(60_000));

    h.elapse(60_000);
    assert_eq!(node.text(), "2 minutes ago");
    assert_eq!(h.queue.pending(), 1);
}

#[test]
fn start_timer_twice_keeps_one_timer() {
    let h = Harness::new();
    h.tracker.start_timer();
    h.tracker.start_timer();

    assert!(h.tracker.has_pending_timer());
    assert_eq!(h.queue.pending(), 1);

    h.tracker.stop_timer();
    assert!(!h.tracker.has_pending_timer());
    assert_eq!(h.queue.pending(), 0);
}

#[test]
fn watcher_tracks_added_and_removed_subtrees() {
    let h = Harness::new();
    h.tracker.start();
    assert!(h.tracker.is_empty());

    let first = label("2022-01-01T00:00:00Z");
    let second = label("2021-12-25T00:00:00Z");
    let container = MemoryNode::element("section")
        .with_child(first.clone())
        .with_child(MemoryNode::element("div").with_child(second.clone()));

    h.attach(&container);
    assert_eq!(h.tracker.len(), 2);
    assert_eq!(second.text(), "1 week ago");

    h.doc.remove_child(&h.doc.body(), &container);
    assert!(h.tracker.is_empty());
}

#[test]
fn watcher_ignores_unmarked_and_text_nodes() {
    let h = Harness::new();
    h.tracker.start();

    h.attach(&MemoryNode::element("div"));
    h.attach(&MemoryNode::text_node("2022-01-01T00:00:00Z"));
    h.attach(&label("not a date"));

    assert!(h.tracker.is_empty());
}

#[test]
fn reattached_node_is_tracked_once() {
    let h = Harness::new();
    let node = label("2022-01-01T00:00:00Z");
    h.attach(&node);
    h.tracker.start();

    let wrapper = MemoryNode::element("div");
    h.attach(&wrapper);
    // moving the node raises a removal then an addition
    h.doc.append_child(&wrapper, node.clone());

    assert_eq!(h.tracker.len(), 1);
}

#[test]
fn missing_mutation_support_degrades_to_timer_only() {
    let h = Harness::with_document(MemoryDocument::without_mutation_support());
    let node = label("2022-01-01T00:00:00Z");
    h.attach(&node);

    h.tracker.start();

    assert!(h.tracker.is_observing());
    assert!(!h.tracker.is_watching());
    assert!(h.tracker.has_pending_timer());
    assert_eq!(h.tracker.len(), 1);

    // later additions are not noticed, but refreshes continue
    h.attach(&label("2022-01-01T00:00:00Z"));
    assert_eq!(h.tracker.len(), 1);

    h.elapse(120_000);
    assert_eq!(node.text(), "2 minutes ago");
}

#[test]
fn stopped_tracker_stops_rendering() {
    let h = Harness::new();
    let node = label("2022-01-01T00:00:00Z");
    h.attach(&node);
    h.tracker.start();
    h.tracker.stop();

    h.elapse(10 * 60_000);
    assert_eq!(node.text(), "just now");
    assert_eq!(h.queue.fired(), 0);
}

//! Tempo Sync Library
//!
//! Keeps human-readable "time ago" / "time until" labels on document
//! elements in sync with the passage of real time.
//!
//! # Architecture
//!
//! A single tracker ([`TempoSync`]) coordinates everything:
//! - Scans the document for elements carrying the marker attribute
//!   (`data-tempo` by default) and renders their labels
//! - Follows elements added to / removed from the document body, when the
//!   host can report structural changes
//! - Refreshes all labels on a self-adjusting timer whose cadence follows the
//!   youngest label (every second under a minute, up to once a day)
//!
//! The document, clock and scheduler are injected through the traits in
//! [`host`]. An in-memory document and a virtual-time scheduler are bundled;
//! the `web` feature adds a browser host.
//!
//! # Example Usage
//!
//! ```
//! use tempo_sync::{format_relative, ManualClock, MemoryDocument, MemoryNode, Node, TempoSync, TimerQueue};
//!
//! assert_eq!(format_relative(2 * 60_000), "2 minutes ago");
//! assert_eq!(format_relative(-2 * 3_600_000), "in 2 hours");
//!
//! let doc = MemoryDocument::new();
//! let queue = TimerQueue::new();
//! let clock = ManualClock::new(1_640_995_200_000);
//!
//! let tracker = TempoSync::new(doc.clone(), queue.clone(), clock.clone());
//! tracker.start();
//!
//! // Labels added later are picked up by the structural-change watcher
//! let label = MemoryNode::element("time").with_attribute("data-tempo", "2022-01-01T00:00:00Z");
//! doc.append_child(&doc.body(), label.clone());
//! assert_eq!(label.text(), "just now");
//!
//! // The young label drives a one-second cadence
//! assert_eq!(tracker.next_interval(), 1_000);
//!
//! clock.advance(90_000);
//! queue.advance(90_000);
//! assert_eq!(label.text(), "1 minute ago");
//!
//! tracker.stop();
//! assert!(tracker.is_empty());
//! ```

// Public modules
pub mod config;
pub mod format;
pub mod host;
pub mod instant;
pub mod tracker;
pub mod types;

// Re-export main types for convenience
pub use config::TrackerConfig;
pub use format::{format_relative, refresh_granularity, RelativeTime, Tense, Unit, JUST_NOW};
pub use host::{
    Clock, Document, ManualClock, MemoryDocument, MemoryNode, MemorySubscription,
    MutationCallback, MutationRecord, Node, Scheduler, SystemClock, TimerId, TimerQueue,
};
pub use instant::parse_instant;
pub use tracker::TempoSync;
pub use types::{
    EpochMillis, Result, TempoError, TrackedEntry, DEFAULT_MARKER_ATTRIBUTE, IDLE_INTERVAL_MS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

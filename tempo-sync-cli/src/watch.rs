//! `watch` mode: keep configured labels in sync on the terminal
//!
//! Builds an in-memory document with one marked element per label, runs a
//! tracker over it on the system clock, and sleeps from one refresh
//! deadline to the next, printing the labels whose text changed.

use anyhow::Result;
use std::io::Write;
use std::thread;
use std::time::Duration;
use tempo_sync::{MemoryDocument, MemoryNode, Node, SystemClock, TempoSync, TimerQueue};

use crate::config::{AppConfig, LabelConfig};
use crate::report::{write_rows, LabelRow, ReportFormat};

/// A tracker running over the configured labels
pub struct WatchSession {
    tracker: TempoSync<MemoryDocument, TimerQueue, SystemClock>,
    queue: TimerQueue,
    labels: Vec<(LabelConfig, MemoryNode)>,
}

impl WatchSession {
    /// Build the document and the tracker (not started yet)
    pub fn new(config: &AppConfig) -> Result<Self> {
        let doc = MemoryDocument::new();
        let queue = TimerQueue::new();
        let marker = config.tracker.marker_attribute.as_str();

        let mut labels = Vec::with_capacity(config.labels.len());
        for label in &config.labels {
            let node = MemoryNode::element("time")
                .with_attribute(marker, &label.timestamp)
                .with_attribute("data-name", &label.name);
            doc.append_child(&doc.body(), node.clone());
            labels.push((label.clone(), node));
        }

        let tracker =
            TempoSync::with_config(doc, queue.clone(), SystemClock, config.tracker.clone())?;

        Ok(Self {
            tracker,
            queue,
            labels,
        })
    }

    pub fn start(&self) {
        self.tracker.start();
    }

    /// Current state of every configured label
    pub fn snapshot(&self) -> Vec<LabelRow> {
        self.labels
            .iter()
            .map(|(label, node)| LabelRow {
                name: label.name.clone(),
                timestamp: label.timestamp.clone(),
                text: node.text(),
                tracked: self.tracker.is_tracking(node),
            })
            .collect()
    }

    /// Sleep until the next refresh and run it; false when nothing is scheduled
    pub fn step(&self) -> bool {
        let Some(delay) = self.queue.next_delay() else {
            return false;
        };
        log::debug!("Sleeping {}ms until next refresh", delay);
        thread::sleep(Duration::from_millis(delay));
        self.queue.advance(delay);
        true
    }

    pub fn stop(&self) {
        self.tracker.stop();
    }
}

/// Run `watch` mode until `max_ticks` refreshes have happened (forever if `None`)
pub fn run<W: Write>(
    config: &AppConfig,
    max_ticks: Option<u64>,
    format: ReportFormat,
    out: &mut W,
) -> Result<()> {
    let session = WatchSession::new(config)?;
    session.start();

    let mut last = session.snapshot();
    write_rows(out, &last, format)?;

    let mut ticks = 0u64;
    while max_ticks.map_or(true, |max| ticks < max) {
        if !session.step() {
            break;
        }
        ticks += 1;

        let current = session.snapshot();
        let changed: Vec<LabelRow> = current
            .iter()
            .zip(&last)
            .filter(|(now, before)| now != before)
            .map(|(now, _)| now.clone())
            .collect();
        if !changed.is_empty() {
            write_rows(out, &changed, format)?;
        }
        last = current;
    }

    session.stop();
    log::info!("Watch finished after {} refresh(es)", ticks);
    Ok(())
}

//! Host capabilities the tracker depends on
//!
//! The tracker never talks to a browser directly. Everything it needs from
//! its environment is expressed here as a trait, and injected when the
//! tracker is built:
//! - [`Document`] / [`Node`]: querying, containment and label writes, plus
//!   the optional structural-change subscription
//! - [`Clock`]: the current instant and the instant parser
//! - [`Scheduler`]: deferred single-shot callbacks
//!
//! Bundled implementations: an in-memory document ([`memory`]), a virtual
//! time timer queue ([`scheduler`]), system and manual clocks ([`clock`]),
//! and with the `web` feature, a browser host ([`web`]).

use std::fmt;

use crate::instant::parse_instant;
use crate::types::EpochMillis;

pub mod clock;
pub mod memory;
pub mod scheduler;

#[cfg(feature = "web")]
pub mod web;

pub use clock::{ManualClock, SystemClock};
pub use memory::{MemoryDocument, MemoryNode, MemorySubscription};
pub use scheduler::{TimerId, TimerQueue};

#[cfg(feature = "web")]
pub use web::{browser_tracker, BrowserTempoSync, WebClock, WebDocument, WebScheduler, WebSubscription, WebTimer};

/// A node of the host document
///
/// Clones are handles to the same node; equality is node identity.
pub trait Node: Clone + PartialEq + fmt::Debug + 'static {
    /// True for element nodes (text and other node kinds are ignored)
    fn is_element(&self) -> bool;

    /// Value of an attribute, if present
    fn attribute(&self, name: &str) -> Option<String>;

    /// Current display text
    fn text(&self) -> String;

    /// Replace the display text
    fn set_text(&self, text: &str);

    /// All descendants (not including `self`) carrying the attribute
    fn descendants_with_attribute(&self, name: &str) -> Vec<Self>;
}

/// A batch entry of structural changes under the observed root
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord<N> {
    /// Nodes inserted into the tree
    pub added: Vec<N>,
    /// Nodes taken out of the tree
    pub removed: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn added(nodes: Vec<N>) -> Self {
        Self { added: nodes, removed: Vec::new() }
    }

    pub fn removed(nodes: Vec<N>) -> Self {
        Self { added: Vec::new(), removed: nodes }
    }
}

/// Callback invoked with each batch of structural changes
pub type MutationCallback<N> = Box<dyn FnMut(&[MutationRecord<N>])>;

/// The host document
pub trait Document: 'static {
    type Node: Node;

    /// Live subscription to structural changes; dropping it unsubscribes
    type Subscription;

    /// Every element in the document carrying the attribute
    fn query_all(&self, attribute: &str) -> Vec<Self::Node>;

    /// Whether the node is still attached to the document
    fn contains(&self, node: &Self::Node) -> bool;

    /// Subscribe to child additions/removals anywhere under the body
    ///
    /// Returns `None` when the host has no structural-change support; the
    /// caller must carry on without it.
    fn observe_mutations(
        &self,
        callback: MutationCallback<Self::Node>,
    ) -> Option<Self::Subscription>;
}

/// Source of the current instant
pub trait Clock: 'static {
    /// Current wall-clock instant in milliseconds since the epoch
    fn now_ms(&self) -> EpochMillis;

    /// Parse a marker value, `None` when it is not a valid instant
    fn parse_instant(&self, text: &str) -> Option<EpochMillis> {
        parse_instant(text).ok()
    }
}

/// Deferred single-shot callbacks
pub trait Scheduler: 'static {
    type Handle;

    /// Run `callback` once, `delay_ms` from now
    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> Self::Handle;

    /// Cancel a callback that has not run yet; no-op if it already ran
    fn cancel(&self, handle: Self::Handle);
}

//! In-memory document
//!
//! A small element tree with a body root, attributes and display text. It
//! reports child additions/removals under the body the way a browser's
//! structural-change observer does (child list, whole subtree), which makes
//! it suitable both for tests and for non-browser hosts such as the CLI.
//!
//! Mutation batches raised while another batch is being delivered are
//! queued and delivered after it, never re-entrantly.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use super::{Document, MutationCallback, MutationRecord, Node};

enum NodeKind {
    Element { tag: String },
    Text,
}

struct NodeData {
    kind: NodeKind,
    attributes: RefCell<BTreeMap<String, String>>,
    text: RefCell<String>,
    children: RefCell<Vec<MemoryNode>>,
    parent: RefCell<Weak<NodeData>>,
}

/// Handle to a node of a [`MemoryDocument`]
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeData>);

impl MemoryNode {
    fn with_kind(kind: NodeKind, text: &str) -> Self {
        MemoryNode(Rc::new(NodeData {
            kind,
            attributes: RefCell::new(BTreeMap::new()),
            text: RefCell::new(text.to_string()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
        }))
    }

    /// Create a detached element
    pub fn element(tag: &str) -> Self {
        Self::with_kind(NodeKind::Element { tag: tag.to_string() }, "")
    }

    /// Create a detached text node
    pub fn text_node(text: &str) -> Self {
        Self::with_kind(NodeKind::Text, text)
    }

    /// Builder method: set an attribute
    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder method: append a child (no mutation records, the node is detached)
    pub fn with_child(self, child: MemoryNode) -> Self {
        child.detach();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
        self
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.borrow_mut().remove(name);
    }

    /// Tag name, `None` for text nodes
    pub fn tag(&self) -> Option<String> {
        match &self.0.kind {
            NodeKind::Element { tag } => Some(tag.clone()),
            NodeKind::Text => None,
        }
    }

    pub fn children(&self) -> Vec<MemoryNode> {
        self.0.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<MemoryNode> {
        self.0.parent.borrow().upgrade().map(MemoryNode)
    }

    /// Unlink from the current parent, returning it
    fn detach(&self) -> Option<MemoryNode> {
        let parent = self.parent()?;
        parent.0.children.borrow_mut().retain(|c| c != self);
        *self.0.parent.borrow_mut() = Weak::new();
        Some(parent)
    }

    fn collect_with_attribute(&self, name: &str, out: &mut Vec<MemoryNode>) {
        for child in self.0.children.borrow().iter() {
            if child.is_element() && child.0.attributes.borrow().contains_key(name) {
                out.push(child.clone());
            }
            child.collect_with_attribute(name, out);
        }
    }
}

impl PartialEq for MemoryNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MemoryNode {}

impl fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Element { tag } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("attributes", &*self.0.attributes.borrow())
                .field("text", &*self.0.text.borrow())
                .finish(),
            NodeKind::Text => f.debug_tuple("Text").field(&*self.0.text.borrow()).finish(),
        }
    }
}

impl Node for MemoryNode {
    fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element { .. })
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if !self.is_element() {
            return None;
        }
        self.0.attributes.borrow().get(name).cloned()
    }

    fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    /// Replaces the node's own text; children are left untouched and no
    /// mutation record is raised.
    fn set_text(&self, text: &str) {
        *self.0.text.borrow_mut() = text.to_string();
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<Self> {
        let mut found = Vec::new();
        self.collect_with_attribute(name, &mut found);
        found
    }
}

type SharedCallback = Rc<RefCell<MutationCallback<MemoryNode>>>;

struct DocInner {
    body: MemoryNode,
    mutation_support: bool,
    observers: RefCell<Vec<(u64, SharedCallback)>>,
    next_observer: Cell<u64>,
    pending: RefCell<Vec<MutationRecord<MemoryNode>>>,
    delivering: Cell<bool>,
}

/// In-memory document rooted at a `<body>` element
///
/// Clones share the same tree.
#[derive(Clone)]
pub struct MemoryDocument {
    inner: Rc<DocInner>,
}

impl MemoryDocument {
    /// Create an empty document that reports structural changes
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Create an empty document whose host lacks structural-change support
    pub fn without_mutation_support() -> Self {
        Self::build(false)
    }

    fn build(mutation_support: bool) -> Self {
        Self {
            inner: Rc::new(DocInner {
                body: MemoryNode::element("body"),
                mutation_support,
                observers: RefCell::new(Vec::new()),
                next_observer: Cell::new(0),
                pending: RefCell::new(Vec::new()),
                delivering: Cell::new(false),
            }),
        }
    }

    pub fn body(&self) -> MemoryNode {
        self.inner.body.clone()
    }

    /// Number of live mutation subscriptions
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Append `child` to `parent`, moving it if it already has a parent
    pub fn append_child(&self, parent: &MemoryNode, child: MemoryNode) {
        if let Some(old_parent) = child.detach() {
            if self.contains(&old_parent) {
                self.notify(MutationRecord::removed(vec![child.clone()]));
            }
        }

        *child.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
        parent.0.children.borrow_mut().push(child.clone());

        if self.contains(parent) {
            self.notify(MutationRecord::added(vec![child]));
        }
    }

    /// Remove `child` from `parent`; false when it was not a child
    pub fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) -> bool {
        if child.parent().as_ref() != Some(parent) {
            return false;
        }
        child.detach();

        if self.contains(parent) {
            self.notify(MutationRecord::removed(vec![child.clone()]));
        }
        true
    }

    fn notify(&self, record: MutationRecord<MemoryNode>) {
        if !self.inner.mutation_support {
            return;
        }
        self.inner.pending.borrow_mut().push(record);
        if self.inner.delivering.get() {
            return;
        }

        self.inner.delivering.set(true);
        loop {
            let batch = mem::take(&mut *self.inner.pending.borrow_mut());
            if batch.is_empty() {
                break;
            }
            let observers: Vec<SharedCallback> = self
                .inner
                .observers
                .borrow()
                .iter()
                .map(|(_, callback)| callback.clone())
                .collect();
            for observer in observers {
                let mut callback = observer.borrow_mut();
                (&mut **callback)(&batch);
            }
        }
        self.inner.delivering.set(false);
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("body", &self.inner.body)
            .field("mutation_support", &self.inner.mutation_support)
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Subscription returned by [`MemoryDocument::observe_mutations`]
///
/// Dropping it stops delivery.
pub struct MemorySubscription {
    doc: Weak<DocInner>,
    id: u64,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(doc) = self.doc.upgrade() {
            doc.observers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for MemorySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySubscription").field("id", &self.id).finish()
    }
}

impl Document for MemoryDocument {
    type Node = MemoryNode;
    type Subscription = MemorySubscription;

    fn query_all(&self, attribute: &str) -> Vec<MemoryNode> {
        let body = &self.inner.body;
        let mut found = Vec::new();
        if body.attribute(attribute).is_some() {
            found.push(body.clone());
        }
        found.extend(body.descendants_with_attribute(attribute));
        found
    }

    fn contains(&self, node: &MemoryNode) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n == self.inner.body {
                return true;
            }
            current = n.parent();
        }
        false
    }

    fn observe_mutations(
        &self,
        callback: MutationCallback<MemoryNode>,
    ) -> Option<MemorySubscription> {
        if !self.inner.mutation_support {
            return None;
        }
        let id = self.inner.next_observer.get();
        self.inner.next_observer.set(id + 1);
        self.inner
            .observers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));

        Some(MemorySubscription {
            doc: Rc::downgrade(&self.inner),
            id,
        })
    }
}

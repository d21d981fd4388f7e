//! Browser host (feature `web`)
//!
//! Runs the tracker against a live page: `querySelectorAll` for scans,
//! `MutationObserver` for structural changes, `setTimeout` for refreshes
//! and `Date` for the clock and the instant parser.

use std::fmt;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, MutationObserver, MutationObserverInit, NodeList, Window};

use super::{Clock, Document, MutationCallback, MutationRecord, Node, Scheduler};
use crate::tracker::TempoSync;
use crate::types::EpochMillis;

/// Tracker wired to the current browser page
pub type BrowserTempoSync = TempoSync<WebDocument, WebScheduler, WebClock>;

/// Build a tracker for the current page, `None` outside a browser window
pub fn browser_tracker() -> Option<BrowserTempoSync> {
    let window = web_sys::window()?;
    let document = WebDocument::from_window(&window)?;
    Some(TempoSync::new(document, WebScheduler::new(window), WebClock))
}

fn attribute_selector(name: &str) -> String {
    format!("[{}]", name)
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Node for Element {
    fn is_element(&self) -> bool {
        true
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn text(&self) -> String {
        self.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.set_text_content(Some(text));
    }

    fn descendants_with_attribute(&self, name: &str) -> Vec<Self> {
        match self.query_selector_all(&attribute_selector(name)) {
            Ok(list) => elements(&list),
            Err(err) => {
                log::warn!("querySelectorAll failed for '{}': {:?}", name, err);
                Vec::new()
            }
        }
    }
}

/// The page's `document`
#[derive(Clone)]
pub struct WebDocument {
    document: web_sys::Document,
    mutation_support: bool,
}

impl WebDocument {
    /// Wrap the document of `window`
    pub fn from_window(window: &Window) -> Option<Self> {
        let document = window.document()?;
        let mutation_support =
            js_sys::Reflect::has(window.as_ref(), &JsValue::from_str("MutationObserver"))
                .unwrap_or(false);
        Some(Self {
            document,
            mutation_support,
        })
    }
}

impl fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDocument")
            .field("mutation_support", &self.mutation_support)
            .finish()
    }
}

/// Live `MutationObserver`; dropping it disconnects the observer
pub struct WebSubscription {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl Drop for WebSubscription {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl Document for WebDocument {
    type Node = Element;
    type Subscription = WebSubscription;

    fn query_all(&self, attribute: &str) -> Vec<Element> {
        match self.document.query_selector_all(&attribute_selector(attribute)) {
            Ok(list) => elements(&list),
            Err(err) => {
                log::warn!("querySelectorAll failed for '{}': {:?}", attribute, err);
                Vec::new()
            }
        }
    }

    fn contains(&self, node: &Element) -> bool {
        self.document.contains(Some(node.as_ref()))
    }

    fn observe_mutations(&self, mut callback: MutationCallback<Element>) -> Option<WebSubscription> {
        if !self.mutation_support {
            return None;
        }
        let body = self.document.body()?;

        let closure = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch: Vec<MutationRecord<Element>> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                    .map(|record| MutationRecord {
                        added: elements(&record.added_nodes()),
                        removed: elements(&record.removed_nodes()),
                    })
                    .collect();
                callback(&batch);
            },
        );

        let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::info!("MutationObserver unavailable: {:?}", err);
                return None;
            }
        };

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(err) = observer.observe_with_options(body.as_ref(), &options) {
            log::info!("MutationObserver.observe failed: {:?}", err);
            return None;
        }

        Some(WebSubscription {
            observer,
            _callback: closure,
        })
    }
}

/// `setTimeout` / `clearTimeout` of a window
#[derive(Clone)]
pub struct WebScheduler {
    window: Window,
}

impl WebScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl fmt::Debug for WebScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebScheduler").finish()
    }
}

/// Timeout id returned by `setTimeout`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebTimer(i32);

impl Scheduler for WebScheduler {
    type Handle = WebTimer;

    fn schedule(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> WebTimer {
        // Frees itself once invoked.
        let function = Closure::once_into_js(move || callback());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);

        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(function.unchecked_ref(), delay)
        {
            Ok(id) => WebTimer(id),
            Err(err) => {
                log::warn!("setTimeout failed: {:?}", err);
                WebTimer(0)
            }
        }
    }

    fn cancel(&self, handle: WebTimer) {
        self.window.clear_timeout_with_handle(handle.0);
    }
}

/// `Date.now()` / `Date.parse()`
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    fn now_ms(&self) -> EpochMillis {
        js_sys::Date::now() as EpochMillis
    }

    fn parse_instant(&self, text: &str) -> Option<EpochMillis> {
        let ms = js_sys::Date::parse(text);
        if ms.is_nan() {
            None
        } else {
            Some(ms as EpochMillis)
        }
    }
}

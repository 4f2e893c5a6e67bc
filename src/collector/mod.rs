//! The dispatch pipeline: capture-phase events come in, structured messages
//! go out. An event passes the enablement gate, its listener's pre-filter
//! and adapter, ancestor resolution, and the ordered rule entries; the
//! first entry whose formatted message clears its include/exclude/custom
//! gates produces the message handed to the queue or sink.

mod builder;

pub use builder::CollectorBuilder;

use crate::config::{ConfigDocument, EntrySpec, MessageFilter};
use crate::error::Error;
use crate::message::{self, Message};
use crate::node::{DomNode, Found};
use crate::queue::IdleQueue;
use crate::resolver::{self, Resolver};
use crate::rules::RuleSet;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Selector used to find the loggable ancestor when none is configured.
pub const DEFAULT_SELECTOR: &str = "[data-metric-label]";

/// Default per-tick drain budget in milliseconds.
pub const DEFAULT_FRAME_SIZE: u64 = 100;

/// Pre-filter deciding whether an event enters the pipeline at all.
pub type EventFilter<N> = Rc<dyn Fn(&RawEvent<N>) -> bool>;

/// Extracts extra message fields from the raw event (key names, pointer
/// coordinates, ...). Built-in fields win on collision.
pub type EventAdapter<N> = Rc<dyn Fn(&RawEvent<N>) -> Map<String, Value>>;

/// Global message post-processor; returning `None` drops the message.
pub type FormatHook = Rc<dyn Fn(Message) -> Option<Message>>;

/// An event as delivered by the host: a kind string, the target node, and
/// whatever host-specific detail an adapter may want to extract.
#[derive(Debug, Clone)]
pub struct RawEvent<N: DomNode> {
    pub kind: String,
    pub target: Option<N>,
    pub detail: Map<String, Value>,
}

impl<N: DomNode> RawEvent<N> {
    #[must_use]
    pub fn new(kind: impl Into<String>, target: Option<N>) -> Self {
        Self {
            kind: kind.into(),
            target,
            detail: Map::new(),
        }
    }

    /// Attaches a host detail field for adapters to pick up.
    #[must_use]
    pub fn with_detail(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(name.into(), value.into());
        self
    }
}

/// Per-event-kind pre-filter and adapter. Both are optional; a default
/// listener forwards every event of its kind unmodified.
#[derive(Clone)]
pub struct Listener<N: DomNode> {
    pub filter: Option<EventFilter<N>>,
    pub adapter: Option<EventAdapter<N>>,
}

// Not derived: derive would demand `N: Default`.
impl<N: DomNode> Default for Listener<N> {
    fn default() -> Self {
        Self {
            filter: None,
            adapter: None,
        }
    }
}

impl<N: DomNode> Listener<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&RawEvent<N>) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    #[must_use]
    pub fn with_adapter(
        mut self,
        adapter: impl Fn(&RawEvent<N>) -> Map<String, Value> + 'static,
    ) -> Self {
        self.adapter = Some(Rc::new(adapter));
        self
    }

    /// Keydown listener passing only the Enter key through. The host must
    /// populate a numeric `keyCode` detail field on the raw event.
    #[must_use]
    pub fn enter_key() -> Self {
        Self::new().with_filter(|ev: &RawEvent<N>| {
            ev.detail.get("keyCode").and_then(Value::as_u64) == Some(13)
        })
    }

    /// Click listener passing only the primary mouse button through. The
    /// host must populate a numeric `button` detail field on the raw event.
    #[must_use]
    pub fn left_click() -> Self {
        Self::new().with_filter(|ev: &RawEvent<N>| {
            ev.detail.get("button").and_then(Value::as_u64) == Some(0)
        })
    }
}

/// Capture-phase event subscription capability supplied by the host.
pub trait EventSource<N: DomNode> {
    /// Subscribes `handler` to capture-phase events of `kind`.
    ///
    /// # Errors
    /// The one unrecoverable condition in the pipeline: the host cannot
    /// provide the subscription at all.
    fn observe(&mut self, kind: &str, handler: Rc<dyn Fn(RawEvent<N>)>) -> Result<(), Error>;
}

/// A compiled rule entry.
#[derive(Clone, Default)]
struct Entry {
    data: Vec<(String, Resolver)>,
    include: Option<RuleSet>,
    exclude: Option<RuleSet>,
    filter: Option<MessageFilter>,
}

impl Entry {
    fn compile(spec: &EntrySpec) -> Self {
        Self {
            data: resolver::compile_data(&spec.data),
            include: spec.include.as_ref().map(RuleSet::compile),
            exclude: spec.exclude.as_ref().map(RuleSet::compile),
            filter: spec.filter.clone(),
        }
    }

    /// All three gates must pass: exclude (any match rejects), include
    /// (anything short of a full match rejects), then the custom filter.
    fn passes(&self, msg: &Message) -> bool {
        if self.exclude.as_ref().is_some_and(|rs| rs.matches_any(msg)) {
            return false;
        }
        if self
            .include
            .as_ref()
            .is_some_and(|rs| !rs.matches_all(msg))
        {
            return false;
        }
        self.filter.as_ref().is_none_or(|f| f(msg))
    }
}

/// The event-to-message pipeline plus its idle batch queue.
///
/// One collector per process scope; tests instantiate isolated ones. All
/// state is single-threaded by construction — dispatch happens on the
/// host's main thread, and the scheduler's idle callback is the only
/// deferred work.
pub struct Collector<N: DomNode> {
    enabled: bool,
    selector: Option<String>,
    idle: bool,
    entries: Vec<Entry>,
    listeners: HashMap<String, Listener<N>>,
    format: Option<FormatHook>,
    label: Resolver,
    queue: IdleQueue,
}

impl<N: DomNode + 'static> Collector<N> {
    /// Entry point for construction; see [`CollectorBuilder`].
    #[must_use]
    pub fn builder() -> CollectorBuilder<N> {
        CollectorBuilder::new()
    }

    /// Registers one capture-phase subscription per configured listener
    /// kind on the host's event source.
    ///
    /// # Errors
    /// Propagates the source's refusal; already-registered kinds stay
    /// registered.
    pub fn attach(
        collector: &Rc<RefCell<Self>>,
        source: &mut impl EventSource<N>,
    ) -> Result<(), Error> {
        let kinds: Vec<String> = collector.borrow().listeners.keys().cloned().collect();

        for kind in kinds {
            let handle = Rc::clone(collector);
            source.observe(&kind, Rc::new(move |ev| handle.borrow().dispatch(&ev)))?;
        }

        Ok(())
    }
}

impl<N: DomNode> Collector<N> {
    /// Full listener path: enablement gate, listener lookup by kind,
    /// pre-filter, adapter, then the resolution pipeline. Events of a kind
    /// with no registered listener are ignored once any listener exists.
    pub fn dispatch(&self, ev: &RawEvent<N>) {
        if !self.enabled {
            return;
        }

        let listener = self.listeners.get(&ev.kind);
        if listener.is_none() && !self.listeners.is_empty() {
            return;
        }

        self.process(ev, listener);
    }

    /// Manual submission: the resolution pipeline without listener
    /// filtering. Still gated on enablement.
    pub fn log_event(&self, ev: &RawEvent<N>) {
        if !self.enabled {
            return;
        }

        self.process(ev, None);
    }

    fn process(&self, ev: &RawEvent<N>, listener: Option<&Listener<N>>) {
        if let Some(listener) = listener {
            if listener.filter.as_ref().is_some_and(|f| !f(ev)) {
                return;
            }
        }

        let extras = listener
            .and_then(|l| l.adapter.as_ref())
            .map(|adapter| adapter(ev))
            .unwrap_or_default();

        let Some(target) = ev.target.as_ref().and_then(|t| self.resolve_target(t)) else {
            return;
        };

        if let Some(msg) = self.match_entry(&ev.kind, &target, &extras) {
            self.accept(msg);
        }
    }

    /// Ancestor resolution: root targets and an absent selector pass
    /// through; otherwise the nearest matching ancestor, or nothing.
    fn resolve_target(&self, target: &N) -> Option<N> {
        match &self.selector {
            Some(selector) if !target.is_root() => target.closest(selector),
            _ => Some(target.clone()),
        }
    }

    /// First-match-wins over the configured entries. Candidate messages of
    /// failing entries are discarded, not reused. No entries configured
    /// means an implicit catch-all.
    fn match_entry(&self, kind: &str, target: &N, extras: &Map<String, Value>) -> Option<Message> {
        if self.entries.is_empty() {
            return self.format_message(&Entry::default(), kind, target, extras);
        }

        self.entries.iter().find_map(|entry| {
            self.format_message(entry, kind, target, extras)
                .filter(|msg| entry.passes(msg))
        })
    }

    /// Assembles one candidate message: time, type, label, adapter fields,
    /// then the entry's data fields. Fields that resolve to nothing are
    /// omitted. The global format hook runs last and may drop the message.
    fn format_message(
        &self,
        entry: &Entry,
        kind: &str,
        target: &N,
        extras: &Map<String, Value>,
    ) -> Option<Message> {
        let mut msg = Message::new();
        msg.insert(message::TIME, Utc::now().timestamp_millis());
        msg.insert(message::TYPE, kind);

        if target.is_root() {
            msg.insert(message::LABEL, message::GLOBAL_LABEL);
        } else if let Some(label) = self.resolve_label(target) {
            msg.insert(message::LABEL, label);
        }

        msg.merge_under(extras.clone());

        let selection = Found::Node(target.clone());
        for (field, resolver) in &entry.data {
            if let Some(value) = resolver.resolve(Some(&selection)) {
                msg.insert(field.clone(), value);
            }
        }

        match &self.format {
            Some(hook) => hook(msg),
            None => Some(msg),
        }
    }

    /// Label fallback chain: `data-metric-label`, `aria-label`, text
    /// content — first non-null wins, trimmed.
    fn resolve_label(&self, target: &N) -> Option<String> {
        let selection = Found::Node(target.clone());
        match self.label.resolve(Some(&selection))? {
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    fn accept(&self, msg: Message) {
        if self.idle {
            self.queue.submit(msg);
        } else {
            self.queue.deliver_now(msg);
        }
    }

    /// Applies a configuration document: recognized fields only, each
    /// applied only when present.
    pub fn configure(&mut self, doc: ConfigDocument) {
        if let Some(rules) = &doc.rules {
            self.entries = rules.iter().map(Entry::compile).collect();
        }
        if let Some(selector) = doc.selector {
            self.selector = Some(selector);
        }
        if let Some(idle) = doc.idle {
            self.idle = idle;
        }
        if let Some(frame_size) = doc.frame_size {
            self.queue.set_frame_size(frame_size);
        }
        if let Some(kinds) = &doc.listeners {
            for kind in kinds {
                self.listeners.entry(kind.clone()).or_default();
            }
        }
        if let Some(enabled) = doc.enabled {
            if enabled {
                self.enable();
            } else {
                self.disable();
            }
        }

        tracing::debug!(
            entries = self.entries.len(),
            listeners = self.listeners.len(),
            enabled = self.enabled,
            "collector configured"
        );
    }

    /// Registers a listener for an event kind at runtime.
    pub fn add_listener(&mut self, kind: impl Into<String>, listener: Listener<N>) {
        self.listeners.insert(kind.into(), listener);
    }

    pub fn enable(&mut self) {
        if !self.queue.has_sink() {
            tracing::warn!("enabling without a sink, messages will accumulate undelivered");
        }
        self.enabled = true;
    }

    /// Disables dispatch and clears the pending batch — data queued while
    /// enabled must not leak out after disablement.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.queue.clear();
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Delivers every pending message synchronously, ignoring the frame
    /// budget. Teardown and explicit flush points.
    pub fn flush(&self) {
        self.queue.drain_all();
    }

    /// Number of accepted messages awaiting delivery.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.pending_count()
    }
}

impl<N: DomNode> Drop for Collector<N> {
    /// Teardown flush, so accepted messages survive the collector.
    fn drop(&mut self) {
        self.queue.drain_all();
    }
}

/// Built-in label resolution chain.
fn label_chain() -> Resolver {
    Resolver::First(vec![
        Resolver::Attribute("data-metric-label".to_string()),
        Resolver::Attribute("aria-label".to_string()),
        Resolver::Text,
    ])
}

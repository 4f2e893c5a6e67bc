//! Stepwise construction of a [`Collector`]. The sink, scheduler, format
//! hook, and per-entry filter closures have no JSON representation, so the
//! builder is where they attach; declarative parts can come in later
//! through [`Collector::configure`].

use super::{Collector, DEFAULT_FRAME_SIZE, DEFAULT_SELECTOR, Entry, FormatHook, Listener};
use crate::config::EntrySpec;
use crate::message::Message;
use crate::node::DomNode;
use crate::queue::IdleQueue;
use crate::sched::{InlineScheduler, Scheduler};
use std::collections::HashMap;
use std::rc::Rc;

pub struct CollectorBuilder<N: DomNode> {
    scheduler: Option<Rc<dyn Scheduler>>,
    sink: Option<Rc<dyn Fn(Message)>>,
    format: Option<FormatHook>,
    selector: Option<String>,
    idle: bool,
    frame_size: u64,
    enabled: bool,
    rules: Vec<EntrySpec>,
    listeners: HashMap<String, Listener<N>>,
}

impl<N: DomNode> CollectorBuilder<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheduler: None,
            sink: None,
            format: None,
            selector: Some(DEFAULT_SELECTOR.to_string()),
            idle: true,
            frame_size: DEFAULT_FRAME_SIZE,
            enabled: false,
            rules: Vec::new(),
            listeners: HashMap::new(),
        }
    }

    /// Host idle facility and monotonic clock. Defaults to
    /// [`InlineScheduler`], which degrades idle batching to synchronous
    /// delivery.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// The delivery callback, invoked once per accepted message. Required
    /// before enabling; without it messages accumulate undelivered.
    #[must_use]
    pub fn sink(mut self, sink: impl Fn(Message) + 'static) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }

    /// Global post-processor over every formatted message; returning
    /// `None` drops the message.
    #[must_use]
    pub fn format(mut self, hook: impl Fn(Message) -> Option<Message> + 'static) -> Self {
        self.format = Some(Rc::new(hook));
        self
    }

    /// Selector locating the loggable ancestor of an event target.
    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Event targets pass through unresolved; every target is loggable.
    #[must_use]
    pub fn any_target(mut self) -> Self {
        self.selector = None;
        self
    }

    /// Idle batching on (the default) or synchronous delivery off.
    #[must_use]
    pub const fn idle(mut self, idle: bool) -> Self {
        self.idle = idle;
        self
    }

    /// Per-tick drain budget in milliseconds.
    #[must_use]
    pub const fn frame_size(mut self, ms: u64) -> Self {
        self.frame_size = ms;
        self
    }

    /// Start enabled. Collectors start disabled by default.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Appends a rule entry; entries match in the order they were added.
    #[must_use]
    pub fn rule(mut self, spec: EntrySpec) -> Self {
        self.rules.push(spec);
        self
    }

    /// Registers a listener with a pre-filter and/or adapter.
    #[must_use]
    pub fn listener(mut self, kind: impl Into<String>, listener: Listener<N>) -> Self {
        self.listeners.insert(kind.into(), listener);
        self
    }

    /// Registers a plain listener for an event kind.
    #[must_use]
    pub fn event(self, kind: impl Into<String>) -> Self {
        self.listener(kind, Listener::new())
    }

    #[must_use]
    pub fn build(self) -> Collector<N> {
        if self.enabled && self.sink.is_none() {
            tracing::warn!("building an enabled collector without a sink");
        }

        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Rc::new(InlineScheduler::new()));
        let queue = IdleQueue::new(scheduler, self.frame_size);
        queue.set_sink(self.sink);

        Collector {
            enabled: self.enabled,
            selector: self.selector,
            idle: self.idle,
            entries: self.rules.iter().map(Entry::compile).collect(),
            listeners: self.listeners,
            format: self.format,
            label: super::label_chain(),
            queue,
        }
    }
}

impl<N: DomNode> Default for CollectorBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

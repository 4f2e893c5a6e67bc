//! The JSON configuration surface. A host (or a remote-config fetcher on
//! the host side) hands a [`ConfigDocument`] to
//! [`Collector::configure`](crate::collector::Collector::configure), which
//! applies recognized fields and ignores everything else. A completely
//! empty document changes nothing.

use crate::error::Error;
use crate::message::Message;
use crate::resolver::ResolverSpec;
use crate::rules::StringOrList;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A custom per-entry message predicate, applied after include/exclude.
pub type MessageFilter = Rc<dyn Fn(&Message) -> bool>;

/// One configured rule entry: data resolvers plus filtering. An entry with
/// none of these always matches and acts as a catch-all.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntrySpec {
    /// Message field name → resolver spec.
    pub data: BTreeMap<String, ResolverSpec>,
    /// All fields must match for the message to pass. Present-but-empty
    /// rejects everything; absent imposes nothing.
    pub include: Option<BTreeMap<String, StringOrList>>,
    /// Any matching field rejects the message.
    pub exclude: Option<BTreeMap<String, StringOrList>>,
    /// Custom predicate, programmatic only — not part of the JSON surface.
    #[serde(skip)]
    pub filter: Option<MessageFilter>,
}

impl EntrySpec {
    /// Attaches a custom filter predicate.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Fn(&Message) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }
}

impl std::fmt::Debug for EntrySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrySpec")
            .field("data", &self.data)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Replace-on-configure update document. Every field is optional; only
/// present fields are applied. Unrecognized and mistyped fields fail or
/// are ignored at the serde layer, never at runtime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Master switch, routed through enable/disable (disable clears the
    /// pending batch).
    pub enabled: Option<bool>,
    /// CSS selector locating the loggable ancestor of an event target.
    pub selector: Option<String>,
    /// Batch messages across idle opportunities instead of delivering
    /// synchronously.
    pub idle: Option<bool>,
    /// Per-tick drain budget in milliseconds.
    #[serde(alias = "frameSize")]
    pub frame_size: Option<u64>,
    /// Ordered rule entries; first match wins.
    pub rules: Option<Vec<EntrySpec>>,
    /// Event kinds to listen for. Filters and adapters are closures and
    /// attach programmatically.
    pub listeners: Option<Vec<String>>,
}

impl ConfigDocument {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    /// Returns [`Error::ConfigParse`] when the text is not valid JSON or a
    /// recognized field has the wrong shape.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

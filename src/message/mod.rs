//! The flat message record handed to the sink. Carries everything one
//! accepted event produced — capture time, event type, resolved label, and
//! any resolver-extracted fields — in insertion order.

use serde::Serialize;
use serde_json::{Map, Value};

/// Field name for the capture timestamp (milliseconds since the epoch).
pub const TIME: &str = "time";
/// Field name for the event type string.
pub const TYPE: &str = "type";
/// Field name for the resolved display label.
pub const LABEL: &str = "label";

/// Label value used when the event target is the document root.
pub const GLOBAL_LABEL: &str = "global";

/// An ordered flat mapping from field name to extracted value.
///
/// Fields whose resolver produced nothing are omitted entirely; a present
/// field is never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Message {
    fields: Map<String, Value>,
}

impl Message {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Merges `other`'s fields in, keeping existing values on collision.
    /// Adapter-supplied fields merge under the built-in ones this way.
    pub fn merge_under(&mut self, other: Map<String, Value>) {
        for (name, value) in other {
            self.fields.entry(name).or_insert(value);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String view of a field, rendering numbers in decimal so rulesets can
    /// match numeric values (`<count>` output) by substring.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the message, yielding the underlying field map.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

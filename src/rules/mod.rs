//! Include/exclude ruleset compiler. A ruleset maps message fields to one
//! or more literal strings; at runtime a field matches when its value
//! *contains* any of the literals, case-insensitively. Literals compile
//! once into a single alternation regex per field.

use crate::message::Message;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;

/// A rule value in the configuration surface: one literal or several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn literals(&self) -> &[String] {
        match self {
            Self::One(s) => std::slice::from_ref(s),
            Self::Many(v) => v,
        }
    }
}

/// How much of a ruleset a message satisfied.
///
/// `exclude` fires on anything above `None`; `include` demands `Full` —
/// a partially matching include ruleset still rejects the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    None,
    Partial,
    Full,
}

/// A compiled mapping from message field to containment pattern.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    patterns: BTreeMap<String, Regex>,
}

impl RuleSet {
    /// Compiles a field → literals mapping. Regex metacharacters in the
    /// literals are escaped, so they always match literally; the escaped
    /// alternation cannot fail to compile, but a failure would drop the
    /// field with a warning rather than abort configuration.
    #[must_use]
    pub fn compile(spec: &BTreeMap<String, StringOrList>) -> Self {
        let mut patterns = BTreeMap::new();

        for (field, literals) in spec {
            let alternation = literals
                .literals()
                .iter()
                .map(|lit| regex::escape(lit))
                .collect::<Vec<_>>()
                .join("|");

            match RegexBuilder::new(&format!("({alternation})"))
                .case_insensitive(true)
                .build()
            {
                Ok(pattern) => {
                    patterns.insert(field.clone(), pattern);
                }
                Err(e) => {
                    tracing::warn!(field = %field, error = %e, "unusable rule pattern, dropping field");
                }
            }
        }

        Self { patterns }
    }

    /// Tri-state coverage of `msg` against this ruleset. A field absent
    /// from the message never matches. An empty ruleset reports `None`,
    /// so a present-but-empty include ruleset rejects every message.
    #[must_use]
    pub fn coverage(&self, msg: &Message) -> Coverage {
        let matched = self
            .patterns
            .iter()
            .filter(|(field, pattern)| {
                msg.get_text(field)
                    .is_some_and(|value| pattern.is_match(&value))
            })
            .count();

        if matched == 0 {
            Coverage::None
        } else if matched == self.patterns.len() {
            Coverage::Full
        } else {
            Coverage::Partial
        }
    }

    /// At least one field matched — the `exclude` gate.
    #[must_use]
    pub fn matches_any(&self, msg: &Message) -> bool {
        self.coverage(msg) != Coverage::None
    }

    /// Every field matched — the `include` gate.
    #[must_use]
    pub fn matches_all(&self, msg: &Message) -> bool {
        self.coverage(msg) == Coverage::Full
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

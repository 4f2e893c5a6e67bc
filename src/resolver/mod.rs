//! The declarative resolution DSL. A spec — a string, an array, or a scoped
//! object — compiles once into a [`Resolver`], a pure node-to-value
//! extractor evaluated against every candidate event target.
//!
//! Spec forms:
//! * `"literal"` — a constant, the node is ignored
//! * `"@aria-label"` — attribute read
//! * `"<text>"`, `"<value>"`, `"<count>"` — pseudo-selectors
//! * `[spec, spec, ...]` — alternatives, first non-null (and non-zero
//!   count) result wins
//! * `{matches?, closest? | selector?, value, expression?}` — navigate,
//!   resolve `value` against the result, refine through a regex
//!
//! Malformed specs (missing `value`, unknown `<...>` token, invalid
//! expression pattern) are configuration defects: they warn and compile to
//! nothing rather than failing the pipeline.

use crate::node::{DomNode, Found};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Declarative resolver specification, as found in the configuration
/// document. See the module docs for the accepted forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResolverSpec {
    /// Literal, attribute, or pseudo-selector shorthand.
    Shorthand(String),
    /// Ordered alternatives.
    Many(Vec<ResolverSpec>),
    /// Navigation plus nested value plus optional refinement.
    Scoped(ScopedSpec),
}

/// The object form of a resolver spec. `value` is required; `closest`
/// takes precedence over `selector` when both are given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopedSpec {
    /// Gate: the candidate node must match this selector or resolution
    /// short-circuits to nothing.
    pub matches: Option<String>,
    /// Navigate to the nearest ancestor matching this selector.
    pub closest: Option<String>,
    /// Navigate to all descendants matching this selector.
    pub selector: Option<String>,
    /// Nested resolver evaluated against the navigated selection.
    pub value: Option<Box<ResolverSpec>>,
    /// Regex refiner applied to the resolved value; the first capture
    /// group wins over the whole match.
    pub expression: Option<String>,
}

/// One navigation step of a scoped resolver.
#[derive(Debug, Clone)]
pub enum Navigator {
    /// Nearest ancestor matching the selector.
    Closest(String),
    /// All descendants matching the selector.
    Descendants(String),
    /// Pass the current selection through unchanged.
    Stay,
}

impl Navigator {
    fn navigate<N: DomNode>(&self, selection: &Found<N>) -> Option<Found<N>> {
        match self {
            Self::Closest(sel) => selection.first()?.closest(sel).map(Found::Node),
            Self::Descendants(sel) => selection.first().map(|n| Found::List(n.query_all(sel))),
            Self::Stay => Some(selection.clone()),
        }
    }
}

/// Post-extraction regex refiner. An absent or invalid expression is the
/// identity; an invalid pattern warns at compile time instead of failing.
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    pattern: Option<Regex>,
}

impl Refiner {
    #[must_use]
    pub fn compile(expression: Option<&str>) -> Self {
        let pattern = expression.and_then(|expr| match Regex::new(expr) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(expression = %expr, error = %e, "invalid expression, refiner degrades to identity");
                None
            }
        });

        Self { pattern }
    }

    /// On a match, yields the first capture group if it participated, else
    /// the whole match; no match yields nothing. Without a compiled
    /// pattern, or for non-string values, the input passes through.
    #[must_use]
    pub fn apply(&self, value: Option<Value>) -> Option<Value> {
        let value = value?;

        let Some(pattern) = &self.pattern else {
            return Some(value);
        };

        let Value::String(text) = &value else {
            return Some(value);
        };

        let caps = pattern.captures(text)?;
        let matched = caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())?;

        Some(Value::String(matched))
    }
}

/// A compiled node-to-value extractor. Every variant is itself a valid
/// input to further composition: alternatives hold resolvers, scoped
/// resolvers nest one as their value.
#[derive(Debug, Clone)]
pub enum Resolver {
    /// A fixed string; the selection is ignored.
    Literal(String),
    /// Attribute read off the first node of the selection.
    Attribute(String),
    /// `<text>`: text content of the first node.
    Text,
    /// `<value>`: form value of the first node, suppressed for passwords.
    FormValue,
    /// `<count>`: size of the selection, `0` when nothing was found.
    Count,
    /// Ordered alternatives, first non-null result wins. A zero count is
    /// also a miss here; `0` survives only as the terminal result.
    First(Vec<Resolver>),
    /// Gate, navigate, resolve, refine.
    Scoped {
        gate: Option<String>,
        nav: Navigator,
        value: Box<Resolver>,
        refine: Refiner,
    },
}

impl Resolver {
    /// Evaluates against a selection. `None` models a failed navigation:
    /// every variant except `Literal` and `Count` propagates it.
    pub fn resolve<N: DomNode>(&self, selection: Option<&Found<N>>) -> Option<Value> {
        match self {
            Self::Literal(s) => Some(Value::String(s.clone())),

            Self::Count => {
                let count = selection.map_or(0, Found::count);
                Some(Value::from(count))
            }

            Self::Attribute(name) => {
                let first = selection?.first()?;
                if !first.is_element() {
                    return None;
                }
                first.attribute(name).map(Value::String)
            }

            Self::Text => selection?.first()?.text_content().map(Value::String),

            Self::FormValue => {
                let first = selection?.first()?;
                if first.input_type().as_deref() == Some("password") {
                    return None;
                }
                first.form_value().map(Value::String)
            }

            Self::First(alternatives) => {
                let mut last = None;
                for resolver in alternatives {
                    last = resolver.resolve(selection);
                    if last.as_ref().is_some_and(|value| !is_zero_count(value)) {
                        break;
                    }
                }
                last
            }

            Self::Scoped {
                gate,
                nav,
                value,
                refine,
            } => {
                let selection = selection?;

                if let Some(gate_selector) = gate {
                    if !selection.first()?.matches(gate_selector) {
                        return None;
                    }
                }

                let navigated = nav.navigate(selection);
                refine.apply(value.resolve(navigated.as_ref()))
            }
        }
    }
}

/// An empty selection counted mid-chain falls through to the next
/// alternative; only a terminal `<count>` reports it as `0`.
fn is_zero_count(value: &Value) -> bool {
    matches!(value, Value::Number(n) if n.as_u64() == Some(0))
}

/// Compiles a spec into a resolver. `None` means the spec was defective
/// and the field it backs is silently omitted from every message.
#[must_use]
pub fn compile(spec: &ResolverSpec) -> Option<Resolver> {
    match spec {
        ResolverSpec::Shorthand(s) => compile_shorthand(s),

        ResolverSpec::Many(specs) => {
            let alternatives: Vec<Resolver> = specs.iter().filter_map(compile).collect();
            Some(Resolver::First(alternatives))
        }

        ResolverSpec::Scoped(scoped) => {
            let Some(value_spec) = &scoped.value else {
                tracing::warn!("resolver spec must be a string or an object with a `value` member");
                return None;
            };

            let value = compile(value_spec)?;

            // `closest` wins when both navigation selectors are supplied.
            let nav = match (&scoped.closest, &scoped.selector) {
                (Some(sel), _) => Navigator::Closest(sel.clone()),
                (None, Some(sel)) => Navigator::Descendants(sel.clone()),
                (None, None) => Navigator::Stay,
            };

            Some(Resolver::Scoped {
                gate: scoped.matches.clone(),
                nav,
                value: Box::new(value),
                refine: Refiner::compile(scoped.expression.as_deref()),
            })
        }
    }
}

fn compile_shorthand(s: &str) -> Option<Resolver> {
    if let Some(name) = s.strip_prefix('@') {
        return Some(Resolver::Attribute(name.to_string()));
    }

    match s {
        "<text>" => Some(Resolver::Text),
        "<value>" => Some(Resolver::FormValue),
        "<count>" => Some(Resolver::Count),
        _ if s.starts_with('<') => {
            tracing::warn!(token = %s, "unknown pseudo-selector");
            None
        }
        _ => Some(Resolver::Literal(s.to_string())),
    }
}

/// Compiles a `data` mapping, dropping fields whose spec failed to
/// compile. Field order is preserved so messages are deterministic.
#[must_use]
pub fn compile_data(data: &BTreeMap<String, ResolverSpec>) -> Vec<(String, Resolver)> {
    data.iter()
        .filter_map(|(field, spec)| compile(spec).map(|resolver| (field.clone(), resolver)))
        .collect()
}

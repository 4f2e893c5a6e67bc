#![forbid(unsafe_code)]

//! `domtap` - Declarative DOM-event analytics collector.
//!
//! Turns capture-phase DOM events into structured messages:
//! - A declarative resolution DSL extracts labels and metadata from the
//!   interacted element (attributes, text, form values, match counts)
//! - Ordered rule entries with include/exclude rulesets and custom
//!   predicates gate the result; first match wins
//! - An idle batch queue hands accepted messages to an application sink
//!   within a configurable per-tick frame budget
//! - The DOM, the idle facility, and the event source are all host-supplied
//!   traits, so the pipeline runs against any tree
//!
//! # Example
//!
//! ```
//! use domtap::config::EntrySpec;
//! use domtap::collector::{Collector, RawEvent};
//! use domtap::resolver::ResolverSpec;
//! use domtap::testing::MockTree;
//!
//! let tree = MockTree::new();
//! let button = tree
//!     .element(&tree.root(), "button")
//!     .attr("data-metric-label", "Purchase")
//!     .text("Buy now");
//!
//! let mut entry = EntrySpec::default();
//! entry.data.insert(
//!     "text".to_string(),
//!     ResolverSpec::Shorthand("<text>".to_string()),
//! );
//!
//! let collector = Collector::builder()
//!     .sink(|msg| println!("{}", serde_json::to_string(&msg).unwrap()))
//!     .rule(entry)
//!     .idle(false)
//!     .enabled(true)
//!     .build();
//!
//! collector.log_event(&RawEvent::new("click", Some(button)));
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod message;
pub mod node;
pub mod queue;
pub mod resolver;
pub mod rules;
pub mod sched;
pub mod testing;

// Re-exports for convenience
pub use collector::{Collector, CollectorBuilder, EventSource, Listener, RawEvent};
pub use config::{ConfigDocument, EntrySpec};
pub use error::Error;
pub use message::Message;
pub use node::{DomNode, Found};
pub use queue::IdleQueue;
pub use resolver::{Resolver, ResolverSpec};
pub use rules::{Coverage, RuleSet};
pub use sched::{InlineScheduler, ManualScheduler, Scheduler};

//! Tests for the JSON configuration surface and allow-list merging.

use domtap::collector::{Collector, RawEvent};
use domtap::config::ConfigDocument;
use domtap::error::Error;
use domtap::message::Message;
use domtap::testing::{MockNode, MockTree};
use std::cell::RefCell;
use std::rc::Rc;

type Logged = Rc<RefCell<Vec<Message>>>;

fn capture() -> (Logged, impl Fn(Message) + 'static) {
    let logged: Logged = Rc::new(RefCell::new(Vec::new()));
    let sink_log = Rc::clone(&logged);
    (logged, move |msg| sink_log.borrow_mut().push(msg))
}

#[test]
fn parses_a_full_document() {
    let doc = ConfigDocument::from_json(
        r#"{
            "enabled": true,
            "selector": "[data-metric-label]",
            "idle": false,
            "frameSize": 50,
            "listeners": ["click", "keydown"],
            "rules": [
                {
                    "data": {"panel": {"closest": "section", "value": "@data-name"}},
                    "include": {"panel": "HOME"},
                    "exclude": {"label": ["blue", "purple"]}
                }
            ]
        }"#,
    )
    .expect("document should parse");

    assert_eq!(doc.enabled, Some(true));
    assert_eq!(doc.idle, Some(false));
    assert_eq!(doc.frame_size, Some(50));
    assert_eq!(doc.listeners.as_deref(), Some(&["click".to_string(), "keydown".to_string()][..]));
    assert_eq!(doc.rules.as_ref().map(Vec::len), Some(1));
}

#[test]
fn snake_case_frame_size_also_parses() {
    let doc = ConfigDocument::from_json(r#"{"frame_size": 25}"#).unwrap();
    assert_eq!(doc.frame_size, Some(25));
}

#[test]
fn unknown_fields_are_ignored() {
    let doc = ConfigDocument::from_json(r#"{"telemetryEndpoint": "https://x", "idle": true}"#)
        .expect("unknown fields should not fail parsing");
    assert_eq!(doc.idle, Some(true));
}

#[test]
fn empty_document_changes_nothing() {
    let (_logged, sink) = capture();
    let mut collector: Collector<MockNode> = Collector::builder()
        .sink(sink)
        .enabled(true)
        .build();

    collector.configure(ConfigDocument::default());
    assert!(collector.is_enabled());
}

#[test]
fn invalid_json_is_a_parse_error() {
    assert!(matches!(
        ConfigDocument::from_json("not json"),
        Err(Error::ConfigParse(_))
    ));
}

#[test]
fn mistyped_recognized_field_is_a_parse_error() {
    assert!(ConfigDocument::from_json(r#"{"idle": "yes"}"#).is_err());
}

#[test]
fn enabled_field_routes_through_disable_and_clears() {
    let tree = MockTree::new();
    let button = tree.element(&tree.root(), "button").text("Go");

    let (logged, sink) = capture();
    let mut collector = Collector::builder()
        .sink(sink)
        .selector("button")
        .enabled(true)
        .build();

    collector.log_event(&RawEvent::new("click", Some(button.clone())));
    assert_eq!(collector.pending_count(), 1);

    collector.configure(ConfigDocument::from_json(r#"{"enabled": false}"#).unwrap());
    assert!(!collector.is_enabled());
    assert_eq!(collector.pending_count(), 0);

    collector.log_event(&RawEvent::new("click", Some(button)));
    collector.flush();
    assert!(logged.borrow().is_empty());
}

#[test]
fn configured_rules_replace_previous_entries() {
    let tree = MockTree::new();
    let button = tree.element(&tree.root(), "button").text("Go");

    let (logged, sink) = capture();
    let mut collector = Collector::builder()
        .sink(sink)
        .selector("button")
        .idle(false)
        .enabled(true)
        .build();

    collector.configure(
        ConfigDocument::from_json(
            r#"{"rules": [{"data": {"tag": "configured"}, "exclude": {"label": "Stop"}}]}"#,
        )
        .unwrap(),
    );

    collector.log_event(&RawEvent::new("click", Some(button)));
    let logged = logged.borrow();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].get_text("tag").as_deref(), Some("configured"));
}

#[test]
fn configured_listeners_register_kinds() {
    let tree = MockTree::new();
    let button = tree.element(&tree.root(), "button").text("Go");

    let (logged, sink) = capture();
    let mut collector = Collector::builder()
        .sink(sink)
        .selector("button")
        .idle(false)
        .enabled(true)
        .build();

    collector.configure(ConfigDocument::from_json(r#"{"listeners": ["click"]}"#).unwrap());

    collector.dispatch(&RawEvent::new("focus", Some(button.clone())));
    assert!(logged.borrow().is_empty());

    collector.dispatch(&RawEvent::new("click", Some(button)));
    assert_eq!(logged.borrow().len(), 1);
}

#[test]
fn selector_update_takes_effect() {
    let tree = MockTree::new();
    let link = tree.element(&tree.root(), "a").text("Go");

    let (logged, sink) = capture();
    let mut collector = Collector::builder()
        .sink(sink)
        .selector("button")
        .idle(false)
        .enabled(true)
        .build();

    collector.log_event(&RawEvent::new("click", Some(link.clone())));
    assert!(logged.borrow().is_empty());

    collector.configure(ConfigDocument::from_json(r#"{"selector": "a"}"#).unwrap());
    collector.log_event(&RawEvent::new("click", Some(link)));
    assert_eq!(logged.borrow().len(), 1);
}

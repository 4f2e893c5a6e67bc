//! Tests for the resolution DSL: compilation of the spec forms and the
//! pseudo-selector edge cases.

use domtap::node::Found;
use domtap::resolver::{self, Refiner, ResolverSpec};
use domtap::testing::{MockNode, MockTree};
use serde_json::{Value, json};

fn spec(value: serde_json::Value) -> ResolverSpec {
    serde_json::from_value(value).expect("resolver spec should deserialize")
}

fn resolve(spec_value: serde_json::Value, node: &MockNode) -> Option<Value> {
    let resolver = resolver::compile(&spec(spec_value)).expect("spec should compile");
    resolver.resolve(Some(&Found::Node(node.clone())))
}

#[test]
fn literal_ignores_the_node() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div");
    assert_eq!(resolve(json!("constant"), &div), Some(json!("constant")));
}

#[test]
fn attribute_read() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div").attr("role", "button");
    assert_eq!(resolve(json!("@role"), &div), Some(json!("button")));
    assert_eq!(resolve(json!("@missing"), &div), None);
}

#[test]
fn attribute_on_non_element_is_nothing() {
    let tree = MockTree::new();
    // The document root is not an element; attribute reads refuse it even
    // when the underlying data carries the attribute.
    let root = tree.root().attr("role", "main");
    assert_eq!(resolve(json!("@role"), &root), None);
}

#[test]
fn text_pseudo_selector() {
    let tree = MockTree::new();
    let button = tree.element(&tree.root(), "button").text("Click Me");
    assert_eq!(resolve(json!("<text>"), &button), Some(json!("Click Me")));
}

#[test]
fn value_pseudo_selector() {
    let tree = MockTree::new();
    let input = tree.element(&tree.root(), "input").value("typed");
    assert_eq!(resolve(json!("<value>"), &input), Some(json!("typed")));
}

#[test]
fn password_value_is_suppressed() {
    let tree = MockTree::new();
    let input = tree
        .element(&tree.root(), "input")
        .attr("type", "password")
        .value("hunter2");
    assert_eq!(resolve(json!("<value>"), &input), None);
}

#[test]
fn count_counts_matches() {
    let tree = MockTree::new();
    let list = tree.element(&tree.root(), "ul");
    let _a = tree.element(&list, "li");
    let _b = tree.element(&list, "li");

    let result = resolve(json!({"selector": "li", "value": "<count>"}), &list);
    assert_eq!(result, Some(json!(2)));
}

#[test]
fn count_is_zero_when_nothing_found() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div");

    // Empty descendant match list.
    assert_eq!(
        resolve(json!({"selector": "li", "value": "<count>"}), &div),
        Some(json!(0))
    );
    // Failed ancestor navigation.
    assert_eq!(
        resolve(json!({"closest": "article", "value": "<count>"}), &div),
        Some(json!(0))
    );
    // A single node counts as one.
    assert_eq!(resolve(json!("<count>"), &div), Some(json!(1)));
}

#[test]
fn closest_navigates_to_ancestor() {
    let tree = MockTree::new();
    let section = tree
        .element(&tree.root(), "section")
        .attr("data-name", "home");
    let button = tree.element(&section, "button");

    let result = resolve(json!({"closest": "section", "value": "@data-name"}), &button);
    assert_eq!(result, Some(json!("home")));
}

#[test]
fn closest_miss_resolves_nothing() {
    let tree = MockTree::new();
    let button = tree.element(&tree.root(), "button");
    assert_eq!(
        resolve(json!({"closest": "article", "value": "@data-name"}), &button),
        None
    );
}

#[test]
fn selector_navigates_to_descendants() {
    let tree = MockTree::new();
    let article = tree.element(&tree.root(), "article");
    let header = tree.element(&article, "header");
    let _h1 = tree.element(&header, "h1").text("Title");

    let result = resolve(json!({"selector": "h1", "value": "<text>"}), &article);
    assert_eq!(result, Some(json!("Title")));
}

#[test]
fn closest_takes_precedence_over_selector() {
    let tree = MockTree::new();
    let outer = tree.element(&tree.root(), "div").attr("data-name", "outer");
    let mid = tree.element(&outer, "span");
    let _inner = tree.element(&mid, "div").attr("data-name", "inner");

    let result = resolve(
        json!({"closest": "div", "selector": "div", "value": "@data-name"}),
        &mid,
    );
    assert_eq!(result, Some(json!("outer")));
}

#[test]
fn matches_gate_blocks_non_matching_nodes() {
    let tree = MockTree::new();
    let plain = tree.element(&tree.root(), "div").text("plain");
    let role = tree
        .element(&tree.root(), "div")
        .attr("role", "button")
        .text("gated");

    let gated = json!({"matches": "[role='button']", "value": "<text>"});
    assert_eq!(resolve(gated.clone(), &plain), None);
    assert_eq!(resolve(gated, &role), Some(json!("gated")));
}

#[test]
fn alternatives_take_first_non_null() {
    let tree = MockTree::new();
    let div = tree
        .element(&tree.root(), "div")
        .attr("aria-label", "from aria")
        .text("from text");

    let result = resolve(json!(["@data-metric-label", "@aria-label", "<text>"]), &div);
    assert_eq!(result, Some(json!("from aria")));
}

#[test]
fn alternatives_fall_through_to_literal() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div");

    let result = resolve(json!(["@missing", "fallback"]), &div);
    assert_eq!(result, Some(json!("fallback")));
}

#[test]
fn zero_count_falls_through_alternatives() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div");

    let result = resolve(
        json!([{"selector": "li", "value": "<count>"}, "fallback"]),
        &div,
    );
    assert_eq!(result, Some(json!("fallback")));
}

#[test]
fn non_zero_count_short_circuits_alternatives() {
    let tree = MockTree::new();
    let list = tree.element(&tree.root(), "ul");
    let _a = tree.element(&list, "li");

    let result = resolve(
        json!([{"selector": "li", "value": "<count>"}, "fallback"]),
        &list,
    );
    assert_eq!(result, Some(json!(1)));
}

#[test]
fn terminal_zero_count_is_kept() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div");

    let result = resolve(
        json!(["@missing", {"selector": "li", "value": "<count>"}]),
        &div,
    );
    assert_eq!(result, Some(json!(0)));
}

#[test]
fn nested_value_resolvers_compose() {
    let tree = MockTree::new();
    let article = tree.element(&tree.root(), "article").attr("role", "region");
    let header = tree.element(&article, "header");
    let _h1 = tree.element(&header, "h1").text("Panel Title");
    let button = tree.element(&article, "button");

    let result = resolve(
        json!({
            "closest": "article[role='region']",
            "value": {"selector": "h1", "value": "<text>"}
        }),
        &button,
    );
    assert_eq!(result, Some(json!("Panel Title")));
}

#[test]
fn expression_returns_first_capture_group() {
    let tree = MockTree::new();
    let div = tree
        .element(&tree.root(), "div")
        .attr("style", "background: url(images/icons/star.png)");

    let result = resolve(
        json!({"value": "@style", "expression": r"url\(.*/(.*)\)"}),
        &div,
    );
    assert_eq!(result, Some(json!("star.png")));
}

#[test]
fn expression_without_group_returns_whole_match() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div").text("order #4521 shipped");

    let result = resolve(json!({"value": "<text>", "expression": r"#\d+"}), &div);
    assert_eq!(result, Some(json!("#4521")));
}

#[test]
fn expression_miss_resolves_nothing() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div").text("no digits here");

    let result = resolve(json!({"value": "<text>", "expression": r"\d+"}), &div);
    assert_eq!(result, None);
}

#[test]
fn invalid_expression_degrades_to_identity() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div").text("untouched");

    let result = resolve(json!({"value": "<text>", "expression": "(unclosed"}), &div);
    assert_eq!(result, Some(json!("untouched")));
}

#[test]
fn refiner_passes_non_strings_through() {
    let refiner = Refiner::compile(Some(r"\d+"));
    assert_eq!(refiner.apply(Some(json!(3))), Some(json!(3)));
    assert_eq!(refiner.apply(None), None);
}

#[test]
fn spec_without_value_fails_to_compile() {
    assert!(resolver::compile(&spec(json!({"closest": "div"}))).is_none());
}

#[test]
fn unknown_pseudo_selector_fails_to_compile() {
    assert!(resolver::compile(&spec(json!("<bogus>"))).is_none());
}

#[test]
fn defective_alternatives_are_dropped() {
    let tree = MockTree::new();
    let div = tree.element(&tree.root(), "div").text("kept");

    let result = resolve(json!(["<bogus>", "<text>"]), &div);
    assert_eq!(result, Some(json!("kept")));
}

#[test]
fn data_compilation_skips_defective_fields() {
    let mut data = std::collections::BTreeMap::new();
    data.insert("good".to_string(), spec(json!("<text>")));
    data.insert("bad".to_string(), spec(json!({"selector": "div"})));

    let compiled = resolver::compile_data(&data);
    assert_eq!(compiled.len(), 1);
    assert_eq!(compiled[0].0, "good");
}

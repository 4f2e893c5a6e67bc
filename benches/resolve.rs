use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domtap::message::Message;
use domtap::node::Found;
use domtap::resolver::{self, ResolverSpec};
use domtap::rules::{RuleSet, StringOrList};
use domtap::testing::{MockNode, MockTree};
use std::collections::BTreeMap;

fn sample_tree() -> (MockTree, MockNode) {
    let tree = MockTree::new();
    let article = tree.element(&tree.root(), "article").attr("role", "region");
    let header = tree.element(&article, "header");
    let _title = tree.element(&header, "h1").text("Panel Title");
    let button = tree
        .element(&article, "button")
        .attr("aria-label", "Purchase")
        .text("Buy now");
    for _ in 0..8 {
        let _ = tree.element(&article, "li");
    }
    (tree, button)
}

fn bench_resolver_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver::compile");

    let shorthand: ResolverSpec = serde_json::from_value(serde_json::json!("@aria-label")).unwrap();
    let scoped: ResolverSpec = serde_json::from_value(serde_json::json!({
        "closest": "article[role='region']",
        "value": {"selector": "h1", "value": "<text>"},
        "expression": "Panel (.*)"
    }))
    .unwrap();

    group.bench_function("shorthand", |b| {
        b.iter(|| resolver::compile(black_box(&shorthand)));
    });

    group.bench_function("scoped_nested", |b| {
        b.iter(|| resolver::compile(black_box(&scoped)));
    });

    group.finish();
}

fn bench_resolver_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resolver::resolve");
    let (_tree, button) = sample_tree();
    let selection = Found::Node(button);

    let label: ResolverSpec =
        serde_json::from_value(serde_json::json!(["@data-metric-label", "@aria-label", "<text>"]))
            .unwrap();
    let label = resolver::compile(&label).unwrap();

    let count: ResolverSpec = serde_json::from_value(serde_json::json!({
        "closest": "article",
        "value": {"selector": "li", "value": "<count>"}
    }))
    .unwrap();
    let count = resolver::compile(&count).unwrap();

    group.bench_function("label_chain", |b| {
        b.iter(|| label.resolve(black_box(Some(&selection))));
    });

    group.bench_function("ancestor_count", |b| {
        b.iter(|| count.resolve(black_box(Some(&selection))));
    });

    group.finish();
}

fn bench_ruleset(c: &mut Criterion) {
    let mut group = c.benchmark_group("RuleSet");

    let mut spec = BTreeMap::new();
    spec.insert(
        "label".to_string(),
        StringOrList::Many(vec!["blue".to_string(), "purple".to_string()]),
    );
    spec.insert("panel".to_string(), StringOrList::One("HOME".to_string()));

    group.bench_function("compile", |b| {
        b.iter(|| RuleSet::compile(black_box(&spec)));
    });

    let rules = RuleSet::compile(&spec);
    let mut msg = Message::new();
    msg.insert("label", "deep purple");
    msg.insert("panel", "HOME panel");

    group.bench_function("coverage", |b| {
        b.iter(|| rules.coverage(black_box(&msg)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_resolver_compile,
    bench_resolver_resolve,
    bench_ruleset
);
criterion_main!(benches);

//! In-memory DOM for tests and examples. Nodes live in a shared arena and
//! hand out cheap index handles; the selector language is the small subset
//! the resolver DSL exercises in practice: `tag`, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, `[attr*=value]`, compounds thereof, and
//! comma-separated alternatives.
//!
//! Real hosts implement [`DomNode`] over their own tree with their own
//! selector engine; nothing in the pipeline depends on this module.

use crate::node::DomNode;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct NodeData {
    parent: Option<usize>,
    children: Vec<usize>,
    tag: String,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    value: Option<String>,
    element: bool,
}

/// An arena-backed mock document. Node 0 is the document root.
#[derive(Clone, Default)]
pub struct MockTree {
    nodes: Rc<RefCell<Vec<NodeData>>>,
}

impl MockTree {
    /// Creates a tree containing only the document root.
    #[must_use]
    pub fn new() -> Self {
        let tree = Self::default();
        tree.nodes.borrow_mut().push(NodeData {
            tag: "#document".to_string(),
            ..NodeData::default()
        });
        tree
    }

    /// The document root node.
    #[must_use]
    pub fn root(&self) -> MockNode {
        MockNode {
            tree: self.clone(),
            id: 0,
        }
    }

    /// Appends an element child under `parent`.
    pub fn element(&self, parent: &MockNode, tag: &str) -> MockNode {
        self.push(parent.id, tag, true)
    }

    /// Appends a text node child under `parent`.
    pub fn text(&self, parent: &MockNode, content: &str) -> MockNode {
        let node = self.push(parent.id, "#text", false);
        self.nodes.borrow_mut()[node.id].text = Some(content.to_string());
        node
    }

    fn push(&self, parent: usize, tag: &str, element: bool) -> MockNode {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(NodeData {
            parent: Some(parent),
            tag: tag.to_string(),
            element,
            ..NodeData::default()
        });
        nodes[parent].children.push(id);
        MockNode {
            tree: self.clone(),
            id,
        }
    }
}

/// A handle into a [`MockTree`].
#[derive(Clone)]
pub struct MockNode {
    tree: MockTree,
    id: usize,
}

impl MockNode {
    /// Sets an attribute, returning the node for chaining.
    #[must_use]
    pub fn attr(self, name: &str, value: &str) -> Self {
        self.tree.nodes.borrow_mut()[self.id]
            .attrs
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Sets this node's own text (children contribute theirs separately).
    #[must_use]
    pub fn text(self, content: &str) -> Self {
        self.tree.nodes.borrow_mut()[self.id].text = Some(content.to_string());
        self
    }

    /// Sets the form control value.
    #[must_use]
    pub fn value(self, value: &str) -> Self {
        self.tree.nodes.borrow_mut()[self.id].value = Some(value.to_string());
        self
    }

    fn descendant_ids(&self) -> Vec<usize> {
        fn walk(nodes: &[NodeData], id: usize, out: &mut Vec<usize>) {
            for &child in &nodes[id].children {
                out.push(child);
                walk(nodes, child, out);
            }
        }

        let nodes = self.tree.nodes.borrow();
        let mut out = Vec::new();
        walk(&nodes, self.id, &mut out);
        out
    }

    fn at(&self, id: usize) -> Self {
        Self {
            tree: self.tree.clone(),
            id,
        }
    }
}

impl DomNode for MockNode {
    fn closest(&self, selector: &str) -> Option<Self> {
        let selectors = Selector::parse_list(selector);
        let mut current = Some(self.id);

        while let Some(id) = current {
            let node = self.at(id);
            if selectors.iter().any(|s| s.matches(&node)) {
                return Some(node);
            }
            current = self.tree.nodes.borrow()[id].parent;
        }

        None
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        let selectors = Selector::parse_list(selector);
        self.descendant_ids()
            .into_iter()
            .map(|id| self.at(id))
            .filter(|node| selectors.iter().any(|s| s.matches(node)))
            .collect()
    }

    fn matches(&self, selector: &str) -> bool {
        Selector::parse_list(selector)
            .iter()
            .any(|s| s.matches(self))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.tree.nodes.borrow()[self.id].attrs.get(name).cloned()
    }

    fn text_content(&self) -> Option<String> {
        let own = self.tree.nodes.borrow()[self.id].text.clone();
        let mut content = own.unwrap_or_default();
        for id in self.descendant_ids() {
            if let Some(text) = &self.tree.nodes.borrow()[id].text {
                content.push_str(text);
            }
        }
        Some(content)
    }

    fn form_value(&self) -> Option<String> {
        self.tree.nodes.borrow()[self.id].value.clone()
    }

    fn input_type(&self) -> Option<String> {
        self.attribute("type")
    }

    fn is_element(&self) -> bool {
        self.tree.nodes.borrow()[self.id].element
    }

    fn is_root(&self) -> bool {
        self.id == 0
    }
}

#[derive(Debug, Default)]
struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug)]
enum AttrTest {
    Present(String),
    Equals(String, String),
    Contains(String, String),
}

impl Selector {
    fn parse_list(input: &str) -> Vec<Self> {
        input.split(',').map(str::trim).map(Self::parse).collect()
    }

    fn parse(input: &str) -> Self {
        let mut selector = Self::default();
        let mut rest = input;

        let tag_end = rest
            .find(['#', '.', '['])
            .unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_string());
        }
        rest = &rest[tag_end..];

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('#') {
                let end = after.find(['#', '.', '[']).unwrap_or(after.len());
                selector.id = Some(after[..end].to_string());
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(['#', '.', '[']).unwrap_or(after.len());
                selector.classes.push(after[..end].to_string());
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let Some(close) = after.find(']') else { break };
                selector.attrs.push(Self::parse_attr(&after[..close]));
                rest = &after[close + 1..];
            } else {
                break;
            }
        }

        selector
    }

    fn parse_attr(body: &str) -> AttrTest {
        let unquote = |s: &str| s.trim().trim_matches(['\'', '"']).to_string();

        if let Some((name, value)) = body.split_once("*=") {
            AttrTest::Contains(name.trim().to_string(), unquote(value))
        } else if let Some((name, value)) = body.split_once('=') {
            AttrTest::Equals(name.trim().to_string(), unquote(value))
        } else {
            AttrTest::Present(body.trim().to_string())
        }
    }

    fn matches(&self, node: &MockNode) -> bool {
        if !node.is_element() {
            return false;
        }

        if let Some(tag) = &self.tag {
            if !node.tree.nodes.borrow()[node.id].tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if node.attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        for class in &self.classes {
            let listed = node
                .attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|item| item == class));
            if !listed {
                return false;
            }
        }

        self.attrs.iter().all(|test| match test {
            AttrTest::Present(name) => node.attribute(name).is_some(),
            AttrTest::Equals(name, value) => {
                node.attribute(name).as_deref() == Some(value.as_str())
            }
            AttrTest::Contains(name, value) => {
                node.attribute(name).is_some_and(|v| v.contains(value))
            }
        })
    }
}

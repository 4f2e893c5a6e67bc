//! The DOM capability seam. The collector never touches a concrete tree —
//! hosts implement [`DomNode`] over whatever DOM they have (a real browser
//! tree behind FFI, a server-side render tree, the in-memory tree in
//! [`crate::testing`]), and the resolver DSL works against that.

/// A cheap-to-clone handle to one node of a DOM-like tree.
///
/// Selector strings are opaque to domtap; their semantics (CSS or otherwise)
/// belong entirely to the implementation.
pub trait DomNode: Clone {
    /// Nearest ancestor-or-self matching `selector`, or `None`.
    fn closest(&self, selector: &str) -> Option<Self>;

    /// All descendants matching `selector`, in document order. May be empty.
    fn query_all(&self, selector: &str) -> Vec<Self>;

    /// Whether this node itself matches `selector`.
    fn matches(&self, selector: &str) -> bool;

    /// Attribute value by name, `None` when absent.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text content of the subtree.
    fn text_content(&self) -> Option<String>;

    /// Form control value (`<input>`, `<select>`, ...), `None` otherwise.
    fn form_value(&self) -> Option<String>;

    /// Form control `type` attribute, used to suppress password values.
    fn input_type(&self) -> Option<String>;

    /// Whether this is a true element node (attribute reads require one).
    fn is_element(&self) -> bool;

    /// Whether this is the document root or body, the "global" target.
    fn is_root(&self) -> bool;
}

/// The result of a navigation step: ancestor lookup yields a single node,
/// descendant lookup yields a list. Pseudo-selectors treat the two
/// uniformly through [`Found::first`] and [`Found::count`].
#[derive(Debug, Clone)]
pub enum Found<N: DomNode> {
    /// A single node (the entry node or a `closest` match).
    Node(N),
    /// A `selector` match list, possibly empty.
    List(Vec<N>),
}

impl<N: DomNode> Found<N> {
    /// First node of the selection, `None` for an empty list.
    pub fn first(&self) -> Option<&N> {
        match self {
            Self::Node(n) => Some(n),
            Self::List(v) => v.first(),
        }
    }

    /// A single node counts as 1; a list counts its length.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Node(_) => 1,
            Self::List(v) => v.len(),
        }
    }
}

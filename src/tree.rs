//! The capability interface to the underlying tree document.
//!
//! The engine never parses or owns a document; it works against any type
//! implementing [`TreeDoc`], which must supply node identity, traversal,
//! and selector matching. Selector syntax is whatever the implementation
//! understands: the engine passes selector strings through verbatim.

use std::fmt::Debug;
use std::hash::Hash;

/// A read-only, tree-shaped document the engine can score.
///
/// Node identity is an associated `Id` type rather than a node reference,
/// so the engine can index its own per-node state without borrowing into
/// the document. Implementations must keep the tree immutable for the
/// lifetime of any binding made against it.
pub trait TreeDoc {
    /// Stable identity for one node of the tree.
    type Id: Copy + Eq + Hash + Debug;

    /// The root node of the document.
    fn root(&self) -> Self::Id;

    /// The parent of `node`, or `None` for the root.
    fn parent(&self, node: Self::Id) -> Option<Self::Id>;

    /// The children of `node`, in document order.
    fn children(&self, node: Self::Id) -> Vec<Self::Id>;

    /// The element name of `node` (e.g. `"div"`).
    fn tag(&self, node: Self::Id) -> &str;

    /// The concatenated text content of `node`.
    fn text(&self, node: Self::Id) -> String;

    /// All descendants of `scope` matching `selector`, in document order.
    /// `scope` itself is not a candidate.
    fn select(&self, scope: Self::Id, selector: &str) -> Vec<Self::Id>;
}

/// A value a rule can attach to a (node, type) pair.
///
/// Notes are last-writer-wins per (node, type). The `Node` variant is how
/// `nearest()` records which neighbor a node was paired with; callers
/// resolve it back to a fact handle with `Facts::fnode_for`.
#[derive(Debug, Clone, PartialEq)]
pub enum Note<Id> {
    Text(String),
    Node(Id),
}

impl<Id: Copy> Note<Id> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Note::Text(text) => Some(text),
            Note::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<Id> {
        match self {
            Note::Text(_) => None,
            Note::Node(id) => Some(*id),
        }
    }
}

//! Pairwise node distance for `nearest()` queries.
//!
//! The engine is agnostic to the metric: a [`DistanceFn`] is any pure,
//! deterministic function over two nodes returning a non-negative real,
//! smaller meaning nearer. This module ships a default tree-structural
//! metric that charges for the hops separating two nodes.

use std::rc::Rc;

use crate::tree::TreeDoc;

/// A pluggable distance function over two nodes of a document.
pub type DistanceFn<D> = Rc<dyn Fn(&D, <D as TreeDoc>::Id, <D as TreeDoc>::Id) -> f64>;

/// Costs for the default tree-structural metric.
#[derive(Debug, Clone, Copy)]
pub struct DistanceOptions {
    /// Cost per level while the two nodes sit at unequal depths.
    pub different_depth_cost: f64,
    /// Cost per paired upward step whose elements have differing tags.
    pub different_tag_cost: f64,
    /// Cost per paired upward step whose elements share a tag.
    pub same_tag_cost: f64,
    /// Cost per sibling passed over between the two branches under their
    /// lowest common ancestor.
    pub stride_cost: f64,
}

impl Default for DistanceOptions {
    fn default() -> Self {
        Self {
            different_depth_cost: 2.0,
            different_tag_cost: 2.0,
            same_tag_cost: 1.0,
            stride_cost: 1.0,
        }
    }
}

/// Structural distance between two nodes of `doc`.
///
/// Both nodes are walked up to their lowest common ancestor. Levels climbed
/// while the depths are unequal cost `different_depth_cost` each; the
/// remaining paired steps cost `same_tag_cost` or `different_tag_cost`
/// depending on tag equality; siblings lying between the two branches under
/// the common ancestor cost `stride_cost` each. A node is at distance zero
/// from itself.
pub fn tree_distance<D: TreeDoc>(doc: &D, a: D::Id, b: D::Id, opts: DistanceOptions) -> f64 {
    if a == b {
        return 0.0;
    }

    let path_a = ancestor_path(doc, a);
    let path_b = ancestor_path(doc, b);

    // Strip the shared ancestor suffix, leaving each node's path down from
    // (but not including) the lowest common ancestor.
    let mut len_a = path_a.len();
    let mut len_b = path_b.len();
    while len_a > 0 && len_b > 0 && path_a[len_a - 1] == path_b[len_b - 1] {
        len_a -= 1;
        len_b -= 1;
    }

    let mut cost = opts.different_depth_cost * len_a.abs_diff(len_b) as f64;

    // Paired upward steps, from the common ancestor down.
    let paired = len_a.min(len_b);
    for k in 1..=paired {
        let step_a = path_a[len_a - k];
        let step_b = path_b[len_b - k];
        cost += if doc.tag(step_a) == doc.tag(step_b) {
            opts.same_tag_cost
        } else {
            opts.different_tag_cost
        };
    }

    // Stride over the siblings separating the two branches.
    if len_a > 0 && len_b > 0 {
        let top_a = path_a[len_a - 1];
        let top_b = path_b[len_b - 1];
        if let Some(ancestor) = doc.parent(top_a) {
            let siblings = doc.children(ancestor);
            let pos_a = siblings.iter().position(|&n| n == top_a);
            let pos_b = siblings.iter().position(|&n| n == top_b);
            if let (Some(pos_a), Some(pos_b)) = (pos_a, pos_b) {
                let between = pos_a.abs_diff(pos_b).saturating_sub(1);
                cost += opts.stride_cost * between as f64;
            }
        }
    }

    cost
}

/// The default structural metric packaged as a [`DistanceFn`].
pub fn default_distance<D: TreeDoc>() -> DistanceFn<D> {
    let opts = DistanceOptions::default();
    Rc::new(move |doc, a, b| tree_distance(doc, a, b, opts))
}

/// Path from `node` up to the root, inclusive at both ends.
fn ancestor_path<D: TreeDoc>(doc: &D, node: D::Id) -> Vec<D::Id> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        path.push(parent);
        current = parent;
    }
    path
}

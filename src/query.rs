//! Query descriptors.
//!
//! The same [`Query`] values serve as rule left-hand sides and as the
//! top-level query surface of a binding. A query describes which facts are
//! wanted; the engine derives the types it must settle from the query
//! alone, which is what makes demand-driven execution possible.

use std::fmt;

use crate::distance::DistanceFn;
use crate::tree::TreeDoc;

/// A query over already-known facts.
pub enum Query<D: TreeDoc> {
    /// Nodes matching a selector, resolved by the tree collaborator.
    Dom(String),
    /// Nodes bearing a type; with `max` set, only the top-scoring ties.
    Type { name: String, max: bool },
    /// Set intersection of subqueries, by fact identity.
    And(Vec<Query<D>>),
    /// Each left result paired with its distance-minimizing right result.
    Nearest {
        left: Box<Query<D>>,
        right: Box<Query<D>>,
        distance: DistanceFn<D>,
    },
}

/// Nodes matching `selector`.
pub fn dom<D: TreeDoc>(selector: impl Into<String>) -> Query<D> {
    Query::Dom(selector.into())
}

/// Nodes bearing the type `name`.
pub fn typed<D: TreeDoc>(name: impl Into<String>) -> Query<D> {
    Query::Type {
        name: name.into(),
        max: false,
    }
}

/// A type demanded by a query: the type name plus whether the demand is an
/// aggregate, i.e. requires the type to be fully settled first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeDemand {
    pub(crate) name: String,
    pub(crate) aggregate: bool,
}

impl<D: TreeDoc> Query<D> {
    /// Restrict a type query to its maximal-scoring facts (ties included).
    ///
    /// Only `typed()` queries carry scores to rank; on `dom()`, `and()`,
    /// and `nearest()` shapes this returns the query unchanged. To keep
    /// only the best facts of an intersection or pairing, emit them as a
    /// type first and call `max()` on that.
    pub fn max(self) -> Self {
        match self {
            Query::Type { name, .. } => Query::Type { name, max: true },
            other => other,
        }
    }

    /// Intersect `queries` by fact identity.
    pub fn and(queries: Vec<Query<D>>) -> Self {
        Query::And(queries)
    }

    /// Pair each `left` result with the `right` result nearest to it under
    /// `distance`; ties go to the earlier-encountered right result.
    pub fn nearest(left: Query<D>, right: Query<D>, distance: DistanceFn<D>) -> Self {
        Query::Nearest {
            left: Box::new(left),
            right: Box::new(right),
            distance,
        }
    }

    /// Every type this query consumes, in encounter order.
    pub(crate) fn input_types(&self) -> Vec<TypeDemand> {
        let mut demands = Vec::new();
        self.collect_input_types(&mut demands);
        demands
    }

    fn collect_input_types(&self, demands: &mut Vec<TypeDemand>) {
        match self {
            Query::Dom(_) => {}
            Query::Type { name, max } => demands.push(TypeDemand {
                name: name.clone(),
                aggregate: *max,
            }),
            Query::And(queries) => {
                for query in queries {
                    query.collect_input_types(demands);
                }
            }
            Query::Nearest { left, right, .. } => {
                left.collect_input_types(demands);
                right.collect_input_types(demands);
            }
        }
    }

    /// The single type a typed query consumes, if this is one. Used by the
    /// compiler to let score- and note-only effects inherit their type.
    pub(crate) fn single_input_type(&self) -> Option<&str> {
        match self {
            Query::Type { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl<D: TreeDoc> Clone for Query<D> {
    fn clone(&self) -> Self {
        match self {
            Query::Dom(selector) => Query::Dom(selector.clone()),
            Query::Type { name, max } => Query::Type {
                name: name.clone(),
                max: *max,
            },
            Query::And(queries) => Query::And(queries.clone()),
            Query::Nearest {
                left,
                right,
                distance,
            } => Query::Nearest {
                left: left.clone(),
                right: right.clone(),
                distance: distance.clone(),
            },
        }
    }
}

impl<D: TreeDoc> fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Dom(selector) => f.debug_tuple("Dom").field(selector).finish(),
            Query::Type { name, max } => f
                .debug_struct("Type")
                .field("name", name)
                .field("max", max)
                .finish(),
            Query::And(queries) => f.debug_tuple("And").field(queries).finish(),
            Query::Nearest { left, right, .. } => f
                .debug_struct("Nearest")
                .field("left", left)
                .field("right", right)
                .finish(),
        }
    }
}

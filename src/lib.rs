//! # Canopy Engine
//!
//! **Declarative rules for scoring tree-shaped documents**
//!
//! Canopy is a lazily-evaluated rule engine that scores and classifies the
//! nodes of a tree-shaped document (such as an HTML DOM) for
//! content-extraction tasks like "find the best candidate paragraph on a
//! page".
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use canopy::{dom, typed, CanopyResult, Effect, Query, Rule, RuleSet};
//!
//! fn main() -> CanopyResult<()> {
//!     // `Html` is any type implementing canopy::TreeDoc.
//!     let doc = Html::parse("<div>Some text</div>");
//!
//!     let rules = RuleSet::new(vec![
//!         Rule::new(dom("div"), Effect::typed("paragraphish")),
//!         Rule::new(typed("paragraphish"), Effect::scored(2.0)),
//!     ])?;
//!
//!     let mut facts = rules.against(&doc, doc.root());
//!     let best = facts.get(typed("paragraphish").max())?;
//!     println!("{:?}", best);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Rules
//! A rule pairs a query over already-known facts (its left-hand side) with
//! an effect (its right-hand side) that labels matching nodes with a type,
//! contributes a score, and/or attaches a note.
//!
//! ### Types and facts
//! A type is a label a node may acquire. The per-node record of acquired
//! types, scores, and notes within one binding is an [`Fnode`].
//!
//! ### Bindings
//! Compiling rules once yields a [`RuleSet`]; binding it to a document
//! root yields an independent [`Facts`] store. Queries settle only the
//! rules they transitively need, each at most once per node.
//!
//! ### Scores
//! A type's score on a node is `sigmoid(bias + Σ coeff × contribution)`
//! over the rules that actually executed, so externally learned weights
//! can be applied after the fact via [`Calibration`].

pub mod distance;
pub mod error;
pub mod facts;
pub mod fnode;
pub mod query;
pub mod rule;
pub mod ruleset;
pub mod tree;

pub use distance::{default_distance, tree_distance, DistanceFn, DistanceOptions};
pub use error::CanopyError;
pub use facts::{Calibration, Facts};
pub use fnode::{sigmoid, Fnode};
pub use query::{dom, typed, Query};
pub use rule::{Effect, Emission, Rule, RuleId};
pub use ruleset::RuleSet;
pub use tree::{Note, TreeDoc};

/// Result type for canopy operations
pub type CanopyResult<T> = Result<T, CanopyError>;

#[cfg(test)]
mod tests;

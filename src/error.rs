//! Error types for the canopy engine.
//!
//! Every failure here is a ruleset-authoring error: identical ruleset and
//! query always fail identically, so there is nothing to retry. A failed
//! `get()` yields no partial results but leaves the binding usable for
//! unrelated queries.

use thiserror::Error;

/// Error taxonomy for compiling and querying rulesets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanopyError {
    /// Raised at compile time when a rule's output types cannot be
    /// enumerated from its right-hand side alone: a dynamic effect with an
    /// empty `type_in` declaration, or a fixed effect with neither a type
    /// of its own nor a single-type left-hand side to inherit one from.
    #[error("could not determine the emitted type of {rule}: a fixed effect needs a type and a dynamic effect must declare its possible output types")]
    IndeterminateType { rule: String },

    /// No rule in the ruleset can emit the named type, but a query or
    /// another rule needs it as input.
    #[error("no rule emits the \"{0}\" type, but another rule needs it as input")]
    UnemittedType(String),

    /// Rules emit the named type but none can create new facts of it, and
    /// no node currently bears it.
    #[error("no rule adds the \"{0}\" type, but another rule needs it as input")]
    UnaddedType(String),

    /// The type dependency graph contains a cycle reachable from the query.
    #[error("the ruleset has a cyclic dependency involving the \"{0}\" type")]
    CyclicDependency(String),

    /// Two rules claim the same output key.
    #[error("multiple rules claim the output key \"{0}\"")]
    DuplicateOutKey(String),

    /// A query named an output key no rule declares.
    #[error("no rule has the output key \"{0}\"")]
    UnknownOutKey(String),

    /// A dynamic effect emitted a type outside its declared `type_in` set.
    #[error("{rule} emitted the \"{typ}\" type, which is not in its declared output types")]
    UndeclaredType { rule: String, typ: String },

    /// Calibration data could not be parsed.
    #[error("invalid calibration: {0}")]
    Calibration(String),
}

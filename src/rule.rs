//! Rules: an LHS query paired with an RHS effect.
//!
//! A rule is an immutable value. Its effect may label matching nodes with a
//! type, contribute a score, and attach a note. Effects come in two shapes:
//! `Static`, whose single output type is known at compile time (declared
//! outright or inherited from a single-type LHS), and `Dynamic`, whose
//! per-node compute callback picks the output from a statically declared
//! `type_in` set.

use std::fmt;
use std::rc::Rc;

use crate::query::Query;
use crate::tree::{Note, TreeDoc};

/// Stable identity of a compiled rule, assigned in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub usize);

/// Per-node score callback.
pub type ScoreFn<D> = Rc<dyn Fn(&D, <D as TreeDoc>::Id) -> f64>;

/// Per-node note callback.
pub type NoteFn<D> = Rc<dyn Fn(&D, <D as TreeDoc>::Id) -> Option<Note<<D as TreeDoc>::Id>>>;

/// Per-node compute callback for dynamic effects.
pub type ComputeFn<D> = Rc<dyn Fn(&D, <D as TreeDoc>::Id) -> Emission<<D as TreeDoc>::Id>>;

/// What a dynamic effect produced for one node.
#[derive(Debug, Clone, Default)]
pub struct Emission<Id> {
    /// Output type; `None` inherits the LHS input type.
    pub typ: Option<String>,
    pub score: Option<f64>,
    pub note: Option<Note<Id>>,
}

impl<Id> Emission<Id> {
    pub fn none() -> Self {
        Self {
            typ: None,
            score: None,
            note: None,
        }
    }

    pub fn typed(name: impl Into<String>) -> Self {
        Self {
            typ: Some(name.into()),
            score: None,
            note: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_note(mut self, note: Note<Id>) -> Self {
        self.note = Some(note);
        self
    }
}

/// A score contribution: a constant or a per-node callback.
pub enum Score<D: TreeDoc> {
    Value(f64),
    With(ScoreFn<D>),
}

impl<D: TreeDoc> Score<D> {
    pub(crate) fn for_node(&self, doc: &D, node: D::Id) -> f64 {
        match self {
            Score::Value(value) => *value,
            Score::With(callback) => callback(doc, node),
        }
    }
}

impl<D: TreeDoc> Clone for Score<D> {
    fn clone(&self) -> Self {
        match self {
            Score::Value(value) => Score::Value(*value),
            Score::With(callback) => Score::With(Rc::clone(callback)),
        }
    }
}

pub(crate) enum EffectKind<D: TreeDoc> {
    Static {
        typ: Option<String>,
        score: Option<Score<D>>,
        note: Option<NoteFn<D>>,
    },
    Dynamic {
        compute: ComputeFn<D>,
        type_in: Vec<String>,
    },
}

impl<D: TreeDoc> Clone for EffectKind<D> {
    fn clone(&self) -> Self {
        match self {
            EffectKind::Static { typ, score, note } => EffectKind::Static {
                typ: typ.clone(),
                score: score.clone(),
                note: note.as_ref().map(Rc::clone),
            },
            EffectKind::Dynamic { compute, type_in } => EffectKind::Dynamic {
                compute: Rc::clone(compute),
                type_in: type_in.clone(),
            },
        }
    }
}

/// The right-hand side of a rule.
pub struct Effect<D: TreeDoc> {
    pub(crate) kind: EffectKind<D>,
    pub(crate) out_key: Option<String>,
}

impl<D: TreeDoc> Effect<D> {
    /// An effect labeling matches with a fixed type.
    pub fn typed(name: impl Into<String>) -> Self {
        Self {
            kind: EffectKind::Static {
                typ: Some(name.into()),
                score: None,
                note: None,
            },
            out_key: None,
        }
    }

    /// A score-only effect; its type is inherited from the LHS.
    pub fn scored(value: f64) -> Self {
        Self {
            kind: EffectKind::Static {
                typ: None,
                score: Some(Score::Value(value)),
                note: None,
            },
            out_key: None,
        }
    }

    /// A score-only effect computed per node; its type is inherited from
    /// the LHS.
    pub fn scored_with(callback: impl Fn(&D, D::Id) -> f64 + 'static) -> Self {
        Self {
            kind: EffectKind::Static {
                typ: None,
                score: Some(Score::With(Rc::new(callback))),
                note: None,
            },
            out_key: None,
        }
    }

    /// A dynamic effect: the compute callback chooses each node's type,
    /// score, and note, constrained to the declared `type_in` set.
    pub fn dynamic(
        compute: impl Fn(&D, D::Id) -> Emission<D::Id> + 'static,
        type_in: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            kind: EffectKind::Dynamic {
                compute: Rc::new(compute),
                type_in: type_in.into_iter().map(Into::into).collect(),
            },
            out_key: None,
        }
    }

    /// A pure output-key effect. Such a rule never mutates facts; it names
    /// its LHS so callers can query it with `Facts::get_by_key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            kind: EffectKind::Static {
                typ: None,
                score: None,
                note: None,
            },
            out_key: Some(key.into()),
        }
    }

    /// Add a constant score contribution.
    pub fn score(mut self, value: f64) -> Self {
        if let EffectKind::Static { score, .. } = &mut self.kind {
            *score = Some(Score::Value(value));
        }
        self
    }

    /// Add a per-node score contribution.
    pub fn score_with(mut self, callback: impl Fn(&D, D::Id) -> f64 + 'static) -> Self {
        if let EffectKind::Static { score, .. } = &mut self.kind {
            *score = Some(Score::With(Rc::new(callback)));
        }
        self
    }

    /// Add a per-node note.
    pub fn note_with(
        mut self,
        callback: impl Fn(&D, D::Id) -> Option<Note<D::Id>> + 'static,
    ) -> Self {
        if let EffectKind::Static { note, .. } = &mut self.kind {
            *note = Some(Rc::new(callback));
        }
        self
    }

    /// Also register this rule under an output key.
    pub fn out(mut self, key: impl Into<String>) -> Self {
        self.out_key = Some(key.into());
        self
    }

    pub fn out_key(&self) -> Option<&str> {
        self.out_key.as_deref()
    }

    /// An effect that carries nothing but an output key.
    pub(crate) fn is_pure_out(&self) -> bool {
        self.out_key.is_some()
            && matches!(
                &self.kind,
                EffectKind::Static {
                    typ: None,
                    score: None,
                    note: None,
                }
            )
    }
}

impl<D: TreeDoc> Clone for Effect<D> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            out_key: self.out_key.clone(),
        }
    }
}

impl<D: TreeDoc> fmt::Debug for Effect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EffectKind::Static { typ, score, note } => f
                .debug_struct("Static")
                .field("typ", typ)
                .field("score", &score.is_some())
                .field("note", &note.is_some())
                .field("out_key", &self.out_key)
                .finish(),
            EffectKind::Dynamic { type_in, .. } => f
                .debug_struct("Dynamic")
                .field("type_in", type_in)
                .field("out_key", &self.out_key)
                .finish(),
        }
    }
}

/// An LHS query paired with an RHS effect, optionally named.
///
/// The name is the handle coefficients are keyed by when calibrating a
/// binding; unnamed rules always weigh their contributions at 1.
pub struct Rule<D: TreeDoc> {
    pub(crate) lhs: Query<D>,
    pub(crate) effect: Effect<D>,
    pub(crate) name: Option<String>,
}

impl<D: TreeDoc> Rule<D> {
    pub fn new(lhs: Query<D>, effect: Effect<D>) -> Self {
        Self {
            lhs,
            effect,
            name: None,
        }
    }

    /// Name this rule for coefficient lookup.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn lhs(&self) -> &Query<D> {
        &self.lhs
    }

    pub fn effect(&self) -> &Effect<D> {
        &self.effect
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<D: TreeDoc> Clone for Rule<D> {
    fn clone(&self) -> Self {
        Self {
            lhs: self.lhs.clone(),
            effect: self.effect.clone(),
            name: self.name.clone(),
        }
    }
}

impl<D: TreeDoc> fmt::Debug for Rule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("lhs", &self.lhs)
            .field("effect", &self.effect)
            .field("name", &self.name)
            .finish()
    }
}

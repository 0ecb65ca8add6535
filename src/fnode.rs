//! Per-node fact records.
//!
//! An [`Fnode`] is the fact record for one tree node within one binding: an
//! ordered log of acquired types and, per type, a score ledger and a note.
//! Handles are cheap clones of a shared record, so every query against one
//! binding hands back the same underlying fact for the same node; compare
//! with [`Fnode::ptr_eq`] (also the `PartialEq` impl).
//!
//! Everything here is non-triggering introspection. Reads that settle rules
//! first (`score_for`, `note_for`) live on `Facts`, which owns the
//! execution engine.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::rule::RuleId;
use crate::tree::Note;

/// The logistic squashing function used to fold a raw combined score into
/// `(0, 1)`. Monotonic; `sigmoid(0) == 0.5`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

struct TypeRecord<Id> {
    /// Contribution per executed rule. Keyed by rule identity so a rule
    /// re-triggered through another query path cannot double-count, and
    /// ordered so summation is deterministic.
    ledger: BTreeMap<RuleId, f64>,
    /// Last writer wins.
    note: Option<Note<Id>>,
}

impl<Id> Default for TypeRecord<Id> {
    fn default() -> Self {
        Self {
            ledger: BTreeMap::new(),
            note: None,
        }
    }
}

struct FnodeData<Id> {
    node: Id,
    /// Types in order of first acquisition.
    acquired: Vec<String>,
    types: HashMap<String, TypeRecord<Id>>,
}

/// Handle to the fact record of one node within one binding.
pub struct Fnode<Id>(Rc<RefCell<FnodeData<Id>>>);

impl<Id: Copy + Eq + Hash + fmt::Debug> Fnode<Id> {
    pub(crate) fn new(node: Id) -> Self {
        Self(Rc::new(RefCell::new(FnodeData {
            node,
            acquired: Vec::new(),
            types: HashMap::new(),
        })))
    }

    /// The underlying tree node's identity.
    pub fn node(&self) -> Id {
        self.0.borrow().node
    }

    /// Whether two handles refer to the same fact record.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Types acquired so far, in acquisition order. Non-triggering.
    pub fn types_so_far(&self) -> Vec<String> {
        self.0.borrow().acquired.clone()
    }

    /// Whether this fact currently bears `typ`. Non-triggering.
    pub fn has_type(&self, typ: &str) -> bool {
        self.0.borrow().types.contains_key(typ)
    }

    /// The score ledger accumulated for `typ` so far, keyed by rule
    /// identity. Non-triggering: reflects only rules that have already run.
    pub fn scores_so_far_for(&self, typ: &str) -> BTreeMap<RuleId, f64> {
        self.0
            .borrow()
            .types
            .get(typ)
            .map(|record| record.ledger.clone())
            .unwrap_or_default()
    }

    /// The note recorded for `typ` so far, if any. Non-triggering.
    pub fn note_so_far_for(&self, typ: &str) -> Option<Note<Id>> {
        self.0
            .borrow()
            .types
            .get(typ)
            .and_then(|record| record.note.clone())
    }

    /// Tag this fact with `typ`; true if newly acquired.
    pub(crate) fn add_type(&self, typ: &str) -> bool {
        let mut data = self.0.borrow_mut();
        if data.types.contains_key(typ) {
            return false;
        }
        data.acquired.push(typ.to_string());
        data.types.insert(typ.to_string(), TypeRecord::default());
        true
    }

    pub(crate) fn add_contribution(&self, typ: &str, rule: RuleId, score: f64) {
        let mut data = self.0.borrow_mut();
        data.types
            .entry(typ.to_string())
            .or_default()
            .ledger
            .insert(rule, score);
    }

    pub(crate) fn set_note(&self, typ: &str, note: Note<Id>) {
        let mut data = self.0.borrow_mut();
        data.types.entry(typ.to_string()).or_default().note = Some(note);
    }
}

impl<Id> Clone for Fnode<Id> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

/// Equality is fact identity, not structural comparison.
impl<Id> PartialEq for Fnode<Id> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<Id> Eq for Fnode<Id> {}

impl<Id: Copy + Eq + Hash + fmt::Debug> fmt::Debug for Fnode<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Fnode")
            .field("node", &data.node)
            .field("types", &data.acquired)
            .finish()
    }
}

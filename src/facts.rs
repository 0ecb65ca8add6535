//! The bound fact store and its demand-driven execution engine.
//!
//! A [`Facts`] instance is one binding of a compiled ruleset to a document
//! root. Queries settle types on demand:
//! 1. Already-settled types answer from the cached index.
//! 2. Rules that could emit the type are found; a type with no emitters,
//!    or with emitters but no adders and no existing facts, is an error.
//! 3. The type is marked in progress and each emitting rule's own input
//!    types are settled recursively; revisiting an in-progress type is a
//!    cyclic dependency.
//! 4. Each rule's LHS runs against the known facts and its RHS applies to
//!    every match exactly once per (rule, node).
//!
//! Bindings never share state: binding the same ruleset to a subtree
//! re-executes rules fresh against that subtree alone.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CanopyError;
use crate::fnode::{sigmoid, Fnode};
use crate::query::Query;
use crate::rule::{EffectKind, RuleId};
use crate::ruleset::RuleSet;
use crate::tree::{Note, TreeDoc};
use crate::CanopyResult;

/// One LHS match: the matched fact plus, for `nearest()`, its pair.
struct Match<Id> {
    fnode: Fnode<Id>,
    paired: Option<Fnode<Id>>,
}

/// The runtime fact store produced by binding a ruleset to a root node.
pub struct Facts<'r, 'd, D: TreeDoc> {
    ruleset: &'r RuleSet<D>,
    doc: &'d D,
    root: D::Id,
    fnodes: HashMap<D::Id, Fnode<D::Id>>,
    /// Realized facts per type, in acquisition order.
    by_type: HashMap<String, Vec<Fnode<D::Id>>>,
    settled: HashSet<String>,
    in_progress: HashSet<String>,
    executed: HashSet<(RuleId, D::Id)>,
    coeffs: HashMap<String, f64>,
    biases: HashMap<String, f64>,
}

impl<'r, 'd, D: TreeDoc> Facts<'r, 'd, D> {
    pub(crate) fn new(ruleset: &'r RuleSet<D>, doc: &'d D, root: D::Id) -> Self {
        Self {
            ruleset,
            doc,
            root,
            fnodes: HashMap::new(),
            by_type: HashMap::new(),
            settled: HashSet::new(),
            in_progress: HashSet::new(),
            executed: HashSet::new(),
            coeffs: HashMap::new(),
            biases: HashMap::new(),
        }
    }

    pub fn ruleset(&self) -> &RuleSet<D> {
        self.ruleset
    }

    pub fn doc(&self) -> &D {
        self.doc
    }

    pub fn root(&self) -> D::Id {
        self.root
    }

    /// Answer a query, lazily settling only the types it demands.
    pub fn get(&mut self, query: Query<D>) -> CanopyResult<Vec<Fnode<D::Id>>> {
        for demand in query.input_types() {
            self.settle(&demand.name)?;
        }
        let matches = self.evaluate_query(&query);
        Ok(matches.into_iter().map(|m| m.fnode).collect())
    }

    /// Answer by output key: the facts of the keyed rule's emitted type,
    /// or for a pure out rule, its LHS results.
    pub fn get_by_key(&mut self, key: &str) -> CanopyResult<Vec<Fnode<D::Id>>> {
        let ruleset = self.ruleset;
        let id = ruleset
            .out_rule(key)
            .ok_or_else(|| CanopyError::UnknownOutKey(key.to_string()))?;
        let rule = ruleset.rule(id);

        if rule.effect().is_pure_out() {
            for demand in rule.lhs().input_types() {
                self.settle(&demand.name)?;
            }
            let matches = self.evaluate_query(rule.lhs());
            return Ok(matches.into_iter().map(|m| m.fnode).collect());
        }

        let mut result: Vec<Fnode<D::Id>> = Vec::new();
        for typ in ruleset.output_types_of(id).to_vec() {
            self.settle(&typ)?;
            for fnode in self.by_type.get(&typ).cloned().unwrap_or_default() {
                if !result.iter().any(|f| Fnode::ptr_eq(f, &fnode)) {
                    result.push(fnode);
                }
            }
        }
        Ok(result)
    }

    /// The fact wrapping a concrete node, realized without forcing any
    /// rule to run.
    pub fn fnode_for(&mut self, node: D::Id) -> Fnode<D::Id> {
        self.fnodes
            .entry(node)
            .or_insert_with(|| Fnode::new(node))
            .clone()
    }

    /// The combined score of `fnode` for `typ`, settling `typ` first:
    /// `sigmoid(bias + Σ coeff × contribution)` over the ledger.
    pub fn score_for(&mut self, fnode: &Fnode<D::Id>, typ: &str) -> CanopyResult<f64> {
        self.settle(typ)?;
        Ok(self.combined_score(fnode, typ))
    }

    /// The last note written for (fnode, typ), settling `typ` first.
    pub fn note_for(
        &mut self,
        fnode: &Fnode<D::Id>,
        typ: &str,
    ) -> CanopyResult<Option<Note<D::Id>>> {
        self.settle(typ)?;
        Ok(fnode.note_so_far_for(typ))
    }

    /// Overwrite the linear calibration weights: coefficients per rule
    /// name (default 1) and biases per type (default 0). Never re-triggers
    /// executed rules; affects only subsequent reads.
    pub fn set_coeffs_and_biases(
        &mut self,
        coeffs: HashMap<String, f64>,
        biases: HashMap<String, f64>,
    ) {
        self.coeffs = coeffs;
        self.biases = biases;
    }

    pub fn apply_calibration(&mut self, calibration: &Calibration) {
        self.set_coeffs_and_biases(
            calibration.coeffs.iter().cloned().collect(),
            calibration.biases.iter().cloned().collect(),
        );
    }

    pub fn coeffs(&self) -> &HashMap<String, f64> {
        &self.coeffs
    }

    pub fn biases(&self) -> &HashMap<String, f64> {
        &self.biases
    }

    /// Ensure every rule needed to finalize `typ`'s facts has executed.
    fn settle(&mut self, typ: &str) -> CanopyResult<()> {
        if self.settled.contains(typ) {
            return Ok(());
        }
        if self.in_progress.contains(typ) {
            return Err(CanopyError::CyclicDependency(typ.to_string()));
        }

        let ruleset = self.ruleset;
        let emitters = ruleset.inward_rules_that_could_emit(typ).to_vec();
        if emitters.is_empty() {
            return Err(CanopyError::UnemittedType(typ.to_string()));
        }
        let no_existing = self.by_type.get(typ).map_or(true, Vec::is_empty);
        if ruleset.inward_rules_that_could_add(typ).is_empty() && no_existing {
            return Err(CanopyError::UnaddedType(typ.to_string()));
        }

        // Rules not consuming the type run before T -> T self-refiners, so
        // declaration order among independent rules stays a tie-break.
        let (feeders, refiners): (Vec<RuleId>, Vec<RuleId>) =
            emitters.iter().partition(|&&id| {
                !ruleset
                    .rule(id)
                    .lhs()
                    .input_types()
                    .iter()
                    .any(|demand| demand.name == typ && !demand.aggregate)
            });

        self.in_progress.insert(typ.to_string());
        let outcome = self.run_emitters(typ, feeders.into_iter().chain(refiners));
        self.in_progress.remove(typ);
        outcome?;

        self.settled.insert(typ.to_string());
        Ok(())
    }

    fn run_emitters(
        &mut self,
        typ: &str,
        ids: impl Iterator<Item = RuleId>,
    ) -> CanopyResult<()> {
        let ruleset = self.ruleset;
        for id in ids {
            for demand in ruleset.rule(id).lhs().input_types() {
                if demand.name == typ && !demand.aggregate {
                    // Non-aggregate self-consumption runs within this
                    // settlement; an aggregate demand on the type being
                    // settled recurses and reports the cycle.
                    continue;
                }
                self.settle(&demand.name)?;
            }
            self.run_rule(id)?;
        }
        Ok(())
    }

    /// Evaluate one rule's LHS and apply its RHS to every match. Assumes
    /// the LHS's input types are settled (or being settled, for
    /// self-refining rules).
    fn run_rule(&mut self, id: RuleId) -> CanopyResult<()> {
        let ruleset = self.ruleset;
        let matches = self.evaluate_query(ruleset.rule(id).lhs());
        for m in matches {
            self.apply(id, m)?;
        }
        Ok(())
    }

    /// Apply a rule's RHS to one matched fact. Idempotent per (rule, node)
    /// even when re-triggered through multiple query paths.
    fn apply(&mut self, id: RuleId, m: Match<D::Id>) -> CanopyResult<()> {
        let node = m.fnode.node();
        if !self.executed.insert((id, node)) {
            return Ok(());
        }

        let ruleset = self.ruleset;
        let doc = self.doc;
        let rule = ruleset.rule(id);

        let (out_type, contribution, note) = match &rule.effect().kind {
            EffectKind::Static { typ, score, note } => {
                let inherited = || rule.lhs().single_input_type().map(str::to_string);
                let Some(out_type) = typ.clone().or_else(inherited) else {
                    // Pure out rules are not inward and never reach here.
                    return Ok(());
                };
                let contribution = score.as_ref().map(|s| s.for_node(doc, node));
                let note = note.as_ref().and_then(|callback| callback(doc, node));
                (out_type, contribution, note)
            }
            EffectKind::Dynamic { compute, type_in } => {
                let emission = compute(doc, node);
                let out_type = match emission.typ {
                    Some(typ) => {
                        if !type_in.contains(&typ) {
                            return Err(CanopyError::UndeclaredType {
                                rule: ruleset.rule_label(id),
                                typ,
                            });
                        }
                        typ
                    }
                    None => match rule.lhs().single_input_type() {
                        Some(typ) if type_in.iter().any(|t| t == typ) => typ.to_string(),
                        Some(typ) => {
                            return Err(CanopyError::UndeclaredType {
                                rule: ruleset.rule_label(id),
                                typ: typ.to_string(),
                            })
                        }
                        // No type chosen and none inheritable: the rule
                        // declined to label this node.
                        None => return Ok(()),
                    },
                };
                (out_type, emission.score, emission.note)
            }
        };

        // nearest() records the pair as the note unless the RHS wrote one.
        let note = note.or_else(|| m.paired.as_ref().map(|pair| Note::Node(pair.node())));

        if m.fnode.add_type(&out_type) {
            self.by_type
                .entry(out_type.clone())
                .or_default()
                .push(m.fnode.clone());
        }
        if let Some(score) = contribution {
            m.fnode.add_contribution(&out_type, id, score);
        }
        if let Some(note) = note {
            m.fnode.set_note(&out_type, note);
        }
        Ok(())
    }

    /// Evaluate a query against the facts known right now. Input types
    /// must already be settled (or in flight, for self-refiners).
    fn evaluate_query(&mut self, query: &Query<D>) -> Vec<Match<D::Id>> {
        match query {
            Query::Dom(selector) => {
                let doc = self.doc;
                let root = self.root;
                doc.select(root, selector)
                    .into_iter()
                    .map(|node| Match {
                        fnode: self.fnode_for(node),
                        paired: None,
                    })
                    .collect()
            }
            Query::Type { name, max } => {
                let facts = self.by_type.get(name).cloned().unwrap_or_default();
                let facts = if *max { self.maximal(facts, name) } else { facts };
                facts
                    .into_iter()
                    .map(|fnode| Match {
                        fnode,
                        paired: None,
                    })
                    .collect()
            }
            Query::And(queries) => {
                let mut subqueries = queries.iter();
                let Some(first) = subqueries.next() else {
                    return Vec::new();
                };
                let mut result = self.evaluate_query(first);
                for query in subqueries {
                    let other: Vec<Fnode<D::Id>> = self
                        .evaluate_query(query)
                        .into_iter()
                        .map(|m| m.fnode)
                        .collect();
                    result.retain(|m| other.iter().any(|f| Fnode::ptr_eq(f, &m.fnode)));
                }
                result
            }
            Query::Nearest {
                left,
                right,
                distance,
            } => {
                let lefts = self.evaluate_query(left);
                let rights = self.evaluate_query(right);
                let doc = self.doc;
                lefts
                    .into_iter()
                    .map(|mut m| {
                        let mut best: Option<(f64, &Fnode<D::Id>)> = None;
                        for candidate in &rights {
                            let d = distance(doc, m.fnode.node(), candidate.fnode.node());
                            // Strict comparison keeps the first-encountered
                            // candidate on ties.
                            if best.as_ref().map_or(true, |(best_d, _)| d < *best_d) {
                                best = Some((d, &candidate.fnode));
                            }
                        }
                        m.paired = best.map(|(_, fnode)| fnode.clone());
                        m
                    })
                    .collect()
            }
        }
    }

    /// The maximal-scoring facts of `typ`, ties included.
    fn maximal(&self, facts: Vec<Fnode<D::Id>>, typ: &str) -> Vec<Fnode<D::Id>> {
        let scored: Vec<(Fnode<D::Id>, f64)> = facts
            .into_iter()
            .map(|fnode| {
                let score = self.combined_score(&fnode, typ);
                (fnode, score)
            })
            .collect();
        let best = scored
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);
        scored
            .into_iter()
            .filter(|(_, score)| *score == best)
            .map(|(fnode, _)| fnode)
            .collect()
    }

    fn combined_score(&self, fnode: &Fnode<D::Id>, typ: &str) -> f64 {
        let mut raw = self.biases.get(typ).copied().unwrap_or(0.0);
        for (rule, contribution) in fnode.scores_so_far_for(typ) {
            let coeff = self
                .ruleset
                .rule(rule)
                .name()
                .and_then(|name| self.coeffs.get(name))
                .copied()
                .unwrap_or(1.0);
            raw += coeff * contribution;
        }
        sigmoid(raw)
    }
}

/// Externally learned linear weights for a binding: coefficients per rule
/// name and biases per type.
///
/// Serializes as pair lists, the shape the training tooling emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calibration {
    #[serde(default)]
    pub coeffs: Vec<(String, f64)>,
    #[serde(default)]
    pub biases: Vec<(String, f64)>,
}

impl Calibration {
    pub fn from_json(json: &str) -> CanopyResult<Self> {
        serde_json::from_str(json).map_err(|e| CanopyError::Calibration(e.to_string()))
    }

    /// Parse the trainer's own output shape, `{"coeffs": [["rule", w],
    /// …], "bias": b}`, attributing the single bias to `typ`.
    pub fn from_trainer_json(json: &str, typ: &str) -> CanopyResult<Self> {
        #[derive(Deserialize)]
        struct Trainer {
            #[serde(default)]
            coeffs: Vec<(String, f64)>,
            #[serde(default)]
            bias: f64,
        }
        let trainer: Trainer =
            serde_json::from_str(json).map_err(|e| CanopyError::Calibration(e.to_string()))?;
        Ok(Self {
            coeffs: trainer.coeffs,
            biases: vec![(typ.to_string(), trainer.bias)],
        })
    }
}

//! The ruleset compiler and planner.
//!
//! Compilation assigns each rule a stable [`RuleId`], validates that every
//! inward rule's output types are enumerable from its right-hand side
//! alone, and derives the lookup tables the execution engine plans with:
//! type to emitting rules, type to adding rules, and output key to rule.
//!
//! Type-existence and cycle checks are deferred to query time, since a
//! legal ruleset may carry rules for types a given run never asks about.

use std::collections::{HashMap, HashSet};

use crate::error::CanopyError;
use crate::facts::Facts;
use crate::rule::{EffectKind, Rule, RuleId};
use crate::tree::TreeDoc;
use crate::CanopyResult;

/// A compiled, immutable ruleset. Bind it to a document root with
/// [`RuleSet::against`] to start answering queries.
pub struct RuleSet<D: TreeDoc> {
    rules: Vec<Rule<D>>,
    /// Per rule, its enumerated output types (empty for pure out rules).
    outputs: Vec<Vec<String>>,
    emitters: HashMap<String, Vec<RuleId>>,
    adders: HashMap<String, Vec<RuleId>>,
    out_keys: HashMap<String, RuleId>,
}

impl<D: TreeDoc> std::fmt::Debug for RuleSet<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("outputs", &self.outputs)
            .field("emitters", &self.emitters)
            .field("adders", &self.adders)
            .field("out_keys", &self.out_keys)
            .finish_non_exhaustive()
    }
}

impl<D: TreeDoc> RuleSet<D> {
    /// Compile an ordered rule sequence. Order among independent rules
    /// touching the same type affects only tie-breaks, never correctness.
    pub fn new(rules: Vec<Rule<D>>) -> CanopyResult<Self> {
        let mut outputs: Vec<Vec<String>> = Vec::with_capacity(rules.len());
        let mut emitters: HashMap<String, Vec<RuleId>> = HashMap::new();
        let mut adders: HashMap<String, Vec<RuleId>> = HashMap::new();
        let mut out_keys: HashMap<String, RuleId> = HashMap::new();

        for (index, rule) in rules.iter().enumerate() {
            let id = RuleId(index);

            if let Some(key) = rule.effect().out_key() {
                if out_keys.insert(key.to_string(), id).is_some() {
                    return Err(CanopyError::DuplicateOutKey(key.to_string()));
                }
            }
            if rule.effect().is_pure_out() {
                outputs.push(Vec::new());
                continue;
            }

            let rule_outputs = output_types(rule, index)?;
            let inputs: HashSet<String> = rule
                .lhs()
                .input_types()
                .into_iter()
                .map(|demand| demand.name)
                .collect();

            for typ in &rule_outputs {
                emitters.entry(typ.clone()).or_default().push(id);
                // A rule adds a type only when it can mint new facts of it,
                // i.e. when the type is not one of its own inputs.
                if !inputs.contains(typ) {
                    adders.entry(typ.clone()).or_default().push(id);
                }
            }
            outputs.push(rule_outputs);
        }

        Ok(Self {
            rules,
            outputs,
            emitters,
            adders,
            out_keys,
        })
    }

    /// The original rule sequence. Recompiling it yields a behaviorally
    /// equal ruleset.
    pub fn rules(&self) -> &[Rule<D>] {
        &self.rules
    }

    /// Rules whose right-hand side could label a node with `typ`, in
    /// declaration order.
    pub fn inward_rules_that_could_emit(&self, typ: &str) -> &[RuleId] {
        self.emitters.get(typ).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rules that could create new facts of `typ` (not merely score or
    /// annotate existing ones), in declaration order.
    pub fn inward_rules_that_could_add(&self, typ: &str) -> &[RuleId] {
        self.adders.get(typ).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn rule(&self, id: RuleId) -> &Rule<D> {
        &self.rules[id.0]
    }

    pub(crate) fn output_types_of(&self, id: RuleId) -> &[String] {
        &self.outputs[id.0]
    }

    pub(crate) fn out_rule(&self, key: &str) -> Option<RuleId> {
        self.out_keys.get(key).copied()
    }

    /// The coefficient lookup handle for a rule: its name, or its 1-based
    /// position for unnamed rules. Also how errors refer to rules.
    pub(crate) fn rule_label(&self, id: RuleId) -> String {
        rule_label(self.rule(id), id.0)
    }

    /// Bind this ruleset to `root` of `doc`, producing an independent fact
    /// store scoped to that subtree.
    pub fn against<'r, 'd>(&'r self, doc: &'d D, root: D::Id) -> Facts<'r, 'd, D> {
        Facts::new(self, doc, root)
    }
}

/// Enumerate a rule's output types from its RHS alone.
fn output_types<D: TreeDoc>(rule: &Rule<D>, index: usize) -> CanopyResult<Vec<String>> {
    match &rule.effect().kind {
        EffectKind::Static { typ: Some(typ), .. } => Ok(vec![typ.clone()]),
        EffectKind::Static { typ: None, .. } => match rule.lhs().single_input_type() {
            Some(inherited) => Ok(vec![inherited.to_string()]),
            None => Err(CanopyError::IndeterminateType {
                rule: rule_label(rule, index),
            }),
        },
        EffectKind::Dynamic { type_in, .. } => {
            if type_in.is_empty() {
                Err(CanopyError::IndeterminateType {
                    rule: rule_label(rule, index),
                })
            } else {
                Ok(type_in.clone())
            }
        }
    }
}

fn rule_label<D: TreeDoc>(rule: &Rule<D>, index: usize) -> String {
    match rule.name() {
        Some(name) => name.to_string(),
        None => format!("rule #{}", index + 1),
    }
}

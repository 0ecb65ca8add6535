//! Query-surface behavior of a bound ruleset.

mod common;

use canopy::{
    dom, sigmoid, typed, CanopyError, Effect, Emission, Fnode, Query, Rule, RuleSet, TreeDoc,
};
use common::{single_div_doc, TestDom};

#[test]
fn scores_untouched_type_matches_at_zero() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![Rule::new(dom("div"), Effect::typed("paragraphish"))]).unwrap();
    let mut facts = rules.against(&doc, doc.root());

    let divs = facts.get(typed("paragraphish")).unwrap();
    assert_eq!(divs.len(), 1);
    let score = facts.score_for(&divs[0], "paragraphish").unwrap();
    assert_eq!(score, sigmoid(0.0));
}

#[test]
fn a_binding_exposes_its_ruleset_document_and_root() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![Rule::new(dom("div"), Effect::typed("paragraphish"))]).unwrap();
    let facts = rules.against(&doc, doc.root());

    assert_eq!(facts.root(), doc.root());
    assert_eq!(facts.ruleset().rules().len(), 1);
    assert!(std::ptr::eq(facts.doc(), &doc));
}

#[test]
fn type_queries_trigger_self_refining_rules() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![
        Rule::new(dom("div"), Effect::typed("paragraphish")),
        Rule::new(typed("paragraphish"), Effect::scored(2.0)),
        Rule::new(typed("paragraphish"), Effect::typed("foo")),
    ])
    .unwrap();
    let mut facts = rules.against(&doc, doc.root());

    let div = facts.get(typed("paragraphish")).unwrap()[0].clone();
    assert_eq!(
        facts.score_for(&div, "paragraphish").unwrap(),
        sigmoid(2.0)
    );

    // max() queries agree:
    let div_max = facts.get(typed("paragraphish").max()).unwrap()[0].clone();
    assert_eq!(
        facts.score_for(&div_max, "paragraphish").unwrap(),
        sigmoid(2.0)
    );

    // and() returns the same fnode as the other queries:
    let div_and = facts
        .get(Query::and(vec![typed("paragraphish"), typed("foo")]))
        .unwrap()[0]
        .clone();
    assert!(Fnode::ptr_eq(&div_and, &div));
    assert!(Fnode::ptr_eq(&div_max, &div));
}

#[test]
fn results_by_out_rule_key() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![
        Rule::new(dom("div"), Effect::typed("paragraphish")),
        Rule::new(typed("paragraphish"), Effect::key("p")),
    ])
    .unwrap();
    let mut facts = rules.against(&doc, doc.root());

    assert_eq!(facts.get_by_key("p").unwrap().len(), 1);
}

#[test]
fn unknown_out_key_is_an_error() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![Rule::new(dom("div"), Effect::typed("paragraphish"))]).unwrap();
    let mut facts = rules.against(&doc, doc.root());

    assert_eq!(
        facts.get_by_key("nope").unwrap_err(),
        CanopyError::UnknownOutKey("nope".to_string())
    );
}

#[test]
fn fnode_for_a_concrete_node_scores_lazily() {
    let doc = single_div_doc();
    let rules = RuleSet::new(vec![
        Rule::new(dom("div"), Effect::typed("paragraphish")),
        Rule::new(
            typed("paragraphish"),
            Effect::scored_with(|doc: &TestDom, node| doc.text(node).len() as f64),
        ),
    ])
    .unwrap();
    let mut facts = rules.against(&doc, doc.root());

    // Realizing the fnode forces nothing:
    let div_node = doc.select(doc.root(), "div")[0];
    let div = facts.fnode_for(div_node);
    assert!(div.types_so_far().is_empty());

    // score_for() triggers rule execution; "Hooooooo" is 8 chars:
    assert_eq!(
        facts.score_for(&div, "paragraphish").unwrap(),
        sigmoid(8.0)
    );
}

#[test]
fn declared_but_never_emitted_types_answer_empty() {
    let mut doc = TestDom::new();
    doc.append(doc.root(), "a");
    let rules = RuleSet::new(vec![Rule::new(
        dom("a"),
        Effect::dynamic(|_: &TestDom, _| Emission::typed("a"), ["a", "b"]),
    )])
    .unwrap();
    let mut facts = rules.against(&doc, doc.root());

    assert!(facts.get(typed("b")).unwrap().is_empty());
    assert_eq!(facts.get(typed("a")).unwrap().len(), 1);
}


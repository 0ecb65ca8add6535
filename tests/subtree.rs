//! Binding a ruleset to an inner node scopes queries to that subtree.

mod common;

use canopy::{dom, typed, Effect, Rule, RuleSet, TreeDoc};
use common::TestDom;

fn weighted_doc() -> TestDom {
    let mut doc = TestDom::new();
    let outer = doc.append(doc.root(), "div");
    doc.set_attr(outer, "id", "outer");
    doc.set_attr(outer, "weight", "10");
    let inner = doc.append(outer, "div");
    doc.set_attr(inner, "id", "inner");
    doc.set_attr(inner, "weight", "5");
    doc
}

fn weighted_rules() -> RuleSet<TestDom> {
    RuleSet::new(vec![
        Rule::new(
            dom("div"),
            Effect::typed("smoo").score_with(|doc: &TestDom, node| {
                doc.attr(node, "weight")
                    .and_then(|w| w.parse().ok())
                    .unwrap_or(0.0)
            }),
        ),
        Rule::new(typed("smoo").max(), Effect::key("best")),
    ])
    .unwrap()
}

#[test]
fn the_full_document_sees_every_candidate() {
    let doc = weighted_doc();
    let rules = weighted_rules();
    let mut facts = rules.against(&doc, doc.root());

    let best = facts.get_by_key("best").unwrap();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].node(), doc.by_id("outer").unwrap());
}

#[test]
fn a_subtree_binding_excludes_its_own_scope_node() {
    let doc = weighted_doc();
    let rules = weighted_rules();
    let mut facts = rules.against(&doc, doc.by_id("outer").unwrap());

    // The scope node itself is not a match, so only the inner div is left.
    let best = facts.get_by_key("best").unwrap();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].node(), doc.by_id("inner").unwrap());
}

#[test]
fn bindings_keep_independent_fact_caches() {
    let doc = weighted_doc();
    let rules = weighted_rules();

    let mut whole = rules.against(&doc, doc.root());
    let smoos = whole.get(typed("smoo")).unwrap();
    assert_eq!(smoos.len(), 2);

    // A second binding starts from scratch rather than inheriting facts.
    let mut scoped = rules.against(&doc, doc.by_id("outer").unwrap());
    let inner = doc.by_id("inner").unwrap();
    assert!(scoped.fnode_for(inner).types_so_far().is_empty());
    let scoped_smoos = scoped.get(typed("smoo")).unwrap();
    assert_eq!(scoped_smoos.len(), 1);
    assert_eq!(scoped_smoos[0].node(), inner);
}

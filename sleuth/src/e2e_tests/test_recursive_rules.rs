//! Test recursive rules over the family relation.

use crate::binding::LAction;
use crate::e2e_tests::helpers::{Family, free, strings, text};
use crate::query::LogicalQuery;

/// Test ancestor membership through the recursive rule.
///
/// Setup:
/// - ancestor(x, z) :- parent(x, z)
/// - ancestor(x, z) :- parent(x, y), ancestor(y, z)
///
/// Expected: ann is an ancestor of eve, eve is not an ancestor of ann
#[test]
fn test_ancestor_membership() {
    let family = Family::new().with_ancestor_rules().expect("rules");

    for (ancestor, descendant, expected) in [
        ("ann", "eve", true),
        ("bob", "dan", true),
        ("cat", "eve", true),
        ("eve", "ann", false),
        ("dan", "cat", false),
    ] {
        let pattern = family
            .ancestor
            .pattern([text(ancestor), text(descendant)])
            .expect("pattern");
        let mut query = LogicalQuery::new().with(LAction::facts(&family.kb, &pattern));
        assert_eq!(
            query.execute().expect("execute"),
            expected,
            "ancestor({ancestor}, {descendant})"
        );
    }
}

/// Test that each rule contributes one solution per generation.
///
/// Query: ancestor("ann", d)
/// Expected: bob from the base rule, then cat from the recursive rule
#[test]
fn test_each_rule_yields_one_solution() {
    let family = Family::new().with_ancestor_rules().expect("rules");
    let descendant = free();
    let pattern = family
        .ancestor
        .pattern([text("ann"), descendant.clone()])
        .expect("pattern");

    let result = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &pattern))
        .collect(&[("descendant", &descendant)])
        .expect("collect");
    assert_eq!(strings(&result, "descendant"), vec!["bob", "cat"]);
    assert_eq!(family.kb.rule_count(family.ancestor.fact_type()), 2);
}

/// Test enumerating every ancestor of eve by driving the descendant side
/// from the stored facts.
///
/// Query: parent(a, _), ancestor(a, "eve")
/// Expected: ann, bob, bob, cat (one row per parent fact of each ancestor)
#[test]
fn test_ancestors_of_eve() {
    let family = Family::new().with_ancestor_rules().expect("rules");
    let a = free();
    let candidate = family.parent.pattern([a.clone(), free()]).expect("pattern");
    let check = family.ancestor.pattern([a.clone(), text("eve")]).expect("pattern");

    let result = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &candidate))
        .with(LAction::facts(&family.kb, &check))
        .collect(&[("a", &a)])
        .expect("collect");
    assert_eq!(strings(&result, "a"), vec!["ann", "bob", "bob", "cat"]);
}

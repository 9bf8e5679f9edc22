//! Test negation-as-failure.

use crate::binding::{BoundValue, LAction};
use crate::e2e_tests::helpers::{Family, free, strings, text};
use crate::query::LogicalQuery;

/// Test leaves of the family tree: children who are nobody's parent.
///
/// Query: parent(_, c), not(parent(c, _))
/// Expected: dan, eve
#[test]
fn test_children_without_children() {
    let family = Family::new();
    let child = free();
    let has_parent = family.parent.pattern([free(), child.clone()]).expect("pattern");
    let grandchild = free();
    let has_child = family
        .parent
        .pattern([child.clone(), grandchild.clone()])
        .expect("pattern");

    let mut query = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &has_parent))
        .not(LogicalQuery::new().with(LAction::facts(&family.kb, &has_child)));

    let result = query.collect(&[("child", &child)]).expect("collect");
    assert_eq!(strings(&result, "child"), vec!["dan", "eve"]);
    assert!(!grandchild.is_bound());
}

/// Test that a provable inner query makes the negation fail without
/// leaving its bindings behind.
#[test]
fn test_negation_of_provable_query() {
    let family = Family::new();
    let child = free();
    let inner = family.parent.pattern([text("ann"), child.clone()]).expect("pattern");

    let mut query = LogicalQuery::new().not(LogicalQuery::new().with(LAction::facts(&family.kb, &inner)));
    assert!(!query.execute().expect("execute"));
    assert!(!child.is_bound());
}

/// Test negation of an unprovable query and of an empty query.
#[test]
fn test_negation_of_unprovable_and_empty_queries() {
    let family = Family::new();
    let inner = family.parent.pattern([text("eve"), free()]).expect("pattern");

    let mut unprovable =
        LogicalQuery::new().not(LogicalQuery::new().with(LAction::facts(&family.kb, &inner)));
    assert!(unprovable.execute().expect("execute"));
    assert!(!unprovable.execute().expect("execute"));

    // An empty query is provable, so its negation is not.
    let mut empty = LogicalQuery::new().not(LogicalQuery::new());
    assert!(!empty.execute().expect("execute"));
}

/// Test that the inner query sees the outer bindings on every pull.
#[test]
fn test_negation_is_re_evaluated_per_outer_solution() {
    let x = BoundValue::<i64>::unbound();
    let handle = x.clone();
    let mut query = LogicalQuery::new()
        .with(LAction::each(&x, 1..=6))
        .not(LogicalQuery::new().with_predicate(move || handle.get().is_some_and(|x| x % 3 == 0)));

    let result = query.collect(&[("x", &x)]).expect("collect");
    let values: Vec<i64> = result.rows.into_iter().filter_map(|row| row[0]).collect();
    assert_eq!(values, vec![1, 2, 4, 5]);
}

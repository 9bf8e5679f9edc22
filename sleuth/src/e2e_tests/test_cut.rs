//! Test cut (committed choice).

use std::cell::Cell;
use std::rc::Rc;

use crate::binding::{BoundValue, LAction};
use crate::e2e_tests::helpers::{Family, free, strings};
use crate::query::LogicalQuery;
use crate::relation::Datum;

/// Test that a failure after the cut never re-tries earlier steps.
///
/// Query: parent(p, c), letter(l), !, fail-counting(c)
/// Expected: `parent` and `letter` are each tried once, the counting step
/// is tried once per attempt it holds, and the query fails
#[test]
fn test_cut_commits() {
    let family = Family::new();
    let pair = family.parent.unbound_pattern();
    let letter = BoundValue::<char>::unbound();

    let parent_successes = Rc::new(Cell::new(0));
    let letter_successes = Rc::new(Cell::new(0));
    let tail_attempts = Rc::new(Cell::new(0));

    let mut query = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &pair))
        .with_predicate({
            let counter = Rc::clone(&parent_successes);
            move || {
                counter.set(counter.get() + 1);
                true
            }
        })
        .with(LAction::each(&letter, ['a', 'b']))
        .with_predicate({
            let counter = Rc::clone(&letter_successes);
            move || {
                counter.set(counter.get() + 1);
                true
            }
        })
        .cut()
        .with(LAction::each(&BoundValue::<u8>::unbound(), [1, 2, 3]))
        .with_predicate({
            let counter = Rc::clone(&tail_attempts);
            move || {
                counter.set(counter.get() + 1);
                false
            }
        });

    assert!(!query.execute().expect("execute"));
    assert_eq!(parent_successes.get(), 1);
    assert_eq!(letter_successes.get(), 1);
    assert_eq!(tail_attempts.get(), 3);
    assert!(pair.cells().iter().all(|cell| !cell.is_bound()));
    assert!(!letter.is_bound());
}

/// Test "first child of bob" using a cut.
///
/// Expected: exactly one solution, cat
#[test]
fn test_cut_takes_first_solution() {
    let family = Family::new();
    let child = free();
    let pattern = family
        .parent
        .pattern([BoundValue::bound(Datum::from("bob")), child.clone()])
        .expect("pattern");

    let mut query = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &pattern))
        .cut();

    let result = query.collect(&[("child", &child)]).expect("collect");
    assert_eq!(strings(&result, "child"), vec!["cat"]);
}

/// Test that a cut inside a scoped sub-query only commits that sub-query.
///
/// Query: parent(p, _), scope(parent(p, c), !)
/// Expected: one row per parent fact, each with that parent's first child
#[test]
fn test_cut_inside_scope_is_local() {
    let family = Family::new();
    let (p, c) = (free(), free());
    let outer = family.parent.pattern([p.clone(), free()]).expect("pattern");
    let inner = family.parent.pattern([p.clone(), c.clone()]).expect("pattern");

    let mut query = LogicalQuery::new()
        .with(LAction::facts(&family.kb, &outer))
        .scope(
            LogicalQuery::new()
                .with(LAction::facts(&family.kb, &inner))
                .cut(),
        );

    let result = query.collect(&[("p", &p), ("c", &c)]).expect("collect");
    assert_eq!(strings(&result, "p"), vec!["ann", "bob", "bob", "cat"]);
    assert_eq!(strings(&result, "c"), vec!["bob", "cat", "cat", "eve"]);
}

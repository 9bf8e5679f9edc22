//! Test rules concluded by running a body query.

use crate::binding::{BoundValue, LAction};
use crate::query::LogicalQuery;
use crate::testing::{AdultPattern, Person, PersonPattern, adult_rule, people};

/// Test the `Adult` rule for a bound person.
///
/// Setup:
/// - Person("Alice", 30), Person("Bob", 25)
/// - Adult(p) :- Person(p, age), age >= 18
///
/// Query: Adult("Bob")
/// Expected: the body binds age to 25 internally and the query succeeds once
#[test]
fn test_adult_rule_for_bob() {
    let kb = people();
    kb.assert_rule(adult_rule()).expect("assert rule");

    let seen_age = BoundValue::<u32>::unbound();
    let handle = seen_age.clone();
    let observer = PersonPattern::new(BoundValue::bound("Bob".to_owned()), handle);

    let sample = AdultPattern::named("Bob");
    let mut query = LogicalQuery::new()
        .with(LAction::facts(&kb, &sample))
        .with(LAction::facts(&kb, &observer));

    assert!(query.execute().expect("execute"));
    assert_eq!(seen_age.get(), Some(25));
    assert!(!query.execute().expect("execute"));
}

/// Test that the rule fails for a minor and for an unknown person.
#[test]
fn test_adult_rule_rejects_minor_and_unknown() {
    let kb = people();
    assert!(kb.assert_fact(Person::new("Tim", 12)).expect("assert"));
    kb.assert_rule(adult_rule()).expect("assert rule");

    for name in ["Tim", "Zed"] {
        let sample = AdultPattern::named(name);
        let mut query = LogicalQuery::new().with(LAction::facts(&kb, &sample));
        assert!(!query.execute().expect("execute"), "{name} is not an adult");
    }
}

/// Test that a rule binds the caller's free cells from its head.
///
/// Query: Adult(p)
/// Expected: one solution per rule per generation, binding p to the first
/// adult found
#[test]
fn test_adult_rule_binds_free_head() {
    let kb = people();
    kb.assert_rule(adult_rule()).expect("assert rule");

    let sample = AdultPattern::unbound();
    let mut query = LogicalQuery::new().with(LAction::facts(&kb, &sample));

    assert!(query.execute().expect("execute"));
    assert_eq!(sample.person.get().as_deref(), Some("Alice"));
    assert!(!query.execute().expect("execute"));
    assert!(!sample.person.is_bound());
}

/// Test that stored facts are tried before rules.
#[test]
fn test_facts_before_rules() {
    let kb = people();
    kb.assert_rule(adult_rule()).expect("assert rule");
    assert!(kb
        .assert_fact(crate::testing::Adult {
            person: crate::binding::Value::new("Zoe".to_owned()),
        })
        .expect("assert adult"));

    let sample = AdultPattern::unbound();
    let result = LogicalQuery::new()
        .with(LAction::facts(&kb, &sample))
        .collect(&[("person", &sample.person)])
        .expect("collect");
    assert_eq!(
        result.rows,
        vec![vec![Some("Zoe".to_owned())], vec![Some("Alice".to_owned())]]
    );
}

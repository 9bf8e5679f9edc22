//! Family-tree walkthrough of the sleuth engine.
//!
//! Loads configuration from the environment, builds a small knowledge base
//! and logs the answers to a few queries. Set `RUST_LOG=sleuth=trace` to see
//! the search itself.

use sleuth::{BoundValue, Datum, KnowledgeBase, KnowledgeBaseConfig, LAction, LogicError, LogicalQuery, Relation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PARENTS: [(&str, &str); 5] = [
    ("abe", "homer"),
    ("homer", "bart"),
    ("homer", "lisa"),
    ("homer", "maggie"),
    ("bart", "rod"),
];

struct Family {
    kb: KnowledgeBase,
    parent: Relation,
    ancestor: Relation,
    sibling: Relation,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "sleuth=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match KnowledgeBaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: indexing={}, max_rule_depth={}",
        config.indexing,
        config.max_rule_depth
    );

    if let Err(e) = run(config) {
        tracing::error!("Query failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: KnowledgeBaseConfig) -> Result<(), LogicError> {
    let family = build_family(KnowledgeBase::with_config(config))?;
    let Family {
        kb,
        parent,
        ancestor,
        sibling,
    } = &family;

    // parent(homer, child)
    let child = BoundValue::unbound();
    let mut query = LogicalQuery::new().with(LAction::facts(kb, &parent.pattern([text("homer"), child.clone()])?));
    let result = query.collect(&[("child", &child)])?;
    tracing::info!("children of homer:\n{result}");

    // A rule contributes only its first solution per lookup, so rule
    // queries are asked as yes/no membership checks.
    for (older, younger) in [("abe", "rod"), ("lisa", "rod")] {
        let mut query =
            LogicalQuery::new().with(LAction::facts(kb, &ancestor.pattern([text(older), text(younger)])?));
        let proved = query.execute()?;
        query.reset();
        tracing::info!("ancestor({older}, {younger}): {proved}");
    }

    for (a, b) in [("lisa", "maggie"), ("lisa", "rod")] {
        let mut query = LogicalQuery::new().with(LAction::facts(kb, &sibling.pattern([text(a), text(b)])?));
        let proved = query.execute()?;
        query.reset();
        tracing::info!("sibling({a}, {b}): {proved}");
    }

    // parent(_, leaf), not parent(leaf, _)
    let leaf = BoundValue::unbound();
    let mut query = LogicalQuery::new()
        .with(LAction::facts(kb, &parent.pattern([free(), leaf.clone()])?))
        .not(LogicalQuery::new().with(LAction::facts(kb, &parent.pattern([leaf.clone(), free()])?)));
    let result = query.collect(&[("leaf", &leaf)])?;
    tracing::info!("people without children:\n{result}");

    // parent(homer, first), !
    let first = BoundValue::unbound();
    let mut query = LogicalQuery::new()
        .with(LAction::facts(kb, &parent.pattern([text("homer"), first.clone()])?))
        .cut();
    let result = query.collect(&[("first", &first)])?;
    tracing::info!("first child of homer:\n{result}");

    // parent(abe, x) ; parent(bart, x)
    let x = BoundValue::unbound();
    let mut query = LogicalQuery::new()
        .with(LAction::facts(kb, &parent.pattern([text("abe"), x.clone()])?))
        .or_with(LAction::facts(kb, &parent.pattern([text("bart"), x.clone()])?))?;
    let result = query.collect(&[("x", &x)])?;
    tracing::info!("children of abe or bart:\n{result}");

    tracing::debug!("{kb:?}");
    Ok(())
}

fn build_family(kb: KnowledgeBase) -> Result<Family, LogicError> {
    let parent = Relation::builder("parent").attribute("parent").attribute("child").build();
    let ancestor = Relation::builder("ancestor")
        .attribute("ancestor")
        .attribute("descendant")
        .build();
    let sibling = Relation::builder("sibling").attribute("a").attribute("b").build();

    for (p, c) in PARENTS {
        kb.assert_fact(parent.fact([p, c])?)?;
    }

    // ancestor(x, z) :- parent(x, z).
    let base = parent.clone();
    kb.assert_rule(
        ancestor
            .rule(move |head, kb| {
                let step = base.pattern(head.cells().iter().cloned())?;
                Ok(LogicalQuery::new().with(LAction::facts(kb, &step)))
            })
            .named("ancestor-base"),
    )?;

    // ancestor(x, z) :- parent(x, y), ancestor(y, z).
    let (step_parent, step_ancestor) = (parent.clone(), ancestor.clone());
    kb.assert_rule(
        ancestor
            .rule(move |head, kb| {
                let (x, z) = pair(head.cells(), &step_ancestor)?;
                let y = free();
                Ok(LogicalQuery::new()
                    .with(LAction::facts(kb, &step_parent.pattern([x, y.clone()])?))
                    .with(LAction::facts(kb, &step_ancestor.pattern([y, z])?)))
            })
            .named("ancestor-step"),
    )?;

    // sibling(a, b) :- parent(p, a), parent(p, b), a != b.
    let (sibling_parent, sibling_relation) = (parent.clone(), sibling.clone());
    kb.assert_rule(
        sibling
            .rule(move |head, kb| {
                let (a, b) = pair(head.cells(), &sibling_relation)?;
                let p = free();
                let (left, right) = (a.clone(), b.clone());
                Ok(LogicalQuery::new()
                    .with(LAction::facts(kb, &sibling_parent.pattern([p.clone(), a])?))
                    .with(LAction::facts(kb, &sibling_parent.pattern([p, b])?))
                    .with_predicate(move || left.get() != right.get()))
            })
            .named("sibling"),
    )?;

    Ok(Family {
        kb,
        parent,
        ancestor,
        sibling,
    })
}

fn pair(
    cells: &[BoundValue<Datum>],
    relation: &Relation,
) -> Result<(BoundValue<Datum>, BoundValue<Datum>), LogicError> {
    match cells {
        [first, second] => Ok((first.clone(), second.clone())),
        _ => Err(LogicError::ArityMismatch {
            fact_type: relation.fact_type().clone(),
            expected: 2,
            found: cells.len(),
        }),
    }
}

fn text(value: &str) -> BoundValue<Datum> {
    BoundValue::bound(Datum::from(value))
}

fn free() -> BoundValue<Datum> {
    BoundValue::unbound()
}

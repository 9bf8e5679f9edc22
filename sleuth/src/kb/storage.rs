//! Indexed fact storage.
//!
//! Each fact type owns one `FactStorage`:
//! - `facts` - every fact, in insertion order
//! - `exact` - membership set for fully bound lookups
//! - `clusters` - per hashable attribute, facts grouped by value hash
//!
//! `filtered_by_sample` never produces false negatives. Every path except the
//! exact-match one may return facts that do not match; callers re-check each
//! candidate with `Pattern::matches`.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::adapter::{Fact, FactType, Pattern};
use crate::error::{LogicError, ensure_same_type};

/// Facts sharing one attribute's hash, in insertion order.
#[derive(Debug)]
pub struct Cluster<F> {
    facts: Vec<Rc<F>>,
}

impl<F> Default for Cluster<F> {
    fn default() -> Self {
        Self { facts: Vec::new() }
    }
}

impl<F> Cluster<F> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.facts.iter().map(AsRef::as_ref)
    }
}

/// How a candidate set was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The fully bound sample was found in the exact-match set.
    Exact,
    /// The smallest cluster among the sample's bound hashable attributes.
    Cluster { attribute: usize, size: usize },
    /// A linear scan filtered by the sample.
    Scan { scanned: usize },
}

/// Candidate facts for a sample.
#[derive(Debug)]
pub struct Candidates<F> {
    strategy: Lookup,
    facts: Vec<Rc<F>>,
}

impl<F> Candidates<F> {
    #[must_use]
    pub const fn strategy(&self) -> Lookup {
        self.strategy
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.facts.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn into_facts(self) -> Vec<Rc<F>> {
        self.facts
    }
}

/// Storage for the facts of one type.
#[derive(Debug)]
pub struct FactStorage<F> {
    fact_type: FactType,
    facts: Vec<Rc<F>>,
    exact: HashSet<Rc<F>>,
    /// One index per hashable attribute, keyed by attribute position.
    clusters: Vec<(usize, HashMap<u64, Cluster<F>>)>,
}

impl<F: Fact> FactStorage<F> {
    /// Create an empty storage clustering on `hashable` attribute positions.
    #[must_use]
    pub fn new(fact_type: FactType, mut hashable: Vec<usize>) -> Self {
        hashable.sort_unstable();
        hashable.dedup();
        Self {
            fact_type,
            facts: Vec::new(),
            exact: HashSet::new(),
            clusters: hashable.into_iter().map(|attribute| (attribute, HashMap::new())).collect(),
        }
    }

    #[must_use]
    pub const fn fact_type(&self) -> &FactType {
        &self.fact_type
    }

    /// Attribute positions this storage clusters on.
    #[must_use]
    pub fn hashable_attributes(&self) -> Vec<usize> {
        self.clusters.iter().map(|(attribute, _)| *attribute).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    #[must_use]
    pub fn contains(&self, fact: &F) -> bool {
        self.exact.contains(fact)
    }

    /// All facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.facts.iter().map(AsRef::as_ref)
    }

    /// The cluster for `key` on `attribute`, if any fact produced that key.
    #[must_use]
    pub fn cluster(&self, attribute: usize, key: u64) -> Option<&Cluster<F>> {
        self.clusters
            .iter()
            .find(|(position, _)| *position == attribute)
            .and_then(|(_, index)| index.get(&key))
    }

    /// Store a fact.
    ///
    /// Returns `Ok(false)` without storing anything if an equal fact is
    /// already present.
    pub fn add(&mut self, fact: F) -> Result<bool, LogicError> {
        ensure_same_type(&self.fact_type, &fact.fact_type())?;
        if self.exact.contains(&fact) {
            return Ok(false);
        }

        let fact = Rc::new(fact);
        for (attribute, index) in &mut self.clusters {
            index
                .entry(fact.attribute_hash(*attribute))
                .or_default()
                .facts
                .push(Rc::clone(&fact));
        }
        self.exact.insert(Rc::clone(&fact));
        self.facts.push(fact);
        Ok(true)
    }

    /// Candidate facts for `sample`: a superset of the facts it matches.
    pub fn filtered_by_sample<P>(&self, sample: &P) -> Result<Candidates<F>, LogicError>
    where
        P: Pattern<Fact = F>,
    {
        ensure_same_type(&self.fact_type, &sample.fact_type())?;
        if self.clusters.is_empty() {
            return self.scan(sample);
        }

        if let Some(found) = sample.to_fact().and_then(|fact| self.exact.get(&fact)) {
            return Ok(Candidates {
                strategy: Lookup::Exact,
                facts: vec![Rc::clone(found)],
            });
        }

        let mut smallest: Option<(usize, &Cluster<F>)> = None;
        for (attribute, index) in &self.clusters {
            let Some(key) = sample.attribute_hash(*attribute) else {
                continue;
            };
            let Some(cluster) = index.get(&key) else {
                // No fact has this value, so nothing can match.
                return Ok(Candidates {
                    strategy: Lookup::Cluster {
                        attribute: *attribute,
                        size: 0,
                    },
                    facts: Vec::new(),
                });
            };
            if smallest.is_none_or(|(_, best)| cluster.len() < best.len()) {
                smallest = Some((*attribute, cluster));
            }
        }

        match smallest {
            Some((attribute, cluster)) => Ok(Candidates {
                strategy: Lookup::Cluster {
                    attribute,
                    size: cluster.len(),
                },
                facts: cluster.facts.clone(),
            }),
            None => self.scan(sample),
        }
    }

    fn scan<P>(&self, sample: &P) -> Result<Candidates<F>, LogicError>
    where
        P: Pattern<Fact = F>,
    {
        let mut facts = Vec::new();
        for fact in &self.facts {
            if sample.matches(fact)? {
                facts.push(Rc::clone(fact));
            }
        }
        Ok(Candidates {
            strategy: Lookup::Scan {
                scanned: self.facts.len(),
            },
            facts,
        })
    }
}

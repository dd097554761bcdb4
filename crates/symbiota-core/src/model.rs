//! # Fact Model
//!
//! Normalized representation of one metabolic interaction instance.
//!
//! A `FactModel` is an ordered, duplicate-free set of facts. It is built by the
//! instance builder, optionally persisted, augmented with seeds and targets,
//! and finally moved into grounding. Once moved it can no longer be changed.

use std::collections::BTreeSet;

use crate::primitives::predicates;
use crate::types::{Fact, SymbiotaError};

/// An ordered set of facts describing one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactModel {
    facts: BTreeSet<Fact>,
}

impl FactModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one fact. Returns false if it was already present.
    pub fn insert(&mut self, fact: Fact) -> bool {
        self.facts.insert(fact)
    }

    /// Merge a batch of facts, as produced by one organism reader.
    pub fn merge(&mut self, facts: impl IntoIterator<Item = Fact>) {
        self.facts.extend(facts);
    }

    /// Add seed and target facts. Augmentation only ever adds.
    pub fn augment(&mut self, seeds: &[Fact], targets: &[Fact]) {
        self.facts.extend(seeds.iter().cloned());
        self.facts.extend(targets.iter().cloned());
    }

    /// Add a `target_species` fact for every focused organism.
    pub fn add_focus<'a>(&mut self, organisms: impl IntoIterator<Item = &'a str>) {
        for org in organisms {
            self.facts.insert(Fact::target_species(org));
        }
    }

    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate facts in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Facts with the given predicate and arity.
    pub fn with_predicate<'a>(
        &'a self,
        predicate: &'a str,
        arity: usize,
    ) -> impl Iterator<Item = &'a Fact> + 'a {
        self.facts.iter().filter(move |f| f.is(predicate, arity))
    }

    fn first_args(&self, predicate: &str, arity: usize) -> BTreeSet<String> {
        self.with_predicate(predicate, arity)
            .filter_map(|f| f.arg(0))
            .collect()
    }

    /// True if a host organism is marked with `draft`.
    #[must_use]
    pub fn has_draft(&self) -> bool {
        self.with_predicate(predicates::DRAFT, 1).next().is_some()
    }

    /// Name of the host organism, if any.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        self.with_predicate(predicates::DRAFT, 1)
            .next()
            .and_then(|f| f.arg(0))
    }

    /// Candidate community members.
    #[must_use]
    pub fn bacteria(&self) -> BTreeSet<String> {
        self.first_args(predicates::BACTERIA, 1)
    }

    /// Every organism that owns at least one reaction.
    #[must_use]
    pub fn organisms(&self) -> BTreeSet<String> {
        self.with_predicate(predicates::REACTION, 2)
            .filter_map(|f| f.arg(1))
            .collect()
    }

    #[must_use]
    pub fn seeds(&self) -> BTreeSet<String> {
        self.first_args(predicates::SEED, 1)
    }

    #[must_use]
    pub fn targets(&self) -> BTreeSet<String> {
        self.first_args(predicates::TARGET, 1)
    }

    /// Organisms marked for focus queries.
    #[must_use]
    pub fn focused(&self) -> BTreeSet<String> {
        self.first_args(predicates::TARGET_SPECIES, 1)
    }

    /// Check structural invariants.
    ///
    /// - Every `reactant`/`product` references a declared `(reaction, organism)`
    /// - At most one `draft` fact exists
    ///
    /// Returns a human-readable reason on violation.
    pub fn check(&self) -> Result<(), String> {
        let reactions: BTreeSet<(String, String)> = self
            .with_predicate(predicates::REACTION, 2)
            .filter_map(|f| Some((f.arg(0)?, f.arg(1)?)))
            .collect();

        for pred in [predicates::REACTANT, predicates::PRODUCT] {
            for fact in self.with_predicate(pred, 3) {
                let key = (fact.arg(1).unwrap_or_default(), fact.arg(2).unwrap_or_default());
                if !reactions.contains(&key) {
                    return Err(format!("{fact} references undeclared reaction"));
                }
            }
        }

        let drafts = self.with_predicate(predicates::DRAFT, 1).count();
        if drafts > 1 {
            return Err(format!("{drafts} draft facts, at most one host is allowed"));
        }

        Ok(())
    }

    /// Validate invariants, reporting violations as `MalformedInput` against `origin`.
    pub fn validate(&self, origin: &std::path::Path) -> Result<(), SymbiotaError> {
        self.check()
            .map_err(|reason| SymbiotaError::malformed(origin, reason))
    }
}

impl FromIterator<Fact> for FactModel {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FactModel {
    type Item = &'a Fact;
    type IntoIter = std::collections::btree_set::Iter<'a, Fact>;

    fn into_iter(self) -> Self::IntoIter {
        self.facts.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> FactModel {
        [
            Fact::reaction("R1", "orgA"),
            Fact::reactant("a", "R1", "orgA"),
            Fact::product("b", "R1", "orgA"),
            Fact::bacteria("orgA"),
            Fact::seed("a"),
            Fact::target("b"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn queries_report_roles() {
        let model = small_model();
        assert!(!model.has_draft());
        assert_eq!(model.host(), None);
        assert_eq!(model.bacteria().into_iter().collect::<Vec<_>>(), vec!["orgA"]);
        assert_eq!(model.organisms().len(), 1);
        assert!(model.seeds().contains("a"));
        assert!(model.targets().contains("b"));
    }

    #[test]
    fn merge_is_duplicate_free() {
        let mut model = small_model();
        let before = model.len();
        model.merge(vec![Fact::seed("a"), Fact::seed("a")]);
        assert_eq!(model.len(), before);
    }

    #[test]
    fn augment_only_adds() {
        let mut model = small_model();
        let before = model.clone();
        model.augment(&[Fact::seed("z")], &[Fact::target("y")]);
        assert!(before.iter().all(|f| model.contains(f)));
        assert!(model.seeds().contains("z"));
        assert!(model.targets().contains("y"));
    }

    #[test]
    fn dangling_reactant_is_rejected() {
        let mut model = small_model();
        model.insert(Fact::reactant("a", "R9", "orgA"));
        assert!(model.check().is_err());
    }

    #[test]
    fn two_drafts_are_rejected() {
        let mut model = small_model();
        model.insert(Fact::draft("h1"));
        assert!(model.check().is_ok());
        model.insert(Fact::draft("h2"));
        assert!(model.check().is_err());
    }

    #[test]
    fn focus_adds_target_species() {
        let mut model = small_model();
        model.add_focus(["orgA"]);
        assert!(model.contains(&Fact::target_species("orgA")));
        assert_eq!(model.focused().len(), 1);
    }
}

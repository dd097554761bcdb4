//! # Result Extractor
//!
//! Classifies the flat facts of an [`Answer`] into query-specific views.
//!
//! Decoding is closed: every recognised `(predicate, arity)` shape has one
//! [`AnswerAtom`] variant and anything else is [`AnswerAtom::Unrecognized`]
//! and ignored. Extraction is total and does not depend on fact order.

use std::collections::BTreeMap;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::primitives::predicates;
use crate::solver::{Answer, Optimum};
use crate::types::Fact;

// =============================================================================
// DECODE
// =============================================================================

/// One decoded answer fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerAtom {
    ChosenBacteria(String),
    Exchanged {
        metabolite: String,
        compartment: String,
        from: String,
        to: String,
    },
    NewlyProducibleTarget(String),
    UnproducibleTarget(String),
    ProducibleTarget(String),
    SelectedProducer { organism: String, target: String },

    HostScope(String),
    HostProducible(String),
    HostUnproducible(String),
    CommunityScope(String),
    CommunityScopeWithHost(String),
    CommunityProducible(String),
    CommunityUnproducible(String),
    InitialProducer { organism: String, target: String },

    ProducedAlone { metabolite: String, organism: String },
    ProducedInCommunity { metabolite: String, organism: String },

    DeadendNoProducer(String),
    DeadendNoConsumer(String),

    Unrecognized,
}

impl AnswerAtom {
    /// Decode one fact by predicate name and arity.
    #[must_use]
    pub fn decode(fact: &Fact) -> Self {
        let a = |i: usize| fact.arg(i).unwrap_or_default();
        match (fact.predicate.as_str(), fact.arity()) {
            (predicates::CHOSEN_BACTERIA, 1) => Self::ChosenBacteria(a(0)),
            (predicates::EXCHANGED, 4) => Self::Exchanged {
                metabolite: a(0),
                compartment: a(1),
                from: a(2),
                to: a(3),
            },
            (predicates::NEWLY_PRODUCIBLE_TARGET, 1) => Self::NewlyProducibleTarget(a(0)),
            (predicates::UNPRODUCIBLE_TARGET, 1) => Self::UnproducibleTarget(a(0)),
            (predicates::PRODUCIBLE_TARGET, 1) => Self::ProducibleTarget(a(0)),
            (predicates::TARGET_PRODUCER_SELECTED, 2) => Self::SelectedProducer {
                organism: a(0),
                target: a(1),
            },
            (predicates::DSCOPE, 1) => Self::HostScope(a(0)),
            (predicates::DPRODUCIBLE, 1) => Self::HostProducible(a(0)),
            (predicates::DUNPRODUCIBLE, 1) => Self::HostUnproducible(a(0)),
            (predicates::NEWSCOPE_MICROBIOME, 1) => Self::CommunityScope(a(0)),
            (predicates::NEWSCOPE_WITH_HOST, 1) => Self::CommunityScopeWithHost(a(0)),
            (predicates::NEWLYPRODUCIBLE, 1) => Self::CommunityProducible(a(0)),
            (predicates::AUNPRODUCIBLE, 1) => Self::CommunityUnproducible(a(0)),
            (predicates::TARGET_PRODUCER_INITIAL, 2) => Self::InitialProducer {
                organism: a(0),
                target: a(1),
            },
            (predicates::IPRODUCED, 2) => Self::ProducedAlone {
                metabolite: a(0),
                organism: a(1),
            },
            (predicates::CPRODUCED, 2) => Self::ProducedInCommunity {
                metabolite: a(0),
                organism: a(1),
            },
            (predicates::DEADEND_NP, 1) => Self::DeadendNoProducer(a(0)),
            (predicates::DEADEND_NC, 1) => Self::DeadendNoConsumer(a(0)),
            _ => Self::Unrecognized,
        }
    }
}

// =============================================================================
// GROUPINGS
// =============================================================================

/// Exchanged metabolites keyed by ordered `(from, to)` organism pair.
///
/// Serializes as `[{"from": .., "to": .., "what": [..]}]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeMap {
    pairs: BTreeMap<(String, String), Vec<String>>,
}

impl ExchangeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `what` to the `(from, to)` entry.
    pub fn insert(&mut self, from: &str, to: &str, what: &str) {
        self.pairs
            .entry((from.to_string(), to.to_string()))
            .or_default()
            .push(what.to_string());
    }

    #[must_use]
    pub fn get(&self, from: &str, to: &str) -> Option<&[String]> {
        self.pairs
            .get(&(from.to_string(), to.to_string()))
            .map(Vec::as_slice)
    }

    /// Number of `(from, to)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of exchanged metabolites over all pairs.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.pairs
            .iter()
            .map(|((from, to), what)| (from.as_str(), to.as_str(), what.as_slice()))
    }
}

#[derive(Serialize)]
struct ExchangeEntry<'a> {
    from: &'a str,
    to: &'a str,
    what: &'a [String],
}

impl Serialize for ExchangeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.pairs.len()))?;
        for (from, to, what) in self.iter() {
            seq.serialize_element(&ExchangeEntry { from, to, what })?;
        }
        seq.end()
    }
}

/// Organisms grouped by the key they relate to (a target, or a focused organism).
pub type GroupedNames = BTreeMap<String, Vec<String>>;

fn group(map: &mut GroupedNames, key: String, value: String) {
    map.entry(key).or_default().push(value);
}

// =============================================================================
// VIEWS
// =============================================================================

/// A query family's reading of an answer.
pub trait ResultView: Sized {
    fn from_answer(answer: &Answer) -> Self;
}

/// Classify `answer` under the vocabulary of the view `V`.
#[must_use]
pub fn extract<V: ResultView>(answer: &Answer) -> V {
    V::from_answer(answer)
}

/// Community selection answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MincomView {
    pub bacteria: Vec<String>,
    pub exchanged: ExchangeMap,
    pub newly_producible: Vec<String>,
    pub unproducible: Vec<String>,
    pub producible: Vec<String>,
    /// Target -> producing members of the selected community.
    pub target_producers: GroupedNames,
    pub costs: Optimum,
}

impl ResultView for MincomView {
    fn from_answer(answer: &Answer) -> Self {
        let mut view = Self {
            costs: answer.costs.clone(),
            ..Self::default()
        };
        for atom in answer.facts.iter().map(AnswerAtom::decode) {
            match atom {
                AnswerAtom::ChosenBacteria(org) => view.bacteria.push(org),
                AnswerAtom::Exchanged { metabolite, from, to, .. } => {
                    view.exchanged.insert(&from, &to, &metabolite);
                }
                AnswerAtom::NewlyProducibleTarget(m) => view.newly_producible.push(m),
                AnswerAtom::UnproducibleTarget(m) => view.unproducible.push(m),
                AnswerAtom::ProducibleTarget(m) => view.producible.push(m),
                AnswerAtom::SelectedProducer { organism, target } => {
                    group(&mut view.target_producers, target, organism);
                }
                _ => {}
            }
        }
        view
    }
}

/// Host-alone versus community scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopesView {
    pub host_scope: Vec<String>,
    pub host_producible: Vec<String>,
    pub host_unproducible: Vec<String>,
    pub community_scope: Vec<String>,
    pub community_scope_with_host: Vec<String>,
    pub community_producible: Vec<String>,
    pub community_unproducible: Vec<String>,
    /// Target -> organisms able to produce it in the full community.
    pub target_producers: GroupedNames,
}

impl ResultView for ScopesView {
    fn from_answer(answer: &Answer) -> Self {
        let mut view = Self::default();
        for atom in answer.facts.iter().map(AnswerAtom::decode) {
            match atom {
                AnswerAtom::HostScope(m) => view.host_scope.push(m),
                AnswerAtom::HostProducible(m) => view.host_producible.push(m),
                AnswerAtom::HostUnproducible(m) => view.host_unproducible.push(m),
                AnswerAtom::CommunityScope(m) => view.community_scope.push(m),
                AnswerAtom::CommunityScopeWithHost(m) => view.community_scope_with_host.push(m),
                AnswerAtom::CommunityProducible(m) => view.community_producible.push(m),
                AnswerAtom::CommunityUnproducible(m) => view.community_unproducible.push(m),
                AnswerAtom::InitialProducer { organism, target } => {
                    group(&mut view.target_producers, target, organism);
                }
                _ => {}
            }
        }
        view
    }
}

/// What focused organisms make alone and inside the community.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusView {
    /// Organism -> metabolites it makes from the seeds alone.
    pub alone: GroupedNames,
    /// Organism -> metabolites it makes within the community.
    pub in_community: GroupedNames,
}

impl ResultView for FocusView {
    fn from_answer(answer: &Answer) -> Self {
        let mut view = Self::default();
        for atom in answer.facts.iter().map(AnswerAtom::decode) {
            match atom {
                AnswerAtom::ProducedAlone { metabolite, organism } => {
                    group(&mut view.alone, organism, metabolite);
                }
                AnswerAtom::ProducedInCommunity { metabolite, organism } => {
                    group(&mut view.in_community, organism, metabolite);
                }
                _ => {}
            }
        }
        view
    }
}

impl FocusView {
    #[must_use]
    pub fn produced_alone(&self, organism: &str) -> &[String] {
        self.alone.get(organism).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn produced_in_community(&self, organism: &str) -> &[String] {
        self.in_community.get(organism).map(Vec::as_slice).unwrap_or_default()
    }

    /// Made in the community but not alone.
    #[must_use]
    pub fn gain(&self, organism: &str) -> Vec<String> {
        let alone = self.produced_alone(organism);
        self.produced_in_community(organism)
            .iter()
            .filter(|m| !alone.contains(m))
            .cloned()
            .collect()
    }
}

/// Metabolites lacking a producer or a consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadendsView {
    pub no_producer: Vec<String>,
    pub no_consumer: Vec<String>,
}

impl ResultView for DeadendsView {
    fn from_answer(answer: &Answer) -> Self {
        let mut view = Self::default();
        for atom in answer.facts.iter().map(AnswerAtom::decode) {
            match atom {
                AnswerAtom::DeadendNoProducer(m) => view.no_producer.push(m),
                AnswerAtom::DeadendNoConsumer(m) => view.no_consumer.push(m),
                _ => {}
            }
        }
        view
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Term;

    fn answer(facts: Vec<Fact>) -> Answer {
        Answer::new(facts.into_iter().collect(), Optimum::new(vec![1, 2]))
    }

    #[test]
    fn decode_matches_predicate_and_arity() {
        let chosen = Fact::quoted("chosen_bacteria", &["orgB3"]);
        assert_eq!(
            AnswerAtom::decode(&chosen),
            AnswerAtom::ChosenBacteria("orgB3".into())
        );
        let wrong_arity = Fact::quoted("chosen_bacteria", &["orgB3", "x"]);
        assert_eq!(AnswerAtom::decode(&wrong_arity), AnswerAtom::Unrecognized);
        let unknown = Fact::new("helper", vec![Term::Number(3)]);
        assert_eq!(AnswerAtom::decode(&unknown), AnswerAtom::Unrecognized);
    }

    #[test]
    fn mincom_view_groups_exchanges_and_producers() {
        let view = MincomView::from_answer(&answer(vec![
            Fact::quoted("chosen_bacteria", &["b1"]),
            Fact::quoted("chosen_bacteria", &["b2"]),
            Fact::quoted("exchanged", &["e", "c", "b1", "h"]),
            Fact::quoted("exchanged", &["g", "c", "b1", "h"]),
            Fact::quoted("exchanged", &["k", "-", "b2", "b1"]),
            Fact::quoted("newly_producible_target", &["f"]),
            Fact::quoted("unproducible_target", &["z"]),
            Fact::quoted("target_producer_coop_selectedcom", &["h", "f"]),
            Fact::quoted("target_producer_coop_selectedcom", &["b2", "f"]),
            Fact::quoted("dscope", &["ignored"]),
        ]));
        assert_eq!(view.bacteria, vec!["b1", "b2"]);
        assert_eq!(view.exchanged.len(), 2);
        assert_eq!(view.exchanged.exchange_count(), 3);
        assert_eq!(
            view.exchanged.get("b1", "h"),
            Some(&["e".to_string(), "g".to_string()][..])
        );
        assert_eq!(view.newly_producible, vec!["f"]);
        assert_eq!(view.unproducible, vec!["z"]);
        assert!(view.producible.is_empty());
        assert_eq!(view.target_producers["f"], vec!["b2", "h"]);
        assert_eq!(view.costs, Optimum::new(vec![1, 2]));
    }

    #[test]
    fn exchange_map_serializes_as_triples() {
        let mut map = ExchangeMap::new();
        map.insert("b1", "h", "e");
        map.insert("b1", "h", "g");
        let json = serde_json::to_value(&map).expect("json");
        assert_eq!(
            json,
            serde_json::json!([{ "from": "b1", "to": "h", "what": ["e", "g"] }])
        );
    }

    #[test]
    fn focus_gain_is_community_minus_alone() {
        let view = FocusView::from_answer(&answer(vec![
            Fact::quoted("iproduced", &["a", "s"]),
            Fact::quoted("cproduced", &["a", "s"]),
            Fact::quoted("cproduced", &["b", "s"]),
        ]));
        assert_eq!(view.produced_alone("s"), ["a".to_string()]);
        assert_eq!(view.gain("s"), vec!["b"]);
        assert!(view.produced_in_community("other").is_empty());
    }

    #[test]
    fn extract_reads_only_the_requested_vocabulary() {
        let ans = answer(vec![
            Fact::quoted("deadend_np", &["x"]),
            Fact::quoted("deadend_nc", &["y"]),
            Fact::quoted("dscope", &["a"]),
        ]);
        let expected = DeadendsView {
            no_producer: vec!["x".into()],
            no_consumer: vec!["y".into()],
        };
        assert_eq!(extract::<DeadendsView>(&ans), expected);
        let scopes: ScopesView = extract(&ans);
        assert_eq!(scopes.host_scope, vec!["a"]);
        assert!(scopes.community_scope.is_empty());
        let mincom: MincomView = extract(&ans);
        assert!(mincom.bacteria.is_empty() && mincom.exchanged.is_empty());
        assert_eq!(mincom.costs, Optimum::new(vec![1, 2]));
    }
}

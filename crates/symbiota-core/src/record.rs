//! # Result Records
//!
//! Serializable query results with a fixed key set per query kind.
//! Writers render them unchanged; exchange maps flatten to
//! `{from, to, what}` entries.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aggregate::SymbiontRoles;
use crate::extract::{DeadendsView, ExchangeMap, FocusView, GroupedNames, MincomView, ScopesView};
use crate::solver::Optimum;

// =============================================================================
// MINCOM
// =============================================================================

/// One optimal community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SingleRecord {
    pub bacteria: Vec<String>,
    pub still_unprod: Vec<String>,
    pub newly_prod: Vec<String>,
    pub producible: Vec<String>,
    pub exchanged: ExchangeMap,
    pub one_model_targetsproducers: GroupedNames,
    pub score_optimum: Optimum,
}

impl From<MincomView> for SingleRecord {
    fn from(view: MincomView) -> Self {
        Self {
            bacteria: view.bacteria,
            still_unprod: view.unproducible,
            newly_prod: view.newly_producible,
            producible: view.producible,
            exchanged: view.exchanged,
            one_model_targetsproducers: view.target_producers,
            score_optimum: view.costs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnionRecord {
    pub union_bacteria: Vec<String>,
    pub union_exchanged: ExchangeMap,
    pub union_targetsproducers: GroupedNames,
    pub score_optimum_union: Optimum,
}

impl UnionRecord {
    #[must_use]
    pub fn new(view: MincomView, optimum: Optimum) -> Self {
        Self {
            union_bacteria: view.bacteria,
            union_exchanged: view.exchanged,
            union_targetsproducers: view.target_producers,
            score_optimum_union: optimum,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntersectionRecord {
    pub inter_bacteria: Vec<String>,
    pub inter_exchanged: ExchangeMap,
    pub inter_targetsproducers: GroupedNames,
    pub score_optimum_inter: Optimum,
}

impl IntersectionRecord {
    #[must_use]
    pub fn new(view: MincomView, optimum: Optimum) -> Self {
        Self {
            inter_bacteria: view.bacteria,
            inter_exchanged: view.exchanged,
            inter_targetsproducers: view.target_producers,
            score_optimum_inter: optimum,
        }
    }
}

/// Every optimal community, numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumerationRecord {
    pub enum_bacteria: BTreeMap<usize, Vec<String>>,
    pub enum_exchanged: BTreeMap<usize, ExchangeMap>,
    pub enum_targetsproducers: BTreeMap<usize, GroupedNames>,
}

impl EnumerationRecord {
    /// Record the next solution; returns its number.
    pub fn push(&mut self, view: MincomView) -> usize {
        let index = self.enum_bacteria.len() + 1;
        self.enum_bacteria.insert(index, view.bacteria);
        self.enum_exchanged.insert(index, view.exchanged);
        self.enum_targetsproducers.insert(index, view.target_producers);
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.enum_bacteria.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enum_bacteria.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolesRecord {
    pub key_species: BTreeSet<String>,
    pub essential_symbionts: BTreeSet<String>,
    pub alternative_symbionts: BTreeSet<String>,
}

impl From<SymbiontRoles> for RolesRecord {
    fn from(roles: SymbiontRoles) -> Self {
        Self {
            key_species: roles.keystone,
            essential_symbionts: roles.essential,
            alternative_symbionts: roles.alternative,
        }
    }
}

/// Community selection result. Only the requested modes are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MincomRecord {
    #[serde(flatten)]
    pub single: Option<SingleRecord>,
    #[serde(flatten)]
    pub union: Option<UnionRecord>,
    #[serde(flatten)]
    pub intersection: Option<IntersectionRecord>,
    #[serde(flatten)]
    pub enumeration: Option<EnumerationRecord>,
    #[serde(flatten)]
    pub roles: Option<RolesRecord>,
    /// Mode -> reason, for modes that found no answer.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub no_solution: BTreeMap<String, String>,
}

// =============================================================================
// SCOPES / FOCUS / DEADENDS
// =============================================================================

/// Host-alone and community producibility.
///
/// Host keys appear when the instance has a host or came from an instance
/// file; `com_scope` when it came from an instance file or has no host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopesRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_prodtargets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_unprodtargets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_scope: Option<Vec<String>>,
    pub com_prodtargets: Vec<String>,
    pub com_unprodtargets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comhost_scope: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub com_scope: Option<Vec<String>>,
    pub targets_producers: GroupedNames,
}

impl ScopesRecord {
    #[must_use]
    pub fn new(view: ScopesView, host_present: bool, from_instance: bool) -> Self {
        let host_keys = host_present || from_instance;
        Self {
            host_prodtargets: host_keys.then_some(view.host_producible),
            host_unprodtargets: host_keys.then_some(view.host_unproducible),
            host_scope: host_keys.then_some(view.host_scope),
            com_prodtargets: view.community_producible,
            com_unprodtargets: view.community_unproducible,
            comhost_scope: host_keys.then_some(view.community_scope_with_host),
            com_scope: (from_instance || !host_present).then_some(view.community_scope),
            targets_producers: view.target_producers,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FocusEntry {
    pub produced_alone: Vec<String>,
    pub produced_in_community: Vec<String>,
    pub community_metabolic_gain: Vec<String>,
}

/// Per focused organism production, keyed by organism name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FocusRecord {
    pub organisms: BTreeMap<String, FocusEntry>,
    /// Requested names that are not symbionts of the instance.
    #[serde(skip)]
    pub ignored: Vec<String>,
}

impl FocusRecord {
    #[must_use]
    pub fn new(view: &FocusView, focused: &[String], ignored: Vec<String>) -> Self {
        let organisms = focused
            .iter()
            .map(|org| {
                let entry = FocusEntry {
                    produced_alone: view.produced_alone(org).to_vec(),
                    produced_in_community: view.produced_in_community(org).to_vec(),
                    community_metabolic_gain: view.gain(org),
                };
                (org.clone(), entry)
            })
            .collect();
        Self { organisms, ignored }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeadendsRecord {
    pub deadend_np: Vec<String>,
    pub deadend_nc: Vec<String>,
}

impl From<DeadendsView> for DeadendsRecord {
    fn from(view: DeadendsView) -> Self {
        Self {
            deadend_np: view.no_producer,
            deadend_nc: view.no_consumer,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mincom_record_shows_only_requested_modes() {
        let mut exchanged = ExchangeMap::new();
        exchanged.insert("orgB3", "host_metab_mod", "e");
        let view = MincomView {
            bacteria: vec!["orgB3".into()],
            exchanged,
            newly_producible: vec!["f".into()],
            costs: Optimum::new(vec![1, 1]),
            ..MincomView::default()
        };
        let mut record = MincomRecord {
            single: Some(view.into()),
            ..MincomRecord::default()
        };
        record
            .no_solution
            .insert("union".into(), "no answer exists (union)".into());

        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["bacteria"], json!(["orgB3"]));
        assert_eq!(value["score_optimum"], json!("1,1"));
        assert_eq!(
            value["exchanged"],
            json!([{ "from": "orgB3", "to": "host_metab_mod", "what": ["e"] }])
        );
        assert!(value.get("union_bacteria").is_none());
        assert!(value.get("key_species").is_none());
        assert_eq!(value["no_solution"]["union"], json!("no answer exists (union)"));
    }

    #[test]
    fn enumeration_numbers_solutions_from_one() {
        let mut record = EnumerationRecord::default();
        let first = record.push(MincomView {
            bacteria: vec!["b1".into()],
            ..MincomView::default()
        });
        let second = record.push(MincomView::default());
        assert_eq!((first, second), (1, 2));
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["enum_bacteria"]["1"], json!(["b1"]));
    }

    #[test]
    fn scopes_record_key_set_follows_host() {
        let view = ScopesView {
            community_scope: vec!["c".into()],
            ..ScopesView::default()
        };
        let hosted = serde_json::to_value(ScopesRecord::new(view.clone(), true, false)).expect("json");
        assert!(hosted.get("host_scope").is_some());
        assert!(hosted.get("com_scope").is_none());

        let hostless = serde_json::to_value(ScopesRecord::new(view, false, false)).expect("json");
        assert!(hostless.get("host_scope").is_none());
        assert_eq!(hostless["com_scope"], json!(["c"]));
    }

    #[test]
    fn focus_record_is_keyed_by_organism() {
        let mut view = FocusView::default();
        view.alone.insert("s".into(), vec!["a".into()]);
        view.in_community.insert("s".into(), vec!["a".into(), "b".into()]);
        let record = FocusRecord::new(&view, &["s".to_string()], vec!["ghost".into()]);
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["s"]["community_metabolic_gain"], json!(["b"]));
        assert!(value.get("ghost").is_none());
        assert_eq!(record.ignored, vec!["ghost"]);
    }
}

//! Interned, index-based view of a fact model.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::FactModel;
use crate::primitives::predicates;

/// A reaction of one organism.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub organism: usize,
    pub reactants: Vec<usize>,
    pub products: Vec<usize>,
    pub reversible: bool,
}

impl Reaction {
    /// Metabolites made when the reaction fires under `available`.
    ///
    /// Forward firing needs every reactant; reversible reactions also fire
    /// backward when every product is available.
    pub fn outputs<'a>(&'a self, available: &[bool]) -> impl Iterator<Item = usize> + 'a {
        let forward = self.reactants.iter().all(|&m| available[m]);
        let backward = self.reversible && self.products.iter().all(|&m| available[m]);
        let fwd = self.products.iter().copied().filter(move |_| forward);
        let bwd = self.reactants.iter().copied().filter(move |_| backward);
        fwd.chain(bwd)
    }

    /// Metabolites this reaction may consume.
    pub fn inputs(&self) -> impl Iterator<Item = usize> + '_ {
        let bwd = self.products.iter().copied().filter(|_| self.reversible);
        self.reactants.iter().copied().chain(bwd)
    }
}

/// Index of metabolites, organisms and reactions.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub metabolites: Vec<String>,
    pub organisms: Vec<String>,
    pub reactions: Vec<Reaction>,
    /// Reaction indices per organism.
    pub by_organism: Vec<Vec<usize>>,
    pub seeds: BTreeSet<usize>,
    pub targets: BTreeSet<usize>,
    pub host: Option<usize>,
    /// Candidate members, sorted by name.
    pub bacteria: Vec<usize>,
    pub focus: Vec<usize>,
    /// Declared compartments of `(metabolite, organism)`.
    pub compartments: BTreeMap<(usize, usize), BTreeSet<String>>,
}

struct Interner {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl Interner {
    fn new() -> Self {
        Self {
            names: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    fn id(&mut self, name: String) -> usize {
        if let Some(&id) = self.index.get(&name) {
            return id;
        }
        let id = self.names.len();
        self.index.insert(name.clone(), id);
        self.names.push(name);
        id
    }
}

impl Network {
    /// Index every fact of a model. Unknown predicates are ignored.
    pub fn from_model(model: &FactModel) -> Self {
        let mut mets = Interner::new();
        let mut orgs = Interner::new();
        let mut reaction_index: BTreeMap<(String, usize), usize> = BTreeMap::new();
        let mut reactions: Vec<Reaction> = Vec::new();

        for fact in model.with_predicate(predicates::REACTION, 2) {
            let (Some(rid), Some(org)) = (fact.arg(0), fact.arg(1)) else {
                continue;
            };
            let organism = orgs.id(org);
            reaction_index.insert((rid, organism), reactions.len());
            reactions.push(Reaction {
                organism,
                reactants: Vec::new(),
                products: Vec::new(),
                reversible: false,
            });
        }

        let mut net = Self::default();

        for fact in model {
            let args: Vec<String> = fact.args.iter().map(|t| t.text()).collect();
            match (fact.predicate.as_str(), args.as_slice()) {
                (predicates::REVERSIBLE, [rid, org]) => {
                    let key = (rid.clone(), orgs.id(org.clone()));
                    if let Some(&r) = reaction_index.get(&key) {
                        reactions[r].reversible = true;
                    }
                }
                (predicates::REACTANT | predicates::PRODUCT, [met, rid, org]) => {
                    let key = (rid.clone(), orgs.id(org.clone()));
                    if let Some(&r) = reaction_index.get(&key) {
                        let m = mets.id(met.clone());
                        if fact.predicate == predicates::REACTANT {
                            reactions[r].reactants.push(m);
                        } else {
                            reactions[r].products.push(m);
                        }
                    }
                }
                (predicates::SPECIES, [met, _name, compartment, org]) => {
                    let key = (mets.id(met.clone()), orgs.id(org.clone()));
                    net.compartments
                        .entry(key)
                        .or_default()
                        .insert(compartment.clone());
                }
                (predicates::SEED, [met]) => {
                    net.seeds.insert(mets.id(met.clone()));
                }
                (predicates::TARGET, [met]) => {
                    net.targets.insert(mets.id(met.clone()));
                }
                (predicates::DRAFT, [org]) => net.host = Some(orgs.id(org.clone())),
                (predicates::BACTERIA, [org]) => net.bacteria.push(orgs.id(org.clone())),
                (predicates::TARGET_SPECIES, [org]) => net.focus.push(orgs.id(org.clone())),
                _ => {}
            }
        }

        net.by_organism = vec![Vec::new(); orgs.names.len()];
        for (r, reaction) in reactions.iter().enumerate() {
            net.by_organism[reaction.organism].push(r);
        }
        net.reactions = reactions;
        net.metabolites = mets.names;
        net.organisms = orgs.names;
        net.bacteria.sort_by(|a, b| net.organisms[*a].cmp(&net.organisms[*b]));
        net.focus.sort_by(|a, b| net.organisms[*a].cmp(&net.organisms[*b]));
        net
    }

    /// Availability vector holding exactly the seeds.
    pub fn seed_vector(&self) -> Vec<bool> {
        let mut available = vec![false; self.metabolites.len()];
        for &s in &self.seeds {
            available[s] = true;
        }
        available
    }

    /// Every organism with reactions or a role.
    pub fn all_organisms(&self) -> Vec<usize> {
        (0..self.organisms.len()).collect()
    }

    /// True if `organism` may consume `metabolite`.
    pub fn consumes(&self, organism: usize, metabolite: usize) -> bool {
        self.by_organism[organism]
            .iter()
            .any(|&r| self.reactions[r].inputs().any(|m| m == metabolite))
    }

    pub fn metabolite(&self, id: usize) -> &str {
        &self.metabolites[id]
    }

    pub fn organism(&self, id: usize) -> &str {
        &self.organisms[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fact;

    #[test]
    fn indexes_roles_and_reactions() {
        let model: FactModel = [
            Fact::reaction("R1", "h"),
            Fact::reversible("R1", "h"),
            Fact::reactant("a", "R1", "h"),
            Fact::product("b", "R1", "h"),
            Fact::species("b", "b", "cyto", "h"),
            Fact::draft("h"),
            Fact::bacteria("z"),
            Fact::bacteria("y"),
            Fact::seed("a"),
            Fact::target("b"),
        ]
        .into_iter()
        .collect();

        let net = Network::from_model(&model);
        assert_eq!(net.reactions.len(), 1);
        assert!(net.reactions[0].reversible);
        assert_eq!(net.host.map(|h| net.organism(h)), Some("h"));
        let names: Vec<_> = net.bacteria.iter().map(|&b| net.organism(b)).collect();
        assert_eq!(names, vec!["y", "z"]);
        assert_eq!(net.seeds.len(), 1);
        assert_eq!(net.compartments.len(), 1);
    }

    #[test]
    fn reversible_reaction_fires_backward() {
        let reaction = Reaction {
            organism: 0,
            reactants: vec![0],
            products: vec![1],
            reversible: true,
        };
        let outputs: Vec<_> = reaction.outputs(&[false, true]).collect();
        assert_eq!(outputs, vec![0]);
        let outputs: Vec<_> = reaction.outputs(&[true, false]).collect();
        assert_eq!(outputs, vec![1]);
    }
}

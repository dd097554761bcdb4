//! Reachability closures over a [`Network`].
//!
//! A scope is the least fixpoint of firing reactions from an initial set.
//! Pools share one availability vector; compartments keep one per member.

use std::collections::BTreeSet;

use super::network::Network;

/// Soup closure of `members` from `initial`.
pub fn closure(net: &Network, members: &[usize], initial: &[bool]) -> Vec<bool> {
    let mut available = initial.to_vec();
    let mut changed = true;
    while changed {
        changed = false;
        for &org in members {
            for &r in &net.by_organism[org] {
                for m in net.reactions[r].outputs(&available).collect::<Vec<_>>() {
                    if !available[m] {
                        available[m] = true;
                        changed = true;
                    }
                }
            }
        }
    }
    available
}

/// Metabolites `organism` makes when `available` is present.
pub fn made_by(net: &Network, organism: usize, available: &[bool]) -> BTreeSet<usize> {
    net.by_organism[organism]
        .iter()
        .flat_map(|&r| net.reactions[r].outputs(available))
        .collect()
}

/// Members of a set, as metabolite ids.
pub fn members(available: &[bool]) -> BTreeSet<usize> {
    available
        .iter()
        .enumerate()
        .filter_map(|(m, &on)| on.then_some(m))
        .collect()
}

/// One directed transfer of a metabolite between two organisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Exchange {
    pub from: usize,
    pub to: usize,
    pub metabolite: usize,
}

/// Per-member availability after exchanging along `exchanges`.
#[derive(Debug, Clone)]
pub struct Compartments {
    /// `(organism, available, made)` per member, in member order.
    pub state: Vec<(usize, Vec<bool>, Vec<bool>)>,
}

impl Compartments {
    /// Compute the compartment fixpoint for `members` from the seeds.
    pub fn compute(net: &Network, members: &[usize], exchanges: &[Exchange]) -> Self {
        let seeds = net.seed_vector();
        let width = net.metabolites.len();
        let mut state: Vec<(usize, Vec<bool>, Vec<bool>)> = members
            .iter()
            .map(|&o| (o, seeds.clone(), vec![false; width]))
            .collect();

        fn slot(org: usize, state: &[(usize, Vec<bool>, Vec<bool>)]) -> Option<usize> {
            state.iter().position(|(o, _, _)| *o == org)
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (org, available, made) in &mut state {
                let reached = closure(net, &[*org], available);
                for m in made_by(net, *org, &reached) {
                    made[m] = true;
                }
                if reached != *available {
                    *available = reached;
                    changed = true;
                }
            }
            for x in exchanges {
                let (Some(from), Some(to)) = (slot(x.from, &state), slot(x.to, &state)) else {
                    continue;
                };
                if state[from].2[x.metabolite] && !state[to].1[x.metabolite] {
                    state[to].1[x.metabolite] = true;
                    changed = true;
                }
            }
        }

        Self { state }
    }

    /// True if `metabolite` is available in the compartment of `organism`.
    pub fn available_in(&self, organism: usize, metabolite: usize) -> bool {
        self.state
            .iter()
            .any(|(o, available, _)| *o == organism && available[metabolite])
    }

    /// True if any compartment holds `metabolite`.
    pub fn available_anywhere(&self, metabolite: usize) -> bool {
        self.state.iter().any(|(_, available, _)| available[metabolite])
    }

    /// True if `organism` makes `metabolite`.
    pub fn made_in(&self, organism: usize, metabolite: usize) -> bool {
        self.state
            .iter()
            .any(|(o, _, made)| *o == organism && made[metabolite])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactModel;
    use crate::types::Fact;

    /// h: a -> b ; s: b -> c ; h: c -> t
    fn chain() -> Network {
        let model: FactModel = [
            Fact::reaction("R1", "h"),
            Fact::reactant("a", "R1", "h"),
            Fact::product("b", "R1", "h"),
            Fact::reaction("R2", "s"),
            Fact::reactant("b", "R2", "s"),
            Fact::product("c", "R2", "s"),
            Fact::reaction("R3", "h"),
            Fact::reactant("c", "R3", "h"),
            Fact::product("t", "R3", "h"),
            Fact::seed("a"),
        ]
        .into_iter()
        .collect();
        Network::from_model(&model)
    }

    fn id(net: &Network, name: &str) -> usize {
        net.metabolites
            .iter()
            .position(|m| m == name)
            .expect("known metabolite")
    }

    fn org(net: &Network, name: &str) -> usize {
        net.organisms
            .iter()
            .position(|o| o == name)
            .expect("known organism")
    }

    #[test]
    fn soup_closure_chains_organisms() {
        let net = chain();
        let all = closure(&net, &net.all_organisms(), &net.seed_vector());
        assert!(all[id(&net, "t")]);

        let host_only = closure(&net, &[org(&net, "h")], &net.seed_vector());
        assert!(host_only[id(&net, "b")]);
        assert!(!host_only[id(&net, "t")]);
        assert_eq!(members(&host_only).len(), 2);
    }

    #[test]
    fn compartments_need_exchanges() {
        let net = chain();
        let (h, s) = (org(&net, "h"), org(&net, "s"));
        let isolated = Compartments::compute(&net, &[h, s], &[]);
        assert!(!isolated.available_in(h, id(&net, "t")));
        assert!(isolated.made_in(h, id(&net, "b")));

        let exchanges = [
            Exchange { from: h, to: s, metabolite: id(&net, "b") },
            Exchange { from: s, to: h, metabolite: id(&net, "c") },
        ];
        let linked = Compartments::compute(&net, &[h, s], &exchanges);
        assert!(linked.available_in(h, id(&net, "t")));
        assert!(linked.available_anywhere(id(&net, "c")));
        assert!(!linked.available_in(s, id(&net, "t")));
    }
}

//! Single-model encodings: scopes, focus and dead-ends.

use std::collections::BTreeSet;

use super::network::Network;
use super::scope::{closure, made_by, members};
use crate::primitives::predicates;
use crate::types::Fact;

fn unary(predicate: &str, net: &Network, ids: impl IntoIterator<Item = usize>) -> Vec<Fact> {
    ids.into_iter()
        .map(|m| Fact::quoted(predicate, &[net.metabolite(m)]))
        .collect()
}

/// Host-alone and community scopes with target producibility.
pub fn scopes(net: &Network) -> BTreeSet<Fact> {
    let seeds = net.seed_vector();
    let host: Vec<usize> = net.host.into_iter().collect();
    let dscope = closure(net, &host, &seeds);
    let all = net.all_organisms();
    let scope = closure(net, &all, &seeds);

    let mut host_metabolites: BTreeSet<usize> = BTreeSet::new();
    if let Some(h) = net.host {
        for &r in &net.by_organism[h] {
            let reaction = &net.reactions[r];
            host_metabolites.extend(reaction.reactants.iter().chain(&reaction.products));
        }
        for &(m, o) in net.compartments.keys() {
            if o == h {
                host_metabolites.insert(m);
            }
        }
    }

    let targets = &net.targets;
    let mut facts = BTreeSet::new();
    facts.extend(unary(predicates::DSCOPE, net, members(&dscope)));
    facts.extend(unary(
        predicates::DPRODUCIBLE,
        net,
        targets.iter().copied().filter(|&t| dscope[t]),
    ));
    facts.extend(unary(
        predicates::DUNPRODUCIBLE,
        net,
        targets.iter().copied().filter(|&t| !dscope[t]),
    ));

    let gained: Vec<usize> = members(&scope).into_iter().filter(|&m| !dscope[m]).collect();
    facts.extend(unary(predicates::NEWSCOPE_MICROBIOME, net, gained.iter().copied()));
    facts.extend(unary(
        predicates::NEWSCOPE_WITH_HOST,
        net,
        gained.iter().copied().filter(|m| host_metabolites.contains(m)),
    ));
    facts.extend(unary(
        predicates::NEWLYPRODUCIBLE,
        net,
        targets.iter().copied().filter(|&t| scope[t] && !dscope[t]),
    ));
    facts.extend(unary(
        predicates::AUNPRODUCIBLE,
        net,
        targets.iter().copied().filter(|&t| !scope[t]),
    ));

    for &o in &all {
        for m in made_by(net, o, &scope) {
            if targets.contains(&m) {
                facts.insert(Fact::quoted(
                    predicates::TARGET_PRODUCER_INITIAL,
                    &[net.organism(o), net.metabolite(m)],
                ));
            }
        }
    }

    facts
}

/// Per focused organism: what it makes alone and inside the community.
pub fn focus(net: &Network) -> BTreeSet<Fact> {
    let seeds = net.seed_vector();
    let scope = closure(net, &net.all_organisms(), &seeds);
    let mut facts = BTreeSet::new();

    for &o in &net.focus {
        let alone = closure(net, &[o], &seeds);
        for m in made_by(net, o, &alone) {
            facts.insert(Fact::quoted(
                predicates::IPRODUCED,
                &[net.metabolite(m), net.organism(o)],
            ));
        }
        for m in made_by(net, o, &scope) {
            facts.insert(Fact::quoted(
                predicates::CPRODUCED,
                &[net.metabolite(m), net.organism(o)],
            ));
        }
    }

    facts
}

/// Metabolites without producer (`np`) or without consumer (`nc`).
pub fn deadends(net: &Network) -> BTreeSet<Fact> {
    let mut consumed = BTreeSet::new();
    let mut produced = BTreeSet::new();
    for reaction in &net.reactions {
        consumed.extend(reaction.inputs());
        produced.extend(reaction.products.iter().copied());
        if reaction.reversible {
            produced.extend(reaction.reactants.iter().copied());
        }
    }

    let mut facts = BTreeSet::new();
    facts.extend(unary(
        predicates::DEADEND_NP,
        net,
        consumed.difference(&produced).copied(),
    ));
    facts.extend(unary(
        predicates::DEADEND_NC,
        net,
        produced.difference(&consumed).copied(),
    ));
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactModel;

    /// h: a -> b ; s: b -> c ; s: c -> t, target t, seed a
    fn net(with_focus: bool) -> Network {
        let mut facts = vec![
            Fact::reaction("R1", "h"),
            Fact::reactant("a", "R1", "h"),
            Fact::product("b", "R1", "h"),
            Fact::reaction("R2", "s"),
            Fact::reactant("b", "R2", "s"),
            Fact::product("c", "R2", "s"),
            Fact::reaction("R3", "s"),
            Fact::reactant("c", "R3", "s"),
            Fact::product("t", "R3", "s"),
            Fact::species("c", "c", "cyto", "h"),
            Fact::draft("h"),
            Fact::bacteria("s"),
            Fact::seed("a"),
            Fact::target("t"),
        ];
        if with_focus {
            facts.push(Fact::target_species("s"));
        }
        let model: FactModel = facts.into_iter().collect();
        Network::from_model(&model)
    }

    fn has(facts: &BTreeSet<Fact>, pred: &str, args: &[&str]) -> bool {
        facts.contains(&Fact::quoted(pred, args))
    }

    #[test]
    fn scopes_split_host_and_community() {
        let facts = scopes(&net(false));
        assert!(has(&facts, "dscope", &["a"]));
        assert!(has(&facts, "dscope", &["b"]));
        assert!(has(&facts, "dunproducible", &["t"]));
        assert!(has(&facts, "newscope_microbiome", &["c"]));
        assert!(has(&facts, "newscope_microbiome", &["t"]));
        assert!(has(&facts, "newscope_with_host", &["c"]));
        assert!(!has(&facts, "newscope_with_host", &["t"]));
        assert!(has(&facts, "newlyproducible", &["t"]));
        assert!(has(&facts, "target_producer_coop_initcom", &["s", "t"]));
        assert!(!facts.iter().any(|f| f.predicate == "aunproducible"));
    }

    #[test]
    fn focus_compares_alone_and_community() {
        let facts = focus(&net(true));
        assert!(!facts.iter().any(|f| f.predicate == "iproduced"));
        assert!(has(&facts, "cproduced", &["c", "s"]));
        assert!(has(&facts, "cproduced", &["t", "s"]));
    }

    #[test]
    fn deadends_find_orphans_and_sinks() {
        let facts = deadends(&net(false));
        assert!(has(&facts, "deadend_np", &["a"]));
        assert!(has(&facts, "deadend_nc", &["t"]));
        assert!(!has(&facts, "deadend_np", &["b"]));
    }
}

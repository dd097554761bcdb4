//! Minimal community search.
//!
//! Communities are explored by increasing size, each size in lexicographic
//! order of the sorted candidate list, so the first feasible size is the
//! optimum and every answer at that size is found in a stable order.
//!
//! In exchange topologies the secondary objective, the number of exchanges,
//! is minimized the same way over the exchange candidates of a community.

use std::collections::BTreeSet;

use super::network::Network;
use super::scope::{Compartments, Exchange, closure, made_by};
use crate::primitives::{
    DEADLINE_CHECK_INTERVAL, MAX_EXCHANGE_CANDIDATES, UNKNOWN_COMPARTMENT, predicates,
};
use crate::solver::{Answer, Deadline, Optimum};
use crate::types::{Fact, SymbiotaError};

// =============================================================================
// COMBINATIONS
// =============================================================================

/// `k`-subsets of `0..n` in lexicographic order.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    idx: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    #[must_use]
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            idx: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.idx.clone());
        }
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.idx[i] < self.n - self.k + i {
                break;
            }
        }
        self.idx[i] += 1;
        for j in i + 1..self.k {
            self.idx[j] = self.idx[j - 1] + 1;
        }
        Some(self.idx.clone())
    }
}

// =============================================================================
// TICKER
// =============================================================================

/// Deadline checks spaced by `DEADLINE_CHECK_INTERVAL` iterations.
#[derive(Debug, Clone, Copy)]
struct Ticker {
    deadline: Deadline,
    count: usize,
}

impl Ticker {
    fn new(deadline: Deadline) -> Self {
        Self { deadline, count: 0 }
    }

    fn tick(&mut self, stage: &str) -> Result<(), SymbiotaError> {
        let due = self.count % DEADLINE_CHECK_INTERVAL == 0;
        self.count = self.count.wrapping_add(1);
        if due {
            self.deadline.check(stage)?;
        }
        Ok(())
    }
}

// =============================================================================
// PROBLEM
// =============================================================================

/// How members share metabolites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Soup,
    /// Compartments; targets must reach the host when `host_goal` is set.
    Exchange { host_goal: bool },
}

/// One community selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Vec<usize>,
    pub exchanges: Vec<Exchange>,
}

/// Everything the search needs, precomputed once per solve.
#[derive(Debug, Clone)]
pub struct SelectionProblem<'n> {
    net: &'n Network,
    topology: Topology,
    base: Vec<usize>,
    candidates: Vec<usize>,
    dscope: Vec<bool>,
    newly: BTreeSet<usize>,
    exchange_pool: Vec<Exchange>,
}

impl<'n> SelectionProblem<'n> {
    pub fn new(net: &'n Network, topology: Topology) -> Self {
        let seeds = net.seed_vector();
        let base: Vec<usize> = net.host.into_iter().collect();
        let dscope = closure(net, &base, &seeds);

        let everyone: Vec<usize> = base.iter().chain(&net.bacteria).copied().collect();
        let full = closure(net, &everyone, &seeds);

        let newly = net
            .targets
            .iter()
            .copied()
            .filter(|&t| full[t] && !dscope[t])
            .collect();

        let candidates: Vec<usize> = net
            .bacteria
            .iter()
            .copied()
            .filter(|&b| {
                let made = made_by(net, b, &full);
                match topology {
                    Topology::Soup => made.iter().any(|&m| !dscope[m]),
                    Topology::Exchange { .. } => !made.is_empty(),
                }
            })
            .collect();

        let mut exchange_pool = Vec::new();
        if let Topology::Exchange { .. } = topology {
            let members: Vec<usize> = base.iter().chain(&candidates).copied().collect();
            for &from in &members {
                for m in made_by(net, from, &full) {
                    if net.seeds.contains(&m) {
                        continue;
                    }
                    for &to in &members {
                        let wanted = net.consumes(to, m)
                            || (Some(to) == net.host && net.targets.contains(&m));
                        if to != from && wanted {
                            exchange_pool.push(Exchange {
                                from,
                                to,
                                metabolite: m,
                            });
                        }
                    }
                }
            }
            exchange_pool.sort();
        }

        Self {
            net,
            topology,
            base,
            candidates,
            dscope,
            newly,
            exchange_pool,
        }
    }

    /// Targets the host reaches alone (or seeded targets without a host).
    pub fn producible(&self) -> BTreeSet<usize> {
        self.net
            .targets
            .iter()
            .copied()
            .filter(|&t| self.dscope[t])
            .collect()
    }

    /// Targets only the community can reach.
    pub fn newly(&self) -> &BTreeSet<usize> {
        &self.newly
    }

    /// Targets nobody can reach.
    pub fn unproducible(&self) -> BTreeSet<usize> {
        let producible = self.producible();
        self.net
            .targets
            .iter()
            .copied()
            .filter(|t| !producible.contains(t) && !self.newly.contains(t))
            .collect()
    }

    /// Candidates left after discarding members that cannot contribute.
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    fn members(&self, chosen: &[usize]) -> Vec<usize> {
        self.base.iter().chain(chosen).copied().collect()
    }

    fn chosen(&self, combo: &[usize]) -> Vec<usize> {
        combo.iter().map(|&i| self.candidates[i]).collect()
    }

    fn soup_feasible(&self, members: &[usize]) -> bool {
        let reached = closure(self.net, members, &self.net.seed_vector());
        self.newly.iter().all(|&t| reached[t])
    }

    fn exchange_feasible(&self, members: &[usize], exchanges: &[Exchange]) -> bool {
        let compartments = Compartments::compute(self.net, members, exchanges);
        let host_goal = matches!(self.topology, Topology::Exchange { host_goal: true });
        self.newly.iter().all(|&t| match (host_goal, self.net.host) {
            (true, Some(h)) => compartments.available_in(h, t),
            _ => compartments.available_anywhere(t),
        })
    }

    /// Exchange candidates between members of one community.
    fn pool_for(&self, members: &[usize]) -> Result<Vec<Exchange>, SymbiotaError> {
        let pool: Vec<Exchange> = self
            .exchange_pool
            .iter()
            .copied()
            .filter(|x| members.contains(&x.from) && members.contains(&x.to))
            .collect();
        if pool.len() > MAX_EXCHANGE_CANDIDATES {
            return Err(SymbiotaError::SolverFailed(format!(
                "{} exchange candidates exceed the embedded solver limit of {}; use the clingo backend",
                pool.len(),
                MAX_EXCHANGE_CANDIDATES
            )));
        }
        Ok(pool)
    }

    /// Fewest exchanges making `members` feasible, if any.
    fn min_exchanges(
        &self,
        members: &[usize],
        ticker: &mut Ticker,
    ) -> Result<Option<usize>, SymbiotaError> {
        let pool = self.pool_for(members)?;
        if !self.exchange_feasible(members, &pool) {
            return Ok(None);
        }
        for size in 0..=pool.len() {
            for combo in Combinations::new(pool.len(), size) {
                ticker.tick("exchange minimization")?;
                let picked: Vec<Exchange> = combo.iter().map(|&i| pool[i]).collect();
                if self.exchange_feasible(members, &picked) {
                    return Ok(Some(size));
                }
            }
        }
        Ok(None)
    }

    /// Lexicographic optimum, or `None` if no community is feasible.
    pub fn optimum(&self, deadline: Deadline) -> Result<Option<Optimum>, SymbiotaError> {
        let mut ticker = Ticker::new(deadline);
        for size in 0..=self.candidates.len() {
            let mut best: Option<usize> = None;
            for combo in Combinations::new(self.candidates.len(), size) {
                ticker.tick("community optimization")?;
                let members = self.members(&self.chosen(&combo));
                match self.topology {
                    Topology::Soup => {
                        if self.soup_feasible(&members) {
                            return Ok(Some(Optimum::new(vec![size as i64])));
                        }
                    }
                    Topology::Exchange { .. } => {
                        if let Some(x) = self.min_exchanges(&members, &mut ticker)? {
                            best = Some(best.map_or(x, |b| b.min(x)));
                        }
                    }
                }
            }
            if let Some(x) = best {
                return Ok(Some(Optimum::new(vec![size as i64, x as i64])));
            }
        }
        Ok(None)
    }

    /// Lazy sequence of every answer achieving `optimum`.
    pub fn into_answers(self, optimum: Optimum, deadline: Deadline) -> OptimalAnswers<'n> {
        let size = optimum.values().first().copied().unwrap_or(0).max(0) as usize;
        let exchanges = optimum.values().get(1).copied().unwrap_or(0).max(0) as usize;
        let communities = Combinations::new(self.candidates.len(), size);
        OptimalAnswers {
            problem: self,
            optimum,
            exchanges,
            communities,
            current: None,
            ticker: Ticker::new(deadline),
            failed: false,
        }
    }

    /// Answer facts of one selection.
    pub fn answer(&self, selection: &Selection, costs: Optimum) -> Answer {
        let net = self.net;
        let mut facts = BTreeSet::new();

        for &b in &selection.chosen {
            facts.insert(Fact::quoted(predicates::CHOSEN_BACTERIA, &[net.organism(b)]));
        }
        for t in self.producible() {
            facts.insert(Fact::quoted(predicates::PRODUCIBLE_TARGET, &[net.metabolite(t)]));
        }
        for &t in &self.newly {
            facts.insert(Fact::quoted(
                predicates::NEWLY_PRODUCIBLE_TARGET,
                &[net.metabolite(t)],
            ));
        }
        for t in self.unproducible() {
            facts.insert(Fact::quoted(predicates::UNPRODUCIBLE_TARGET, &[net.metabolite(t)]));
        }

        for x in &selection.exchanges {
            let (met, from, to) = (
                net.metabolite(x.metabolite),
                net.organism(x.from),
                net.organism(x.to),
            );
            match net.compartments.get(&(x.metabolite, x.to)) {
                Some(compartments) if !compartments.is_empty() => {
                    for c in compartments {
                        facts.insert(Fact::quoted(predicates::EXCHANGED, &[met, c.as_str(), from, to]));
                    }
                }
                _ => {
                    facts.insert(Fact::quoted(
                        predicates::EXCHANGED,
                        &[met, UNKNOWN_COMPARTMENT, from, to],
                    ));
                }
            }
        }

        let members = self.members(&selection.chosen);
        let producers: Vec<(usize, usize)> = match self.topology {
            Topology::Soup => {
                let reached = closure(net, &members, &net.seed_vector());
                members
                    .iter()
                    .flat_map(|&o| made_by(net, o, &reached).into_iter().map(move |m| (o, m)))
                    .collect()
            }
            Topology::Exchange { .. } => {
                let compartments = Compartments::compute(net, &members, &selection.exchanges);
                members
                    .iter()
                    .flat_map(|&o| net.targets.iter().map(move |&t| (o, t)))
                    .filter(|&(o, t)| compartments.made_in(o, t))
                    .collect()
            }
        };
        for (o, t) in producers {
            if net.targets.contains(&t) {
                facts.insert(Fact::quoted(
                    predicates::TARGET_PRODUCER_SELECTED,
                    &[net.organism(o), net.metabolite(t)],
                ));
            }
        }

        Answer::new(facts, costs)
    }
}

// =============================================================================
// LAZY ENUMERATION
// =============================================================================

/// Exchange subsets still to try for the current community.
#[derive(Debug, Clone)]
struct ExchangeCursor {
    chosen: Vec<usize>,
    members: Vec<usize>,
    pool: Vec<Exchange>,
    subsets: Combinations,
}

/// Iterator over every optimal answer of a [`SelectionProblem`].
#[derive(Debug, Clone)]
pub struct OptimalAnswers<'n> {
    problem: SelectionProblem<'n>,
    optimum: Optimum,
    exchanges: usize,
    communities: Combinations,
    current: Option<ExchangeCursor>,
    ticker: Ticker,
    failed: bool,
}

impl OptimalAnswers<'_> {
    fn advance(&mut self) -> Result<Option<Selection>, SymbiotaError> {
        loop {
            self.ticker.tick("answer enumeration")?;

            if let Some(cursor) = &mut self.current {
                match cursor.subsets.next() {
                    Some(combo) => {
                        let picked: Vec<Exchange> = combo.iter().map(|&i| cursor.pool[i]).collect();
                        if self.problem.exchange_feasible(&cursor.members, &picked) {
                            return Ok(Some(Selection {
                                chosen: cursor.chosen.clone(),
                                exchanges: picked,
                            }));
                        }
                        continue;
                    }
                    None => self.current = None,
                }
            }

            let Some(combo) = self.communities.next() else {
                return Ok(None);
            };
            let chosen = self.problem.chosen(&combo);
            let members = self.problem.members(&chosen);

            match self.problem.topology {
                Topology::Soup => {
                    if self.problem.soup_feasible(&members) {
                        return Ok(Some(Selection {
                            chosen,
                            exchanges: Vec::new(),
                        }));
                    }
                }
                Topology::Exchange { .. } => {
                    let pool = self.problem.pool_for(&members)?;
                    if self.problem.exchange_feasible(&members, &pool) {
                        self.current = Some(ExchangeCursor {
                            subsets: Combinations::new(pool.len(), self.exchanges),
                            chosen,
                            members,
                            pool,
                        });
                    }
                }
            }
        }
    }
}

impl Iterator for OptimalAnswers<'_> {
    type Item = Result<Answer, SymbiotaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(Some(selection)) => Some(Ok(self.problem.answer(&selection, self.optimum.clone()))),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactModel;

    #[test]
    fn combinations_are_lexicographic() {
        let all: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 1]);
        assert_eq!(all[5], vec![2, 3]);
        assert_eq!(Combinations::new(3, 0).count(), 1);
        assert_eq!(Combinations::new(2, 3).count(), 0);
    }

    /// Host needs `e` for its target; each symbiont makes `e` differently.
    fn toy(with_host: bool) -> Network {
        let mut facts = vec![
            Fact::reaction("R1", "h"),
            Fact::reactant("a", "R1", "h"),
            Fact::reactant("e", "R1", "h"),
            Fact::product("f", "R1", "h"),
            Fact::reaction("S1", "b1"),
            Fact::reactant("a", "S1", "b1"),
            Fact::product("e", "S1", "b1"),
            Fact::reaction("S2", "b2"),
            Fact::reactant("x", "S2", "b2"),
            Fact::product("e", "S2", "b2"),
            Fact::bacteria("b1"),
            Fact::bacteria("b2"),
            Fact::seed("a"),
            Fact::target("f"),
        ];
        if with_host {
            facts.push(Fact::draft("h"));
        } else {
            facts.push(Fact::bacteria("h"));
        }
        let model: FactModel = facts.into_iter().collect();
        Network::from_model(&model)
    }

    #[test]
    fn soup_optimum_and_answers() {
        let net = toy(true);
        let problem = SelectionProblem::new(&net, Topology::Soup);
        // b2 never fires, so it is pruned
        assert_eq!(problem.candidates().len(), 1);
        let optimum = problem
            .optimum(Deadline::start(None))
            .expect("solve")
            .expect("feasible");
        assert_eq!(optimum, Optimum::new(vec![1]));

        let answers: Vec<_> = problem
            .into_answers(optimum, Deadline::start(None))
            .collect::<Result<_, _>>()
            .expect("enumerate");
        assert_eq!(answers.len(), 1);
        assert!(answers[0].facts.contains(&Fact::quoted("chosen_bacteria", &["b1"])));
        assert!(answers[0].facts.contains(&Fact::quoted("newly_producible_target", &["f"])));
        assert!(answers[0]
            .facts
            .contains(&Fact::quoted("target_producer_coop_selectedcom", &["h", "f"])));
    }

    #[test]
    fn exchange_optimum_counts_transfers() {
        let net = toy(true);
        let problem = SelectionProblem::new(&net, Topology::Exchange { host_goal: true });
        let optimum = problem
            .optimum(Deadline::start(None))
            .expect("solve")
            .expect("feasible");
        assert_eq!(optimum, Optimum::new(vec![1, 1]));

        let answers: Vec<_> = problem
            .into_answers(optimum, Deadline::start(None))
            .collect::<Result<_, _>>()
            .expect("enumerate");
        assert_eq!(answers.len(), 1);
        assert!(answers[0]
            .facts
            .contains(&Fact::quoted("exchanged", &["e", "-", "b1", "h"])));
    }

    #[test]
    fn without_host_every_member_is_chosen() {
        let net = toy(false);
        let problem = SelectionProblem::new(&net, Topology::Exchange { host_goal: false });
        let optimum = problem
            .optimum(Deadline::start(None))
            .expect("solve")
            .expect("feasible");
        assert_eq!(optimum, Optimum::new(vec![2, 1]));
    }

    #[test]
    fn expired_deadline_times_out() {
        let net = toy(true);
        let problem = SelectionProblem::new(&net, Topology::Soup);
        let err = problem
            .optimum(Deadline::start(Some(std::time::Duration::ZERO)))
            .expect_err("timeout");
        assert!(matches!(err, SymbiotaError::SolverTimeout { .. }));
    }
}

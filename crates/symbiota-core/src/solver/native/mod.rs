//! # Native Solver
//!
//! Embedded, deterministic implementation of the shipped encodings.
//!
//! Grounding indexes the fact model. Solving:
//! - scope, focus and dead-end encodings yield exactly one answer
//! - selection encodings search communities by increasing size and yield
//!   every answer at the lexicographic optimum, lazily
//!
//! The optimum of a program is computed once and reused by later calls.

pub mod community;
pub mod network;
pub mod report;
pub mod scope;

use std::cell::OnceCell;
use std::iter;

use self::community::{SelectionProblem, Topology};
use self::network::Network;
use crate::encoding::EncodingId;
use crate::model::FactModel;
use crate::solver::{
    Answer, Deadline, EnumMode, Optimum, OptimumBound, SolveConfig, Solutions, Solver,
};
use crate::types::SymbiotaError;

/// Embedded solver backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSolver;

impl NativeSolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// A model indexed for one encoding.
#[derive(Debug)]
pub struct NativeProgram {
    encoding: EncodingId,
    network: Network,
    optimum: OnceCell<Option<Optimum>>,
}

impl NativeProgram {
    #[must_use]
    pub fn encoding(&self) -> EncodingId {
        self.encoding
    }

    fn topology(&self) -> Topology {
        if self.encoding.tracks_exchanges() {
            Topology::Exchange {
                host_goal: self.encoding == EncodingId::CommunityMinexch,
            }
        } else {
            Topology::Soup
        }
    }

    fn optimum(
        &self,
        problem: &SelectionProblem<'_>,
        deadline: Deadline,
    ) -> Result<Option<Optimum>, SymbiotaError> {
        if let Some(cached) = self.optimum.get() {
            return Ok(cached.clone());
        }
        let found = problem.optimum(deadline)?;
        let _ = self.optimum.set(found.clone());
        Ok(found)
    }
}

impl Solver for NativeSolver {
    type Program = NativeProgram;

    fn name(&self) -> &'static str {
        "native"
    }

    fn ground(&self, model: &FactModel, encoding: EncodingId) -> Result<NativeProgram, SymbiotaError> {
        Ok(NativeProgram {
            encoding,
            network: Network::from_model(model),
            optimum: OnceCell::new(),
        })
    }

    fn solve<'a>(
        &'a self,
        program: &'a NativeProgram,
        config: &SolveConfig,
    ) -> Result<Solutions<'a>, SymbiotaError> {
        let deadline = Deadline::start(config.timeout);
        let net = &program.network;

        let single = match program.encoding {
            EncodingId::Scopes => Some(report::scopes(net)),
            EncodingId::Focus => Some(report::focus(net)),
            EncodingId::Deadends => Some(report::deadends(net)),
            _ => None,
        };
        if let Some(facts) = single {
            let answer: Result<Answer, SymbiotaError> = Ok(Answer::new(facts, Optimum::default()));
            return Ok(Box::new(iter::once(answer)));
        }

        if !config.optimize {
            return Err(SymbiotaError::InvalidOption(format!(
                "{} is an optimization encoding and cannot be solved without optimization",
                program.encoding
            )));
        }

        let problem = SelectionProblem::new(net, program.topology());
        let Some(optimum) = program.optimum(&problem, deadline)? else {
            return Ok(Box::new(iter::empty::<Result<Answer, SymbiotaError>>()));
        };

        if let OptimumBound::Exact(bound) = &config.bound {
            if bound.values().len() != optimum.values().len() {
                return Err(SymbiotaError::InvalidOption(format!(
                    "optimum bound '{bound}' does not match the {} objective levels of {}",
                    optimum.values().len(),
                    program.encoding
                )));
            }
            if *bound < optimum {
                return Ok(Box::new(iter::empty::<Result<Answer, SymbiotaError>>()));
            }
        }

        let answers = problem.into_answers(optimum, deadline);
        match config.enumeration {
            EnumMode::None if config.limit > 0 => Ok(Box::new(answers.take(config.limit))),
            EnumMode::None => Ok(Box::new(answers)),
            EnumMode::Brave | EnumMode::Cautious => {
                let brave = config.enumeration == EnumMode::Brave;
                let mut combined: Option<Answer> = None;
                for answer in answers {
                    let answer = answer?;
                    combined = Some(match combined {
                        None => answer,
                        Some(acc) if brave => acc.unite(&answer),
                        Some(acc) => acc.intersect(&answer),
                    });
                }
                Ok(Box::new(combined.into_iter().map(Ok::<Answer, SymbiotaError>)))
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
    use crate::types::Fact;

    /// Host needs `e`; three symbionts make it from seeds.
    fn three_way() -> FactModel {
        let mut facts = vec![
            Fact::reaction("R1", "h"),
            Fact::reactant("e", "R1", "h"),
            Fact::product("f", "R1", "h"),
            Fact::draft("h"),
            Fact::seed("a"),
            Fact::target("f"),
        ];
        for b in ["b1", "b2", "b3"] {
            facts.push(Fact::reaction("S", b));
            facts.push(Fact::reactant("a", "S", b));
            facts.push(Fact::product("e", "S", b));
            facts.push(Fact::bacteria(b));
        }
        facts.into_iter().collect()
    }

    fn chosen(answer: &Answer) -> Vec<String> {
        answer
            .facts
            .iter()
            .filter(|f| f.is("chosen_bacteria", 1))
            .filter_map(|f| f.arg(0))
            .collect()
    }

    #[test]
    fn enumeration_yields_every_optimal_answer() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunitySoup)
            .expect("ground");
        let config = SolveConfig::enumerate(OptimumBound::Search, 0).expect("config");
        let answers: Vec<Answer> = solver
            .solve(&program, &config)
            .expect("solve")
            .collect::<Result<_, _>>()
            .expect("answers");
        assert_eq!(answers.len(), 3);
        assert_eq!(chosen(&answers[0]), vec!["b1"]);
        assert_eq!(chosen(&answers[2]), vec!["b3"]);
    }

    #[test]
    fn limit_caps_enumeration() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunitySoup)
            .expect("ground");
        let config = SolveConfig::enumerate(OptimumBound::Search, 2).expect("config");
        assert_eq!(solver.solve(&program, &config).expect("solve").count(), 2);
    }

    #[test]
    fn brave_and_cautious_combine_answers() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunitySoup)
            .expect("ground");

        let brave = SolveConfig::brave(OptimumBound::Search).expect("config");
        let union: Vec<Answer> = solver
            .solve(&program, &brave)
            .expect("solve")
            .collect::<Result<_, _>>()
            .expect("answers");
        assert_eq!(chosen(&union[0]).len(), 3);

        let cautious = SolveConfig::cautious(OptimumBound::Search).expect("config");
        let inter: Vec<Answer> = solver
            .solve(&program, &cautious)
            .expect("solve")
            .collect::<Result<_, _>>()
            .expect("answers");
        assert!(chosen(&inter[0]).is_empty());
        assert!(inter[0].facts.contains(&Fact::quoted("newly_producible_target", &["f"])));
    }

    #[test]
    fn tighter_bound_than_optimum_has_no_answer() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunitySoup)
            .expect("ground");
        let config =
            SolveConfig::enumerate(OptimumBound::Exact(Optimum::new(vec![0])), 0).expect("config");
        assert_eq!(solver.solve(&program, &config).expect("solve").count(), 0);
    }

    #[test]
    fn bound_of_wrong_length_is_rejected() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunityMinexch)
            .expect("ground");
        let config =
            SolveConfig::brave(OptimumBound::Exact(Optimum::new(vec![1]))).expect("config");
        assert!(matches!(
            solver.solve(&program, &config),
            Err(SymbiotaError::InvalidOption(_))
        ));
    }

    #[test]
    fn selection_without_optimization_is_rejected() {
        let solver = NativeSolver::new();
        let program = solver
            .ground(&three_way(), EncodingId::CommunitySoup)
            .expect("ground");
        assert!(matches!(
            solver.solve(&program, &SolveConfig::plain()),
            Err(SymbiotaError::InvalidOption(_))
        ));
    }

    #[test]
    fn scopes_yield_single_answer() {
        let solver = NativeSolver::new();
        let program = solver.ground(&three_way(), EncodingId::Scopes).expect("ground");
        assert_eq!(program.encoding(), EncodingId::Scopes);
        let answers: Vec<Answer> = solver
            .solve(&program, &SolveConfig::plain())
            .expect("solve")
            .collect::<Result<_, _>>()
            .expect("answers");
        assert_eq!(answers.len(), 1);
        assert!(answers[0].costs.is_empty());
    }
}

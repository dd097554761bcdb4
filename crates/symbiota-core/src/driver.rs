//! # Solver Driver
//!
//! Grounds a fact model once and issues solve requests against it in four
//! retrieval modes:
//!
//! - single: one optimal answer plus its optimum
//! - union: facts true in at least one optimal answer (brave)
//! - intersection: facts true in every optimal answer (cautious)
//! - enumeration: every optimal answer, lazily
//!
//! The optimum is an explicit value: `solve_one` returns it and the other
//! modes take an [`OptimumBound`]. Calls on one [`GroundedProgram`] take
//! `&mut self`, so they are serialized by construction.

use std::fmt;
use std::time::Duration;

use crate::encoding::EncodingId;
use crate::model::FactModel;
use crate::solver::{Answer, Optimum, OptimumBound, SolveConfig, Solutions, Solver};
use crate::types::SymbiotaError;

// =============================================================================
// STATES AND OUTCOMES
// =============================================================================

/// States traversed by one grounded program.
///
/// The four solved states are independent; a run may visit several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Grounded,
    SingleSolved,
    UnionSolved,
    IntersectionSolved,
    Enumerated,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grounded => "grounded",
            Self::SingleSolved => "single",
            Self::UnionSolved => "union",
            Self::IntersectionSolved => "intersection",
            Self::Enumerated => "enumeration",
        };
        f.write_str(name)
    }
}

/// Result of [`GroundedProgram::solve_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSolution {
    pub answer: Answer,
    pub optimum: Optimum,
}

/// Outcome of a retrieval mode that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval<T> {
    Found(T),
    /// The instance has no answer under the requested optimum.
    NoSolution { reason: String },
}

impl<T> Retrieval<T> {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NoSolution { .. } => None,
        }
    }
}

/// Lazy sequence of optimal answers, known to hold at least one.
pub struct Enumeration<'p> {
    first: Option<Answer>,
    rest: Solutions<'p>,
}

impl Iterator for Enumeration<'_> {
    type Item = Result<Answer, SymbiotaError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.first.take() {
            Some(answer) => Some(Ok(answer)),
            None => self.rest.next(),
        }
    }
}

impl fmt::Debug for Enumeration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumeration")
            .field("pending_first", &self.first.is_some())
            .finish_non_exhaustive()
    }
}

/// Which retrieval modes a query asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrievalModes {
    pub single: bool,
    pub union: bool,
    pub intersection: bool,
    pub enumeration: bool,
}

impl RetrievalModes {
    /// Falls back to `single` when nothing is requested.
    #[must_use]
    pub fn or_default(self) -> Self {
        if self.is_empty() {
            Self {
                single: true,
                ..self
            }
        } else {
            self
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.single || self.union || self.intersection || self.enumeration)
    }

    /// True if some requested mode reasons about a shared optimum.
    #[must_use]
    pub fn needs_optimum(&self) -> bool {
        self.union || self.intersection || self.enumeration
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Entry point: holds the solver and the per-call timeout.
#[derive(Debug)]
pub struct SolverDriver<'s, S: Solver> {
    solver: &'s S,
    timeout: Option<Duration>,
}

impl<'s, S: Solver> SolverDriver<'s, S> {
    #[must_use]
    pub fn new(solver: &'s S) -> Self {
        Self {
            solver,
            timeout: None,
        }
    }

    /// Bound every solver call issued through this driver.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ground `model` against `encoding`. The model is consumed.
    pub fn ground(
        &self,
        model: FactModel,
        encoding: EncodingId,
    ) -> Result<GroundedProgram<'s, S>, SymbiotaError> {
        let program = self.solver.ground(&model, encoding)?;
        Ok(GroundedProgram {
            solver: self.solver,
            program,
            encoding,
            timeout: self.timeout,
            history: vec![DriverState::Grounded],
        })
    }
}

/// A grounded program ready for solve requests.
pub struct GroundedProgram<'s, S: Solver> {
    solver: &'s S,
    program: S::Program,
    encoding: EncodingId,
    timeout: Option<Duration>,
    history: Vec<DriverState>,
}

impl<S: Solver> fmt::Debug for GroundedProgram<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroundedProgram")
            .field("solver", &self.solver.name())
            .field("encoding", &self.encoding)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl<S: Solver> GroundedProgram<'_, S> {
    #[must_use]
    pub fn encoding(&self) -> EncodingId {
        self.encoding
    }

    /// States traversed so far, in order.
    #[must_use]
    pub fn history(&self) -> &[DriverState] {
        &self.history
    }

    /// One optimal answer and its optimum.
    ///
    /// # Errors
    /// `Unsatisfiable` when the program has no answer.
    pub fn solve_one(&mut self) -> Result<SingleSolution, SymbiotaError> {
        let config = SolveConfig::single().with_timeout(self.timeout);
        self.history.push(DriverState::SingleSolved);
        let first = self.solver.solve(&self.program, &config)?.next();
        match first {
            Some(answer) => {
                let answer = answer?;
                let optimum = answer.costs.clone();
                Ok(SingleSolution { answer, optimum })
            }
            None => Err(SymbiotaError::Unsatisfiable {
                stage: DriverState::SingleSolved.to_string(),
            }),
        }
    }

    /// One answer of a non-optimizing encoding.
    ///
    /// # Errors
    /// `InvalidOption` for community-selection encodings, whose answers
    /// only mean something at the optimum.
    pub fn solve_plain(&mut self) -> Result<Answer, SymbiotaError> {
        if self.encoding.is_selection() {
            return Err(SymbiotaError::InvalidOption(format!(
                "{} must be solved to an optimum",
                self.encoding
            )));
        }
        let config = SolveConfig::plain().with_timeout(self.timeout);
        self.history.push(DriverState::SingleSolved);
        let first = self.solver.solve(&self.program, &config)?.next();
        match first {
            Some(answer) => answer,
            None => Err(SymbiotaError::Unsatisfiable {
                stage: self.encoding.to_string(),
            }),
        }
    }

    /// Facts holding in at least one optimal answer.
    pub fn solve_union(&mut self, bound: OptimumBound) -> Result<Retrieval<Answer>, SymbiotaError> {
        let config = SolveConfig::brave(bound)?.with_timeout(self.timeout);
        self.consequences(config, DriverState::UnionSolved)
    }

    /// Facts holding in every optimal answer.
    pub fn solve_intersection(
        &mut self,
        bound: OptimumBound,
    ) -> Result<Retrieval<Answer>, SymbiotaError> {
        let config = SolveConfig::cautious(bound)?.with_timeout(self.timeout);
        self.consequences(config, DriverState::IntersectionSolved)
    }

    /// Every optimal answer, up to `limit` (0 = unbounded).
    pub fn solve_all(
        &mut self,
        bound: OptimumBound,
        limit: usize,
    ) -> Result<Retrieval<Enumeration<'_>>, SymbiotaError> {
        let config = SolveConfig::enumerate(bound, limit)?.with_timeout(self.timeout);
        self.history.push(DriverState::Enumerated);
        let mut rest = self.solver.solve(&self.program, &config)?;
        match rest.next() {
            Some(first) => Ok(Retrieval::Found(Enumeration {
                first: Some(first?),
                rest,
            })),
            None => Ok(Retrieval::NoSolution {
                reason: no_solution_reason(DriverState::Enumerated, &config.bound),
            }),
        }
    }

    fn consequences(
        &mut self,
        config: SolveConfig,
        state: DriverState,
    ) -> Result<Retrieval<Answer>, SymbiotaError> {
        self.history.push(state);
        let first = self.solver.solve(&self.program, &config)?.next();
        match first {
            Some(answer) => Ok(Retrieval::Found(answer?)),
            None => Ok(Retrieval::NoSolution {
                reason: no_solution_reason(state, &config.bound),
            }),
        }
    }
}

fn no_solution_reason(state: DriverState, bound: &OptimumBound) -> String {
    match bound {
        OptimumBound::Search => format!("no answer exists ({state})"),
        OptimumBound::Exact(optimum) => {
            format!("no answer reaches optimum {optimum} ({state})")
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

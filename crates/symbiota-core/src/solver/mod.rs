//! # Solver Boundary
//!
//! Contract between the driver and any combinatorial solver.
//!
//! - `ground(facts, encoding) -> program`
//! - `solve(program, config) -> lazy sequence of answers`
//!
//! Configuration is a validated structure, never a free-form option string.
//! Two backends implement the contract:
//! - [`NativeSolver`]: embedded, deterministic, exhaustive
//! - [`ClingoSolver`]: the external `clingo` program

pub mod clingo;
pub mod native;

pub use clingo::ClingoSolver;
pub use native::NativeSolver;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::encoding::EncodingId;
use crate::model::FactModel;
use crate::types::{Fact, SymbiotaError};

// =============================================================================
// OPTIMUM
// =============================================================================

/// Ordered objective vector, highest priority first.
///
/// Community selection minimizes `[chosen organisms]` in soup mode and
/// `[chosen organisms, exchanges]` in minexch mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Optimum(pub Vec<i64>);

impl Optimum {
    #[must_use]
    pub fn new(values: Vec<i64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Optimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl FromStr for Optimum {
    type Err = SymbiotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|_| {
                    SymbiotaError::InvalidOption(format!("invalid optimum value '{s}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl Serialize for Optimum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Search heuristics profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProfile {
    /// Aggressive restarts; used for single answers and brave/cautious.
    Jumpy,
    /// Used for full enumeration.
    Handy,
    /// Solver default.
    Auto,
}

/// Answer-set consequence semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMode {
    /// Every answer is reported individually.
    None,
    /// Union over optimal answers.
    Brave,
    /// Intersection over optimal answers.
    Cautious,
}

/// Which optimum the solver reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimumBound {
    /// The solver finds the optimum itself.
    Search,
    /// Answers must not cost more than this vector.
    Exact(Optimum),
}

impl OptimumBound {
    #[must_use]
    pub fn from_optimum(optimum: Option<Optimum>) -> Self {
        optimum.map_or(Self::Search, Self::Exact)
    }
}

/// Validated configuration for one solve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveConfig {
    pub profile: SearchProfile,
    pub optimize: bool,
    pub enumeration: EnumMode,
    pub bound: OptimumBound,
    /// Maximum number of answers; 0 means all.
    pub limit: usize,
    pub timeout: Option<Duration>,
}

impl SolveConfig {
    /// Build and validate a configuration.
    ///
    /// # Errors
    /// Returns `InvalidOption` if:
    /// - an exact bound is given without optimization
    /// - brave or cautious semantics are capped by a limit
    pub fn new(
        profile: SearchProfile,
        optimize: bool,
        enumeration: EnumMode,
        bound: OptimumBound,
        limit: usize,
    ) -> Result<Self, SymbiotaError> {
        if !optimize && matches!(bound, OptimumBound::Exact(_)) {
            return Err(SymbiotaError::InvalidOption(
                "an optimum bound requires optimization".to_string(),
            ));
        }
        if enumeration != EnumMode::None && limit != 0 {
            return Err(SymbiotaError::InvalidOption(
                "brave and cautious reasoning consider every answer, limit must be 0".to_string(),
            ));
        }
        Ok(Self {
            profile,
            optimize,
            enumeration,
            bound,
            limit,
            timeout: None,
        })
    }

    /// One optimal answer.
    #[must_use]
    pub fn single() -> Self {
        Self {
            profile: SearchProfile::Jumpy,
            optimize: true,
            enumeration: EnumMode::None,
            bound: OptimumBound::Search,
            limit: 1,
            timeout: None,
        }
    }

    /// Union of the optimal answers.
    pub fn brave(bound: OptimumBound) -> Result<Self, SymbiotaError> {
        Self::new(SearchProfile::Jumpy, true, EnumMode::Brave, bound, 0)
    }

    /// Intersection of the optimal answers.
    pub fn cautious(bound: OptimumBound) -> Result<Self, SymbiotaError> {
        Self::new(SearchProfile::Jumpy, true, EnumMode::Cautious, bound, 0)
    }

    /// Every optimal answer, up to `limit` (0 = all).
    pub fn enumerate(bound: OptimumBound, limit: usize) -> Result<Self, SymbiotaError> {
        Self::new(SearchProfile::Handy, true, EnumMode::None, bound, limit)
    }

    /// One answer of a non-optimizing encoding.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            profile: SearchProfile::Auto,
            optimize: false,
            enumeration: EnumMode::None,
            bound: OptimumBound::Search,
            limit: 1,
            timeout: None,
        }
    }

    /// Attach a per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// ANSWERS
// =============================================================================

/// One solver answer: shown facts plus its cost vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub facts: BTreeSet<Fact>,
    pub costs: Optimum,
}

impl Answer {
    #[must_use]
    pub fn new(facts: BTreeSet<Fact>, costs: Optimum) -> Self {
        Self { facts, costs }
    }

    /// Facts shared by `self` and `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            facts: self.facts.intersection(&other.facts).cloned().collect(),
            costs: self.costs.clone(),
        }
    }

    /// Facts of `self` plus those of `other`.
    #[must_use]
    pub fn unite(&self, other: &Self) -> Self {
        Self {
            facts: self.facts.union(&other.facts).cloned().collect(),
            costs: self.costs.clone(),
        }
    }
}

/// Lazy answer sequence borrowed from a grounded program.
pub type Solutions<'a> = Box<dyn Iterator<Item = Result<Answer, SymbiotaError>> + 'a>;

// =============================================================================
// SOLVER TRAIT
// =============================================================================

/// A combinatorial solver that can ground and solve encodings.
pub trait Solver {
    /// Grounded form of a fact model under one encoding.
    type Program;

    /// Short backend name for reports.
    fn name(&self) -> &'static str;

    /// Ground a model against an encoding. One-shot and deterministic.
    fn ground(&self, model: &FactModel, encoding: EncodingId) -> Result<Self::Program, SymbiotaError>;

    /// Solve a grounded program.
    ///
    /// Zero answers is an empty sequence, not an error.
    fn solve<'a>(
        &'a self,
        program: &'a Self::Program,
        config: &SolveConfig,
    ) -> Result<Solutions<'a>, SymbiotaError>;
}

// =============================================================================
// DEADLINE
// =============================================================================

/// Wall-clock budget for one solver call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    /// Start counting now. `None` never expires.
    #[must_use]
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    #[must_use]
    pub fn expired(&self) -> bool {
        self.limit.is_some_and(|l| self.start.elapsed() >= l)
    }

    /// Time left, if bounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|l| l.saturating_sub(self.start.elapsed()))
    }

    /// Fail with `SolverTimeout` once expired.
    pub fn check(&self, stage: &str) -> Result<(), SymbiotaError> {
        if self.expired() {
            return Err(self.timeout_error(stage));
        }
        Ok(())
    }

    /// The error reported when this deadline elapses.
    #[must_use]
    pub fn timeout_error(&self, stage: &str) -> SymbiotaError {
        SymbiotaError::SolverTimeout {
            stage: stage.to_string(),
            timeout_ms: self.limit.map_or(0, |l| l.as_millis() as u64),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

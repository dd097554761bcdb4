//! # symbiota-core
//!
//! The community-selection and scope-query engine for Symbiota - THE LOGIC.
//!
//! This crate selects minimal microbial communities able to produce target
//! metabolites from seed nutrients, and computes metabolic scopes for a host
//! alone and for host-symbiont communities.
//!
//! ## Pipeline
//!
//! instance builder -> encoding selector -> solver driver (ground once, solve
//! per retrieval mode) -> result extractor -> result aggregator -> record.
//!
//! ## Architectural Constraints
//!
//! - Deterministic: ordered collections only, no floats, no randomness
//! - Quiet: no logging; skipped inputs are returned as data
//! - Synchronous: solver calls on one grounded program are serialized
//! - Replaceable solver: the embedded [`NativeSolver`] and the external
//!   [`ClingoSolver`] both implement [`Solver`]

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod builder;
pub mod driver;
pub mod encoding;
pub mod extract;
pub mod formats;
pub mod model;
pub mod primitives;
pub mod query;
pub mod record;
pub mod sbml;
pub mod solver;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use model::FactModel;
pub use types::{CompoundRole, Fact, NetworkReader, SymbiotaError, Term};

// =============================================================================
// RE-EXPORTS: Instance Building
// =============================================================================

pub use builder::{
    BuildOutcome, BuildRequest, Instance, InstanceBuilder, InstanceInputs, SkippedOrganism,
};
pub use sbml::SbmlReader;

// =============================================================================
// RE-EXPORTS: Solving
// =============================================================================

pub use driver::{
    DriverState, Enumeration, GroundedProgram, Retrieval, RetrievalModes, SingleSolution,
    SolverDriver,
};
pub use encoding::{EncodingCatalog, EncodingId, TopologyMode, select, select_for};
pub use solver::{
    Answer, ClingoSolver, EnumMode, NativeSolver, Optimum, OptimumBound, SearchProfile,
    SolveConfig, Solver,
};

// =============================================================================
// RE-EXPORTS: Results
// =============================================================================

pub use aggregate::SymbiontRoles;
pub use extract::{
    AnswerAtom, DeadendsView, ExchangeMap, FocusView, MincomView, ResultView, ScopesView, extract,
};
pub use query::{
    FocusRequest, InstanceReport, MincomRequest, Query, QueryOutcome, QueryResult, QueryRunner,
    QueryType, build_instance,
};
pub use record::{DeadendsRecord, FocusRecord, MincomRecord, ScopesRecord};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{read_instance, write_instance};

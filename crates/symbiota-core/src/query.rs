//! # Query Module
//!
//! End-to-end queries over a community instance.
//!
//! Every query follows the same pipeline:
//! instance builder -> encoding selector -> solver driver -> extractor ->
//! aggregator -> record.
//!
//! - `mincom`: minimal communities in up to four retrieval modes
//! - `scopes`: host-alone versus community producibility
//! - `focus`: per-organism production alone and in the community
//! - `deadends`: metabolites without producer or consumer
//!
//! Queries do not log. Skipped organisms and other diagnostics are returned
//! in the [`QueryOutcome`] for the caller to report.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::aggregate::SymbiontRoles;
use crate::builder::{
    BuildOutcome, BuildRequest, Instance, InstanceBuilder, InstanceInputs, SkippedOrganism,
};
use crate::driver::{DriverState, Retrieval, RetrievalModes, SolverDriver};
use crate::encoding::{EncodingId, TopologyMode, select_for};
use crate::extract::{DeadendsView, FocusView, MincomView, ScopesView, extract};
use crate::primitives::{INSTANCE_EXTENSION, TEMP_PREFIX};
use crate::record::{
    DeadendsRecord, EnumerationRecord, FocusRecord, IntersectionRecord, MincomRecord, RolesRecord,
    ScopesRecord, UnionRecord,
};
use crate::solver::{Optimum, OptimumBound, Solver};
use crate::types::{NetworkReader, SymbiotaError};

// =============================================================================
// REQUESTS
// =============================================================================

/// Community selection request.
#[derive(Debug, Clone)]
pub struct MincomRequest {
    pub inputs: InstanceInputs,
    pub mode: TopologyMode,
    pub modes: RetrievalModes,
    /// Cap on enumerated communities; 0 means all.
    pub limit: usize,
}

/// Focus request. Focus always builds from network files.
#[derive(Debug, Clone, Default)]
pub struct FocusRequest {
    pub seeds: PathBuf,
    pub symbionts: PathBuf,
    /// Organisms to report, by file stem.
    pub organisms: Vec<String>,
    /// Report every symbiont.
    pub all: bool,
}

/// Query operation types.
#[derive(Debug, Clone)]
pub enum QueryType {
    Mincom(MincomRequest),
    Scopes(InstanceInputs),
    Focus(FocusRequest),
    Deadends(InstanceInputs),
}

/// A structured query with optional timeout.
#[derive(Debug, Clone)]
pub struct Query {
    /// The type of query operation.
    pub query_type: QueryType,
    /// Per solver call timeout in milliseconds. Overrides the runner default.
    pub timeout_ms: Option<u64>,
}

impl Query {
    /// Create a new query with no timeout.
    #[must_use]
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            timeout_ms: None,
        }
    }

    /// Create a new query with a timeout.
    #[must_use]
    pub fn with_timeout(query_type: QueryType, timeout_ms: u64) -> Self {
        Self {
            query_type,
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Short name of the query kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.query_type {
            QueryType::Mincom(_) => "mincom",
            QueryType::Scopes(_) => "scopes",
            QueryType::Focus(_) => "focus",
            QueryType::Deadends(_) => "deadends",
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// A record together with what it took to compute it.
#[derive(Debug)]
pub struct QueryOutcome<T> {
    pub record: T,
    pub encoding: EncodingId,
    /// Symbionts merged into the instance.
    pub loaded: Vec<String>,
    /// Symbionts left out because they could not be read.
    pub skipped: Vec<SkippedOrganism>,
    /// Driver states traversed.
    pub history: Vec<DriverState>,
}

/// Result of [`QueryRunner::run`].
#[derive(Debug)]
pub enum QueryResult {
    Mincom(QueryOutcome<MincomRecord>),
    Scopes(QueryOutcome<ScopesRecord>),
    Focus(QueryOutcome<FocusRecord>),
    Deadends(QueryOutcome<DeadendsRecord>),
}

impl QueryResult {
    /// Render the record as pretty JSON.
    pub fn to_json(&self) -> Result<String, SymbiotaError> {
        match self {
            Self::Mincom(o) => render(&o.record),
            Self::Scopes(o) => render(&o.record),
            Self::Focus(o) => render(&o.record),
            Self::Deadends(o) => render(&o.record),
        }
    }

    #[must_use]
    pub fn skipped(&self) -> &[SkippedOrganism] {
        match self {
            Self::Mincom(o) => &o.skipped,
            Self::Scopes(o) => &o.skipped,
            Self::Focus(o) => &o.skipped,
            Self::Deadends(o) => &o.skipped,
        }
    }
}

fn render<T: Serialize>(record: &T) -> Result<String, SymbiotaError> {
    serde_json::to_string_pretty(record)
        .map_err(|e| SymbiotaError::Io(format!("cannot serialize result: {e}")))
}

/// A persisted instance.
#[derive(Debug)]
pub struct InstanceReport {
    /// Absolute path of the instance file.
    pub path: PathBuf,
    pub facts: usize,
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedOrganism>,
}

/// Build an instance from network files and persist it.
///
/// Without `output` the instance goes to a kept temporary `.lp` file.
pub fn build_instance<R: NetworkReader>(
    builder: &InstanceBuilder<R>,
    request: &BuildRequest,
    output: Option<&Path>,
) -> Result<InstanceReport, SymbiotaError> {
    let BuildOutcome {
        model,
        loaded,
        skipped,
    } = builder.build(request)?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let (_, path) = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(&format!(".{INSTANCE_EXTENSION}"))
                .tempfile()
                .map_err(|e| SymbiotaError::Io(format!("temporary instance: {e}")))?
                .keep()
                .map_err(|e| SymbiotaError::Io(format!("temporary instance: {}", e.error)))?;
            path
        }
    };

    let facts = model.len();
    let instance = Instance::create(&path, model)?;
    let path = fs::canonicalize(instance.path()).map_err(|e| SymbiotaError::io(&path, &e))?;

    Ok(InstanceReport {
        path,
        facts,
        loaded,
        skipped,
    })
}

// =============================================================================
// RUNNER
// =============================================================================

/// Runs queries with one solver and one instance builder.
pub struct QueryRunner<'s, S: Solver, R: NetworkReader> {
    solver: &'s S,
    builder: InstanceBuilder<R>,
    timeout: Option<Duration>,
}

impl<'s, S: Solver, R: NetworkReader> QueryRunner<'s, S, R> {
    #[must_use]
    pub fn new(solver: &'s S, builder: InstanceBuilder<R>) -> Self {
        Self {
            solver,
            builder,
            timeout: None,
        }
    }

    /// Default timeout of every solver call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn builder(&self) -> &InstanceBuilder<R> {
        &self.builder
    }

    /// Execute a query.
    pub fn run(&self, query: &Query) -> Result<QueryResult, SymbiotaError> {
        let timeout = query.timeout_ms.map(Duration::from_millis).or(self.timeout);
        match &query.query_type {
            QueryType::Mincom(request) => self.mincom_with(request, timeout).map(QueryResult::Mincom),
            QueryType::Scopes(inputs) => self.scopes_with(inputs, timeout).map(QueryResult::Scopes),
            QueryType::Focus(request) => self.focus_with(request, timeout).map(QueryResult::Focus),
            QueryType::Deadends(inputs) => {
                self.deadends_with(inputs, timeout).map(QueryResult::Deadends)
            }
        }
    }

    pub fn mincom(&self, request: &MincomRequest) -> Result<QueryOutcome<MincomRecord>, SymbiotaError> {
        self.mincom_with(request, self.timeout)
    }

    pub fn scopes(&self, inputs: &InstanceInputs) -> Result<QueryOutcome<ScopesRecord>, SymbiotaError> {
        self.scopes_with(inputs, self.timeout)
    }

    pub fn focus(&self, request: &FocusRequest) -> Result<QueryOutcome<FocusRecord>, SymbiotaError> {
        self.focus_with(request, self.timeout)
    }

    pub fn deadends(
        &self,
        inputs: &InstanceInputs,
    ) -> Result<QueryOutcome<DeadendsRecord>, SymbiotaError> {
        self.deadends_with(inputs, self.timeout)
    }

    // -------------------------------------------------------------------------
    // mincom
    // -------------------------------------------------------------------------

    fn mincom_with(
        &self,
        request: &MincomRequest,
        timeout: Option<Duration>,
    ) -> Result<QueryOutcome<MincomRecord>, SymbiotaError> {
        let inputs = &request.inputs;
        if inputs.instance.is_none() && inputs.targets.is_none() {
            return Err(SymbiotaError::MissingInput(
                "targets are required with symbiont networks".to_string(),
            ));
        }

        let modes = request.modes.or_default();
        let BuildOutcome {
            model,
            loaded,
            skipped,
        } = self.builder.resolve(inputs, true)?;
        let encoding = select_for(request.mode, &model);

        let driver = SolverDriver::new(self.solver).with_timeout(timeout);
        let mut program = driver.ground(model, encoding)?;
        let mut record = MincomRecord::default();

        let single = match program.solve_one() {
            Ok(single) => single,
            Err(SymbiotaError::Unsatisfiable { stage }) if !modes.single => {
                for mode in requested(&modes) {
                    record
                        .no_solution
                        .insert(mode.to_string(), format!("no answer exists ({stage})"));
                }
                return Ok(QueryOutcome {
                    record,
                    encoding,
                    loaded,
                    skipped,
                    history: program.history().to_vec(),
                });
            }
            Err(e) => return Err(e),
        };

        let optimum = single.optimum.clone();
        let bound = OptimumBound::Exact(optimum.clone());
        if modes.single {
            record.single = Some(extract::<MincomView>(&single.answer).into());
        }

        let mut union_view = None;
        if modes.union {
            match program.solve_union(bound.clone())? {
                Retrieval::Found(answer) => {
                    let view = extract::<MincomView>(&answer);
                    let score = score_or(&view.costs, &optimum);
                    record.union = Some(UnionRecord::new(view.clone(), score));
                    union_view = Some(view);
                }
                Retrieval::NoSolution { reason } => {
                    record.no_solution.insert("union".to_string(), reason);
                }
            }
        }

        let mut inter_view = None;
        if modes.intersection {
            match program.solve_intersection(bound.clone())? {
                Retrieval::Found(answer) => {
                    let view = extract::<MincomView>(&answer);
                    let score = score_or(&view.costs, &optimum);
                    record.intersection = Some(IntersectionRecord::new(view.clone(), score));
                    inter_view = Some(view);
                }
                Retrieval::NoSolution { reason } => {
                    record.no_solution.insert("intersection".to_string(), reason);
                }
            }
        }

        if let (Some(union), Some(inter)) = (&union_view, &inter_view) {
            record.roles = Some(RolesRecord::from(SymbiontRoles::derive(union, inter)));
        }

        if modes.enumeration {
            match program.solve_all(bound, request.limit)? {
                Retrieval::Found(answers) => {
                    let mut enumeration = EnumerationRecord::default();
                    for answer in answers {
                        enumeration.push(extract::<MincomView>(&answer?));
                    }
                    record.enumeration = Some(enumeration);
                }
                Retrieval::NoSolution { reason } => {
                    record.no_solution.insert("enumeration".to_string(), reason);
                }
            }
        }

        Ok(QueryOutcome {
            record,
            encoding,
            loaded,
            skipped,
            history: program.history().to_vec(),
        })
    }

    // -------------------------------------------------------------------------
    // scopes / focus / deadends
    // -------------------------------------------------------------------------

    fn scopes_with(
        &self,
        inputs: &InstanceInputs,
        timeout: Option<Duration>,
    ) -> Result<QueryOutcome<ScopesRecord>, SymbiotaError> {
        let BuildOutcome {
            model,
            loaded,
            skipped,
        } = self.builder.resolve(inputs, true)?;
        let host_present = model.has_draft();
        let from_instance = inputs.instance.is_some();

        let encoding = EncodingId::Scopes;
        let mut program = SolverDriver::new(self.solver)
            .with_timeout(timeout)
            .ground(model, encoding)?;
        let answer = program.solve_plain()?;
        let record = ScopesRecord::new(extract::<ScopesView>(&answer), host_present, from_instance);

        Ok(QueryOutcome {
            record,
            encoding,
            loaded,
            skipped,
            history: program.history().to_vec(),
        })
    }

    fn focus_with(
        &self,
        request: &FocusRequest,
        timeout: Option<Duration>,
    ) -> Result<QueryOutcome<FocusRecord>, SymbiotaError> {
        let BuildOutcome {
            mut model,
            loaded,
            skipped,
        } = self.builder.build(&BuildRequest {
            host: None,
            symbionts: request.symbionts.clone(),
            seeds: Some(request.seeds.clone()),
            targets: None,
        })?;

        let known: BTreeSet<&str> = loaded.iter().map(String::as_str).collect();
        let wanted: Vec<String> = if request.all {
            loaded.clone()
        } else {
            request.organisms.clone()
        };
        let (focused, ignored): (Vec<String>, Vec<String>) = wanted
            .into_iter()
            .partition(|org| known.contains(org.as_str()));
        if focused.is_empty() {
            return Err(SymbiotaError::InvalidOption(format!(
                "none of {:?} is a symbiont of {}; names are file stems",
                request.organisms,
                request.symbionts.display()
            )));
        }
        model.add_focus(focused.iter().map(String::as_str));

        let encoding = EncodingId::Focus;
        let mut program = SolverDriver::new(self.solver)
            .with_timeout(timeout)
            .ground(model, encoding)?;
        let answer = program.solve_plain()?;
        let record = FocusRecord::new(&extract::<FocusView>(&answer), &focused, ignored);

        Ok(QueryOutcome {
            record,
            encoding,
            loaded,
            skipped,
            history: program.history().to_vec(),
        })
    }

    fn deadends_with(
        &self,
        inputs: &InstanceInputs,
        timeout: Option<Duration>,
    ) -> Result<QueryOutcome<DeadendsRecord>, SymbiotaError> {
        let BuildOutcome {
            model,
            loaded,
            skipped,
        } = self.builder.resolve(inputs, false)?;

        let encoding = EncodingId::Deadends;
        let mut program = SolverDriver::new(self.solver)
            .with_timeout(timeout)
            .ground(model, encoding)?;
        let answer = program.solve_plain()?;

        Ok(QueryOutcome {
            record: extract::<DeadendsView>(&answer).into(),
            encoding,
            loaded,
            skipped,
            history: program.history().to_vec(),
        })
    }
}

fn requested(modes: &RetrievalModes) -> Vec<DriverState> {
    let mut states = Vec::new();
    if modes.union {
        states.push(DriverState::UnionSolved);
    }
    if modes.intersection {
        states.push(DriverState::IntersectionSolved);
    }
    if modes.enumeration {
        states.push(DriverState::Enumerated);
    }
    states
}

fn score_or(costs: &Optimum, optimum: &Optimum) -> Optimum {
    if costs.is_empty() {
        optimum.clone()
    } else {
        costs.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

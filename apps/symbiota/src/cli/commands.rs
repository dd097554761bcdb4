//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use symbiota_core::{
    BuildRequest, ClingoSolver, EncodingCatalog, FocusRequest, InstanceBuilder, InstanceInputs,
    MincomRequest, NativeSolver, Query, QueryResult, QueryRunner, QueryType, RetrievalModes,
    SbmlReader, SymbiotaError, TopologyMode, build_instance,
};

use crate::config::{Backend, Settings};
use crate::output::{log_skipped, log_summary, write_json};

// =============================================================================
// SHARED PLUMBING
// =============================================================================

fn instance_builder(settings: &Settings) -> InstanceBuilder<SbmlReader> {
    let builder = InstanceBuilder::new(SbmlReader::new());
    match settings.threads {
        Some(threads) => builder.with_concurrency(threads),
        None => builder,
    }
}

fn clingo_solver(settings: &Settings) -> Result<ClingoSolver, SymbiotaError> {
    let catalog = match &settings.encodings {
        Some(dir) => EncodingCatalog::from_dir(dir)?,
        None => EncodingCatalog::embedded(),
    };
    let solver = ClingoSolver::new(&settings.clingo)
        .with_catalog(catalog)
        .with_ground_timeout(settings.timeout);
    let version = solver.version()?;
    tracing::debug!("Using {}", version);
    Ok(solver)
}

/// Run a query on the configured backend.
pub fn run_query(settings: &Settings, query: &Query) -> Result<QueryResult, SymbiotaError> {
    let builder = instance_builder(settings);
    tracing::info!(
        query = query.name(),
        backend = %settings.backend,
        threads = builder.concurrency(),
        "Running query"
    );

    let started = Instant::now();
    let result = match settings.backend {
        Backend::Native => {
            let solver = NativeSolver::new();
            QueryRunner::new(&solver, builder)
                .with_timeout(settings.timeout)
                .run(query)
        }
        Backend::Clingo => {
            let solver = clingo_solver(settings)?;
            QueryRunner::new(&solver, builder)
                .with_timeout(settings.timeout)
                .run(query)
        }
    }?;
    tracing::info!("Query {} took {:.2?}", query.name(), started.elapsed());

    log_skipped(result.skipped());
    log_summary(&result);
    Ok(result)
}

fn run_and_write(
    settings: &Settings,
    query: &Query,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    let result = run_query(settings, query)?;
    write_json(&result.to_json()?, output)
}

// =============================================================================
// INSTANCE COMMAND
// =============================================================================

/// Build an instance from SBML networks and persist it.
pub fn cmd_instance(
    settings: &Settings,
    host: Option<PathBuf>,
    bacteria: PathBuf,
    seeds: Option<PathBuf>,
    targets: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    let builder = instance_builder(settings);
    let request = BuildRequest {
        host,
        symbionts: bacteria,
        seeds,
        targets,
    };

    let started = Instant::now();
    let report = build_instance(&builder, &request, output)?;
    log_skipped(&report.skipped);
    tracing::info!(
        symbionts = report.loaded.len(),
        facts = report.facts,
        "Instance built in {:.2?}",
        started.elapsed()
    );
    tracing::info!("Instance written to {}", report.path.display());

    println!("{}", report.path.display());
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Select minimal communities.
pub fn cmd_mincom(
    settings: &Settings,
    inputs: InstanceInputs,
    topology: TopologyMode,
    modes: RetrievalModes,
    limit: usize,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    if limit > 0 && !modes.enumeration {
        tracing::warn!("--limit only applies with --enumeration");
    }
    let query = Query::new(QueryType::Mincom(MincomRequest {
        inputs,
        mode: topology,
        modes,
        limit,
    }));
    run_and_write(settings, &query, output)
}

/// Compare host-alone and community scopes.
pub fn cmd_scopes(
    settings: &Settings,
    inputs: InstanceInputs,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    run_and_write(settings, &Query::new(QueryType::Scopes(inputs)), output)
}

/// Report per-organism production alone and within the community.
pub fn cmd_focus(
    settings: &Settings,
    bacteria: PathBuf,
    seeds: PathBuf,
    focus: Vec<String>,
    all: bool,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    if focus.is_empty() && !all {
        return Err(SymbiotaError::MissingInput(
            "give organisms with --focus or use --all".to_string(),
        ));
    }
    let query = Query::new(QueryType::Focus(FocusRequest {
        seeds,
        symbionts: bacteria,
        organisms: focus,
        all,
    }));
    run_and_write(settings, &query, output)
}

/// List dead-end metabolites.
pub fn cmd_deadends(
    settings: &Settings,
    inputs: InstanceInputs,
    output: Option<&Path>,
) -> Result<(), SymbiotaError> {
    run_and_write(settings, &Query::new(QueryType::Deadends(inputs)), output)
}

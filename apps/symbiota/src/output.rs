//! # Result Sink
//!
//! Writes records as pretty JSON and logs run diagnostics.

use std::path::{Path, PathBuf};

use symbiota_core::{
    DeadendsRecord, FocusRecord, MincomRecord, QueryResult, ScopesRecord, SkippedOrganism,
    SymbiotaError,
};

/// Validate an output path: its parent directory must exist.
///
/// Returns the path with a canonical parent and the original file name.
pub fn validate_output_path(path: &Path) -> Result<PathBuf, SymbiotaError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent
        .canonicalize()
        .map_err(|_| SymbiotaError::not_found(parent, "Output directory"))?;
    if !canonical_parent.is_dir() {
        return Err(SymbiotaError::InvalidOption(format!(
            "output directory '{}' is not a directory",
            parent.display()
        )));
    }

    let filename = path.file_name().ok_or_else(|| {
        SymbiotaError::InvalidOption(format!("output path '{}' has no file name", path.display()))
    })?;
    Ok(canonical_parent.join(filename))
}

/// Write rendered JSON to `output`, or to stdout without one.
pub fn write_json(json: &str, output: Option<&Path>) -> Result<(), SymbiotaError> {
    match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, format!("{json}\n")).map_err(|e| SymbiotaError::io(&path, &e))?;
            tracing::info!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Log every symbiont left out of the instance.
pub fn log_skipped(skipped: &[SkippedOrganism]) {
    for s in skipped {
        tracing::warn!(
            organism = %s.organism,
            path = %s.path.display(),
            "Skipping symbiont: {}",
            s.error
        );
    }
}

/// Log a short summary of a query result.
pub fn log_summary(result: &QueryResult) {
    match result {
        QueryResult::Mincom(o) => {
            tracing::info!(encoding = %o.encoding, symbionts = o.loaded.len(), "Community selection done");
            summarize_mincom(&o.record);
        }
        QueryResult::Scopes(o) => {
            tracing::info!(encoding = %o.encoding, symbionts = o.loaded.len(), "Scopes done");
            summarize_scopes(&o.record);
        }
        QueryResult::Focus(o) => {
            tracing::info!(encoding = %o.encoding, symbionts = o.loaded.len(), "Focus done");
            summarize_focus(&o.record);
        }
        QueryResult::Deadends(o) => {
            tracing::info!(encoding = %o.encoding, symbionts = o.loaded.len(), "Dead-ends done");
            summarize_deadends(&o.record);
        }
    }
}

fn summarize_mincom(record: &MincomRecord) {
    if let Some(single) = &record.single {
        tracing::info!(
            "Optimal community ({}): {} symbionts {:?}, {} exchanges",
            single.score_optimum,
            single.bacteria.len(),
            single.bacteria,
            single.exchanged.exchange_count()
        );
        if !single.newly_prod.is_empty() {
            tracing::info!("Newly producible targets: {:?}", single.newly_prod);
        }
        if !single.still_unprod.is_empty() {
            tracing::info!("Still unproducible targets: {:?}", single.still_unprod);
        }
    }
    if let Some(union) = &record.union {
        tracing::info!("Union of optimal communities: {:?}", union.union_bacteria);
    }
    if let Some(inter) = &record.intersection {
        tracing::info!("Intersection of optimal communities: {:?}", inter.inter_bacteria);
    }
    if let Some(roles) = &record.roles {
        tracing::info!(
            "Key species: {}, essential: {}, alternative: {}",
            roles.key_species.len(),
            roles.essential_symbionts.len(),
            roles.alternative_symbionts.len()
        );
    }
    if let Some(enumeration) = &record.enumeration {
        tracing::info!("Enumerated {} optimal communities", enumeration.len());
    }
    for (mode, reason) in &record.no_solution {
        tracing::warn!(mode = %mode, "No solution: {}", reason);
    }
}

fn summarize_scopes(record: &ScopesRecord) {
    if let Some(scope) = &record.host_scope {
        tracing::info!("Host scope: {} metabolites", scope.len());
    }
    if let Some(scope) = &record.comhost_scope {
        tracing::info!("Community adds {} metabolites to the host", scope.len());
    }
    if let Some(scope) = &record.com_scope {
        tracing::info!("Community scope gain: {} metabolites", scope.len());
    }
    tracing::info!(
        "Targets producible by the community: {}, unproducible: {}",
        record.com_prodtargets.len(),
        record.com_unprodtargets.len()
    );
}

fn summarize_focus(record: &FocusRecord) {
    for name in &record.ignored {
        tracing::warn!(organism = %name, "Not a symbiont of the community, ignored");
    }
    for (organism, entry) in &record.organisms {
        tracing::info!(
            organism = %organism,
            "Produces {} alone, {} in community, gains {}",
            entry.produced_alone.len(),
            entry.produced_in_community.len(),
            entry.community_metabolic_gain.len()
        );
    }
}

fn summarize_deadends(record: &DeadendsRecord) {
    tracing::info!(
        "Dead-ends: {} without producer, {} without consumer",
        record.deadend_np.len(),
        record.deadend_nc.len()
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_json_with_trailing_newline() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("out.json");
        write_json("{}", Some(&path)).expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{}\n");
    }

    #[test]
    fn missing_output_directory_is_not_found() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("absent").join("out.json");
        let err = validate_output_path(&path).expect_err("must fail");
        assert!(matches!(err, SymbiotaError::NotFound { .. }));
    }

    #[test]
    fn bare_file_name_resolves_against_working_directory() {
        let path = validate_output_path(Path::new("out.json")).expect("validate");
        assert!(path.is_absolute());
        assert!(path.ends_with("out.json"));
    }
}

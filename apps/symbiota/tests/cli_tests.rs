//! Integration tests for command parsing and in-process command execution.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::{Path, PathBuf};

use clap::Parser;
use symbiota::cli::{Cli, Commands, cmd_focus, cmd_instance, cmd_mincom, cmd_scopes, execute};
use symbiota::config::{Backend, Settings};
use symbiota_core::{InstanceInputs, RetrievalModes, SymbiotaError, TopologyMode};

fn toy() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../crates/symbiota-core/tests/fixtures/toy")
}

fn hosted() -> InstanceInputs {
    InstanceInputs {
        instance: None,
        host: Some(toy().join("orgA.xml")),
        symbionts: Some(toy().join("symbionts")),
        seeds: Some(toy().join("seeds.xml")),
        targets: Some(toy().join("targets_A.xml")),
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// PARSING TESTS
// =============================================================================

#[test]
fn test_parse_mincom_flags() {
    let cli = Cli::try_parse_from([
        "symbiota",
        "-q",
        "--solver",
        "clingo",
        "mincom",
        "-a",
        "community.lp",
        "-o",
        "minexch",
        "--union",
        "--intersection",
    ])
    .unwrap();

    assert!(cli.quiet);
    assert_eq!(cli.solver.as_deref(), Some("clingo"));
    match cli.command {
        Commands::Mincom {
            inputs,
            topology,
            modes,
            limit,
            output,
        } => {
            assert_eq!(inputs.instance, Some(PathBuf::from("community.lp")));
            assert_eq!(topology, TopologyMode::Minexch);
            assert!(modes.union && modes.intersection);
            assert!(!modes.optsol && !modes.enumeration);
            assert_eq!(limit, 0);
            assert!(output.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_rejects_unknown_topology() {
    let result = Cli::try_parse_from(["symbiota", "mincom", "-o", "pool"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_focus_list() {
    let cli = Cli::try_parse_from([
        "symbiota", "focus", "-b", "dir", "-s", "seeds.xml", "-f", "orgB1,orgB2",
    ])
    .unwrap();
    match cli.command {
        Commands::Focus { focus, all, .. } => {
            assert_eq!(focus, vec!["orgB1", "orgB2"]);
            assert!(!all);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_settings_from_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("symbiota.toml");
    std::fs::write(&config, "[solver]\nbackend = \"clingo\"\ntimeout_secs = 5\n").unwrap();

    let cli = Cli::try_parse_from([
        "symbiota",
        "--config",
        config.to_str().unwrap(),
        "--threads",
        "2",
        "deadends",
        "-b",
        "dir",
    ])
    .unwrap();
    let settings = cli.settings().unwrap();
    assert_eq!(settings.backend, Backend::Clingo);
    assert_eq!(settings.timeout, Some(std::time::Duration::from_secs(5)));
    assert_eq!(settings.threads, Some(2));
}

#[test]
fn test_missing_config_file_is_not_found() {
    let cli = Cli::try_parse_from([
        "symbiota",
        "--config",
        "/nonexistent/symbiota.toml",
        "deadends",
        "-b",
        "dir",
    ])
    .unwrap();
    assert!(matches!(
        cli.settings(),
        Err(SymbiotaError::NotFound { .. })
    ));
}

// =============================================================================
// COMMAND TESTS
// =============================================================================

#[test]
fn test_mincom_writes_json_record() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("mincom.json");
    let modes = RetrievalModes {
        single: true,
        union: true,
        intersection: true,
        enumeration: false,
    };

    cmd_mincom(
        &Settings::default(),
        hosted(),
        TopologyMode::Minexch,
        modes,
        0,
        Some(&out),
    )
    .unwrap();

    let json = read_json(&out);
    assert_eq!(json["bacteria"], serde_json::json!(["orgB3"]));
    assert_eq!(json["score_optimum"], serde_json::json!("1,1"));
    assert_eq!(
        json["exchanged"],
        serde_json::json!([{ "from": "orgB3", "to": "host_metab_mod", "what": ["e"] }])
    );
    assert_eq!(json["essential_symbionts"], serde_json::json!(["orgB3"]));
    assert!(json.get("enum_bacteria").is_none());
}

#[test]
fn test_instance_then_scopes() {
    let dir = tempfile::TempDir::new().unwrap();
    let instance = dir.path().join("toy.lp");
    cmd_instance(
        &Settings::default(),
        Some(toy().join("orgA.xml")),
        toy().join("symbionts"),
        Some(toy().join("seeds.xml")),
        Some(toy().join("targets_A.xml")),
        Some(&instance),
    )
    .unwrap();
    assert!(instance.is_file());

    let out = dir.path().join("scopes.json");
    cmd_scopes(
        &Settings::default(),
        InstanceInputs {
            instance: Some(instance),
            ..InstanceInputs::default()
        },
        Some(&out),
    )
    .unwrap();

    let json = read_json(&out);
    assert_eq!(json["host_unprodtargets"], serde_json::json!(["f"]));
    assert_eq!(json["com_prodtargets"], serde_json::json!(["f"]));
    assert!(json.get("com_scope").is_some());
}

#[test]
fn test_focus_requires_organisms() {
    let err = cmd_focus(
        &Settings::default(),
        toy().join("symbionts"),
        toy().join("seeds.xml"),
        Vec::new(),
        false,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, SymbiotaError::MissingInput(_)));
}

#[test]
fn test_execute_deadends_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("deadends.json");
    let cli = Cli::try_parse_from([
        "symbiota",
        "-q",
        "--solver",
        "native",
        "deadends",
        "-m",
        toy().join("orgA.xml").to_str().unwrap(),
        "-b",
        toy().join("symbionts").to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();

    execute(cli).unwrap();
    let json = read_json(&out);
    assert_eq!(json["deadend_np"], serde_json::json!(["a", "b"]));
    assert_eq!(json["deadend_nc"], serde_json::json!(["f"]));
}

#[test]
fn test_execute_unknown_backend_fails() {
    let cli = Cli::try_parse_from([
        "symbiota",
        "--solver",
        "gurobi",
        "deadends",
        "-b",
        "dir",
    ])
    .unwrap();
    assert!(matches!(execute(cli), Err(SymbiotaError::InvalidOption(_))));
}

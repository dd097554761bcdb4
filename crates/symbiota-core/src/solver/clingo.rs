//! # Clingo Backend
//!
//! Drives the external `clingo` program.
//!
//! - Grounding: facts and encoding are written to scoped temporary files,
//!   `clingo --mode=gringo` produces the grounded program, which is kept in a
//!   temporary file owned by the returned [`ClingoProgram`]
//! - Solving: `clingo --mode=clasp --outf=2` on the grounded program; the
//!   JSON report is decoded into answers
//!
//! Every temporary file is removed when its owner is dropped, including on
//! error and timeout paths. A child process that outlives its deadline is
//! killed.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tempfile::{Builder, NamedTempFile, TempPath};

use crate::encoding::{EncodingCatalog, EncodingId};
use crate::formats::{parse_atom, render_instance};
use crate::model::FactModel;
use crate::primitives::{INSTANCE_EXTENSION, TEMP_PREFIX};
use crate::solver::{
    Answer, Deadline, EnumMode, Optimum, OptimumBound, SearchProfile, SolveConfig, Solutions,
    Solver,
};
use crate::types::SymbiotaError;

/// Poll interval while waiting for the child process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit codes clasp uses for completed searches (unknown, sat, unsat, optimum).
const CLASP_OK_CODES: [i32; 4] = [0, 10, 20, 30];

// =============================================================================
// SOLVER
// =============================================================================

/// External process backend.
#[derive(Debug, Clone)]
pub struct ClingoSolver {
    program: PathBuf,
    catalog: EncodingCatalog,
    ground_timeout: Option<Duration>,
}

/// A grounded program on disk.
#[derive(Debug)]
pub struct ClingoProgram {
    encoding: EncodingId,
    grounded: TempPath,
}

impl ClingoProgram {
    #[must_use]
    pub fn encoding(&self) -> EncodingId {
        self.encoding
    }

    /// Location of the grounded artifact; removed when the program is dropped.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.grounded
    }
}

impl ClingoSolver {
    /// Use the `clingo` executable at `program` (a bare name is looked up in `PATH`).
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            catalog: EncodingCatalog::embedded(),
            ground_timeout: None,
        }
    }

    /// Read encodings from `catalog` instead of the embedded copies.
    #[must_use]
    pub fn with_catalog(mut self, catalog: EncodingCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Bound the grounding step.
    #[must_use]
    pub fn with_ground_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ground_timeout = timeout;
        self
    }

    /// First line of `clingo --version`.
    pub fn version(&self) -> Result<String, SymbiotaError> {
        let run = self.run(&[OsString::from("--version")], Deadline::start(None), "version check")?;
        if !run.status.success() {
            return Err(SymbiotaError::SolverUnavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                run.status
            )));
        }
        let text = String::from_utf8_lossy(&run.stdout);
        Ok(text.lines().next().unwrap_or_default().trim().to_string())
    }

    fn temp_file(&self, stem: &str, contents: &str) -> Result<NamedTempFile, SymbiotaError> {
        let mut file = Builder::new()
            .prefix(&format!("{TEMP_PREFIX}{stem}_"))
            .suffix(&format!(".{INSTANCE_EXTENSION}"))
            .tempfile()
            .map_err(|e| SymbiotaError::Io(format!("temporary file: {e}")))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| SymbiotaError::io(file.path(), &e))?;
        file.flush().map_err(|e| SymbiotaError::io(file.path(), &e))?;
        Ok(file)
    }

    fn run(
        &self,
        args: &[OsString],
        deadline: Deadline,
        stage: &str,
    ) -> Result<ProcessRun, SymbiotaError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SymbiotaError::SolverUnavailable(format!(
                    "cannot start {}: {e}",
                    self.program.display()
                ))
            })?;

        let mut out = child.stdout.take();
        let mut err = child.stderr.take();
        let stdout_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(pipe) = out.as_mut() {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            if let Some(pipe) = err.as_mut() {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => return Err(SymbiotaError::Io(format!("waiting for solver: {e}"))),
            }
            if deadline.expired() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(deadline.timeout_error(stage));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout_reader
            .join()
            .map_err(|_| SymbiotaError::SolverFailed("stdout reader stopped".to_string()))?;
        let stderr = stderr_reader
            .join()
            .map_err(|_| SymbiotaError::SolverFailed("stderr reader stopped".to_string()))?;

        Ok(ProcessRun {
            status,
            stdout,
            stderr,
        })
    }
}

struct ProcessRun {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

impl ProcessRun {
    fn failure(&self, stage: &str) -> SymbiotaError {
        let detail = self.stderr.lines().take(5).collect::<Vec<_>>().join(" | ");
        SymbiotaError::SolverFailed(format!("{stage} exited with {}: {detail}", self.status))
    }
}

impl Solver for ClingoSolver {
    type Program = ClingoProgram;

    fn name(&self) -> &'static str {
        "clingo"
    }

    fn ground(&self, model: &FactModel, encoding: EncodingId) -> Result<ClingoProgram, SymbiotaError> {
        let facts = self.temp_file("instance", &render_instance(model))?;
        let source = self.temp_file("encoding", &self.catalog.source(encoding)?)?;

        let args = vec![
            OsString::from("--mode=gringo"),
            facts.path().as_os_str().to_os_string(),
            source.path().as_os_str().to_os_string(),
        ];
        let run = self.run(&args, Deadline::start(self.ground_timeout), "grounding")?;
        if !run.status.success() {
            return Err(run.failure("grounding"));
        }

        let mut grounded = Builder::new()
            .prefix(&format!("{TEMP_PREFIX}grounded_"))
            .tempfile()
            .map_err(|e| SymbiotaError::Io(format!("temporary file: {e}")))?;
        grounded
            .write_all(&run.stdout)
            .map_err(|e| SymbiotaError::io(grounded.path(), &e))?;
        grounded
            .flush()
            .map_err(|e| SymbiotaError::io(grounded.path(), &e))?;

        Ok(ClingoProgram {
            encoding,
            grounded: grounded.into_temp_path(),
        })
    }

    fn solve<'a>(
        &'a self,
        program: &'a ClingoProgram,
        config: &SolveConfig,
    ) -> Result<Solutions<'a>, SymbiotaError> {
        let mut args: Vec<OsString> = solve_args(config).into_iter().map(OsString::from).collect();
        args.push(program.path().as_os_str().to_os_string());

        let run = self.run(&args, Deadline::start(config.timeout), "solving")?;
        let code = run.status.code().unwrap_or(-1);
        if !CLASP_OK_CODES.contains(&code) {
            return Err(run.failure("solving"));
        }

        let text = String::from_utf8_lossy(&run.stdout);
        let answers = decode_output(&text, config)?;
        Ok(Box::new(answers.into_iter().map(Ok::<Answer, SymbiotaError>)))
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Command-line options for one solve request.
#[must_use]
pub fn solve_args(config: &SolveConfig) -> Vec<String> {
    let mut args = vec!["--mode=clasp".to_string(), "--outf=2".to_string()];

    match config.profile {
        SearchProfile::Jumpy => args.push("--configuration=jumpy".to_string()),
        SearchProfile::Handy => args.push("--configuration=handy".to_string()),
        SearchProfile::Auto => {}
    }

    let enumerating = config.enumeration != EnumMode::None || config.limit != 1;
    if config.optimize {
        if enumerating {
            args.push("--opt-strategy=usc,5".to_string());
            match &config.bound {
                OptimumBound::Search => args.push("--opt-mode=optN".to_string()),
                OptimumBound::Exact(bound) => args.push(format!("--opt-mode=optN,{bound}")),
            }
        } else {
            args.push("--opt-strategy=usc,oll".to_string());
            match &config.bound {
                OptimumBound::Search => args.push("--opt-mode=opt".to_string()),
                OptimumBound::Exact(bound) => args.push(format!("--opt-mode=opt,{bound}")),
            }
        }
    } else {
        args.push("--opt-mode=ignore".to_string());
    }

    match config.enumeration {
        EnumMode::Brave => args.push("--enum-mode=brave".to_string()),
        EnumMode::Cautious => args.push("--enum-mode=cautious".to_string()),
        EnumMode::None => {}
    }

    args.push(format!("--models={}", config.limit));
    args
}

// =============================================================================
// OUTPUT DECODING
// =============================================================================

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(rename = "Result")]
    result: String,
    #[serde(rename = "Call", default)]
    calls: Vec<Call>,
    #[serde(rename = "Models", default)]
    models: Option<ModelSummary>,
}

#[derive(Debug, Deserialize)]
struct Call {
    #[serde(rename = "Witnesses", default)]
    witnesses: Vec<Witness>,
}

#[derive(Debug, Deserialize)]
struct Witness {
    #[serde(rename = "Value", default)]
    value: Vec<String>,
    #[serde(rename = "Costs", default)]
    costs: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct ModelSummary {
    #[serde(rename = "Costs", default)]
    costs: Vec<i64>,
}

/// Decode a `--outf=2` report into answers.
///
/// - `UNSATISFIABLE` yields no answers
/// - `UNKNOWN` without witnesses is a timeout when a deadline was set,
///   a solver failure otherwise
/// - single answers, brave and cautious keep the last witness
/// - enumeration keeps the witnesses whose costs equal the best costs
pub fn decode_output(json: &str, config: &SolveConfig) -> Result<Vec<Answer>, SymbiotaError> {
    let report: Report = serde_json::from_str(json)
        .map_err(|e| SymbiotaError::SolverFailed(format!("unreadable solver report: {e}")))?;

    if report.result == "UNSATISFIABLE" {
        return Ok(Vec::new());
    }

    let witnesses: Vec<Witness> = report
        .calls
        .into_iter()
        .flat_map(|call| call.witnesses)
        .collect();

    if report.result == "UNKNOWN" && witnesses.is_empty() {
        return Err(match config.timeout {
            Some(_) => Deadline::start(config.timeout).timeout_error("solving"),
            None => SymbiotaError::SolverFailed("search stopped before any answer".to_string()),
        });
    }

    let single = config.enumeration != EnumMode::None || config.limit == 1;
    let selected: Vec<Witness> = if single {
        witnesses.into_iter().last().into_iter().collect()
    } else if config.optimize {
        let best = match report.models.map(|m| m.costs).filter(|c| !c.is_empty()) {
            Some(costs) => costs,
            None => witnesses.iter().map(|w| w.costs.clone()).min().unwrap_or_default(),
        };
        witnesses.into_iter().filter(|w| w.costs == best).collect()
    } else {
        witnesses
    };

    let limit = if single || config.limit == 0 {
        usize::MAX
    } else {
        config.limit
    };

    selected
        .into_iter()
        .take(limit)
        .map(|witness| -> Result<Answer, SymbiotaError> {
            let facts = witness
                .value
                .iter()
                .map(|atom| {
                    parse_atom(atom).map_err(|reason| {
                        SymbiotaError::SolverFailed(format!("unreadable atom '{atom}': {reason}"))
                    })
                })
                .collect::<Result<_, _>>()?;
            Ok(Answer::new(facts, Optimum::new(witness.costs)))
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fact;

    const ENUMERATION: &str = r#"{
      "Solver": "clingo version 5.7.1",
      "Call": [ { "Witnesses": [
        { "Value": ["chosen_bacteria(\"b1\")", "chosen_bacteria(\"b2\")"], "Costs": [2] },
        { "Value": ["chosen_bacteria(\"b1\")"], "Costs": [1] },
        { "Value": ["chosen_bacteria(\"b3\")"], "Costs": [1] }
      ] } ],
      "Result": "OPTIMUM FOUND",
      "Models": { "Number": 3, "More": "no", "Optimum": "yes", "Optimal": 2, "Costs": [1] }
    }"#;

    #[test]
    fn enumeration_keeps_optimal_witnesses() {
        let config = SolveConfig::enumerate(OptimumBound::Search, 0).expect("config");
        let answers = decode_output(ENUMERATION, &config).expect("decode");
        assert_eq!(answers.len(), 2);
        assert!(answers[1].facts.contains(&Fact::quoted("chosen_bacteria", &["b3"])));
        assert_eq!(answers[0].costs, Optimum::new(vec![1]));
    }

    #[test]
    fn single_keeps_last_witness() {
        let answers = decode_output(ENUMERATION, &SolveConfig::single()).expect("decode");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].facts.len(), 1);
    }

    #[test]
    fn unsatisfiable_has_no_answers() {
        let json = r#"{ "Call": [ { } ], "Result": "UNSATISFIABLE" }"#;
        let config = SolveConfig::brave(OptimumBound::Search).expect("config");
        assert!(decode_output(json, &config).expect("decode").is_empty());
    }

    #[test]
    fn unknown_without_witnesses_is_timeout_under_deadline() {
        let json = r#"{ "Call": [ { } ], "Result": "UNKNOWN" }"#;
        let config = SolveConfig::single().with_timeout(Some(Duration::from_millis(1500)));
        let err = decode_output(json, &config).expect_err("must fail");
        assert!(matches!(
            err,
            SymbiotaError::SolverTimeout { ref stage, timeout_ms: 1500 } if stage == "solving"
        ));

        let err = decode_output(json, &SolveConfig::single()).expect_err("must fail");
        assert!(matches!(err, SymbiotaError::SolverFailed(_)));
    }

    #[test]
    fn unknown_with_witnesses_keeps_them() {
        let json = ENUMERATION.replace("OPTIMUM FOUND", "UNKNOWN");
        let answers = decode_output(&json, &SolveConfig::single()).expect("decode");
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn garbage_report_is_solver_failure() {
        let err = decode_output("not json", &SolveConfig::single()).expect_err("must fail");
        assert!(matches!(err, SymbiotaError::SolverFailed(_)));
    }

    #[test]
    fn args_follow_configuration() {
        let single = solve_args(&SolveConfig::single());
        assert!(single.contains(&"--configuration=jumpy".to_string()));
        assert!(single.contains(&"--opt-mode=opt".to_string()));
        assert!(single.contains(&"--models=1".to_string()));

        let bound = OptimumBound::Exact(Optimum::new(vec![1, 1]));
        let brave = solve_args(&SolveConfig::brave(bound).expect("config"));
        assert!(brave.contains(&"--enum-mode=brave".to_string()));
        assert!(brave.contains(&"--opt-mode=optN,1,1".to_string()));
        assert!(brave.contains(&"--models=0".to_string()));

        let all = solve_args(&SolveConfig::enumerate(OptimumBound::Search, 0).expect("config"));
        assert!(all.contains(&"--configuration=handy".to_string()));
        assert!(all.contains(&"--opt-strategy=usc,5".to_string()));

        let plain = solve_args(&SolveConfig::plain());
        assert!(plain.contains(&"--opt-mode=ignore".to_string()));
        assert!(!plain.iter().any(|a| a.starts_with("--configuration")));
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let solver = ClingoSolver::new("/nonexistent/bin/clingo-missing");
        let model: FactModel = [Fact::seed("a")].into_iter().collect();
        let err = solver
            .ground(&model, EncodingId::Deadends)
            .expect_err("must fail");
        assert!(matches!(err, SymbiotaError::SolverUnavailable(_)));
        assert!(matches!(
            solver.version(),
            Err(SymbiotaError::SolverUnavailable(_))
        ));
    }
}

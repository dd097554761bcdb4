//! # Configuration
//!
//! Optional `symbiota.toml`, resolved against command-line overrides.
//!
//! ```toml
//! [solver]
//! backend = "native"
//! clingo = "clingo"
//! timeout_secs = 600
//! encodings = "encodings/"
//!
//! [builder]
//! threads = 4
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use symbiota_core::SymbiotaError;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "symbiota.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE SCHEMA
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub solver: SolverSection,
    #[serde(default)]
    pub builder: BuilderSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSection {
    pub backend: Option<String>,
    pub clingo: Option<PathBuf>,
    /// Seconds; 0 disables the timeout.
    pub timeout_secs: Option<u64>,
    pub encodings: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderSection {
    pub threads: Option<usize>,
}

impl Config {
    /// Parse configuration text. `origin` names the file in errors.
    pub fn parse(origin: &Path, text: &str) -> Result<Self, SymbiotaError> {
        toml::from_str(text).map_err(|e| SymbiotaError::malformed(origin, e.to_string()))
    }

    /// Load the explicit file, else `symbiota.toml` in the working directory
    /// if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SymbiotaError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let meta = std::fs::metadata(&path).map_err(|e| SymbiotaError::io(&path, &e))?;
        if meta.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SymbiotaError::malformed(
                &path,
                format!(
                    "file size {} bytes exceeds maximum allowed {} bytes",
                    meta.len(),
                    MAX_CONFIG_FILE_SIZE
                ),
            ));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| SymbiotaError::io(&path, &e))?;
        Self::parse(&path, &text)
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Solver backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Embedded exhaustive search.
    #[default]
    Native,
    /// External clingo process.
    Clingo,
}

impl FromStr for Backend {
    type Err = SymbiotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "clingo" => Ok(Self::Clingo),
            other => Err(SymbiotaError::InvalidOption(format!(
                "unknown solver backend '{other}', expected 'native' or 'clingo'"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Clingo => f.write_str("clingo"),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub clingo: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub encodings: Option<PathBuf>,
    pub threads: Option<usize>,
}

/// Effective settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: Backend,
    pub clingo: PathBuf,
    pub timeout: Option<Duration>,
    pub encodings: Option<PathBuf>,
    /// `None` lets the builder use available parallelism.
    pub threads: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Native,
            clingo: PathBuf::from("clingo"),
            timeout: None,
            encodings: None,
            threads: None,
        }
    }
}

impl Settings {
    /// Merge file values under command-line overrides.
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self, SymbiotaError> {
        let defaults = Self::default();
        let backend = match overrides.backend.or(config.solver.backend) {
            Some(name) => name.parse()?,
            None => defaults.backend,
        };
        let timeout = overrides
            .timeout_secs
            .or(config.solver.timeout_secs)
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);
        let threads = overrides.threads.or(config.builder.threads);
        if threads == Some(0) {
            return Err(SymbiotaError::InvalidOption(
                "builder threads must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            backend,
            clingo: overrides
                .clingo
                .or(config.solver.clingo)
                .unwrap_or(defaults.clingo),
            timeout,
            encodings: overrides.encodings.or(config.solver.encodings),
            threads,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let text = r#"
            [solver]
            backend = "clingo"
            clingo = "/opt/clingo/bin/clingo"
            timeout_secs = 30

            [builder]
            threads = 2
        "#;
        let config = Config::parse(Path::new("symbiota.toml"), text).expect("parse");
        assert_eq!(config.solver.backend.as_deref(), Some("clingo"));
        assert_eq!(config.builder.threads, Some(2));
        assert_eq!(config.solver.encodings, None);
    }

    #[test]
    fn broken_file_is_malformed() {
        let err = Config::parse(Path::new("symbiota.toml"), "[solver\nbackend = 1")
            .expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MalformedInput { .. }));

        let err = Config::parse(Path::new("symbiota.toml"), "[solver]\nbackend2 = \"x\"")
            .expect_err("must fail");
        assert!(matches!(err, SymbiotaError::MalformedInput { .. }));
    }

    #[test]
    fn flags_override_file() {
        let config = Config {
            solver: SolverSection {
                backend: Some("clingo".into()),
                timeout_secs: Some(60),
                ..SolverSection::default()
            },
            builder: BuilderSection { threads: Some(8) },
        };
        let overrides = Overrides {
            backend: Some("native".into()),
            threads: Some(1),
            ..Overrides::default()
        };
        let settings = Settings::resolve(config, overrides).expect("resolve");
        assert_eq!(settings.backend, Backend::Native);
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));
        assert_eq!(settings.threads, Some(1));
        assert_eq!(settings.clingo, PathBuf::from("clingo"));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let overrides = Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        };
        let settings = Settings::resolve(Config::default(), overrides).expect("resolve");
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn unknown_backend_is_invalid_option() {
        let overrides = Overrides {
            backend: Some("gurobi".into()),
            ..Overrides::default()
        };
        let err = Settings::resolve(Config::default(), overrides).expect_err("must fail");
        assert!(matches!(err, SymbiotaError::InvalidOption(_)));
    }
}

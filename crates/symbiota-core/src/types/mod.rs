//! # Core Type Definitions
//!
//! This module contains the types shared by every stage of Symbiota:
//! - Atom terms and facts (`Term`, `Fact`)
//! - Compound roles for seed/target lists (`CompoundRole`)
//! - Error types (`SymbiotaError`)
//! - The network reader trait (`NetworkReader`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Render to the same ASP text on every run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::primitives::predicates;

// =============================================================================
// TERMS
// =============================================================================

/// A single argument of an atom.
///
/// Network facts only ever carry quoted strings. Symbols and numbers appear
/// in solver output and in hand-written instance files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A double-quoted string constant, stored unescaped.
    Quoted(String),
    /// A bare constant or an unparsed compound term.
    Symbol(String),
    /// An integer constant.
    Number(i64),
}

impl Term {
    /// Create a quoted term.
    #[must_use]
    pub fn quoted(s: impl Into<String>) -> Self {
        Self::Quoted(s.into())
    }

    /// Textual value of the term without quoting.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Quoted(s) | Self::Symbol(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quoted(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::Symbol(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

// =============================================================================
// FACTS
// =============================================================================

/// An atom `predicate(arg1, ..., argN)`.
///
/// Facts are compared structurally, so two facts with the same predicate and
/// arguments are the same fact regardless of where they were read from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fact {
    /// Predicate name.
    pub predicate: String,
    /// Ordered arguments.
    pub args: Vec<Term>,
}

impl Fact {
    /// Create a fact from a predicate and its terms.
    #[must_use]
    pub fn new(predicate: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            args,
        }
    }

    /// Create a fact whose arguments are all quoted strings.
    #[must_use]
    pub fn quoted(predicate: &str, args: &[&str]) -> Self {
        Self::new(predicate, args.iter().map(|a| Term::quoted(*a)).collect())
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Textual value of argument `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<String> {
        self.args.get(index).map(Term::text)
    }

    /// True if the fact has the given predicate name and arity.
    #[must_use]
    pub fn is(&self, predicate: &str, arity: usize) -> bool {
        self.predicate == predicate && self.args.len() == arity
    }

    // -------------------------------------------------------------------------
    // Network vocabulary
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn reaction(reaction: &str, organism: &str) -> Self {
        Self::quoted(predicates::REACTION, &[reaction, organism])
    }

    #[must_use]
    pub fn reversible(reaction: &str, organism: &str) -> Self {
        Self::quoted(predicates::REVERSIBLE, &[reaction, organism])
    }

    #[must_use]
    pub fn reactant(metabolite: &str, reaction: &str, organism: &str) -> Self {
        Self::quoted(predicates::REACTANT, &[metabolite, reaction, organism])
    }

    #[must_use]
    pub fn product(metabolite: &str, reaction: &str, organism: &str) -> Self {
        Self::quoted(predicates::PRODUCT, &[metabolite, reaction, organism])
    }

    #[must_use]
    pub fn species(metabolite: &str, name: &str, compartment: &str, organism: &str) -> Self {
        Self::quoted(
            predicates::SPECIES,
            &[metabolite, name, compartment, organism],
        )
    }

    /// Mark an organism as a community member candidate.
    #[must_use]
    pub fn bacteria(organism: &str) -> Self {
        Self::quoted(predicates::BACTERIA, &[organism])
    }

    /// Mark the distinguished host organism.
    #[must_use]
    pub fn draft(organism: &str) -> Self {
        Self::quoted(predicates::DRAFT, &[organism])
    }

    #[must_use]
    pub fn seed(metabolite: &str) -> Self {
        Self::quoted(predicates::SEED, &[metabolite])
    }

    #[must_use]
    pub fn target(metabolite: &str) -> Self {
        Self::quoted(predicates::TARGET, &[metabolite])
    }

    /// Mark an organism to be reported individually by focus queries.
    #[must_use]
    pub fn target_species(organism: &str) -> Self {
        Self::quoted(predicates::TARGET_SPECIES, &[organism])
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.predicate)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// COMPOUND LISTS
// =============================================================================

/// Role of a compound list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompoundRole {
    /// Nutrients available in the environment.
    Seed,
    /// Metabolites whose production is the objective.
    Target,
}

impl CompoundRole {
    /// Build the fact for one compound in this role.
    #[must_use]
    pub fn fact(self, metabolite: &str) -> Fact {
        match self {
            Self::Seed => Fact::seed(metabolite),
            Self::Target => Fact::target(metabolite),
        }
    }
}

impl fmt::Display for CompoundRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => f.write_str("seeds"),
            Self::Target => f.write_str("targets"),
        }
    }
}

// =============================================================================
// NETWORK READER TRAIT
// =============================================================================

/// A reader turns a structured metabolic-network source into typed facts.
///
/// Readers are:
/// - Stateless between calls
/// - Shareable across the builder's worker pool
/// - Strict: a missing attribute is `MissingField`, broken syntax is `MalformedInput`
pub trait NetworkReader: Send + Sync {
    /// Read the reaction network of one organism.
    fn read_network(&self, path: &Path, organism: &str) -> Result<Vec<Fact>, SymbiotaError>;

    /// Read a seed or target compound list.
    fn read_compounds(&self, path: &Path, role: CompoundRole) -> Result<Vec<Fact>, SymbiotaError>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Symbiota.
///
/// - No silent failures
/// - Use `Result<T, SymbiotaError>` for fallible operations
/// - Per-organism read failures are reported as data by the builder, not as errors
#[derive(Debug, Error)]
pub enum SymbiotaError {
    /// A required combination of inputs was not supplied.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A referenced file or directory does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound { path: PathBuf, what: String },

    /// A source file could not be parsed.
    #[error("Malformed input in {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// A source element lacks a required attribute.
    #[error("Missing field '{field}' on <{element}> in {}", path.display())]
    MissingField {
        path: PathBuf,
        element: String,
        field: String,
    },

    /// An unknown mode, flag or configuration value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The solver found no answer at all.
    #[error("Unsatisfiable: no stable model found during {stage}")]
    Unsatisfiable { stage: String },

    /// The solver binary or runtime is missing or broken.
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    /// The caller-supplied timeout elapsed.
    #[error("Solver timeout after {timeout_ms} ms during {stage}")]
    SolverTimeout { stage: String, timeout_ms: u64 },

    /// The solver ran but its output could not be used.
    #[error("Solver failed: {0}")]
    SolverFailed(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SymbiotaError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(path: &Path, what: &str) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
            what: what.to_string(),
        }
    }

    /// Shorthand for a `MalformedInput` error.
    #[must_use]
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it concerns.
    #[must_use]
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path, "File");
        }
        Self::Io(format!("{}: {err}", path.display()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Symbiota CLI Module
//!
//! This module implements the CLI interface for Symbiota.
//!
//! ## Available Commands
//!
//! - `instance` - Build and persist a community instance
//! - `mincom` - Select minimal communities producing the targets
//! - `scopes` - Compare host and community producibility
//! - `focus` - Per-organism production alone and in community
//! - `deadends` - Metabolites without producer or consumer

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use symbiota_core::{InstanceInputs, RetrievalModes, SymbiotaError, TopologyMode};

use crate::config::{Config, Overrides, Settings};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Symbiota - minimal microbial community selection
///
/// Selects the smallest sets of symbionts that let a host, or a community
/// without host, produce target metabolites from seed nutrients.
#[derive(Parser, Debug)]
#[command(name = "symbiota")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./symbiota.toml when present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Solver backend: "native" (embedded) or "clingo" (external process)
    #[arg(long, global = true)]
    pub solver: Option<String>,

    /// Path to the clingo program
    #[arg(long, global = true)]
    pub clingo: Option<PathBuf>,

    /// Per solver call timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Directory of encodings overriding the embedded ones (clingo backend)
    #[arg(long, global = true)]
    pub encodings: Option<PathBuf>,

    /// Worker threads for reading symbiont networks
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Ways to obtain the instance of a query.
#[derive(Args, Debug, Clone, Default)]
pub struct InstanceArgs {
    /// Pre-built instance file
    #[arg(short = 'a', long = "asp")]
    pub instance: Option<PathBuf>,

    /// Host metabolic network (SBML)
    #[arg(short = 'm', long)]
    pub host: Option<PathBuf>,

    /// Directory of symbiont metabolic networks (SBML)
    #[arg(short = 'b', long)]
    pub bacteria: Option<PathBuf>,

    /// Seeds (SBML)
    #[arg(short, long)]
    pub seeds: Option<PathBuf>,

    /// Targets (SBML)
    #[arg(short, long)]
    pub targets: Option<PathBuf>,
}

impl From<InstanceArgs> for InstanceInputs {
    fn from(args: InstanceArgs) -> Self {
        Self {
            instance: args.instance,
            host: args.host,
            symbionts: args.bacteria,
            seeds: args.seeds,
            targets: args.targets,
        }
    }
}

/// Retrieval modes of a community selection.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ModeArgs {
    /// One optimal community (default when no mode is given)
    #[arg(long)]
    pub optsol: bool,

    /// Union of every optimal community
    #[arg(long)]
    pub union: bool,

    /// Intersection of every optimal community
    #[arg(long)]
    pub intersection: bool,

    /// Every optimal community
    #[arg(long)]
    pub enumeration: bool,
}

impl From<ModeArgs> for RetrievalModes {
    fn from(args: ModeArgs) -> Self {
        Self {
            single: args.optsol,
            union: args.union,
            intersection: args.intersection,
            enumeration: args.enumeration,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a community instance from SBML networks
    Instance {
        /// Host metabolic network (SBML)
        #[arg(short = 'm', long)]
        host: Option<PathBuf>,

        /// Directory of symbiont metabolic networks (SBML)
        #[arg(short = 'b', long)]
        bacteria: PathBuf,

        /// Seeds (SBML)
        #[arg(short, long)]
        seeds: Option<PathBuf>,

        /// Targets (SBML)
        #[arg(short, long)]
        targets: Option<PathBuf>,

        /// Instance file to write (a kept temporary file otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Select minimal communities producing the targets
    Mincom {
        #[command(flatten)]
        inputs: InstanceArgs,

        /// Topology: "soup" or "minexch"
        #[arg(short = 'o', long = "option", default_value = "soup")]
        topology: TopologyMode,

        #[command(flatten)]
        modes: ModeArgs,

        /// Maximum enumerated communities (0 = all)
        #[arg(long, default_value = "0")]
        limit: usize,

        /// JSON file to write the result to
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare host-alone and community producibility
    Scopes {
        #[command(flatten)]
        inputs: InstanceArgs,

        /// JSON file to write the result to
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Report what organisms produce alone and within the community
    Focus {
        /// Directory of symbiont metabolic networks (SBML)
        #[arg(short = 'b', long)]
        bacteria: PathBuf,

        /// Seeds (SBML)
        #[arg(short, long)]
        seeds: PathBuf,

        /// Organisms to focus on, by file stem
        #[arg(short, long, value_delimiter = ',')]
        focus: Vec<String>,

        /// Focus on every symbiont
        #[arg(long)]
        all: bool,

        /// JSON file to write the result to
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List metabolites without producer or consumer
    Deadends {
        #[command(flatten)]
        inputs: InstanceArgs,

        /// JSON file to write the result to
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Cli {
    /// Effective settings: config file under command-line flags.
    pub fn settings(&self) -> Result<Settings, SymbiotaError> {
        let config = Config::load(self.config.as_deref())?;
        Settings::resolve(
            config,
            Overrides {
                backend: self.solver.clone(),
                clingo: self.clingo.clone(),
                timeout_secs: self.timeout,
                encodings: self.encodings.clone(),
                threads: self.threads,
            },
        )
    }
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SymbiotaError> {
    let settings = cli.settings()?;
    tracing::debug!(?settings, "Resolved settings");

    match cli.command {
        Commands::Instance {
            host,
            bacteria,
            seeds,
            targets,
            output,
        } => cmd_instance(&settings, host, bacteria, seeds, targets, output.as_deref()),
        Commands::Mincom {
            inputs,
            topology,
            modes,
            limit,
            output,
        } => cmd_mincom(
            &settings,
            inputs.into(),
            topology,
            modes.into(),
            limit,
            output.as_deref(),
        ),
        Commands::Scopes { inputs, output } => {
            cmd_scopes(&settings, inputs.into(), output.as_deref())
        }
        Commands::Focus {
            bacteria,
            seeds,
            focus,
            all,
            output,
        } => cmd_focus(&settings, bacteria, seeds, focus, all, output.as_deref()),
        Commands::Deadends { inputs, output } => {
            cmd_deadends(&settings, inputs.into(), output.as_deref())
        }
    }
}

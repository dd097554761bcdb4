//! # symbiota
//!
//! The Symbiota command-line application as a library, so commands can be
//! driven in-process.
//!
//! - [`cli`]: clap definitions and command implementations
//! - [`config`]: `symbiota.toml` and command-line overrides
//! - [`output`]: JSON result sink and run diagnostics

pub mod cli;
pub mod config;
pub mod output;

//! # Symbiota - Minimal Community Selection
//!
//! The main binary for the Symbiota community-selection engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/symbiota (THE BINARY)               │
//! │                                                          │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │  │    CLI      │   │    Config    │   │ Result Sink  │   │
//! │  │   (clap)    │   │    (toml)    │   │ (serde_json) │   │
//! │  └──────┬──────┘   └──────┬───────┘   └──────┬───────┘   │
//! │         └─────────────────┼──────────────────┘           │
//! │                           ▼                              │
//! │                  ┌─────────────────┐                     │
//! │                  │  symbiota-core  │                     │
//! │                  │   (THE LOGIC)   │                     │
//! │                  └─────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Persist an instance
//! symbiota instance -m host.xml -b symbionts/ -s seeds.xml -t targets.xml -o community.lp
//!
//! # Minimal communities with exchanges, every retrieval mode
//! symbiota mincom -a community.lp -o minexch --optsol --union --intersection --enumeration
//!
//! # Scopes through the external solver
//! symbiota --solver clingo scopes -m host.xml -b symbionts/ -s seeds.xml -t targets.xml
//! ```

use clap::Parser;
use symbiota::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. SYMBIOTA_LOG_FORMAT=json switches to JSON lines.
    let log_format = std::env::var("SYMBIOTA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "symbiota=debug,symbiota_core=debug"
    } else {
        "symbiota=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr; stdout carries results.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Symbiota startup banner.
fn print_banner() {
    eprintln!(
        r#"
  ┌─┐┬ ┬┌┬┐┌┐ ┬┌─┐┌┬┐┌─┐
  └─┐└┬┘│││├┴┐││ │ │ ├─┤
  └─┘ ┴ ┴ ┴└─┘┴└─┘ ┴ ┴ ┴

  Minimal Community Selection v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

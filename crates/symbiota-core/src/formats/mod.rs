//! # Formats
//!
//! Text serialization of fact models.

pub mod instance;

pub use instance::{append_facts, parse_atom, read_instance, render_instance, write_instance};

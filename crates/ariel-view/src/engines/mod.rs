//! Diagram engine implementations
//!
//! Native hosts render through the Mermaid CLI. Browser hosts call
//! `mermaid.render` themselves and report the outcome back to the session.

mod mermaid_cli;

pub use mermaid_cli::*;

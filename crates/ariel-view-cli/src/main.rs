//! Ariel View CLI - Render and frame Mermaid diagrams as SVG

mod cli;
mod watcher;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging is configured from flags and environment inside `run`
    let mut app = cli::ArielViewApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

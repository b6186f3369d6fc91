//! Command-line interface for the ariel-view utility
//!
//! Renders Mermaid diagrams to SVG through the same session the editor uses:
//! auto-repair, viewport framing, and a live watch loop.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kurbo::{Point, Size, Vec2};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::watcher::FileWatcher;
use ariel_view::core::logging::init_logging;
use ariel_view::core::{
    quote_bracket_labels, svg_data_uri, DiagramEngine, DirectorySink, ThemeMode,
};
use ariel_view::engines::MermaidCli;
use ariel_view::session::{Session, SurfaceState, ERROR_TITLE};

/// How long the watch loop sleeps when nothing is scheduled
const WATCH_IDLE: Duration = Duration::from_millis(500);

/// Ariel View - Render and frame Mermaid diagrams as SVG
#[derive(Parser)]
#[command(name = "ariel-view")]
#[command(about = "Render Mermaid diagrams to SVG with auto-repair and pan/zoom framing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Color scheme for the engine
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ThemeChoice {
    /// `ARIEL_VIEW_THEME`, then the terminal background, then dark
    #[default]
    Auto,
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn resolve(self) -> ThemeMode {
        match self {
            ThemeChoice::Auto => ThemeMode::from_environment(),
            ThemeChoice::Dark => ThemeMode::Dark,
            ThemeChoice::Light => ThemeMode::Light,
        }
    }
}

/// Options shared by every command that renders
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct RenderArgs {
    /// Engine color scheme
    #[arg(long, value_enum, default_value_t = ThemeChoice::Auto)]
    pub theme: ThemeChoice,

    /// Do not quote bracket labels after a failed render
    #[arg(long)]
    pub no_repair: bool,

    /// Path to the Mermaid CLI (defaults to ARIEL_VIEW_MMDC, then `mmdc`)
    #[arg(long)]
    pub mmdc: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a diagram to SVG
    Render {
        /// Input file with the Mermaid definition (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the SVG (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the definition with bracket labels quoted
    Repair {
        /// Input file with the Mermaid definition (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with an error when labels would be quoted
        #[arg(long)]
        check: bool,
    },

    /// Render, then zoom and pan the view before printing the SVG
    Frame {
        /// Input file with the Mermaid definition (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the SVG (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,

        /// Surface size in pixels, as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_viewport, default_value = "800x600")]
        viewport: Size,

        /// Zoom steps: positive zooms in, negative zooms out
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        zoom: i32,

        /// Drag distance in pixels, as DX,DY
        #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
        pan: Option<Vec2>,
    },

    /// Render and print the SVG as a base64 data URI
    DataUri {
        /// Input file with the Mermaid definition (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Re-render a file whenever it changes
    Watch {
        /// Mermaid file to watch
        file: PathBuf,

        /// Directory receiving diagram.svg
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_viewport(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got {:?}", value))?;
    let number = |text: &str| {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("Invalid viewport dimension: {:?}", text))
    };
    Ok(Size::new(number(width)?, number(height)?))
}

/// Parse `DX,DY`
pub fn parse_pan(value: &str) -> Result<Vec2, String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("Expected DX,DY, got {:?}", value))?;
    let number = |text: &str| {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("Invalid pan offset: {:?}", text))
    };
    Ok(Vec2::new(number(dx)?, number(dy)?))
}

/// Main CLI application
pub struct ArielViewApp {
    engine: Box<dyn DiagramEngine>,
}

impl ArielViewApp {
    /// Create an application rendering through the Mermaid CLI
    pub fn new() -> Self {
        Self::with_engine(Box::new(MermaidCli::from_env()))
    }

    /// Create an application with a specific engine
    pub fn with_engine(engine: Box<dyn DiagramEngine>) -> Self {
        Self { engine }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var("ARIEL_VIEW_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var("ARIEL_VIEW_LOG_FORMAT")
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            debug!("Logging already initialized: {}", e);
        }

        if cli.verbose {
            eprintln!("Ariel View v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Render {
                input,
                output,
                render,
            } => self.render_command(input, output, &render, cli.verbose),
            Commands::Repair {
                input,
                output,
                check,
            } => self.repair_command(input, output, check),
            Commands::Frame {
                input,
                output,
                render,
                viewport,
                zoom,
                pan,
            } => self.frame_command(input, output, &render, viewport, zoom, pan),
            Commands::DataUri {
                input,
                output,
                render,
            } => self.data_uri_command(input, output, &render),
            Commands::Watch {
                file,
                out_dir,
                render,
            } => self.watch_command(&file, &out_dir, &render),
        }
    }

    fn use_engine(&mut self, args: &RenderArgs) {
        if let Some(program) = &args.mmdc {
            self.engine = Box::new(MermaidCli::new(program));
        }
    }

    /// Render `content` once, reporting any auto-repair on stderr
    pub fn render_session(&mut self, content: &str, args: &RenderArgs) -> Result<Session> {
        self.use_engine(args);
        let mut session = Session::with_source(args.theme.resolve(), content);
        session.set_auto_repair(!args.no_repair);

        let request = session
            .render_now()
            .ok_or_else(|| anyhow!("Diagram definition is empty"))?;
        session.drive(&mut self.engine, request);

        if session.source() != content {
            eprintln!("Note: automatically quoted bracket labels");
        }

        match session.surface() {
            SurfaceState::Error { message, tip } => {
                let mut report = format!("{}: {}", ERROR_TITLE, message);
                if let Some(tip) = tip {
                    report.push('\n');
                    report.push_str(tip);
                }
                Err(anyhow!(report))
            }
            _ => Ok(session),
        }
    }

    fn render_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        args: &RenderArgs,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let session = self.render_session(&content, args)?;
        let markup = rendered_markup(&session)?;

        if verbose {
            eprintln!("{}", session.status());
        }

        self.write_output(output, markup)
    }

    fn repair_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        check: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;

        match quote_bracket_labels(&content) {
            Some(repair) => {
                info!(labels_quoted = repair.labels_quoted, "Quoted bracket labels");
                if check {
                    bail!(
                        "{} bracket label(s) need quoting",
                        repair.labels_quoted
                    );
                }
                self.write_output(output, &repair.text)
            }
            None => self.write_output(output, &content),
        }
    }

    fn frame_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        args: &RenderArgs,
        viewport: Size,
        zoom: i32,
        pan: Option<Vec2>,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let mut session = self.render_session(&content, args)?;
        let display = frame(&mut session, viewport, zoom, pan)?;
        self.write_output(output, &display)
    }

    fn data_uri_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        args: &RenderArgs,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let session = self.render_session(&content, args)?;
        let markup = rendered_markup(&session)?;
        self.write_output(output, &svg_data_uri(markup))
    }

    fn watch_command(&mut self, file: &Path, out_dir: &Path, args: &RenderArgs) -> Result<()> {
        self.use_engine(args);
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory '{}'", out_dir.display()))?;

        let watcher = FileWatcher::new(file)
            .with_context(|| format!("Failed to watch '{}'", file.display()))?;
        let mut sink = DirectorySink::new(out_dir);
        let content = self.read_input(Some(file.to_path_buf()))?;
        let mut session = Session::with_source(args.theme.resolve(), content);
        session.set_auto_repair(!args.no_repair);

        eprintln!(
            "Watching {} (writing {})",
            watcher.target_path().display(),
            out_dir.join(ariel_view::DOWNLOAD_FILE_NAME).display()
        );
        if let Some(request) = session.render_now() {
            session.drive(&mut self.engine, request);
        }
        report_watch(&mut session, &mut sink);

        let started = Instant::now();
        loop {
            let now = started.elapsed();
            let timeout = session
                .next_deadline()
                .map(|due| due.saturating_sub(now))
                .unwrap_or(WATCH_IDLE);

            if watcher.wait(timeout)? {
                match fs::read_to_string(file) {
                    Ok(text) => session.edit(text, started.elapsed()),
                    // Editors briefly remove the file while saving
                    Err(e) => debug!(error = %e, "Skipping unreadable change"),
                }
            }

            if session.tick(started.elapsed(), &mut self.engine) {
                report_watch(&mut session, &mut sink);
            }
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                if crossterm::tty::IsTty::is_tty(&io::stdin()) {
                    eprintln!("Reading diagram from stdin (end with Ctrl-D)");
                }
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                if !content.is_empty() && !content.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for ArielViewApp {
    fn default() -> Self {
        Self::new()
    }
}

fn rendered_markup(session: &Session) -> Result<&str> {
    session
        .last_render()
        .map(|result| result.markup.as_str())
        .ok_or_else(|| anyhow!("Render produced no output"))
}

/// Apply zoom steps and a drag to a rendered session; returns display markup
pub fn frame(session: &mut Session, viewport: Size, zoom: i32, pan: Option<Vec2>) -> Result<String> {
    if session.surface() != &SurfaceState::Graphic {
        bail!("Rendered markup has no <svg> root to frame");
    }

    let delta = if zoom > 0 { -1.0 } else { 1.0 };
    for _ in 0..zoom.unsigned_abs() {
        session.wheel(delta);
    }

    if let Some(offset) = pan {
        const POINTER: i32 = 1;
        session.pointer_down(POINTER, 0, Point::ZERO);
        session.pointer_move(POINTER, Point::ZERO + offset, viewport);
        session.pointer_up(POINTER);
    }

    if let Some(view_box) = session.viewport().current() {
        debug!(view_box = %view_box, "Framed view");
    }
    session
        .display_markup()
        .ok_or_else(|| anyhow!("Rendered markup has no <svg> root to frame"))
}

fn report_watch(session: &mut Session, sink: &mut DirectorySink) {
    match session.surface() {
        SurfaceState::Error { message, tip } => {
            eprintln!("{}: {}", ERROR_TITLE, message);
            if let Some(tip) = tip {
                eprintln!("{}", tip);
            }
        }
        _ if session.exports_enabled() => {
            session.download(sink);
            eprintln!("{}", session.status());
        }
        _ => eprintln!("Nothing to render"),
    }
}

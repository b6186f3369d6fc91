//! Ariel View - live Mermaid diagram editing
//!
//! A library behind a two-pane diagram editor: text on one side, the rendered
//! SVG on the other. It debounces edits, renders through an external Mermaid
//! engine, quotes unquoted bracket labels when a render fails, and keeps the
//! zoom/pan state of the preview.
//!
//! # Quick Start
//!
//! With the Mermaid CLI (`mmdc`) installed:
//!
//! ```rust,no_run
//! use ariel_view::{render, ThemeMode};
//!
//! let result = render("flowchart TD\n  A[Start] --> B[End]", ThemeMode::Dark).unwrap();
//! println!("{}", result.markup);
//! ```
//!
//! # Driving a session
//!
//! Hosts feed edits and pointer events into a [`session::Session`] and paint
//! what [`session::Session::view`] returns:
//!
//! ```rust,no_run
//! use ariel_view::prelude::*;
//! use std::time::Duration;
//!
//! let mut engine = MermaidCli::from_env();
//! let mut session = Session::new(ThemeMode::Light);
//! if let Some(request) = session.render_now() {
//!     session.drive(&mut engine, request);
//! }
//!
//! session.edit("flowchart LR\n  A --> B", Duration::ZERO);
//! session.tick(Duration::from_millis(180), &mut engine);
//! session.wheel(-120.0);
//! println!("{}", session.view().status);
//! ```

pub mod core;
pub mod engines;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Clipboard, DiagramEngine, EngineOutput, ExportError, FileSink, RenderError,
        RenderOptions, RenderRequest, RenderResult, ThemeMode, ViewBox, ViewportController,
        ViewportState,
    };
    pub use crate::engines::MermaidCli;
    pub use crate::session::{Session, SurfaceState, SurfaceView};
}

/// Render a definition once through the Mermaid CLI.
///
/// Applies the same bracket-label repair as the editor: a failed render is
/// retried once with quoted labels. Use [`render_with`] for another engine.
///
/// # Example
/// ```rust,no_run
/// use ariel_view::{render, ThemeMode};
///
/// let result = render("graph LR; A[Start here]-->B", ThemeMode::Dark).unwrap();
/// assert!(result.markup.contains("<svg"));
/// ```
pub fn render(definition: &str, theme: ThemeMode) -> anyhow::Result<RenderResult> {
    let mut engine = engines::MermaidCli::from_env();
    render_with(&mut engine, definition, theme, true)
}

/// Render a definition once through `engine`
///
/// # Arguments
/// * `definition` - Mermaid source text
/// * `theme` - Light or dark engine theme
/// * `repair` - Retry a failed render with bracket labels quoted
///
/// # Returns
/// * `Ok(RenderResult)` - Markup from the last successful attempt
/// * `Err` - Empty input, or the engine's error
pub fn render_with<E: DiagramEngine + ?Sized>(
    engine: &mut E,
    definition: &str,
    theme: ThemeMode,
    repair: bool,
) -> anyhow::Result<RenderResult> {
    use crate::session::{Session, SurfaceState};

    let mut session = Session::with_source(theme, definition);
    session.set_auto_repair(repair);
    let request = session
        .render_now()
        .ok_or_else(|| anyhow::anyhow!("Diagram definition is empty"))?;
    session.drive(engine, request);

    match (session.last_render(), session.surface()) {
        (Some(result), _) => Ok(result.clone()),
        (None, SurfaceState::Error { message, tip }) => match tip {
            Some(tip) => Err(anyhow::anyhow!("{} ({})", message, tip)),
            None => Err(anyhow::anyhow!("{}", message)),
        },
        (None, _) => Err(anyhow::anyhow!("Render produced no output")),
    }
}

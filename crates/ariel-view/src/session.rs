//! Editor session: the state behind the editor surface
//!
//! The session owns the diagram source, the debounce timer, the render
//! adapter, the viewport, and the last successful render. Hosts translate
//! their events into session calls and read back a [`SurfaceView`].
//!
//! Rendering is request/response. The session emits a [`RenderRequest`]
//! when a render is due, and the host runs it through an engine and passes
//! the outcome to [`Session::complete`]. A browser host awaits
//! `mermaid.render` in between; a native host can use [`Session::drive`],
//! which runs the engine synchronously.
//!
//! ```rust
//! use ariel_view::core::{DiagramEngine, EngineOutput, RenderError, RenderOptions, RenderRequest, ThemeMode};
//! use ariel_view::session::{Session, SurfaceState};
//! use std::time::Duration;
//!
//! struct Fixed;
//!
//! impl DiagramEngine for Fixed {
//!     fn name(&self) -> &str {
//!         "fixed"
//!     }
//!
//!     fn render(&mut self, _: &RenderRequest, _: &RenderOptions) -> Result<EngineOutput, RenderError> {
//!         Ok(EngineOutput::new(r#"<svg viewBox="0 0 100 50"></svg>"#))
//!     }
//! }
//!
//! let mut session = Session::new(ThemeMode::Dark);
//! session.edit("flowchart TD\n A-->B", Duration::ZERO);
//! assert!(!session.tick(Duration::from_millis(100), &mut Fixed));
//! assert!(session.tick(Duration::from_millis(180), &mut Fixed));
//! assert_eq!(session.surface(), &SurfaceState::Graphic);
//! ```

use kurbo::{Point, Size};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, span, warn, Level};

use crate::core::svg::{display_markup, intrinsic_view_box};
use crate::core::{
    quote_bracket_labels, to_svg_file, Clipboard, Debouncer, DiagramEngine, EngineOutput,
    ExportError, ExportFile, FileSink, RenderAdapter, RenderError, RenderRequest, RenderResult,
    ThemeMode, ViewBox, ViewportController, ViewportState,
};

/// Sample shown when a session starts
pub const DEFAULT_DIAGRAM: &str = "%% Sample flowchart
flowchart TD
  Start((Start)) --> Decide{Ready?}
  Decide -- Yes --> Work[\"Build with Mermaid\"]
  Decide -- No --> Pause[/Take a breath/]
  Work --> Review{Looks good?}
  Review -- Iterate --> Work
  Review -- Ship --> End((Celebrate))";

pub const STATUS_RENDER_ERROR: &str = "Render error";
pub const STATUS_AUTO_REPAIR: &str = "Automatically quoted bracket labels";
pub const STATUS_VIEW_RESET: &str = "View reset";
pub const STATUS_COPIED: &str = "Markup copied to clipboard";
pub const STATUS_NOTHING_TO_COPY: &str = "Nothing to copy";
pub const STATUS_DOWNLOAD_STARTED: &str = "SVG download started";
pub const STATUS_NOTHING_TO_DOWNLOAD: &str = "Nothing to download";

pub const ERROR_TITLE: &str = "Render failed";
pub const REPAIR_TIP: &str = "Bracket labels containing spaces were automatically quoted, but the diagram still failed to render.";

/// What the preview pane shows; exactly one at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceState {
    Placeholder,
    Graphic,
    Error {
        message: String,
        tip: Option<String>,
    },
}

/// Snapshot of everything a host needs to paint the surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceView {
    pub state: SurfaceState,
    pub source: String,
    pub status: String,
    pub theme: ThemeMode,
    pub theme_toggle_label: &'static str,
    pub exports_enabled: bool,
    pub viewport: ViewportState,
    pub view_box: Option<ViewBox>,
    pub display_markup: Option<String>,
    pub is_panning: bool,
    /// Render whose interactive hook the host should bind after mounting
    pub bind_render_id: Option<String>,
}

/// Editor state machine
#[derive(Debug, Clone)]
pub struct Session {
    source: String,
    theme: ThemeMode,
    auto_repair: bool,
    adapter: RenderAdapter,
    debounce: Debouncer<String>,
    viewport: ViewportController,
    last_render: Option<RenderResult>,
    surface: SurfaceState,
    status: String,
}

impl Session {
    /// Session holding the built-in sample diagram
    pub fn new(theme: ThemeMode) -> Self {
        Self::with_source(theme, DEFAULT_DIAGRAM)
    }

    pub fn with_source(theme: ThemeMode, source: impl Into<String>) -> Self {
        let mut adapter = RenderAdapter::new();
        adapter.configure(theme);
        Self {
            source: source.into(),
            theme,
            auto_repair: true,
            adapter,
            debounce: Debouncer::default(),
            viewport: ViewportController::new(),
            last_render: None,
            surface: SurfaceState::Placeholder,
            status: String::new(),
        }
    }

    /// Replace the debounce timer, e.g. with a different quiet interval
    pub fn with_debouncer(mut self, debounce: Debouncer<String>) -> Self {
        self.debounce = debounce;
        self
    }

    /// Enable or disable the bracket-label auto-repair
    pub fn set_auto_repair(&mut self, enabled: bool) {
        self.auto_repair = enabled;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn surface(&self) -> &SurfaceState {
        &self.surface
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn last_render(&self) -> Option<&RenderResult> {
        self.last_render.as_ref()
    }

    pub fn adapter(&self) -> &RenderAdapter {
        &self.adapter
    }

    /// Copy and download are available iff a render result exists
    pub fn exports_enabled(&self) -> bool {
        self.last_render.is_some()
    }

    /// Render the current source right away, bypassing the debounce
    pub fn render_now(&mut self) -> Option<RenderRequest> {
        self.debounce.cancel();
        let definition = self.source.clone();
        self.begin_render(definition)
    }

    /// Record an edit and (re)schedule the debounced render
    pub fn edit(&mut self, text: impl Into<String>, now: Duration) {
        self.source = text.into();
        self.debounce.schedule(self.source.clone(), now);
    }

    /// Request for the debounced render, once the quiet interval has passed
    pub fn poll(&mut self, now: Duration) -> Option<RenderRequest> {
        let definition = self.debounce.poll(now)?;
        self.begin_render(definition)
    }

    /// When the pending debounced render becomes due
    pub fn next_deadline(&self) -> Option<Duration> {
        self.debounce.deadline()
    }

    fn begin_render(&mut self, definition: String) -> Option<RenderRequest> {
        if definition.trim().is_empty() {
            debug!("Empty definition, clearing preview");
            self.clear();
            return None;
        }
        Some(self.adapter.request(&definition, self.auto_repair, false))
    }

    fn clear(&mut self) {
        self.viewport.clear();
        self.last_render = None;
        self.surface = SurfaceState::Placeholder;
        self.status.clear();
    }

    /// Apply the engine's outcome for `request`.
    ///
    /// Returns a follow-up request when the failure was auto-repaired; the
    /// follow-up never allows another repair. The most recently completed
    /// render always wins.
    pub fn complete(
        &mut self,
        request: &RenderRequest,
        outcome: Result<EngineOutput, RenderError>,
    ) -> Option<RenderRequest> {
        match outcome {
            Ok(output) => {
                self.apply_success(RenderResult::new(request, output), request.repaired);
                None
            }
            Err(err) => {
                if request.allow_repair {
                    if let Some(repair) = quote_bracket_labels(&request.definition) {
                        info!(
                            render_id = %request.render_id,
                            labels_quoted = repair.labels_quoted,
                            "Retrying with quoted bracket labels"
                        );
                        self.source = repair.text;
                        self.status = STATUS_AUTO_REPAIR.to_string();
                        return Some(self.adapter.request(&self.source, false, true));
                    }
                }
                self.apply_failure(err, request.repaired);
                None
            }
        }
    }

    /// Run `request` (and any repair retry) through `engine` synchronously
    pub fn drive<E: DiagramEngine + ?Sized>(&mut self, engine: &mut E, request: RenderRequest) {
        let mut next = Some(request);
        while let Some(request) = next {
            let outcome = self.adapter.submit(engine, &request);
            next = self.complete(&request, outcome);
        }
    }

    /// Fire the debounced render if it is due. Returns whether one ran.
    pub fn tick<E: DiagramEngine + ?Sized>(&mut self, now: Duration, engine: &mut E) -> bool {
        if self.debounce.deadline().map_or(true, |due| due > now) {
            return false;
        }
        if let Some(request) = self.poll(now) {
            self.drive(engine, request);
        }
        true
    }

    fn apply_success(&mut self, result: RenderResult, repaired: bool) {
        let apply_span = span!(Level::DEBUG, "apply_render", render_id = %result.render_id);
        let _enter = apply_span.enter();

        match intrinsic_view_box(&result.markup) {
            Ok(intrinsic) => {
                self.viewport.initialize(intrinsic);
                self.surface = SurfaceState::Graphic;
            }
            Err(err) => {
                debug!(error = %err, "Rendered markup has no usable geometry");
                self.viewport.clear();
                self.surface = SurfaceState::Placeholder;
            }
        }

        self.status = if repaired {
            format!(
                "Rendered ({} mode) after automatically quoting bracket labels",
                self.theme
            )
        } else {
            format!("Rendered ({} mode)", self.theme)
        };
        self.last_render = Some(result);
    }

    fn apply_failure(&mut self, err: RenderError, repaired: bool) {
        warn!(error = %err, repaired, "Render failed");
        self.viewport.clear();
        self.last_render = None;
        self.surface = SurfaceState::Error {
            message: err.to_string(),
            tip: repaired.then(|| REPAIR_TIP.to_string()),
        };
        self.status = STATUS_RENDER_ERROR.to_string();
    }

    /// Flip the theme, reconfigure the engine, and re-render immediately
    pub fn toggle_theme(&mut self) -> Option<RenderRequest> {
        self.theme = self.theme.toggled();
        self.adapter.configure(self.theme);
        info!(theme = %self.theme, "Theme toggled");
        self.render_now()
    }

    fn has_graphic(&self) -> bool {
        self.surface == SurfaceState::Graphic
    }

    /// Wheel input over the stage. Returns true when consumed, in which case
    /// the host should suppress page scrolling.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.has_graphic() && self.viewport.zoom(delta_y)
    }

    pub fn pointer_down(&mut self, pointer_id: i32, button: i16, position: Point) -> bool {
        self.has_graphic() && self.viewport.begin_pan(pointer_id, button, position)
    }

    pub fn pointer_move(&mut self, pointer_id: i32, position: Point, stage: Size) -> bool {
        self.viewport.pan_to(pointer_id, position, stage)
    }

    /// Release, cancel, or lost capture of `pointer_id`
    pub fn pointer_up(&mut self, pointer_id: i32) -> bool {
        self.viewport.end_pan(pointer_id)
    }

    /// Double-click/double-tap: back to the fitted view
    pub fn double_click(&mut self) -> bool {
        if !self.has_graphic() || !self.viewport.reset() {
            return false;
        }
        self.status = STATUS_VIEW_RESET.to_string();
        true
    }

    /// The markup to copy, or `None` (and a status message) without a render
    pub fn copy_source(&mut self) -> Option<String> {
        match &self.last_render {
            Some(result) => Some(result.markup.clone()),
            None => {
                self.status = STATUS_NOTHING_TO_COPY.to_string();
                None
            }
        }
    }

    /// Record how a host-side clipboard write went
    pub fn report_copy(&mut self, result: Result<(), ExportError>) {
        self.status = match result {
            Ok(()) => STATUS_COPIED.to_string(),
            Err(err) => {
                warn!(error = %err, "Copy failed");
                format!("Copy failed: {}", err)
            }
        };
    }

    /// Copy the original markup through `clipboard`
    pub fn copy_markup(&mut self, clipboard: &mut dyn Clipboard) {
        if let Some(markup) = self.copy_source() {
            let result = clipboard.write_text(&markup);
            self.report_copy(result);
        }
    }

    /// The file to download, or `None` (and a status message) without a render
    pub fn download_file(&mut self) -> Option<ExportFile> {
        match &self.last_render {
            Some(result) => Some(to_svg_file(&result.markup)),
            None => {
                self.status = STATUS_NOTHING_TO_DOWNLOAD.to_string();
                None
            }
        }
    }

    /// Record how a host-side download went
    pub fn report_download(&mut self, result: Result<(), ExportError>) {
        self.status = match result {
            Ok(()) => STATUS_DOWNLOAD_STARTED.to_string(),
            Err(err) => {
                warn!(error = %err, "Download failed");
                format!("Download failed: {}", err)
            }
        };
    }

    /// Save the original markup as `diagram.svg` through `sink`
    pub fn download(&mut self, sink: &mut dyn FileSink) {
        if let Some(file) = self.download_file() {
            let result = sink.save(&file);
            self.report_download(result);
        }
    }

    /// Markup for the stage, with the current view box applied
    pub fn display_markup(&self) -> Option<String> {
        if !self.has_graphic() {
            return None;
        }
        let result = self.last_render.as_ref()?;
        let view_box = self.viewport.current()?;
        display_markup(&result.markup, &view_box).ok()
    }

    pub fn view(&self) -> SurfaceView {
        SurfaceView {
            state: self.surface.clone(),
            source: self.source.clone(),
            status: self.status.clone(),
            theme: self.theme,
            theme_toggle_label: self.theme.toggle_label(),
            exports_enabled: self.exports_enabled(),
            viewport: self.viewport.state(),
            view_box: self.viewport.current(),
            display_markup: self.display_markup(),
            is_panning: self.viewport.is_panning(),
            bind_render_id: self
                .last_render
                .as_ref()
                .filter(|result| result.interactive && self.has_graphic())
                .map(|result| result.render_id.clone()),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RenderOptions;

    struct Fixed(&'static str);

    impl DiagramEngine for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn render(
            &mut self,
            _: &RenderRequest,
            _: &RenderOptions,
        ) -> Result<EngineOutput, RenderError> {
            Ok(EngineOutput::new(self.0))
        }
    }

    #[test]
    fn test_new_session_is_placeholder() {
        let session = Session::default();
        assert_eq!(session.source(), DEFAULT_DIAGRAM);
        assert_eq!(session.surface(), &SurfaceState::Placeholder);
        assert!(!session.exports_enabled());
        assert_eq!(session.status(), "");
    }

    #[test]
    fn test_markup_without_svg_keeps_exports() {
        let mut session = Session::default();
        let request = session.render_now().unwrap();
        session.drive(&mut Fixed("<div>not svg</div>"), request);
        assert_eq!(session.surface(), &SurfaceState::Placeholder);
        assert!(session.exports_enabled());
        assert_eq!(session.viewport().state(), ViewportState::Empty);
        assert!(session.display_markup().is_none());
    }

    #[test]
    fn test_wheel_ignored_without_graphic() {
        let mut session = Session::default();
        assert!(!session.wheel(1.0));
        assert!(!session.double_click());
    }

    #[test]
    fn test_tick_before_deadline_does_nothing() {
        let mut session = Session::default();
        session.edit("flowchart TD\n A-->B", Duration::ZERO);
        let mut engine = Fixed("<svg viewBox=\"0 0 1 1\"/>");
        assert!(!session.tick(Duration::from_millis(179), &mut engine));
        assert_eq!(session.adapter().renders_issued(), 0);
    }
}

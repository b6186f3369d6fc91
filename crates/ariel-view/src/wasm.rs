//! WebAssembly bindings
//!
//! The browser host owns Mermaid. It asks the session for render requests,
//! awaits `mermaid.render` itself, and reports each outcome back by render
//! id. All structured values cross the boundary as JSON strings.
//!
//! Every issued request must be reported back with `completeRender` or
//! `failRender`, or released with `abandonRender` when the host gives up on
//! it; until then the request is kept so a late outcome still applies.

use std::time::Duration;

use kurbo::{Point, Size};
use wasm_bindgen::prelude::*;

use crate::core::{
    quote_bracket_labels, svg_data_uri, EngineOutput, ExportError, PendingRenders, RenderError,
    RenderOptions, RenderRequest, ThemeMode,
};
use crate::session::Session;

/// Initialize WASM module
///
/// Sets up the panic hook and routes logs to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

fn timestamp(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        Duration::from_secs_f64(now_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn report(error: Option<String>, wrap: fn(String) -> ExportError) -> Result<(), ExportError> {
    match error {
        Some(message) => Err(wrap(message)),
        None => Ok(()),
    }
}

/// Editor session driven from JavaScript
#[wasm_bindgen]
pub struct ArielSession {
    session: Session,
    in_flight: PendingRenders,
}

impl ArielSession {
    /// Remember an issued request so its outcome can be matched by id
    fn track(&mut self, request: Option<RenderRequest>) -> Result<Option<String>, JsValue> {
        match request {
            Some(request) => {
                let json = to_json(&request)?;
                self.in_flight.track(request);
                Ok(Some(json))
            }
            None => Ok(None),
        }
    }

    fn finish(
        &mut self,
        render_id: &str,
        outcome: Result<EngineOutput, RenderError>,
    ) -> Result<Option<String>, JsValue> {
        let request = self
            .in_flight
            .take(render_id)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown render id: {}", render_id)))?;
        let follow_up = self.session.complete(&request, outcome);
        self.track(follow_up)
    }
}

#[wasm_bindgen]
impl ArielSession {
    /// Start a session on the sample diagram
    #[wasm_bindgen(constructor)]
    pub fn new(prefers_light: bool) -> ArielSession {
        ArielSession {
            session: Session::new(ThemeMode::from_preference(prefers_light)),
            in_flight: PendingRenders::new(),
        }
    }

    /// `mermaid.initialize` config for the current theme, as JSON
    #[wasm_bindgen(js_name = engineConfig)]
    pub fn engine_config(&self) -> Result<String, JsValue> {
        to_json(&RenderOptions::for_theme(self.session.theme()))
    }

    /// Request JSON for an immediate render, or nothing for empty input
    #[wasm_bindgen(js_name = renderNow)]
    pub fn render_now(&mut self) -> Result<Option<String>, JsValue> {
        let request = self.session.render_now();
        self.track(request)
    }

    pub fn edit(&mut self, text: String, now_ms: f64) {
        self.session.edit(text, timestamp(now_ms));
    }

    /// Request JSON once the debounce has elapsed
    pub fn poll(&mut self, now_ms: f64) -> Result<Option<String>, JsValue> {
        let request = self.session.poll(timestamp(now_ms));
        self.track(request)
    }

    /// Milliseconds timestamp at which `poll` should be called next
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.session
            .next_deadline()
            .map(|due| due.as_secs_f64() * 1000.0)
    }

    /// Report a successful `mermaid.render`; may return a follow-up request
    #[wasm_bindgen(js_name = completeRender)]
    pub fn complete_render(
        &mut self,
        render_id: &str,
        svg: String,
        interactive: bool,
    ) -> Result<Option<String>, JsValue> {
        let output = EngineOutput::new(svg).with_interactive(interactive);
        self.finish(render_id, Ok(output))
    }

    /// Report a rejected `mermaid.render`; may return the repair retry
    #[wasm_bindgen(js_name = failRender)]
    pub fn fail_render(&mut self, render_id: &str, message: String) -> Result<Option<String>, JsValue> {
        self.finish(render_id, Err(RenderError::rejected(message)))
    }

    /// Release a request whose `mermaid.render` will never settle
    #[wasm_bindgen(js_name = abandonRender)]
    pub fn abandon_render(&mut self, render_id: &str) -> bool {
        self.in_flight.abandon(render_id)
    }

    /// Flip the theme; returns the re-render request
    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&mut self) -> Result<Option<String>, JsValue> {
        let request = self.session.toggle_theme();
        self.track(request)
    }

    /// Returns true when the host should call `preventDefault`
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.session.wheel(delta_y)
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, pointer_id: i32, button: i16, x: f64, y: f64) -> bool {
        self.session.pointer_down(pointer_id, button, Point::new(x, y))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(
        &mut self,
        pointer_id: i32,
        x: f64,
        y: f64,
        stage_width: f64,
        stage_height: f64,
    ) -> bool {
        self.session.pointer_move(
            pointer_id,
            Point::new(x, y),
            Size::new(stage_width, stage_height),
        )
    }

    /// Pointer up, cancel, or lost capture
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, pointer_id: i32) -> bool {
        self.session.pointer_up(pointer_id)
    }

    #[wasm_bindgen(js_name = doubleClick)]
    pub fn double_click(&mut self) -> bool {
        self.session.double_click()
    }

    /// Markup for `navigator.clipboard.writeText`
    #[wasm_bindgen(js_name = copyText)]
    pub fn copy_text(&mut self) -> Option<String> {
        self.session.copy_source()
    }

    /// `error` is the rejection message, or absent on success
    #[wasm_bindgen(js_name = reportCopy)]
    pub fn report_copy(&mut self, error: Option<String>) {
        self.session.report_copy(report(error, ExportError::clipboard));
    }

    /// Markup for the `diagram.svg` blob
    #[wasm_bindgen(js_name = downloadText)]
    pub fn download_text(&mut self) -> Option<String> {
        self.session
            .download_file()
            .map(|file| String::from_utf8_lossy(&file.bytes).into_owned())
    }

    #[wasm_bindgen(js_name = reportDownload)]
    pub fn report_download(&mut self, error: Option<String>) {
        self.session.report_download(report(error, ExportError::file));
    }

    /// Surface snapshot as JSON
    pub fn view(&self) -> Result<String, JsValue> {
        to_json(&self.session.view())
    }
}

/// Quote bracket labels; returns the input unchanged when nothing applies
#[wasm_bindgen(js_name = quoteBracketLabels)]
pub fn quote_labels(definition: &str) -> String {
    quote_bracket_labels(definition)
        .map(|repair| repair.text)
        .unwrap_or_else(|| definition.to_string())
}

/// Inline markup as a `data:image/svg+xml;base64,...` URI
#[wasm_bindgen(js_name = svgDataUri)]
pub fn data_uri(markup: &str) -> String {
    svg_data_uri(markup)
}

//! Render adapter around an external diagram engine
//!
//! The engine is opaque: a definition goes in, SVG markup (or a rejection)
//! comes out. The adapter owns the engine options for the current theme and
//! hands out render identifiers so output from successive renders never
//! collides.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, span, warn, Level};

use super::error::RenderError;
use super::theme::ThemeMode;

/// Prefix of every render identifier
pub const RENDER_ID_PREFIX: &str = "ariel-view";

pub const DEFAULT_FONT_FAMILY: &str =
    "Inter, system-ui, -apple-system, BlinkMacSystemFont, \"Segoe UI\", sans-serif";

/// Engine configuration, serialized in Mermaid's config shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub start_on_load: bool,
    pub security_level: String,
    pub deterministic_ids: bool,
    pub theme: String,
    pub font_family: String,
}

impl RenderOptions {
    pub fn for_theme(theme: ThemeMode) -> Self {
        Self {
            start_on_load: false,
            security_level: "loose".to_string(),
            deterministic_ids: true,
            theme: theme.engine_theme().to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::for_theme(ThemeMode::default())
    }
}

/// One submission to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub render_id: String,
    pub definition: String,
    /// Whether a rejection may still be auto-repaired
    pub allow_repair: bool,
    /// The definition is the output of an auto-repair
    pub repaired: bool,
}

/// What the engine returns on success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub svg: String,
    /// The engine produced a hook that binds interactive handlers to the
    /// mounted graphic; the hook itself stays with the host
    pub interactive: bool,
}

impl EngineOutput {
    pub fn new(svg: impl Into<String>) -> Self {
        Self {
            svg: svg.into(),
            interactive: false,
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// A successful render, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub markup: String,
    pub definition: String,
    pub render_id: String,
    pub interactive: bool,
}

impl RenderResult {
    pub fn new(request: &RenderRequest, output: EngineOutput) -> Self {
        Self {
            markup: output.svg,
            definition: request.definition.clone(),
            render_id: request.render_id.clone(),
            interactive: output.interactive,
        }
    }
}

/// An external engine turning definitions into SVG markup
pub trait DiagramEngine {
    /// Short engine name for logs
    fn name(&self) -> &str;

    fn render(
        &mut self,
        request: &RenderRequest,
        options: &RenderOptions,
    ) -> Result<EngineOutput, RenderError>;
}

impl<E: DiagramEngine + ?Sized> DiagramEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render(
        &mut self,
        request: &RenderRequest,
        options: &RenderOptions,
    ) -> Result<EngineOutput, RenderError> {
        (**self).render(request, options)
    }
}

/// Issues render requests with the current options
#[derive(Debug, Clone, Default)]
pub struct RenderAdapter {
    options: Option<RenderOptions>,
    next_id: u64,
}

impl RenderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine options for `theme`; calling it again is harmless
    pub fn configure(&mut self, theme: ThemeMode) -> &RenderOptions {
        debug!(theme = %theme, "Configuring render options");
        self.options.insert(RenderOptions::for_theme(theme))
    }

    pub fn is_configured(&self) -> bool {
        self.options.is_some()
    }

    /// Current options, configuring the default theme on first use
    pub fn options(&mut self) -> &RenderOptions {
        self.options.get_or_insert_with(RenderOptions::default)
    }

    /// Number of identifiers handed out so far
    pub fn renders_issued(&self) -> u64 {
        self.next_id
    }

    /// Consume the next render identifier and build a request
    pub fn request(&mut self, definition: &str, allow_repair: bool, repaired: bool) -> RenderRequest {
        let render_id = format!("{}-{}", RENDER_ID_PREFIX, self.next_id);
        self.next_id += 1;
        RenderRequest {
            render_id,
            definition: definition.to_string(),
            allow_repair,
            repaired,
        }
    }

    /// Run one request through `engine`
    pub fn submit<E: DiagramEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        request: &RenderRequest,
    ) -> Result<EngineOutput, RenderError> {
        let render_span = span!(
            Level::INFO,
            "render",
            engine = engine.name(),
            render_id = %request.render_id,
            input_len = request.definition.len()
        );
        let _enter = render_span.enter();

        let options = self.options();
        match engine.render(request, options) {
            Ok(output) => {
                info!(output_len = output.svg.len(), "Render completed");
                Ok(output)
            }
            Err(err) => {
                warn!(error = %err, "Render rejected");
                Err(err)
            }
        }
    }

    /// Render `definition` once, without auto-repair
    pub fn render<E: DiagramEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        definition: &str,
    ) -> Result<RenderResult, RenderError> {
        let request = self.request(definition, false, false);
        let output = self.submit(engine, &request)?;
        Ok(RenderResult::new(&request, output))
    }
}

/// Requests handed to an asynchronous host and not yet reported back.
///
/// Stale requests are not dropped when a newer one completes, since the last
/// completed render wins. Every tracked id stays until the host reports it
/// through [`PendingRenders::take`] or gives up on it with
/// [`PendingRenders::abandon`].
#[derive(Debug, Clone, Default)]
pub struct PendingRenders {
    requests: HashMap<String, RenderRequest>,
}

impl PendingRenders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, request: RenderRequest) {
        debug!(render_id = %request.render_id, pending = self.requests.len() + 1, "Render in flight");
        self.requests.insert(request.render_id.clone(), request);
    }

    /// Remove and return the request the host is reporting on
    pub fn take(&mut self, render_id: &str) -> Option<RenderRequest> {
        self.requests.remove(render_id)
    }

    /// Forget a request whose outcome will never arrive
    pub fn abandon(&mut self, render_id: &str) -> bool {
        let removed = self.requests.remove(render_id).is_some();
        if removed {
            debug!(render_id, "Render abandoned");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl DiagramEngine for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn render(
            &mut self,
            request: &RenderRequest,
            options: &RenderOptions,
        ) -> Result<EngineOutput, RenderError> {
            if request.definition.contains("bad") {
                return Err(RenderError::rejected("Parse error"));
            }
            Ok(EngineOutput::new(format!(
                "<svg id=\"{}\" data-theme=\"{}\"/>",
                request.render_id, options.theme
            )))
        }
    }

    #[test]
    fn test_ids_are_monotonic_across_failures() {
        let mut adapter = RenderAdapter::new();
        let mut engine = Echo;
        assert_eq!(adapter.render(&mut engine, "ok").unwrap().render_id, "ariel-view-0");
        assert!(adapter.render(&mut engine, "bad").is_err());
        assert_eq!(adapter.render(&mut engine, "ok").unwrap().render_id, "ariel-view-2");
        assert_eq!(adapter.renders_issued(), 3);
    }

    #[test]
    fn test_unconfigured_adapter_uses_dark_defaults() {
        let mut adapter = RenderAdapter::new();
        assert!(!adapter.is_configured());
        let result = adapter.render(&mut Echo, "ok").unwrap();
        assert!(result.markup.contains("data-theme=\"dark\""));
        assert!(adapter.is_configured());
    }

    #[test]
    fn test_configure_is_idempotent() {
        let mut adapter = RenderAdapter::new();
        let first = adapter.configure(ThemeMode::Light).clone();
        let second = adapter.configure(ThemeMode::Light).clone();
        assert_eq!(first, second);
        assert_eq!(first.theme, "default");
    }

    #[test]
    fn test_options_json_shape() {
        let json = RenderOptions::for_theme(ThemeMode::Dark).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["startOnLoad"], false);
        assert_eq!(value["securityLevel"], "loose");
        assert_eq!(value["deterministicIds"], true);
        assert_eq!(value["theme"], "dark");
    }

    #[test]
    fn test_pending_renders_keep_stale_requests() {
        let mut adapter = RenderAdapter::new();
        let mut pending = PendingRenders::new();
        let first = adapter.request("A-->B", true, false);
        let second = adapter.request("A-->C", true, false);
        pending.track(first.clone());
        pending.track(second.clone());

        assert_eq!(pending.take(&second.render_id), Some(second));
        assert_eq!(pending.take(&first.render_id), Some(first));
        assert!(pending.take("ariel-view-0").is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_abandoned_render_is_released() {
        let mut adapter = RenderAdapter::new();
        let mut pending = PendingRenders::new();
        let request = adapter.request("A-->B", true, false);
        pending.track(request.clone());
        assert_eq!(pending.len(), 1);

        assert!(pending.abandon(&request.render_id));
        assert!(!pending.abandon(&request.render_id));
        assert!(pending.take(&request.render_id).is_none());
        assert!(pending.is_empty());
    }
}

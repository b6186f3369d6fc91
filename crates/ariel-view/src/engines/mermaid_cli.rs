//! Mermaid CLI (`mmdc`) engine
//!
//! Each render gets its own temporary directory holding the definition, the
//! JSON config, and the output SVG. The directory is removed when the render
//! returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

use crate::core::{DiagramEngine, EngineOutput, RenderError, RenderOptions, RenderRequest};

/// Environment variable overriding the `mmdc` executable
pub const MMDC_ENV: &str = "ARIEL_VIEW_MMDC";

const DEFAULT_PROGRAM: &str = "mmdc";

/// Renders through the Mermaid command-line interface
#[derive(Debug, Clone)]
pub struct MermaidCli {
    program: PathBuf,
    background: String,
}

impl MermaidCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            background: "transparent".to_string(),
        }
    }

    /// Use `ARIEL_VIEW_MMDC` if set, else `mmdc` from `PATH`
    pub fn from_env() -> Self {
        let program = std::env::var_os(MMDC_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));
        Self::new(program)
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn engine_error(&self, action: &str, err: impl std::fmt::Display) -> RenderError {
        RenderError::engine(format!(
            "{} ({}): {}",
            action,
            self.program.display(),
            err
        ))
    }
}

impl Default for MermaidCli {
    fn default() -> Self {
        Self::from_env()
    }
}

impl DiagramEngine for MermaidCli {
    fn name(&self) -> &str {
        "mmdc"
    }

    fn render(
        &mut self,
        request: &RenderRequest,
        options: &RenderOptions,
    ) -> Result<EngineOutput, RenderError> {
        let workdir = tempfile::Builder::new()
            .prefix("ariel-view-")
            .tempdir()
            .map_err(|err| self.engine_error("failed to create work directory", err))?;

        let input = workdir.path().join("input.mmd");
        let config = workdir.path().join("config.json");
        let output = workdir.path().join("output.svg");

        fs::write(&input, &request.definition)
            .map_err(|err| self.engine_error("failed to stage definition", err))?;
        let config_json = options
            .to_json()
            .map_err(|err| self.engine_error("failed to encode config", err))?;
        fs::write(&config, config_json)
            .map_err(|err| self.engine_error("failed to stage config", err))?;

        trace!(workdir = %workdir.path().display(), "Invoking mmdc");
        let result = Command::new(&self.program)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .arg("-c")
            .arg(&config)
            .arg("-t")
            .arg(&options.theme)
            .arg("-b")
            .arg(&self.background)
            .arg("-I")
            .arg(&request.render_id)
            .arg("-q")
            .output()
            .map_err(|err| self.engine_error("failed to run", err))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stdout = String::from_utf8_lossy(&result.stdout);
            let message = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|text| !text.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} exited with {}", self.program.display(), result.status));
            debug!(status = %result.status, "mmdc rejected definition");
            return Err(RenderError::rejected(message));
        }

        let svg = fs::read_to_string(&output)
            .map_err(|err| self.engine_error("no SVG produced", err))?;
        Ok(EngineOutput::new(svg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ThemeMode;

    #[test]
    fn test_missing_program_is_engine_error() {
        let mut engine = MermaidCli::new("/nonexistent/ariel-view-mmdc");
        let request = RenderRequest {
            render_id: "ariel-view-0".to_string(),
            definition: "flowchart TD\n A-->B".to_string(),
            allow_repair: true,
            repaired: false,
        };
        let err = engine
            .render(&request, &RenderOptions::for_theme(ThemeMode::Dark))
            .unwrap_err();
        assert!(matches!(err, RenderError::Engine { .. }));
        assert!(err.message().contains("/nonexistent/ariel-view-mmdc"));
    }

    #[test]
    fn test_builder_options() {
        let engine = MermaidCli::new("custom-mmdc").with_background("white");
        assert_eq!(engine.program(), Path::new("custom-mmdc"));
        assert_eq!(engine.background, "white");
    }
}

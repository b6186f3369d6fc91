//! Core error types for rendering, export, and geometry
//!
//! Render failures are recoverable through auto-repair and are otherwise shown
//! verbatim. Export failures end up in the status line. Geometry failures never
//! reach the user; the session neutralizes them.

use thiserror::Error;

/// The diagram engine could not produce markup for a definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The engine rejected the definition (syntax error, unsupported construct)
    #[error("{message}")]
    Rejected { message: String },

    /// The engine itself could not be reached or failed outside of parsing
    #[error("Diagram engine unavailable: {message}")]
    Engine { message: String },
}

impl RenderError {
    /// Create a new rejection with the engine's own message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a new engine failure
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// The raw message, without any prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message } | Self::Engine { message } => message,
        }
    }
}

/// Copying or saving the current markup failed
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{message}")]
    Clipboard { message: String },

    #[error("{message}")]
    File { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Create a new clipboard error
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard {
            message: message.into(),
        }
    }

    /// Create a new file error
    pub fn file(message: impl Into<String>) -> Self {
        Self::File {
            message: message.into(),
        }
    }
}

impl From<tempfile::PersistError> for ExportError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io { source: err.error }
    }
}

/// Rendered output or surface geometry that cannot drive the viewport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("markup has no <svg> root element")]
    MissingRoot,

    #[error("unable to read svg markup: {message}")]
    Malformed { message: String },

    #[error("unable to measure svg: {message}")]
    Unmeasurable { message: String },

    #[error("viewport has zero size ({width}x{height})")]
    DegenerateViewport { width: f64, height: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_verbatim() {
        let error = RenderError::rejected("Parse error on line 2");
        assert_eq!(error.to_string(), "Parse error on line 2");
        assert_eq!(error.message(), "Parse error on line 2");
    }

    #[test]
    fn test_engine_error_is_prefixed() {
        let error = RenderError::engine("mmdc not found");
        assert!(error.to_string().starts_with("Diagram engine unavailable"));
        assert_eq!(error.message(), "mmdc not found");
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let error: ExportError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("read-only"));
    }
}

//! Copy and download of the current markup
//!
//! Exports always carry the engine's original markup, never the display copy
//! rewritten for the current zoom/pan.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ExportError;

pub const DOWNLOAD_FILE_NAME: &str = "diagram.svg";
pub const SVG_MIME_TYPE: &str = "image/svg+xml;charset=utf-8";

/// A file ready to hand to the host for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Package markup as `diagram.svg`
pub fn to_svg_file(markup: &str) -> ExportFile {
    ExportFile {
        name: DOWNLOAD_FILE_NAME.to_string(),
        mime: SVG_MIME_TYPE,
        bytes: markup.as_bytes().to_vec(),
    }
}

/// Inline the markup as a base64 `data:` URI
pub fn svg_data_uri(markup: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(markup))
}

/// Destination for the copy action
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// Destination for the download action
pub trait FileSink {
    fn save(&mut self, file: &ExportFile) -> Result<(), ExportError>;
}

/// Clipboard that writes the text to any writer (stdout in the CLI)
#[derive(Debug)]
pub struct WriterClipboard<W: Write> {
    writer: W,
}

impl<W: Write> WriterClipboard<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Clipboard for WriterClipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        self.writer.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Saves downloads into a directory.
///
/// Each file is written to a temporary file in the same directory and then
/// persisted over the target name, so readers never see a partial file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    last_saved: Option<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_saved: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent successful save
    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, file: &ExportFile) -> Result<(), ExportError> {
        if file.name.contains(['/', '\\']) || file.name.is_empty() {
            return Err(ExportError::file(format!(
                "Invalid download name: {:?}",
                file.name
            )));
        }

        let target = self.dir.join(&file.name);
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        staged.write_all(&file.bytes)?;
        staged.flush()?;
        staged.persist(&target)?;

        debug!(path = %target.display(), bytes = file.bytes.len(), "Saved download");
        self.last_saved = Some(target);
        Ok(())
    }
}

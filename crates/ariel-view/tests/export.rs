//! Tests for copy/download sinks

use ariel_view::core::{
    svg_data_uri, to_svg_file, Clipboard, DirectorySink, ExportError, FileSink, WriterClipboard,
};
use std::fs;

#[test]
fn test_directory_sink_writes_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = DirectorySink::new(dir.path());

    sink.save(&to_svg_file("<svg>one</svg>")).unwrap();
    let saved = sink.last_saved().unwrap().to_path_buf();
    assert_eq!(saved, dir.path().join("diagram.svg"));
    assert_eq!(fs::read_to_string(&saved).unwrap(), "<svg>one</svg>");

    sink.save(&to_svg_file("<svg>two</svg>")).unwrap();
    assert_eq!(fs::read_to_string(&saved).unwrap(), "<svg>two</svg>");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_directory_sink_missing_dir_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = DirectorySink::new(dir.path().join("missing"));
    let err = sink.save(&to_svg_file("<svg/>")).unwrap_err();
    assert!(matches!(err, ExportError::Io { .. }));
    assert!(sink.last_saved().is_none());
}

#[test]
fn test_writer_clipboard_keeps_trailing_newline() {
    let mut clipboard = WriterClipboard::new(Vec::new());
    clipboard.write_text("<svg/>\n").unwrap();
    clipboard.write_text("<svg/>").unwrap();
    assert_eq!(clipboard.into_inner(), b"<svg/>\n<svg/>\n");
}

#[test]
fn test_data_uri_of_unicode_markup() {
    let uri = svg_data_uri("<svg><text>é</text></svg>");
    assert!(uri.starts_with("data:image/svg+xml;base64,"));
    assert!(!uri.contains('é'));
}

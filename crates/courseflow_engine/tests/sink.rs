mod common;

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;

use courseflow_engine::{DocumentSink, HttpDocumentSink, LocalDocumentSink};

use common::init_logging;

#[test]
fn local_sink_creates_nested_directories() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let sink = LocalDocumentSink::new(temp.path().to_path_buf());

    sink.write("algo-course/flows/flow-1.yml", b"title: x", true)
        .unwrap();

    let written = temp.path().join("algo-course/flows/flow-1.yml");
    assert_eq!(fs::read_to_string(written).unwrap(), "title: x");
}

#[test]
fn local_sink_replaces_existing_documents() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let sink = LocalDocumentSink::new(temp.path().to_path_buf());

    sink.write("course.yml", b"first", true).unwrap();
    sink.write("course.yml", b"second", true).unwrap();

    assert_eq!(
        fs::read_to_string(temp.path().join("course.yml")).unwrap(),
        "second"
    );
}

#[test]
fn local_sink_strips_leading_slash() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let sink = LocalDocumentSink::new(temp.path().to_path_buf());

    sink.write("/algo-course/course.yml", b"x", true).unwrap();

    assert!(temp.path().join("algo-course/course.yml").is_file());
}

#[test]
fn local_sink_leaves_no_partial_file_on_error() {
    init_logging();
    let temp = TempDir::new().unwrap();
    // The would-be parent directory is an existing file.
    let blocker = temp.path().join("blocked");
    fs::write(&blocker, b"x").unwrap();
    let sink = LocalDocumentSink::new(temp.path().to_path_buf());

    let result = sink.write("blocked/doc.yml", b"data", true);

    assert!(result.is_err());
    assert!(!temp.path().join("blocked/doc.yml").exists());
}

#[test]
fn http_sink_without_token_is_a_silent_noop() {
    init_logging();
    // Port 9 is discard; if the sink tried to connect this would fail, but
    // without a token no request may be attempted at all.
    let endpoint = Url::parse("http://127.0.0.1:9/publish").unwrap();
    let sink = HttpDocumentSink::new(endpoint, None).unwrap();

    sink.write("algo-course/course.yml", b"x", true).unwrap();
}

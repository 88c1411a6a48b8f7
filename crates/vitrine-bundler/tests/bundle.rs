//! End-to-end bundling through Rolldown.

use async_trait::async_trait;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vitrine_bundler::diagnostics::DiagnosticKind;
use vitrine_bundler::stream::CHUNK_SIZE;
use vitrine_bundler::{Error, ModuleBundler, REGISTRY_GLOBAL, StreamOutcome};
use vitrine_core::{
    ChunkSink, CompilationFailure, ErrorSurface, FailureNotice, Notifier, RequestDescriptor, RootSet,
    SinkClosed, TransformOptions,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<FailureNotice>>);

#[async_trait]
impl Notifier for Recorder {
    async fn notify(&self, notice: FailureNotice) {
        self.0.lock().unwrap().push(notice);
    }
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("helper.js"),
        "module.exports = function greet() { return 'hello from helper'; };\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("widget.js"),
        "var React = require('react');\nvar greet = require('./helper');\nmodule.exports = { greet: greet, React: React };\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("example.js"),
        "import React from 'react';\nexport default function Example() { return <div className=\"demo\">hi</div>; }\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("plain-jsx.js"),
        "var React = require('react');\nmodule.exports = <div>hi</div>;\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("broken.js"),
        "var missing = require('./does-not-exist');\n",
    )
    .unwrap();
    temp
}

fn options(uri: &str) -> TransformOptions {
    TransformOptions::from_request(&RequestDescriptor::from_uri(uri))
}

#[tokio::test]
async fn test_exposed_bundle_uses_registry_for_externals() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/widget.js").unwrap();

    let bundle = ModuleBundler::new(temp.path())
        .bundle(&file, &options("/widget.js?expose=my-widget&external=react"))
        .await
        .unwrap();
    let code = bundle.code();

    assert!(code.contains("my-widget"));
    assert!(code.contains(REGISTRY_GLOBAL));
    assert!(code.contains("hello from helper"));
    assert!(!code.contains("react.development"));
}

#[tokio::test]
async fn test_transpiled_jsx_uses_classic_runtime() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/example.js").unwrap();

    let bundle = ModuleBundler::new(temp.path())
        .bundle(&file, &options("/example.js?babelify&expose=example&external=react"))
        .await
        .unwrap();
    let code = bundle.code();

    assert!(code.contains("createElement"));
    assert!(!code.contains("jsx-runtime"));
}

#[tokio::test]
async fn test_debug_inlines_source_map() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/widget.js").unwrap();

    let bundle = ModuleBundler::new(temp.path())
        .bundle(&file, &options("/widget.js?debug&external=react"))
        .await
        .unwrap();
    assert!(bundle.code().contains("sourceMappingURL=data:application/json"));
}

#[tokio::test]
async fn test_stream_writes_bundle() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/widget.js").unwrap();
    let recorder = Arc::new(Recorder::default());

    let mut sink = Vec::new();
    let outcome = ModuleBundler::new(temp.path())
        .stream(
            &file,
            &options("/widget.js?external=react"),
            &mut sink,
            ErrorSurface::new("/widget.js", recorder.clone()),
        )
        .await;

    assert!(matches!(outcome, StreamOutcome::Completed { bytes } if bytes == sink.len()));
    assert!(String::from_utf8(sink).unwrap().contains("hello from helper"));
    assert!(recorder.0.lock().unwrap().is_empty());
}

/// Remembers the size of every write.
#[derive(Default)]
struct WriteSizes(Vec<usize>);

#[async_trait]
impl ChunkSink for WriteSizes {
    async fn write(&mut self, chunk: Vec<u8>) -> Result<(), SinkClosed> {
        self.0.push(chunk.len());
        Ok(())
    }
}

#[tokio::test]
async fn test_large_bundle_is_written_in_bounded_pieces() {
    let temp = project();
    let filler = "x".repeat(CHUNK_SIZE * 2);
    fs::write(
        temp.path().join("big.js"),
        format!("module.exports = \"{filler}\";\n"),
    )
    .unwrap();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/big.js").unwrap();

    let mut sink = WriteSizes::default();
    let outcome = ModuleBundler::new(temp.path())
        .stream(
            &file,
            &TransformOptions::default(),
            &mut sink,
            ErrorSurface::new("/big.js", Arc::new(Recorder::default())),
        )
        .await;

    let StreamOutcome::Completed { bytes } = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert!(sink.0.len() >= 3);
    assert!(sink.0.iter().all(|len| *len <= CHUNK_SIZE));
    assert_eq!(sink.0.iter().sum::<usize>(), bytes);
}

#[tokio::test]
async fn test_stream_ends_with_failure_payload() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/broken.js").unwrap();
    let recorder = Arc::new(Recorder::default());

    let mut sink = Vec::new();
    let outcome = ModuleBundler::new(temp.path())
        .stream(
            &file,
            &TransformOptions::default(),
            &mut sink,
            ErrorSurface::new("/broken.js", recorder.clone()),
        )
        .await;

    assert_eq!(outcome, StreamOutcome::Failed);
    let body = String::from_utf8(sink).unwrap();
    assert!(body.contains("does-not-exist"));
    assert!(body.trim_end().ends_with(");"));
    assert!(body.contains("throw new Error("));
    assert!(!body.contains("BuildDiagnostic"));

    let notices = recorder.0.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].path, "/broken.js");
    assert!(notices[0].message.contains("does-not-exist"));
    assert!(!notices[0].message.contains("BuildDiagnostic"));
}

#[tokio::test]
async fn test_parse_error_is_reported_readably() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/plain-jsx.js").unwrap();

    let err = ModuleBundler::new(temp.path())
        .bundle(&file, &options("/plain-jsx.js?external=react"))
        .await
        .unwrap_err();

    let Error::Bundler(diagnostics) = &err else {
        panic!("expected a bundler error, got {err:?}");
    };
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::ParseError);
    assert_eq!(diagnostic.line, Some(2));
    assert!(!diagnostic.message.is_empty());
    assert!(!diagnostic.message.contains("BuildDiagnostic"));
    assert!(!diagnostic.message.contains("module.exports"));
    assert!(diagnostic.frame.as_deref().unwrap().contains("<div>hi</div>"));

    let failure = CompilationFailure::from(err);
    assert!(failure.message.starts_with("ParseError: "));
    assert!(!failure.message.contains('\n'));
    assert!(failure.stack.unwrap().contains("plain-jsx.js:2:"));
}

#[tokio::test]
async fn test_project_inside_installed_package_transpiles() {
    let temp = TempDir::new().unwrap();
    let project_dir = temp.path().join("node_modules").join("my-button");
    fs::create_dir_all(&project_dir).unwrap();
    fs::write(
        project_dir.join("example.js"),
        "import React from 'react';\nexport default function Example() { return <div>hi</div>; }\n",
    )
    .unwrap();
    let roots = RootSet::new([&project_dir]);
    let file = roots.resolve("/example.js").unwrap();

    let bundle = ModuleBundler::new(&project_dir)
        .bundle(&file, &options("/example.js?babelify&external=react"))
        .await
        .unwrap();

    assert!(bundle.code().contains("createElement"));
}

#[tokio::test]
async fn test_stream_stops_when_client_leaves() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let file = roots.resolve("/widget.js").unwrap();

    let (mut tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(1);
    drop(rx);
    let outcome = ModuleBundler::new(temp.path())
        .stream(
            &file,
            &options("/widget.js?external=react"),
            &mut tx,
            ErrorSurface::new("/widget.js", Arc::new(Recorder::default())),
        )
        .await;
    assert_eq!(outcome, StreamOutcome::Cancelled);
}

#[tokio::test]
async fn test_render_bundle_keeps_bare_imports() {
    let temp = project();

    let code = ModuleBundler::new(temp.path())
        .bundle_for_render(&temp.path().join("example.js"))
        .await
        .unwrap();

    assert!(code.contains("require(\"react\")"));
    assert!(code.contains("createElement"));
}

#[tokio::test]
async fn test_concurrent_bundles_are_independent() {
    let temp = project();
    let roots = RootSet::new([temp.path()]);
    let bundler = ModuleBundler::new(temp.path());
    let widget = roots.resolve("/widget.js").unwrap();
    let example = roots.resolve("/example.js").unwrap();
    let widget_options = options("/widget.js?expose=first&external=react");
    let example_options = options("/example.js?babelify&expose=second&external=react");

    let (first, second) = tokio::join!(
        bundler.bundle(&widget, &widget_options),
        bundler.bundle(&example, &example_options),
    );

    let first = first.unwrap().code();
    let second = second.unwrap().code();
    assert!(first.contains("\"first\"") && !first.contains("\"second\""));
    assert!(second.contains("\"second\"") && !second.contains("\"first\""));
}

//! Request dispatch.
//!
//! Every request passes through [`dispatch`]. The classifier picks the
//! document, style or module handler in that order; unclaimed requests
//! continue to the static file fallback. Failures of claimed requests go
//! through the request's error surface exactly once.

use crate::dev::SharedState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use vitrine_core::{
    CONTENT_TYPE_JS, Classification, CompiledArtifact, HandlerKind, RequestDescriptor, decode_path,
};

/// Prefix of the server's own endpoints.
pub const INTERNAL_PREFIX: &str = "/__vitrine";

/// Script tag injected into every served document.
pub const RELOAD_SCRIPT_TAG: &str = r#"<script src="/__vitrine_reload__.js"></script>"#;

/// Chunks buffered between the bundler and the response body.
const STREAM_BUFFER: usize = 16;

/// Route a request to a content handler, or pass it on.
pub async fn dispatch(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD)
        || request.uri().path().starts_with(INTERNAL_PREFIX)
    {
        return next.run(request).await;
    }

    let descriptor = RequestDescriptor::new(request.uri().path(), request.uri().query());
    let Some(route) = state.classifier().classify(&descriptor) else {
        return next.run(request).await;
    };

    let path = descriptor.path().to_string();
    tracing::debug!(
        path = %path,
        handler = %route.handler,
        file = %route.file.path().display(),
        "dispatching request"
    );

    match route.handler {
        HandlerKind::Document => {
            let result = state.document().render_document(&route.file).await;
            respond(&state, &path, result).await
        }
        HandlerKind::Style => {
            let result = state.style().compile_style_blocking(route.file).await;
            respond(&state, &path, result).await
        }
        HandlerKind::Module => stream_module(state, path, route),
    }
}

/// Turn a buffered artifact into a response.
async fn respond(state: &SharedState, path: &str, result: CompiledArtifact) -> Response {
    match result {
        Ok(artifact) => {
            let bytes = inject_reload_script(&artifact.bytes, artifact.content_type);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, artifact.content_type),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                bytes,
            )
                .into_response()
        }
        Err(failure) => {
            let body = state.error_surface(path).report(&failure).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response()
        }
    }
}

/// Commit the headers, bundle in the background, then stream the output.
fn stream_module(state: SharedState, path: String, route: Classification) -> Response {
    let (mut tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(STREAM_BUFFER);
    let surface = state.error_surface(&path);

    tokio::spawn(async move {
        let outcome = state
            .bundler()
            .stream(&route.file, &route.options, &mut tx, surface)
            .await;
        tracing::debug!(path = %path, ?outcome, "module stream finished");
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JS));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// Static files from the first root that has them.
pub async fn serve_static(State(state): State<SharedState>, request: Request) -> Response {
    let path = decode_path(request.uri().path());

    let file = state
        .roots()
        .resolve(&path)
        .filter(|file| file.path().is_file());

    match file {
        Some(file) => match ServeFile::new(file.path()).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("File not found: {path}"),
        )
            .into_response(),
    }
}

/// Insert the live-reload script before `</body>` of HTML payloads.
pub fn inject_reload_script(content: &[u8], content_type: &str) -> Vec<u8> {
    if !content_type.starts_with("text/html") {
        return content.to_vec();
    }

    let html = String::from_utf8_lossy(content);

    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + RELOAD_SCRIPT_TAG.len() + 4);
        result.push_str(&html[..pos]);
        result.push_str("  ");
        result.push_str(RELOAD_SCRIPT_TAG);
        result.push('\n');
        result.push_str(&html[pos..]);
        return result.into_bytes();
    }

    let mut result = html.into_owned();
    result.push('\n');
    result.push_str(RELOAD_SCRIPT_TAG);
    result.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_reload_script_with_body() {
        let html = b"<html><body><h1>Test</h1></body></html>";
        let result = String::from_utf8(inject_reload_script(html, "text/html; charset=utf-8")).unwrap();

        let script_pos = result.find(RELOAD_SCRIPT_TAG).unwrap();
        let body_pos = result.find("</body>").unwrap();
        assert!(script_pos < body_pos);
    }

    #[test]
    fn test_inject_reload_script_without_body() {
        let result = String::from_utf8(inject_reload_script(b"<h1>Test</h1>", "text/html")).unwrap();
        assert!(result.ends_with(RELOAD_SCRIPT_TAG));
    }

    #[test]
    fn test_inject_reload_script_non_html() {
        let css = b"a { color: red }";
        assert_eq!(inject_reload_script(css, "text/css"), css);
    }
}

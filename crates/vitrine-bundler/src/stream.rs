//! Streaming bundles into a [`ChunkSink`].
//!
//! Rolldown hands back the output only once `generate()` has finished, so
//! nothing reaches the sink before the whole bundle exists. What streams is
//! the delivery: headers go out when the request is classified, then the
//! finished output is written in pieces of at most 64 KiB, which keeps a
//! slow client from holding a second copy of a large bundle in the
//! transport buffer.
//!
//! The response status is committed before bundling starts, so a failure
//! cannot change it. Instead the stream ends with a failure payload: the
//! error surface body in a comment followed by a `throw`, which keeps the
//! response a valid script that fails loudly in the browser console.

use crate::ModuleBundler;
use crate::plugins::js_string;
use vitrine_core::{ChunkSink, CompilationFailure, ErrorSurface, ResolvedFile, TransformOptions};

/// Largest piece written to the sink at once.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// How a streamed bundle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The whole bundle was written.
    Completed { bytes: usize },
    /// Bundling failed; the failure payload was written.
    Failed,
    /// The consumer went away.
    Cancelled,
}

impl ModuleBundler {
    /// Bundle `file`, then write the finished output into `sink` in pieces.
    pub async fn stream<S>(
        &self,
        file: &ResolvedFile,
        options: &TransformOptions,
        sink: &mut S,
        surface: ErrorSurface,
    ) -> StreamOutcome
    where
        S: ChunkSink + ?Sized,
    {
        let bundle = match self.bundle(file, options).await {
            Ok(bundle) => bundle,
            Err(err) => {
                let failure = CompilationFailure::from(err);
                let body = surface.report(&failure).await;
                return match sink.write(failure_payload(&failure.message, &body).into_bytes()).await {
                    Ok(()) => StreamOutcome::Failed,
                    Err(_) => StreamOutcome::Cancelled,
                };
            }
        };

        let mut bytes = 0;
        for (index, chunk) in bundle.chunks.iter().enumerate() {
            if index > 0 {
                if sink.write(b"\n".to_vec()).await.is_err() {
                    return StreamOutcome::Cancelled;
                }
                bytes += 1;
            }
            for piece in chunk.as_bytes().chunks(CHUNK_SIZE) {
                if sink.write(piece.to_vec()).await.is_err() {
                    tracing::debug!(file = %file.path().display(), "client went away mid-stream");
                    return StreamOutcome::Cancelled;
                }
                bytes += piece.len();
            }
        }

        tracing::debug!(file = %file.path().display(), bytes, "streamed bundle");
        StreamOutcome::Completed { bytes }
    }
}

/// Script that ends a failed stream: the report as a comment, then a throw.
pub fn failure_payload(message: &str, body: &str) -> String {
    let mut payload = String::from("\n/*\n");
    for line in body.lines() {
        payload.push_str(" * ");
        payload.push_str(&line.replace("*/", "* /"));
        payload.push('\n');
    }
    payload.push_str(" */\n");
    payload.push_str(&format!("throw new Error({});\n", js_string(message)));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_payload_is_a_script() {
        let payload = failure_payload(
            "Could not resolve \"left-pad\"",
            "Could not resolve \"left-pad\"\n    at /work/a.js:1:1",
        );
        assert!(payload.contains(" * Could not resolve \"left-pad\""));
        assert!(payload.contains(" *     at /work/a.js:1:1"));
        assert!(payload.ends_with("throw new Error(\"Could not resolve \\\"left-pad\\\"\");\n"));
    }

    #[test]
    fn test_comment_terminators_are_broken() {
        let payload = failure_payload("x", "before */ after");
        assert!(payload.contains("before * / after"));
        assert_eq!(payload.matches("*/").count(), 1);
    }
}

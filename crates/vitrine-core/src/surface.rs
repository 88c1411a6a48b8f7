//! Uniform failure reporting.
//!
//! An [`ErrorSurface`] is created per request and consumed by
//! [`ErrorSurface::report`], so a request can report at most one failure.

use crate::artifact::CompilationFailure;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Notification pushed to live-reload clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureNotice {
    pub path: String,
    pub message: String,
}

/// Broadcast capability of the live-reload channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: FailureNotice);
}

/// Reports one request's failure: log, notify, produce the response body.
pub struct ErrorSurface {
    path: String,
    notifier: Arc<dyn Notifier>,
}

impl ErrorSurface {
    pub fn new(path: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            path: path.into(),
            notifier,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Log the failure, broadcast it and return the response body.
    pub async fn report(self, failure: &CompilationFailure) -> String {
        tracing::error!(
            path = %self.path,
            kind = %failure.kind,
            stack = failure.stack.as_deref().unwrap_or("<none>"),
            "{}",
            failure.message
        );

        self.notifier
            .notify(FailureNotice {
                path: self.path.clone(),
                message: failure.message.clone(),
            })
            .await;

        failure.body()
    }
}

//! Shared state for the development server.
//!
//! [`DevServerState`] is the server context: built once at start and passed
//! by reference to every request. It holds the request classifier, the
//! three content handlers and the live-reload client registry. Handlers
//! keep no per-request state here.

use crate::config::VitrineConfig;
use crate::dev::DevEvent;
use crate::document::{DocumentHandler, RenderSandbox};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use vitrine_bundler::ModuleBundler;
use vitrine_core::{Classifier, ErrorSurface, FailureNotice, Notifier, RootSet};
use vitrine_style::StyleCompiler;

/// Client connection tracker for Server-Sent Events.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, tokio::sync::mpsc::Sender<String>>>>;

/// Events buffered per live-reload client.
pub const CLIENT_QUEUE: usize = 100;

/// Shared development server state.
pub struct DevServerState {
    classifier: Classifier,
    style: StyleCompiler,
    bundler: ModuleBundler,
    document: DocumentHandler,

    /// Connected SSE clients
    pub clients: ClientRegistry,

    /// Next client ID
    pub next_client_id: RwLock<usize>,
}

impl DevServerState {
    pub fn new(
        classifier: Classifier,
        style: StyleCompiler,
        bundler: ModuleBundler,
        document: DocumentHandler,
    ) -> Self {
        Self {
            classifier,
            style,
            bundler,
            document,
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
        }
    }

    /// Wire up every handler for `project_dir`, with `builtin_dir` as the
    /// lowest priority root.
    pub fn from_config(config: &VitrineConfig, project_dir: PathBuf, builtin_dir: PathBuf) -> Self {
        let roots = RootSet::new([project_dir.clone(), builtin_dir.clone()]);
        let classifier = Classifier::new(roots.clone(), config.vendor_dirs.clone());
        let bundler = ModuleBundler::new(project_dir).with_vendor_dirs(config.vendor_dirs.clone());
        let style = StyleCompiler::new(config.style.clone());
        let sandbox = RenderSandbox::new(&config.render.node, config.render.timeout());
        let document = DocumentHandler::new(roots, &config.descriptor_key, bundler.clone(), sandbox)
            .with_builtin_root(builtin_dir);

        Self::new(classifier, style, bundler, document)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn roots(&self) -> &RootSet {
        self.classifier.roots()
    }

    pub fn style(&self) -> &StyleCompiler {
        &self.style
    }

    pub fn bundler(&self) -> &ModuleBundler {
        &self.bundler
    }

    pub fn document(&self) -> &DocumentHandler {
        &self.document
    }

    /// A fresh error surface for one request.
    pub fn error_surface(self: &Arc<Self>, path: &str) -> ErrorSurface {
        let notifier: Arc<dyn Notifier> = Arc::clone(self) as Arc<dyn Notifier>;
        ErrorSurface::new(path, notifier)
    }

    /// Register a new SSE client.
    ///
    /// # Returns
    ///
    /// Client ID and receiver for events
    pub fn register_client(&self) -> (usize, tokio::sync::mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = tokio::sync::mpsc::channel(CLIENT_QUEUE);
        self.clients.write().insert(id, tx);

        (id, rx)
    }

    /// Unregister an SSE client.
    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Broadcast an event to all connected clients.
    pub async fn broadcast(&self, event: &DevEvent) {
        self.publish(event);
    }

    /// Synchronous form of [`DevServerState::broadcast`], for drop guards.
    ///
    /// Never waits on a client: a client whose queue is full misses this
    /// event, a closed client is dropped.
    pub fn publish(&self, event: &DevEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());

        let clients = self.clients.read().clone();

        // Collect failed client IDs first to avoid modifying HashMap during iteration
        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            match tx.try_send(json.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(client = id, "client queue full, skipping event");
                }
                Err(TrySendError::Closed(_)) => failed_ids.push(id),
            }
        }

        for id in failed_ids {
            tracing::debug!(client = id, "dropping disconnected client");
            self.unregister_client(id);
        }
    }

    /// Get number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

#[async_trait]
impl Notifier for DevServerState {
    async fn notify(&self, notice: FailureNotice) {
        self.broadcast(&DevEvent::Failure {
            path: notice.path,
            message: notice.message,
        })
        .await;
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevServerState>;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitrine_core::CompilationFailure;

    fn state() -> (TempDir, SharedState) {
        let temp = TempDir::new().unwrap();
        let state = DevServerState::from_config(
            &VitrineConfig::default(),
            temp.path().to_path_buf(),
            temp.path().join("builtin"),
        );
        (temp, Arc::new(state))
    }

    #[test]
    fn test_client_registration() {
        let (_temp, state) = state();
        assert_eq!(state.client_count(), 0);

        let (id1, _rx1) = state.register_client();
        let (id2, _rx2) = state.register_client();
        assert_ne!(id1, id2);
        assert_eq!(state.client_count(), 2);

        state.unregister_client(id1);
        assert_eq!(state.client_count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_clients() {
        let (_temp, state) = state();
        let (_id, mut rx) = state.register_client();

        state.broadcast(&DevEvent::Reload).await;
        assert_eq!(rx.recv().await.unwrap(), r#"{"type":"Reload"}"#);
    }

    #[tokio::test]
    async fn test_broadcast_drops_closed_clients() {
        let (_temp, state) = state();
        let (_id, rx) = state.register_client();
        drop(rx);

        state.broadcast(&DevEvent::Reload).await;
        assert_eq!(state.client_count(), 0);
    }

    #[tokio::test]
    async fn test_error_surface_notifies_clients() {
        let (_temp, state) = state();
        let (_id, mut rx) = state.register_client();

        let failure = CompilationFailure::compilation("Unexpected token");
        let body = state.error_surface("/broken.css").report(&failure).await;
        assert_eq!(body, "Unexpected token\n");

        let event: DevEvent = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            event,
            DevEvent::Failure {
                path: "/broken.css".to_string(),
                message: "Unexpected token".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stalled_client_does_not_block_reports() {
        let (_temp, state) = state();
        let (_stalled, _never_read) = state.register_client();
        let (_id, mut rx) = state.register_client();

        for _ in 0..CLIENT_QUEUE {
            state.broadcast(&DevEvent::Reload).await;
        }
        while rx.try_recv().is_ok() {}

        let failure = CompilationFailure::compilation("Unexpected token");
        let body = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            state.error_surface("/broken.css").report(&failure),
        )
        .await
        .expect("report waited on a stalled client");
        assert_eq!(body, "Unexpected token\n");

        // The stalled client stays registered; the live one got the failure
        assert_eq!(state.client_count(), 2);
        assert!(rx.recv().await.unwrap().contains("Failure"));
    }

    #[test]
    fn test_roots_order() {
        let (temp, state) = state();
        assert_eq!(state.roots().primary(), Some(temp.path()));
        assert_eq!(state.roots().len(), 2);
    }
}

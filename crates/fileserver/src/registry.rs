//! Handle registry: the current selection and the server bound to it
//!
//! The registry owns its [`FileServer`]. Replacing or clearing the selection
//! are the only ways the server gets started or stopped.

use std::net::SocketAddr;

use chrono::Utc;
use tokio::sync::watch;

use crate::error::ServerError;
use crate::handle::FileHandle;
use crate::resolver::FileResolver;
use crate::server::FileServer;
use crate::state::Snapshot;

/// Ordered set of shared files, coupled 1:1 with a file server
pub struct HandleRegistry<R: FileResolver> {
    handles: Snapshot,
    server: FileServer<R>,
    /// Last tag handed out, in milliseconds since the epoch
    last_tag: i64,
}

impl<R: FileResolver> HandleRegistry<R> {
    pub fn new(server: FileServer<R>) -> Self {
        Self {
            handles: Snapshot::default(),
            server,
            last_tag: 0,
        }
    }

    /// Replace the selection and restart the server on it
    ///
    /// Each key gets a fresh tag, so picking the same file twice yields two
    /// entries. An empty selection is legal and serves an empty index.
    ///
    /// # Arguments
    /// * `keys` - Canonical keys of the picked files, in display order
    ///
    /// # Returns
    /// * `Ok(SocketAddr)` - Address the new instance listens on
    /// * `Err(ServerError)` - The server could not bind; the selection is kept
    ///   but nothing is served
    pub async fn replace<I>(&mut self, keys: I) -> Result<SocketAddr, ServerError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut handles = Vec::new();
        for key in keys {
            let handle = FileHandle::new(key, self.next_tag());
            tracing::debug!("Picked {}", handle.tagged());
            handles.push(handle);
        }

        tracing::info!("Sharing {} files", handles.len());
        self.handles = Snapshot::new(handles);
        self.server.start(self.handles.clone()).await
    }

    /// Empty the selection and stop the server; idempotent
    pub async fn clear(&mut self) {
        self.handles = Snapshot::default();
        self.server.stop().await;
    }

    /// Current selection, in order
    pub fn handles(&self) -> &[FileHandle] {
        self.handles.handles()
    }

    pub fn is_listening(&self) -> bool {
        self.server.is_listening()
    }

    /// Watch the server's Listening flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.server.subscribe()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    pub fn server(&self) -> &FileServer<R> {
        &self.server
    }

    /// Millisecond timestamp, strictly increasing even within one millisecond
    fn next_tag(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_tag = now.max(self.last_tag + 1);
        self.last_tag.to_string()
    }
}

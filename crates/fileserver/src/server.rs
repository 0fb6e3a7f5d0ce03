//! File server lifecycle: bind, accept loop, stop
//!
//! One [`FileServer`] owns at most one running instance. Starting always
//! stops the previous instance first, and stopping only returns once the
//! listener is closed and every open connection has been aborted, so links
//! from an old snapshot never get answered after a restart.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::ServerConfig;
use crate::error::{bind_error, ServerError};
use crate::resolver::FileResolver;
use crate::routes;
use crate::state::{AppState, Snapshot};

/// Back-off after a failed accept, e.g. when out of file descriptors
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A running listener bound to one snapshot
struct Instance {
    local_addr: SocketAddr,
    snapshot: Snapshot,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// HTTP server exposing a snapshot of shared files
pub struct FileServer<R: FileResolver> {
    config: ServerConfig,
    resolver: Arc<R>,
    instance: Option<Instance>,
    /// Listening flag observed by the front end
    status: watch::Sender<bool>,
}

impl<R: FileResolver> FileServer<R> {
    /// Create a stopped server
    ///
    /// # Arguments
    /// * `config` - Address to bind when started
    /// * `resolver` - Collaborator opening and sizing handles at request time
    pub fn new(config: ServerConfig, resolver: R) -> Self {
        let (status, _) = watch::channel(false);
        Self {
            config,
            resolver: Arc::new(resolver),
            instance: None,
            status,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Start serving `snapshot`, replacing any running instance
    ///
    /// # Returns
    /// * `Ok(SocketAddr)` - Address the listener is bound to
    /// * `Err(ServerError)` - Bind failure; the server is left stopped
    pub async fn start(&mut self, snapshot: Snapshot) -> Result<SocketAddr, ServerError> {
        self.stop().await;

        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| bind_error(addr, e))?;
        let local_addr = listener.local_addr()?;

        let router = routes::router(AppState::new(snapshot.clone(), Arc::clone(&self.resolver)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, router, shutdown_rx));

        tracing::info!(
            "File server listening on {} with {} shared files",
            local_addr,
            snapshot.len()
        );

        self.instance = Some(Instance {
            local_addr,
            snapshot,
            shutdown_tx,
            task,
        });
        self.status.send_replace(true);

        Ok(local_addr)
    }

    /// Stop the running instance; a no-op when already stopped
    ///
    /// Returns after the port is released. Downloads still in flight are cut
    /// off.
    pub async fn stop(&mut self) {
        let Some(instance) = self.instance.take() else {
            return;
        };

        let _ = instance.shutdown_tx.send(true);
        if let Err(e) = instance.task.await {
            if e.is_panic() {
                tracing::error!("File server task panicked: {}", e);
            }
        }

        self.status.send_replace(false);
        tracing::info!(
            "File server on {} stopped ({} files released)",
            instance.local_addr,
            instance.snapshot.len()
        );
    }

    pub fn is_listening(&self) -> bool {
        self.instance.is_some()
    }

    /// Watch the Listening flag; updated only when start or stop completes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    /// Address of the running instance
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.instance.as_ref().map(|i| i.local_addr)
    }

    /// Snapshot served by the running instance
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.instance.as_ref().map(|i| &i.snapshot)
    }
}

impl<R: FileResolver> Drop for FileServer<R> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            let _ = instance.shutdown_tx.send(true);
            instance.task.abort();
        }
    }
}

/// Accept connections until shutdown, one task per connection
///
/// Connection tasks live in a `JoinSet` owned by the loop; leaving the loop
/// closes the listener and aborts them all.
async fn accept_loop(listener: TcpListener, router: Router, mut shutdown: watch::Receiver<bool>) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    tracing::debug!("Accepted connection from {}", peer_addr);
                    let service = TowerToHyperService::new(router.clone());
                    connections.spawn(async move {
                        let builder = auto::Builder::new(TokioExecutor::new());
                        if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
                            tracing::debug!("Connection from {} closed with error: {}", peer_addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    if back_off(ACCEPT_ERROR_BACKOFF, &mut shutdown).await {
                        break;
                    }
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.changed() => break,
        }
    }

    drop(listener);
    let open = connections.len();
    connections.shutdown().await;
    if open > 0 {
        tracing::debug!("Aborted {} open connections", open);
    }
}

/// Wait `delay` unless shutdown is requested first; true on shutdown
async fn back_off(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown.changed() => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::FileHandle;
    use crate::testing::MemoryResolver;

    fn local_config() -> ServerConfig {
        ServerConfig::new("127.0.0.1", 0)
    }

    fn snapshot(keys: &[&str]) -> Snapshot {
        keys.iter()
            .map(|k| FileHandle::new(*k, "1"))
            .collect::<Vec<_>>()
            .into()
    }

    #[tokio::test]
    async fn test_back_off_ends_on_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        assert!(!back_off(Duration::from_millis(5), &mut rx).await);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(true);
        });
        let stopped = tokio::time::timeout(Duration::from_secs(5), back_off(Duration::from_secs(60), &mut rx))
            .await
            .unwrap();
        assert!(stopped);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let resolver = MemoryResolver::new().with_file("/s/a.txt", b"hello", Some("text/plain"));
        let mut server = FileServer::new(local_config(), resolver);
        let status = server.subscribe();
        assert!(!server.is_listening());

        let addr = server.start(snapshot(&["/s/a.txt"])).await.unwrap();
        assert!(server.is_listening());
        assert!(*status.borrow());
        assert_eq!(server.local_addr(), Some(addr));
        assert_eq!(server.snapshot().unwrap().len(), 1);

        let body = reqwest::get(format!("http://{}/file?uri=%2Fs%2Fa.txt", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "hello");

        server.stop().await;
        assert!(!server.is_listening());
        assert!(!*status.borrow());
        assert!(server.local_addr().is_none());
        assert!(reqwest::get(format!("http://{}/", addr)).await.is_err());
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let mut server = FileServer::new(local_config(), MemoryResolver::new());
        server.stop().await;
        server.stop().await;
        assert!(!server.is_listening());
    }

    #[tokio::test]
    async fn test_port_is_free_after_stop() {
        let mut server = FileServer::new(local_config(), MemoryResolver::new());
        let addr = server.start(Snapshot::default()).await.unwrap();
        server.stop().await;

        let mut again = FileServer::new(ServerConfig::new("127.0.0.1", addr.port()), MemoryResolver::new());
        let rebound = again.start(Snapshot::default()).await.unwrap();
        assert_eq!(rebound.port(), addr.port());
        again.stop().await;
    }

    #[tokio::test]
    async fn test_bind_failure_is_surfaced() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut server = FileServer::new(ServerConfig::new("127.0.0.1", port), MemoryResolver::new());
        let err = server.start(Snapshot::default()).await.unwrap_err();
        assert!(err.is_addr_in_use());
        assert!(!server.is_listening());
        assert!(!*server.subscribe().borrow());
    }

    #[tokio::test]
    async fn test_invalid_host_is_surfaced() {
        let mut server = FileServer::new(ServerConfig::new("nowhere.invalid", 0), MemoryResolver::new());
        let err = server.start(Snapshot::default()).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_serves_concurrent_requests() {
        let resolver = MemoryResolver::new()
            .with_file("/s/a.bin", &[7u8; 64 * 1024], None)
            .with_file("/s/b.bin", &[9u8; 32 * 1024], None);
        let mut server = FileServer::new(local_config(), resolver);
        let addr = server.start(snapshot(&["/s/a.bin", "/s/b.bin"])).await.unwrap();

        let mut requests = JoinSet::new();
        for i in 0..8 {
            let url = if i % 2 == 0 {
                format!("http://{}/file?uri=%2Fs%2Fa.bin", addr)
            } else {
                format!("http://{}/file?uri=%2Fs%2Fb.bin", addr)
            };
            requests.spawn(async move { reqwest::get(url).await.unwrap().bytes().await.unwrap().len() });
        }

        let mut sizes = Vec::new();
        while let Some(size) = requests.join_next().await {
            sizes.push(size.unwrap());
        }
        assert_eq!(sizes.iter().filter(|&&s| s == 64 * 1024).count(), 4);
        assert_eq!(sizes.iter().filter(|&&s| s == 32 * 1024).count(), 4);

        server.stop().await;
    }
}

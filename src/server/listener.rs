use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tokio::sync::Semaphore;
use tracing::{Instrument, info};

use crate::config::ServerConfig;
use crate::files::FileStore;
use crate::http::connection::Connection;
use crate::routing::Router;

const BACKLOG: u32 = 1024;

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The bound socket plus everything connections share read-only.
pub struct Listener {
    inner: TcpListener,
    router: Arc<Router>,
    config: Arc<ServerConfig>,
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    /// Resolves `host:port` and binds the first address that works.
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let addr = config.listen_addr();
        let candidates: Vec<SocketAddr> = lookup_host(&addr)
            .await
            .with_context(|| format!("failed to resolve {addr}"))?
            .collect();

        let mut last_err = None;
        let mut bound = None;
        for candidate in candidates {
            match bind_socket(candidate, config.reuse_address) {
                Ok(listener) => {
                    bound = Some(listener);
                    break;
                }
                Err(e) => {
                    tracing::debug!(address = %candidate, error = %e, "bind attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let inner = match (bound, last_err) {
            (Some(listener), _) => listener,
            (None, Some(e)) => return Err(e).with_context(|| format!("failed to bind {addr}")),
            (None, None) => anyhow::bail!("{addr} did not resolve to any address"),
        };

        let local = inner.local_addr().context("failed to read bound address")?;
        info!(
            address = %local,
            reuse_address = config.reuse_address,
            max_connections = config.max_connections,
            file_root = %config.file_root.display(),
            "Listening"
        );

        let router = Router::new(FileStore::new(config.file_root.clone()));

        Ok(Self {
            inner,
            router: Arc::new(router),
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept loop. Only returns if the connection limiter is closed.
    ///
    /// A permit is taken before each accept, so once `max_connections`
    /// connections are open new clients wait in the kernel backlog.
    pub async fn serve(self) -> anyhow::Result<()> {
        loop {
            let permit = self
                .connection_limit
                .clone()
                .acquire_owned()
                .await
                .context("connection limiter closed")?;

            let (socket, peer) = match self.inner.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            };
            tracing::debug!(peer = %peer, "Accepted connection");

            let router = Arc::clone(&self.router);
            let config = Arc::clone(&self.config);
            let span = tracing::info_span!("conn", peer = %peer);
            tokio::spawn(
                async move {
                    let _permit = permit;
                    let mut conn = Connection::new(socket, router, config);
                    if let Err(e) = conn.run().await {
                        tracing::warn!(error = %e, "connection error");
                    }
                }
                .instrument(span),
            );
        }
    }
}

fn bind_socket(addr: SocketAddr, reuse_address: bool) -> std::io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(reuse_address)?;
    socket.bind(addr)?;
    socket.listen(BACKLOG)
}

/// Binds according to `cfg` and serves until the process ends.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    Listener::bind(cfg).await?.serve().await
}

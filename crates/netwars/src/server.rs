//! `NetwarsServer` builder and accept loop.
//!
//! This is the entry point for running a match. It ties the layers
//! together: transport → protocol → session → match.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use netwars_session::SessionConfig;
use netwars_transport::{TcpTransport, Transport};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;

use crate::NetwarsError;
use crate::handler::handle_connection;
use crate::manager::ConnectionManager;

/// How long `run` waits for writers to flush after the match ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    /// All match state. Held for the whole of each message, disconnect,
    /// or timer, and never across a socket read.
    pub(crate) manager: Mutex<ConnectionManager>,
    /// Writer tasks, awaited on shutdown so final messages reach clients.
    pub(crate) writers: Mutex<JoinSet<()>>,
    /// Fired once when the match is over.
    pub(crate) finished: Notify,
    pub(crate) config: SessionConfig,
}

impl ServerState {
    /// Closes every outbound channel and wakes the accept loop once the
    /// match has ended. Call with the lock held after each mutation.
    pub(crate) fn settle(&self, manager: &mut ConnectionManager) {
        if manager.is_finished() {
            manager.close_all();
            self.finished.notify_one();
        }
    }
}

/// Builder for configuring and starting a Netwars server.
///
/// # Example
///
/// ```rust,no_run
/// use netwars::prelude::*;
///
/// # async fn start() -> Result<(), NetwarsError> {
/// let server = NetwarsServer::builder()
///     .bind("0.0.0.0:5555")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NetwarsServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    seed: Option<u64>,
}

impl NetwarsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:5555".to_string(),
            session_config: SessionConfig::default(),
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration (reconnect grace period).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Seeds the match RNG so the first player and card draws repeat.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener.
    ///
    /// # Errors
    /// Returns [`NetwarsError::Transport`] if the address cannot be bound.
    pub async fn build(self) -> Result<NetwarsServer, NetwarsError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            manager: Mutex::new(ConnectionManager::new(
                self.session_config.clone(),
                self.seed,
            )),
            writers: Mutex::new(JoinSet::new()),
            finished: Notify::new(),
            config: self.session_config,
        });

        Ok(NetwarsServer { transport, state })
    }
}

impl Default for NetwarsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Netwars server hosting one match.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NetwarsServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl NetwarsServer {
    /// Creates a new builder.
    pub fn builder() -> NetwarsServerBuilder {
        NetwarsServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetwarsError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the match is over.
    ///
    /// Each accepted socket gets its own handler task. When the match
    /// ends (a win or a forfeit) the listener is closed, queued messages
    /// are flushed, and this returns.
    pub async fn run(mut self) -> Result<(), NetwarsError> {
        tracing::info!("Netwars server running");

        loop {
            tokio::select! {
                _ = self.state.finished.notified() => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("match over, shutting down");
        drop(self.transport);

        let mut writers = std::mem::take(&mut *self.state.writers.lock().await);
        let drained = tokio::time::timeout(WRITER_DRAIN_TIMEOUT, async {
            while writers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("writers did not finish in time");
        }

        Ok(())
    }
}

//! `RoshamboServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → session → room.
//! Each accepted WebSocket gets its own handler task; each room runs in
//! its own actor task; the server also runs a reaper drain and a periodic
//! sweep so emptied rooms disappear.

use std::sync::Arc;
use std::time::Duration;

use roshambo_protocol::JsonCodec;
use roshambo_room::{RoomConfig, RoomRegistry};
use roshambo_session::SessionManager;
use roshambo_transport::WebSocketTransport;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::RoshamboError;

/// How often the safety-net sweep looks for rooms the reaper missed.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks; interior
/// mutability via `Mutex` where needed.
pub(crate) struct ServerState {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Roshambo server.
///
/// # Example
///
/// ```rust,ignore
/// let server = RoshamboServer::builder()
///     .bind("0.0.0.0:8080")
///     .public_url("https://play.example.com")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RoshamboServerBuilder {
    bind_addr: String,
    public_url: Option<String>,
    room_config: RoomConfig,
}

impl RoshamboServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            public_url: None,
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the public base URL used in shareable join links. Defaults to
    /// `http://<bind_addr>`.
    pub fn public_url(mut self, url: &str) -> Self {
        self.public_url = Some(url.to_string());
        self
    }

    /// Overrides the room configuration applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<RoshamboServer, RoshamboError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let public_url = self
            .public_url
            .unwrap_or_else(|| format!("http://{}", self.bind_addr));

        let (registry, reaper_rx) = RoomRegistry::new(self.room_config, public_url);

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new()),
            rooms: Mutex::new(registry),
            codec: JsonCodec,
        });

        Ok(RoshamboServer { transport, state, reaper_rx })
    }
}

impl Default for RoshamboServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Roshambo server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoshamboServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    reaper_rx: tokio::sync::mpsc::UnboundedReceiver<roshambo_protocol::RoomId>,
}

impl RoshamboServer {
    /// Creates a new builder.
    pub fn builder() -> RoshamboServerBuilder {
        RoshamboServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    ///
    /// Useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), RoshamboError> {
        tracing::info!("Roshambo server running");

        // Reaper drain: room actors report themselves here once empty.
        let reaper_state = Arc::clone(&self.state);
        let mut reaper_rx = self.reaper_rx;
        tokio::spawn(async move {
            while let Some(room_id) = reaper_rx.recv().await {
                reaper_state.rooms.lock().await.remove_mappings(room_id);
                tracing::debug!(%room_id, "reaped empty room");
            }
        });

        // Safety-net sweep for rooms whose report got lost.
        let sweep_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await; // the first tick fires immediately
            loop {
                interval.tick().await;
                sweep_state.rooms.lock().await.sweep().await;
            }
        });

        loop {
            match self.transport.accept().await {
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
            }
        }
    }
}

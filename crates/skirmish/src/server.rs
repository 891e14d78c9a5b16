//! `SkirmishServer` builder and server loop.
//!
//! Entry point for running a Skirmish match server. It ties together all
//! the layers: transport → protocol → arena (session, lobby, match).

use std::sync::Arc;

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{Arena, ArenaConfig, SkirmishError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) arena: Arena,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn start() -> Result<(), SkirmishError> {
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    config: ArenaConfig,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            config: ArenaConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the arena configuration.
    pub fn config(mut self, config: ArenaConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and creates the arena.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            arena: Arena::new(self.config),
            codec: JsonCodec,
        });
        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The orchestration service behind this server.
    pub fn arena(&self) -> &Arena {
        &self.state.arena
    }

    /// Runs the reaper and the accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        let _reaper = self.state.arena.spawn_reaper();
        tracing::info!("Skirmish server running");

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
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}

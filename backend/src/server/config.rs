//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use engagement::outbound::persistence::DbPool;
use engagement::outbound::queue::PostgresBrokerConfig;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) broker: PostgresBrokerConfig,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            broker: PostgresBrokerConfig::default(),
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, repositories and the event broker are PostgreSQL
    /// backed; otherwise the server runs entirely in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_broker_config(mut self, broker: PostgresBrokerConfig) -> Self {
        self.broker = broker;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

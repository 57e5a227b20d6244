//! Server configuration

use crate::error::{Result, ServerError};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bind address and middleware settings for the HTTP server
///
/// # Example
///
/// ```
/// use server::config::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new("127.0.0.1", 8080)
///     .with_request_timeout(Duration::from_secs(10));
/// assert_eq!(config.http_port, 8080);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// HTTP port; 0 binds an ephemeral port
    pub http_port: u16,
    /// Requests running longer are answered with 408
    pub request_timeout: Duration,
    /// Add a permissive CORS layer
    pub cors_allow_any_origin: bool,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cors_allow_any_origin: true,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cors(mut self, allow_any_origin: bool) -> Self {
        self.cors_allow_any_origin = allow_any_origin;
        self
    }

    /// Get HTTP socket address
    pub fn http_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.http_port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.http_port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", DEFAULT_HTTP_PORT)
    }
}

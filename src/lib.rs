use thiserror::Error;

/// Error types for the serial-relay library
#[derive(Error, Debug)]
pub enum RelayError {
    /// Endpoint failures (open, read, write, or any use after close)
    #[error("Connection error on {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// Invalid startup arguments or configuration values
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Builds a connection error for the named endpoint
    pub fn connection(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RelayError::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds the error returned by any operation on a closed endpoint
    pub fn closed(endpoint: impl Into<String>) -> Self {
        Self::connection(endpoint, "endpoint is closed")
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, RelayError::Connection { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, RelayError::Config(_))
    }
}

/// Result type for the serial-relay library
pub type Result<T> = std::result::Result<T, RelayError>;

pub mod cli;
pub mod common;
pub mod forwarder;
pub mod memory;
pub mod serial;
pub mod session;

// Re-export main types for convenience
pub use common::{Endpoint, ForwarderConfig, RelayConfig};
pub use forwarder::{Direction, Forwarder, ForwarderState, StopSignal};
pub use memory::MemoryEndpoint;
pub use serial::{SerialConfig, SerialEndpoint};
pub use session::Session;

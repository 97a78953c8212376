//! Serial port endpoints
//!
//! Wraps the `serialport` crate behind the `Endpoint` trait. Each opened
//! port keeps two handles to the same device so that the copy task reading
//! from it and the copy task writing to it never wait on each other.
//!
//! # Examples
//!
//! ```no_run
//! use serial_relay::serial::{SerialConfig, SerialEndpoint};
//! use serial_relay::Endpoint;
//!
//! let config = SerialConfig {
//!     path: "/dev/ttyUSB0".to_string(),
//!     ..SerialConfig::default()
//! };
//! let port = SerialEndpoint::open(&config)?;
//! assert!(!port.is_closed());
//! port.close()?;
//! # Ok::<(), serial_relay::RelayError>(())
//! ```

pub mod config;
pub mod endpoint;
pub mod ports;

#[cfg(test)]
mod tests;

pub use config::SerialConfig;
pub use endpoint::SerialEndpoint;
pub use ports::list_ports;

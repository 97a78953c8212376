//! Common traits and types used across the serial-relay library
//!
//! This module contains the `Endpoint` trait that the forwarder copies
//! bytes through, and the configuration shared by every session.

pub mod config;
pub mod traits;


pub use config::{ForwarderConfig, RelayConfig};
pub use traits::Endpoint;

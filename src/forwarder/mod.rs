//! Duplex forwarding between two endpoints
//!
//! A `Forwarder` runs one copy task per direction. Both tasks watch the
//! same `StopSignal`; a failure in one direction ends only that task.
//!
//! # Examples
//!
//! ```
//! use serial_relay::{Endpoint, Forwarder, ForwarderConfig, MemoryEndpoint};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let a = Arc::new(MemoryEndpoint::open("a", 9600)?);
//!     let b = Arc::new(MemoryEndpoint::open("b", 9600)?);
//!
//!     let forwarder = Forwarder::new(ForwarderConfig::default());
//!     forwarder.start(a.clone(), b.clone())?;
//!
//!     a.inject(b"hello");
//!     assert!(b.wait_for_written(5, Duration::from_secs(1)).await);
//!
//!     forwarder.stop().await;
//!     a.close()?;
//!     b.close()?;
//!     Ok(())
//! }
//! ```

pub mod copy;
pub mod duplex;
pub mod signal;
pub mod state;


pub use duplex::Forwarder;
pub use signal::StopSignal;
pub use state::{Direction, ForwarderState};

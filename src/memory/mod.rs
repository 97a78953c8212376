//! In-memory endpoints
//!
//! `MemoryEndpoint` implements `Endpoint` without any device behind it.
//! It is the test double the forwarder and session tests are written
//! against, and it backs the throughput benchmark.

pub mod endpoint;


pub use endpoint::MemoryEndpoint;

//! Session lifecycle: open a pair of endpoints, forward, shut down
//!
//! `Session` is what the binary drives and what integration tests exercise.
//! Opening is all-or-nothing, and shutdown stops the forwarder and closes
//! both endpoints exactly once, whatever state the directions are in.

use crate::common::{Endpoint, ForwarderConfig, RelayConfig};
use crate::forwarder::{Direction, Forwarder};
use crate::serial::{SerialConfig, SerialEndpoint};
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Two endpoints relayed by one forwarder
#[derive(Debug)]
pub struct Session {
    endpoint_a: Arc<dyn Endpoint>,
    endpoint_b: Arc<dyn Endpoint>,
    forwarder: Forwarder,
    shut_down: AtomicBool,
}

impl Session {
    /// Opens both endpoints, or neither
    ///
    /// If A opens and B does not, A is closed again before the error is
    /// returned. Reporting the error is left to the caller.
    pub fn open_pair<F>(
        config_a: &SerialConfig,
        config_b: &SerialConfig,
        mut open: F,
    ) -> Result<(Arc<dyn Endpoint>, Arc<dyn Endpoint>)>
    where
        F: FnMut(&SerialConfig) -> Result<Arc<dyn Endpoint>>,
    {
        let endpoint_a = open(config_a)?;

        match open(config_b) {
            Ok(endpoint_b) => Ok((endpoint_a, endpoint_b)),
            Err(e) => {
                close_quietly(endpoint_a.as_ref());
                Err(e)
            }
        }
    }

    /// Opens the two serial ports named in `config`
    pub fn open_serial(config: &RelayConfig) -> Result<(Arc<dyn Endpoint>, Arc<dyn Endpoint>)> {
        Self::open_pair(&config.port_a, &config.port_b, |port| {
            SerialEndpoint::open(port).map(|endpoint| Arc::new(endpoint) as Arc<dyn Endpoint>)
        })
    }

    /// Starts forwarding between two opened endpoints
    ///
    /// The session takes over closing them; if the forwarder refuses to
    /// start, both are closed before the error is returned.
    pub fn start(
        endpoint_a: Arc<dyn Endpoint>,
        endpoint_b: Arc<dyn Endpoint>,
        config: ForwarderConfig,
    ) -> Result<Self> {
        let forwarder = Forwarder::new(config);
        if let Err(e) = forwarder.start(Arc::clone(&endpoint_a), Arc::clone(&endpoint_b)) {
            close_quietly(endpoint_a.as_ref());
            close_quietly(endpoint_b.as_ref());
            return Err(e);
        }

        Ok(Self {
            endpoint_a,
            endpoint_b,
            forwarder,
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn endpoint_a(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint_a
    }

    pub fn endpoint_b(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint_b
    }

    /// Waits until both directions have ended on their own
    pub async fn wait(&self) {
        self.forwarder.join().await
    }

    /// Forwards until `trigger` completes or both directions have failed,
    /// then shuts down
    ///
    /// Returns the trigger's output, or `None` if the session ended on its
    /// own first.
    pub async fn run_until<F>(&self, trigger: F) -> Option<F::Output>
    where
        F: Future,
    {
        let triggered = tokio::select! {
            output = trigger => {
                info!("Termination requested");
                Some(output)
            }
            _ = self.wait() => {
                warn!("Both directions ended, closing session");
                None
            }
        };
        self.shutdown().await;
        triggered
    }

    /// Stops the forwarder, then closes both endpoints
    ///
    /// Runs once; later calls return immediately. Close failures are
    /// logged and otherwise ignored.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.forwarder.stop().await;
        close_quietly(self.endpoint_a.as_ref());
        close_quietly(self.endpoint_b.as_ref());

        info!(
            a_to_b = self.forwarder.bytes_forwarded(Direction::AToB),
            b_to_a = self.forwarder.bytes_forwarded(Direction::BToA),
            "Session closed"
        );
    }
}

fn close_quietly(endpoint: &dyn Endpoint) {
    if let Err(e) = endpoint.close() {
        warn!(endpoint = endpoint.identifier(), error = %e, "Failed to close endpoint");
    }
}

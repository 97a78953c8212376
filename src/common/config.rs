use crate::serial::SerialConfig;
use crate::{RelayError, Result};
use std::time::Duration;

/// Timing knobs for the forwarder
///
/// `poll_interval` trades forwarding latency against CPU: each copy task
/// sleeps this long whenever its source has nothing buffered.
///
/// # Examples
///
/// ```
/// use serial_relay::ForwarderConfig;
/// use std::time::Duration;
///
/// let config = ForwarderConfig {
///     poll_interval: Duration::from_millis(1),
///     stop_timeout: Duration::from_secs(1),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Pause between polls of an idle source
    pub poll_interval: Duration,
    /// Upper bound on how long `stop` waits for both copy tasks
    pub stop_timeout: Duration,
}

impl ForwarderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(RelayError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.stop_timeout.is_zero() {
            return Err(RelayError::Config(
                "stop timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            stop_timeout: Duration::from_secs(2),
        }
    }
}

/// Full configuration of a relay session: both ports plus forwarder timing
///
/// Using the default configuration:
///
/// ```
/// use serial_relay::RelayConfig;
///
/// let config = RelayConfig::default();
/// assert_eq!(config.port_a.baud_rate, 9600);
/// assert_eq!(config.port_b.path, "COM11");
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port_a: SerialConfig,
    pub port_b: SerialConfig,
    pub forwarder: ForwarderConfig,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        self.port_a.validate()?;
        self.port_b.validate()?;
        if self.port_a.path == self.port_b.path {
            return Err(RelayError::Config(format!(
                "both ends refer to the same port {}",
                self.port_a.path
            )));
        }
        self.forwarder.validate()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port_a: SerialConfig::default(),
            port_b: SerialConfig {
                path: "COM11".to_string(),
                ..SerialConfig::default()
            },
            forwarder: ForwarderConfig::default(),
        }
    }
}

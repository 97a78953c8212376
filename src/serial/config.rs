use crate::{RelayError, Result};
use std::time::Duration;

/// Configuration for one serial endpoint
///
/// # Examples
///
/// ```
/// use serial_relay::serial::SerialConfig;
/// use std::time::Duration;
///
/// let config = SerialConfig {
///     path: "/dev/ttyUSB0".to_string(),
///     baud_rate: 115_200,
///     timeout: Duration::from_millis(500),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path or name (`/dev/ttyUSB0`, `COM5`, ...)
    pub path: String,
    pub baud_rate: u32,
    /// Port I/O timeout, applied to reads and writes alike
    ///
    /// Writes are the calls that can actually wait on it: a read only asks
    /// for bytes the driver already holds.
    pub timeout: Duration,
}

impl SerialConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(RelayError::Config("serial port path is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(RelayError::Config(format!(
                "baud rate for {} must be greater than zero",
                self.path
            )));
        }
        if self.timeout.is_zero() {
            return Err(RelayError::Config(format!(
                "I/O timeout for {} must be greater than zero",
                self.path
            )));
        }
        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "COM5".to_string(),
            baud_rate: 9600,
            timeout: Duration::from_secs(1),
        }
    }
}

//! Command-line arguments of the `serial-relay` binary

use crate::common::{ForwarderConfig, RelayConfig};
use crate::serial::SerialConfig;
use clap::{ArgAction, Parser};
use std::time::Duration;

/// Relays bytes in both directions between two serial ports until Ctrl+C.
#[derive(Parser, Debug, Clone)]
#[command(name = "serial-relay", author, version, about)]
pub struct Args {
    /// First serial port (e.g. /dev/ttyUSB0 or COM5)
    #[arg(value_name = "PORT_A", required_unless_present = "list")]
    pub port_a: Option<String>,

    /// Second serial port (e.g. /dev/ttyUSB1 or COM11)
    #[arg(value_name = "PORT_B", required_unless_present = "list")]
    pub port_b: Option<String>,

    /// Baud rate used for both ports
    #[arg(short, long, value_name = "BAUD", default_value_t = 9600)]
    pub baud: u32,

    /// Baud rate override for port A
    #[arg(long, value_name = "BAUD")]
    pub baud_a: Option<u32>,

    /// Baud rate override for port B
    #[arg(long, value_name = "BAUD")]
    pub baud_b: Option<u32>,

    /// Pause between polls of an idle port, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 5)]
    pub poll_interval_ms: u64,

    /// Serial I/O timeout for reads and writes, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub timeout_ms: u64,

    /// How long shutdown waits for the copy tasks, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub stop_timeout_ms: u64,

    /// List available serial ports and exit
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub list: bool,

    /// Enable debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "serial_relay=debug"
        } else {
            "serial_relay=info"
        }
    }
}

impl From<&Args> for RelayConfig {
    fn from(args: &Args) -> Self {
        let timeout = Duration::from_millis(args.timeout_ms);
        let port = |path: &Option<String>, baud: Option<u32>| SerialConfig {
            path: path.clone().unwrap_or_default(),
            baud_rate: baud.unwrap_or(args.baud),
            timeout,
        };

        RelayConfig {
            port_a: port(&args.port_a, args.baud_a),
            port_b: port(&args.port_b, args.baud_b),
            forwarder: ForwarderConfig {
                poll_interval: Duration::from_millis(args.poll_interval_ms),
                stop_timeout: Duration::from_millis(args.stop_timeout_ms),
            },
        }
    }
}

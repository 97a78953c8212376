use crate::{RelayError, Result};

/// Lists the serial devices the operating system reports
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()
        .map_err(|e| RelayError::connection("port enumeration", e))?;
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}

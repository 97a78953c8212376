use super::{SerialConfig, SerialEndpoint};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = SerialConfig::default();
    assert_eq!(config.path, "COM5");
    assert_eq!(config.baud_rate, 9600);
    assert_eq!(config.timeout, Duration::from_secs(1));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_zero_baud() {
    let config = SerialConfig {
        baud_rate: 0,
        ..SerialConfig::default()
    };
    assert!(config.validate().unwrap_err().is_config());
}

#[test]
fn test_config_rejects_empty_path() {
    let config = SerialConfig {
        path: "  ".to_string(),
        ..SerialConfig::default()
    };
    assert!(config.validate().unwrap_err().is_config());
}

#[test]
fn test_open_missing_device_is_connection_error() {
    let config = SerialConfig {
        path: "/dev/serial-relay-does-not-exist".to_string(),
        ..SerialConfig::default()
    };
    let err = SerialEndpoint::open(&config).unwrap_err();
    assert!(err.is_connection());
    assert!(err.to_string().contains("/dev/serial-relay-does-not-exist"));
}

#[test]
fn test_open_zero_baud_is_connection_error() {
    let config = SerialConfig {
        path: "/dev/serial-relay-does-not-exist".to_string(),
        baud_rate: 0,
        ..SerialConfig::default()
    };
    let err = SerialEndpoint::open(&config).unwrap_err();
    assert!(err.is_connection());
    assert!(err.to_string().contains("unsupported baud rate"));
}

#[cfg(unix)]
mod pty {
    use super::{SerialConfig, SerialEndpoint};
    use crate::common::{Endpoint, ForwarderConfig};
    use crate::forwarder::Forwarder;
    use crate::memory::MemoryEndpoint;
    use serialport::{SerialPort, TTYPort};
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    const WAIT: Duration = Duration::from_secs(2);

    /// Opens a pseudo-terminal pair and reopens its slave side as an endpoint
    fn open_pty(timeout: Duration) -> (TTYPort, SerialEndpoint) {
        let (mut master, slave) = TTYPort::pair().expect("failed to create pty pair");
        master.set_timeout(WAIT).unwrap();
        let path = slave.name().expect("pty slave has no path");
        drop(slave);

        let endpoint = SerialEndpoint::open(&SerialConfig {
            path,
            baud_rate: 9600,
            timeout,
        })
        .unwrap();
        (master, endpoint)
    }

    async fn wait_for_available(endpoint: &SerialEndpoint, len: usize) {
        tokio::time::timeout(WAIT, async {
            while endpoint.available_bytes().unwrap() < len {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("bytes never arrived on the port");
    }

    #[tokio::test]
    async fn test_read_available_returns_line_bytes() {
        let (mut master, endpoint) = open_pty(Duration::from_secs(1));
        assert_eq!(endpoint.available_bytes().unwrap(), 0);
        assert!(endpoint.read_available().await.unwrap().is_empty());

        master.write_all(b"PING").unwrap();
        wait_for_available(&endpoint, 4).await;

        assert_eq!(endpoint.available_bytes().unwrap(), 4);
        assert_eq!(&endpoint.read_available().await.unwrap()[..], b"PING");
        assert_eq!(endpoint.available_bytes().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_reaches_the_line() {
        let (mut master, endpoint) = open_pty(Duration::from_secs(1));

        endpoint.write(b"PONG").await.unwrap();

        let mut received = [0; 4];
        master.read_exact(&mut received).unwrap();
        assert_eq!(&received, b"PONG");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let (mut master, endpoint) = open_pty(Duration::from_secs(1));
        master.write_all(b"late").unwrap();

        endpoint.close().unwrap();
        endpoint.close().unwrap();

        assert!(endpoint.is_closed());
        assert!(endpoint.available_bytes().unwrap_err().is_connection());
        assert!(endpoint.read_available().await.unwrap_err().is_connection());
        assert!(endpoint.write(b"x").await.unwrap_err().is_connection());
    }

    #[tokio::test]
    async fn test_write_is_bounded_by_timeout() {
        // Nobody drains the master side, so the pty buffer fills up.
        let (_master, endpoint) = open_pty(Duration::from_millis(100));
        let payload = vec![0x55; 1 << 20];

        let started = Instant::now();
        let err = tokio::time::timeout(WAIT, endpoint.write(&payload))
            .await
            .expect("write outlived its timeout")
            .unwrap_err();

        assert!(err.is_connection());
        assert!(started.elapsed() < WAIT);
    }

    #[tokio::test]
    async fn test_close_fails_a_stuck_write() {
        let (_master, endpoint) = open_pty(Duration::from_millis(300));
        let endpoint = Arc::new(endpoint);

        let writer = Arc::clone(&endpoint);
        let pending = tokio::spawn(async move { writer.write(&vec![0x55; 1 << 20]).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        endpoint.close().unwrap();

        let result = tokio::time::timeout(WAIT, pending)
            .await
            .expect("close left the write hanging")
            .unwrap();
        assert!(result.unwrap_err().is_connection());
        assert!(endpoint.is_closed());
    }

    #[tokio::test]
    async fn test_relays_between_pty_and_memory() {
        let (mut master, endpoint) = open_pty(Duration::from_secs(1));
        let serial: Arc<dyn Endpoint> = Arc::new(endpoint);
        let memory = Arc::new(MemoryEndpoint::open("mock", 9600).unwrap());

        let forwarder = Forwarder::new(ForwarderConfig {
            poll_interval: Duration::from_millis(1),
            stop_timeout: Duration::from_millis(500),
        });
        forwarder.start(Arc::clone(&serial), memory.clone()).unwrap();

        master.write_all(b"PING").unwrap();
        assert!(memory.wait_for_written(4, WAIT).await);
        assert_eq!(memory.written_bytes(), b"PING");

        memory.inject(b"PONG");
        let received = tokio::task::spawn_blocking(move || {
            let mut received = [0; 4];
            master.read_exact(&mut received).map(|()| received)
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(&received, b"PONG");

        forwarder.stop().await;
        serial.close().unwrap();
        memory.close().unwrap();
    }
}

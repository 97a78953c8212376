use super::SerialConfig;
use crate::common::Endpoint;
use crate::{RelayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serialport::SerialPort;
use std::fmt;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::{debug, info};

type PortSlot = Mutex<Option<Box<dyn SerialPort>>>;

/// A serial port opened for relaying
///
/// The read path and the write path use separate handles of the same
/// device (`SerialPort::try_clone`), each behind its own lock. Writes run
/// on Tokio's blocking pool. The configured timeout bounds both
/// directions, but only writes can wait on it.
pub struct SerialEndpoint {
    identifier: String,
    baud_rate: u32,
    reader: PortSlot,
    writer: Arc<PortSlot>,
    closed: Arc<AtomicBool>,
}

impl SerialEndpoint {
    /// Opens the port described by `config`
    ///
    /// Fails with a connection error when the device does not exist, is
    /// already in use, or rejects the baud rate. Nothing is sent on the
    /// line.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(RelayError::connection(
                &config.path,
                "unsupported baud rate 0",
            ));
        }

        let reader = serialport::new(&config.path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|e| RelayError::connection(&config.path, e))?;
        let writer = reader
            .try_clone()
            .map_err(|e| RelayError::connection(&config.path, e))?;

        info!(port = %config.path, baud_rate = config.baud_rate, "Opened serial port");

        Ok(Self {
            identifier: config.path.clone(),
            baud_rate: config.baud_rate,
            reader: Mutex::new(Some(reader)),
            writer: Arc::new(Mutex::new(Some(writer))),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::closed(&self.identifier));
        }
        Ok(())
    }
}

fn lock(slot: &PortSlot) -> MutexGuard<'_, Option<Box<dyn SerialPort>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Endpoint for SerialEndpoint {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn available_bytes(&self) -> Result<usize> {
        self.ensure_open()?;
        let guard = lock(&self.reader);
        let port = guard
            .as_ref()
            .ok_or_else(|| RelayError::closed(&self.identifier))?;
        let count = port
            .bytes_to_read()
            .map_err(|e| RelayError::connection(&self.identifier, e))?;
        Ok(count as usize)
    }

    async fn read_available(&self) -> Result<Bytes> {
        self.ensure_open()?;
        let mut guard = lock(&self.reader);
        let port = guard
            .as_mut()
            .ok_or_else(|| RelayError::closed(&self.identifier))?;

        let count = port
            .bytes_to_read()
            .map_err(|e| RelayError::connection(&self.identifier, e))? as usize;
        if count == 0 {
            return Ok(Bytes::new());
        }

        // The driver already holds `count` bytes, so this does not wait.
        let mut buffer = vec![0; count];
        port.read_exact(&mut buffer)
            .map_err(|e| RelayError::connection(&self.identifier, e))?;
        debug!(port = %self.identifier, bytes = count, "Read from serial port");
        Ok(Bytes::from(buffer))
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;

        let writer = Arc::clone(&self.writer);
        let closed = Arc::clone(&self.closed);
        let identifier = self.identifier.clone();
        let payload = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&writer);
            let port = guard
                .as_mut()
                .ok_or_else(|| RelayError::closed(&identifier))?;
            let result = port.write_all(&payload).and_then(|()| port.flush());

            // `close` could not take the handle while we held it.
            if closed.load(Ordering::SeqCst) {
                guard.take();
                return Err(RelayError::closed(&identifier));
            }
            result.map_err(|e| RelayError::connection(&identifier, e))
        })
        .await
        .map_err(|e| RelayError::connection(&self.identifier, e))?
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        lock(&self.reader).take();
        match self.writer.try_lock() {
            Ok(mut writer) => {
                writer.take();
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().take();
            }
            // A write is in flight; it releases the handle when it returns.
            Err(TryLockError::WouldBlock) => {}
        }

        info!(port = %self.identifier, "Closed serial port");
        Ok(())
    }
}

impl fmt::Debug for SerialEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialEndpoint")
            .field("identifier", &self.identifier)
            .field("baud_rate", &self.baud_rate)
            .field("closed", &self.is_closed())
            .finish()
    }
}

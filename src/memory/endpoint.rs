use crate::common::Endpoint;
use crate::{RelayError, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// In-memory endpoint for tests, benchmarks, and dry runs
///
/// Bytes passed to `inject` show up as buffered input, and every successful
/// `write` is appended to a log that tests can inspect. Call counters,
/// injectable write/close failures, and held writes make it possible to
/// observe exactly what the forwarder does to an endpoint.
///
/// # Examples
///
/// ```
/// use serial_relay::{Endpoint, MemoryEndpoint};
///
/// # tokio_test::block_on(async {
/// let endpoint = MemoryEndpoint::open("mock-a", 9600)?;
/// endpoint.inject(b"PING");
/// assert_eq!(endpoint.available_bytes()?, 4);
/// assert_eq!(&endpoint.read_available().await?[..], b"PING");
///
/// endpoint.write(b"PONG").await?;
/// assert_eq!(endpoint.written_bytes(), b"PONG");
/// # Ok::<(), serial_relay::RelayError>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct MemoryEndpoint {
    identifier: String,
    baud_rate: u32,
    inbound: Mutex<BytesMut>,
    writes: Mutex<Vec<Bytes>>,
    read_calls: AtomicUsize,
    write_calls: AtomicUsize,
    close_calls: AtomicUsize,
    fail_writes: AtomicBool,
    fail_close: AtomicBool,
    held: watch::Sender<bool>,
    written_len: watch::Sender<usize>,
    closed: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryEndpoint {
    /// Opens an in-memory endpoint; a zero baud rate is rejected like a real port would
    pub fn open(identifier: impl Into<String>, baud_rate: u32) -> Result<Self> {
        let identifier = identifier.into();
        if baud_rate == 0 {
            return Err(RelayError::connection(identifier, "unsupported baud rate 0"));
        }

        let (held, _) = watch::channel(false);
        let (written_len, _) = watch::channel(0);
        Ok(Self {
            identifier,
            baud_rate,
            inbound: Mutex::new(BytesMut::new()),
            writes: Mutex::new(Vec::new()),
            read_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            held,
            written_len,
            closed: CancellationToken::new(),
        })
    }

    /// Makes `data` available for reading, as if it arrived on the line
    pub fn inject(&self, data: &[u8]) {
        lock(&self.inbound).extend_from_slice(data);
    }

    /// Payloads accepted by `write`, one entry per call
    pub fn writes(&self) -> Vec<Bytes> {
        lock(&self.writes).clone()
    }

    /// All accepted payloads concatenated in order
    pub fn written_bytes(&self) -> Vec<u8> {
        lock(&self.writes).iter().flat_map(|chunk| chunk.iter().copied()).collect()
    }

    /// Number of `read_available` calls that reached the endpoint
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Number of `write` calls that reached the endpoint, including failed ones
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail with a connection error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `close` report an error (the endpoint still ends up closed)
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Parks writes until released or until the endpoint is closed
    pub fn hold_writes(&self, hold: bool) {
        self.held.send_replace(hold);
    }

    /// Waits until the write log holds at least `len` bytes
    ///
    /// Returns `false` if `deadline` passes first.
    pub async fn wait_for_written(&self, len: usize, deadline: Duration) -> bool {
        let mut written = self.written_len.subscribe();
        tokio::time::timeout(deadline, async {
            // The sender lives as long as `self`.
            let _ = written.wait_for(|written| *written >= len).await;
        })
        .await
        .is_ok()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(RelayError::closed(&self.identifier));
        }
        Ok(())
    }
}

#[async_trait]
impl Endpoint for MemoryEndpoint {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn available_bytes(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(lock(&self.inbound).len())
    }

    async fn read_available(&self) -> Result<Bytes> {
        self.ensure_open()?;
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let payload = lock(&self.inbound).split().freeze();
        debug!(endpoint = %self.identifier, bytes = payload.len(), "Read from memory endpoint");
        Ok(payload)
    }

    async fn write(&self, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let mut held = self.held.subscribe();
        let released = async {
            // The sender lives as long as `self`, so this only ends on release.
            let _ = held.wait_for(|held| !*held).await;
        };
        tokio::select! {
            _ = self.closed.cancelled() => {
                return Err(RelayError::closed(&self.identifier));
            }
            _ = released => {}
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RelayError::connection(&self.identifier, "write rejected by device"));
        }

        lock(&self.writes).push(Bytes::copy_from_slice(data));
        self.written_len.send_modify(|written| *written += data.len());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.cancel();
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(RelayError::connection(&self.identifier, "close failed"));
        }
        Ok(())
    }
}

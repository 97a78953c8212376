use super::StopSignal;
use crate::Result;
use crate::common::Endpoint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Copies bytes from `source` to `destination` until `stop` is set
///
/// Each round polls the source; an idle source costs one `poll_interval`
/// sleep, cut short if the stop signal fires. A payload that was read is
/// always handed to `destination` in full before the signal is checked
/// again. Returns the number of bytes forwarded, or the first endpoint
/// error. `forwarded` is bumped after every successful write.
pub async fn copy_until_stopped(
    source: &dyn Endpoint,
    destination: &dyn Endpoint,
    stop: &StopSignal,
    poll_interval: Duration,
    forwarded: &AtomicU64,
) -> Result<u64> {
    let mut total = 0u64;

    while !stop.is_set() {
        if source.available_bytes()? == 0 {
            tokio::select! {
                _ = stop.wait() => break,
                _ = tokio::time::sleep(poll_interval) => continue,
            }
        }

        let payload = source.read_available().await?;
        if payload.is_empty() {
            continue;
        }

        destination.write(&payload).await?;

        let len = payload.len() as u64;
        total += len;
        forwarded.fetch_add(len, Ordering::Relaxed);
        debug!(bytes = len, total, "Forwarded payload");
    }

    Ok(total)
}

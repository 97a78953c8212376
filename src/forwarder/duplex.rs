use super::copy::copy_until_stopped;
use super::{Direction, ForwarderState, StopSignal};
use crate::common::{Endpoint, ForwarderConfig};
use crate::{RelayError, Result};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{Instrument, info, warn};

/// State shared between the forwarder and its copy tasks
#[derive(Debug)]
struct Shared {
    state: watch::Sender<ForwarderState>,
    active: AtomicUsize,
    forwarded: [AtomicU64; 2],
}

impl Shared {
    /// Running → Stopping. Returns `true` if this call made the transition.
    fn begin_stopping(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ForwarderState::Running {
                *state = ForwarderState::Stopping;
                true
            } else {
                false
            }
        })
    }
}

/// Decrements the live-task count when a copy task ends, however it ends
///
/// Moved into the task future so an abort (or a future that is never
/// polled) still releases it.
struct TaskGuard {
    shared: Arc<Shared>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.shared.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.state.send_replace(ForwarderState::Stopped);
        }
    }
}

/// Runs the two copy tasks of a relay session
///
/// The forwarder shares the endpoints for the duration of the session but
/// never closes them; closing is the caller's job, after `stop`.
#[derive(Debug)]
pub struct Forwarder {
    config: ForwarderConfig,
    stop: StopSignal,
    shared: Arc<Shared>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl Forwarder {
    /// Creates a forwarder in the `Created` state
    pub fn new(config: ForwarderConfig) -> Self {
        let (state, _) = watch::channel(ForwarderState::Created);
        Self {
            config,
            stop: StopSignal::new(),
            shared: Arc::new(Shared {
                state,
                active: AtomicUsize::new(0),
                forwarded: [AtomicU64::new(0), AtomicU64::new(0)],
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn state(&self) -> ForwarderState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<ForwarderState> {
        self.shared.state.subscribe()
    }

    /// A handle on the signal shared by both copy tasks
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Copy tasks that have not exited yet
    pub fn active_tasks(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn bytes_forwarded(&self, direction: Direction) -> u64 {
        self.shared.forwarded[direction.index()].load(Ordering::Relaxed)
    }

    /// Spawns the A→B and B→A copy tasks and returns immediately
    ///
    /// Must be called from within a Tokio runtime. Fails with a
    /// configuration error if either endpoint is already closed, if both
    /// arguments are the same endpoint, or if this forwarder has already
    /// been started or stopped.
    pub fn start(&self, endpoint_a: Arc<dyn Endpoint>, endpoint_b: Arc<dyn Endpoint>) -> Result<()> {
        for endpoint in [&endpoint_a, &endpoint_b] {
            if endpoint.is_closed() {
                return Err(RelayError::Config(format!(
                    "endpoint {} is already closed",
                    endpoint.identifier()
                )));
            }
        }
        if std::ptr::addr_eq(Arc::as_ptr(&endpoint_a), Arc::as_ptr(&endpoint_b)) {
            return Err(RelayError::Config(format!(
                "cannot relay endpoint {} to itself",
                endpoint_a.identifier()
            )));
        }

        let started = self.shared.state.send_if_modified(|state| {
            if *state == ForwarderState::Created {
                *state = ForwarderState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(RelayError::Config(format!(
                "forwarder cannot start while {}",
                self.state()
            )));
        }
        self.shared.active.store(Direction::ALL.len(), Ordering::SeqCst);

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for direction in Direction::ALL {
            let (source, destination) = match direction {
                Direction::AToB => (Arc::clone(&endpoint_a), Arc::clone(&endpoint_b)),
                Direction::BToA => (Arc::clone(&endpoint_b), Arc::clone(&endpoint_a)),
            };
            let span = tracing::info_span!(
                "forward",
                %direction,
                from = source.identifier(),
                to = destination.identifier()
            );
            let guard = TaskGuard {
                shared: Arc::clone(&self.shared),
            };
            let task = run_direction(
                direction,
                source,
                destination,
                self.stop.clone(),
                self.config.poll_interval,
                Arc::clone(&self.shared),
                guard,
            );
            tasks.push(tokio::spawn(task.instrument(span)).abort_handle());
        }

        info!(
            a = endpoint_a.identifier(),
            b = endpoint_b.identifier(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Forwarding started"
        );
        Ok(())
    }

    /// Signals both copy tasks to stop and waits for them
    ///
    /// Idempotent. The wait is bounded by `stop_timeout`; tasks still
    /// running after that (a write stuck in the transport) are aborted, so
    /// once this returns neither task issues another read or write.
    /// Endpoints are left open.
    pub async fn stop(&self) {
        if self.stop.trigger() {
            info!("Stopping forwarder");
        }
        self.shared.state.send_if_modified(|state| match state {
            ForwarderState::Created => {
                *state = ForwarderState::Stopped;
                true
            }
            ForwarderState::Running => {
                *state = ForwarderState::Stopping;
                true
            }
            ForwarderState::Stopping | ForwarderState::Stopped => false,
        });

        if tokio::time::timeout(self.config.stop_timeout, self.join())
            .await
            .is_err()
        {
            warn!(
                timeout_ms = self.config.stop_timeout.as_millis() as u64,
                remaining = self.active_tasks(),
                "Copy tasks did not stop in time, aborting them"
            );
            for task in self.tasks.lock().unwrap_or_else(PoisonError::into_inner).iter() {
                task.abort();
            }
            self.join().await;
        }
    }

    /// Waits until both copy tasks have exited
    ///
    /// Returns immediately for a forwarder that was never started.
    pub async fn join(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state
            .wait_for(|state| matches!(state, ForwarderState::Created | ForwarderState::Stopped))
            .await;
    }
}

impl Drop for Forwarder {
    fn drop(&mut self) {
        // Detached copy tasks must not outlive their owner.
        self.stop.trigger();
    }
}

async fn run_direction(
    direction: Direction,
    source: Arc<dyn Endpoint>,
    destination: Arc<dyn Endpoint>,
    stop: StopSignal,
    poll_interval: Duration,
    shared: Arc<Shared>,
    _guard: TaskGuard,
) {
    let counter = &shared.forwarded[direction.index()];
    match copy_until_stopped(source.as_ref(), destination.as_ref(), &stop, poll_interval, counter).await
    {
        Ok(bytes) => info!(bytes, "Direction stopped"),
        Err(e) => {
            warn!(error = %e, "Forwarding failed, direction stopped");
            if shared.begin_stopping() {
                warn!("Session degraded, the opposite direction keeps running until stopped");
            }
        }
    }
}

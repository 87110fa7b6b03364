#![forbid(unsafe_code)]

//! Periodic refresh of the dashboard snapshot.
//!
//! The poll loop runs as its own tokio task and reports through a channel; only
//! the UI loop applies those reports to its state. Dropping the [`PollerHandle`]
//! aborts the task, in-flight requests included, and drops the receiving end,
//! so nothing from a cancelled cycle can reach the UI afterwards.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::model::Snapshot;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// A cycle began; any previous error banner should be cleared.
    CycleStarted,
    Updated {
        snapshot: Snapshot,
        at: OffsetDateTime,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug)]
pub struct PollerHandle {
    events: mpsc::UnboundedReceiver<PollEvent>,
    trigger: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Starts polling immediately, then once per `interval`.
    pub fn spawn<B: Backend>(backend: B, interval: Duration) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (trigger, trigger_rx) = mpsc::channel(1);
        let task = tokio::spawn(poll_loop(
            Arc::new(backend),
            interval.max(Duration::from_millis(100)),
            events_tx,
            trigger_rx,
        ));
        Self {
            events,
            trigger,
            task,
        }
    }

    /// Non-blocking; for draining between frames.
    pub fn try_next(&mut self) -> Option<PollEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Runs a cycle now. Requests made while one is already queued coalesce.
    pub fn refresh_now(&self) {
        let _ = self.trigger.try_send(());
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
        self.events.close();
    }
}

async fn poll_loop<B: Backend>(
    backend: Arc<B>,
    interval: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    mut trigger: mpsc::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            msg = trigger.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }

        debug!("poll cycle started");
        if events.send(PollEvent::CycleStarted).is_err() {
            break;
        }

        let event = match backend.fetch_snapshot().await {
            Ok(snapshot) => {
                info!(
                    tasks = snapshot.tasks.len(),
                    agents = snapshot.agents.len(),
                    activity = snapshot.activity.len(),
                    "poll cycle succeeded"
                );
                PollEvent::Updated {
                    snapshot,
                    at: OffsetDateTime::now_utc(),
                }
            }
            Err(e) => {
                warn!(error = %e, "poll cycle failed");
                PollEvent::Failed {
                    message: e.to_string(),
                }
            }
        };

        if events.send(event).is_err() {
            break;
        }
    }
    debug!("poller stopped");
}

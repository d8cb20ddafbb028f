//! Deferred notification delivery.
//!
//! Every change is queued to a dedicated tokio task and delivered after the
//! mutating call has returned. The queue is FIFO, so changes made through one
//! observable are delivered in the order they were scheduled.

use super::event::ChangeEvent;
use super::registry::Registration;
use crate::config::{ObservableConfig, SnapshotPolicy};
use crate::error::{ObservableError, Result};
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

enum Command {
    Deliver {
        event: ChangeEvent,
        listeners: Vec<Registration>,
    },
    Flush(oneshot::Sender<()>),
}

pub(crate) struct Dispatcher {
    tx: mpsc::UnboundedSender<Command>,
}

impl Dispatcher {
    /// Spawn the delivery task on the current tokio runtime.
    pub(crate) fn spawn(config: &ObservableConfig) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| ObservableError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_delivery_loop(
            rx,
            config.snapshot_policy,
            config.log_listener_panics,
        ));
        Ok(Self { tx })
    }

    /// Queue `event` for the given listener snapshot. Never blocks.
    pub(crate) fn schedule(&self, event: ChangeEvent, listeners: Vec<Registration>) {
        if listeners.is_empty() {
            return;
        }
        debug!(
            "Scheduling {} change of '{}' for {} listener(s)",
            event.kind(),
            event.key,
            listeners.len()
        );
        if let Err(e) = self.tx.send(Command::Deliver { event, listeners }) {
            if let Command::Deliver { event, .. } = e.0 {
                warn!("Delivery task stopped, dropping change of '{}'", event.key);
            }
        }
    }

    /// Resolve once everything scheduled before this call has been delivered.
    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_delivery_loop(
    mut rx: mpsc::UnboundedReceiver<Command>,
    policy: SnapshotPolicy,
    log_panics: bool,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Deliver { event, listeners } => {
                deliver(&event, &listeners, policy, log_panics);
                // One change per turn, like a timer callback.
                tokio::task::yield_now().await;
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Delivery task finished");
}

fn deliver(event: &ChangeEvent, listeners: &[Registration], policy: SnapshotPolicy, log_panics: bool) {
    for registration in listeners {
        if policy == SnapshotPolicy::Delivery && !registration.is_active() {
            debug!(
                "Skipping listener {} for '{}': unsubscribed before delivery",
                registration.id(),
                event.key
            );
            continue;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            registration.call(&event.key, event.new_value.as_ref(), event.old_value.as_ref())
        }));

        if let Err(payload) = outcome
            && log_panics
        {
            error!(
                "Listener {} panicked while handling change of '{}': {}",
                registration.id(),
                event.key,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

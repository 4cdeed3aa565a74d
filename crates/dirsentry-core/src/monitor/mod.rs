/// Directory monitor: polls one directory, diffs successive scans and keeps
/// an append-only audit log of every change.
///
/// [`DirectoryMonitor::step`] is the synchronous core. [`start_monitor`]
/// drives it on a background thread at the configured interval and forwards
/// what it sees over a channel.
///
/// # Usage
///
/// ```ignore
/// let monitor = DirectoryMonitor::new(MonitorConfig::new("./incoming", "log.csv"))?;
/// let handle = start_monitor(monitor)?;
/// // receive events on handle.receiver
/// handle.stop();
/// ```
///
/// # Cancellation
///
/// [`MonitorHandle::stop`] sets a flag that the background thread checks
/// every [`CANCEL_POLL_INTERVAL`] while sleeping between steps. A step that
/// is already running always completes.
pub mod diff;
pub mod step;

pub use diff::{describe_modification, diff_states};
pub use step::{DirectoryMonitor, StepReport};

use crate::model::ChangeEvent;
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Maximum number of messages buffered for the consumer.
///
/// Messages are sent with `try_send`; when the consumer falls behind the
/// overflow is dropped. The audit log, not this channel, is the durable
/// record.
pub const MESSAGE_CHANNEL_CAPACITY: usize = 2_048;

/// Granularity at which the sleeping thread notices a stop request.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long the exiting thread waits for room in a full channel to deliver
/// [`MonitorMessage::Stopped`].
pub const STOPPED_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Message sent from the monitor thread to the consumer.
#[derive(Debug)]
pub enum MonitorMessage {
    /// A change was detected (and, unless a `LogWriteFailed` follows,
    /// recorded).
    Event(ChangeEvent),
    /// The directory could not be listed this step.
    ScanFailed { path: PathBuf, message: String },
    /// An event could not be appended to the audit log.
    LogWriteFailed { message: String },
    /// The thread has exited its loop. Last message before disconnect.
    /// Unlike the others it waits up to [`STOPPED_SEND_TIMEOUT`] for channel
    /// space, so it is lost only if the consumer stops draining.
    Stopped,
}

/// Running counters, shared with the consumer.
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    /// Completed steps, including failed scans.
    pub steps: u64,
    pub baseline_established: bool,
    pub events_logged: u64,
    pub write_failures: u64,
    pub scan_failures: u64,
    pub last_step_at: Option<DateTime<Local>>,
}

/// Handle to a running monitor thread.
///
/// Call [`MonitorHandle::stop`] to shut it down.
pub struct MonitorHandle {
    /// Receive [`MonitorMessage`]s from the background thread.
    pub receiver: Receiver<MonitorMessage>,
    /// Counters updated after every step.
    pub stats: Arc<RwLock<MonitorStats>>,
    cancel: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Ask the thread to stop after the current step. Non-blocking.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Copy of the current counters.
    pub fn stats(&self) -> MonitorStats {
        self.stats.read().clone()
    }

    /// Clone of the stop flag, for wiring into signal handlers.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Stop the thread and wait for it to exit.
    pub fn join(mut self) -> thread::Result<()> {
        self.stop();
        match self.thread.take() {
            Some(t) => t.join(),
            None => Ok(()),
        }
    }
}

/// Start driving `monitor` on a background thread.
///
/// The first step runs immediately; later steps start one interval after
/// the previous one started (or immediately, if a step overran).
pub fn start_monitor(monitor: DirectoryMonitor) -> std::io::Result<MonitorHandle> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel);
    let stats = Arc::new(RwLock::new(MonitorStats::default()));
    let stats_clone = Arc::clone(&stats);
    let (tx, rx) = bounded::<MonitorMessage>(MESSAGE_CHANNEL_CAPACITY);

    let thread = thread::Builder::new()
        .name("dirsentry-monitor".to_owned())
        .spawn(move || run_monitor(monitor, cancel_clone, stats_clone, tx))?;

    Ok(MonitorHandle {
        receiver: rx,
        stats,
        cancel,
        thread: Some(thread),
    })
}

// ─── Background thread ──────────────────────────────────────────────────────

fn run_monitor(
    mut monitor: DirectoryMonitor,
    cancel: Arc<AtomicBool>,
    stats: Arc<RwLock<MonitorStats>>,
    tx: Sender<MonitorMessage>,
) {
    let interval = monitor.config().interval();
    debug!("Monitor: thread started for {:?}", monitor.config().directory);

    while !cancel.load(Ordering::Relaxed) {
        let started = Instant::now();
        let result = monitor.step();

        {
            let mut s = stats.write();
            s.steps += 1;
            s.last_step_at = Some(Local::now());
            match &result {
                Ok(report) => {
                    s.baseline_established |= report.baseline;
                    s.events_logged += report.logged() as u64;
                    s.write_failures += report.write_failures.len() as u64;
                }
                Err(_) => s.scan_failures += 1,
            }
        }

        match result {
            Ok(report) => {
                for event in report.events {
                    let _ = tx.try_send(MonitorMessage::Event(event));
                }
                for failure in report.write_failures {
                    let _ = tx.try_send(MonitorMessage::LogWriteFailed {
                        message: failure.to_string(),
                    });
                }
            }
            Err(err) => {
                let _ = tx.try_send(MonitorMessage::ScanFailed {
                    path: err.path().to_path_buf(),
                    message: err.to_string(),
                });
            }
        }

        sleep_unless_cancelled(interval.saturating_sub(started.elapsed()), &cancel);
    }

    if tx
        .send_timeout(MonitorMessage::Stopped, STOPPED_SEND_TIMEOUT)
        .is_err()
    {
        debug!("Monitor: consumer gone or not draining, Stopped not delivered");
    }
    debug!("Monitor: thread stopped for {:?}", monitor.config().directory);
}

/// Sleep for `total`, waking every [`CANCEL_POLL_INTERVAL`] to check `cancel`.
fn sleep_unless_cancelled(total: Duration, cancel: &AtomicBool) {
    let deadline = Instant::now() + total;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(CANCEL_POLL_INTERVAL));
    }
}

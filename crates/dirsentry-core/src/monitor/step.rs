/// The stateful differ: one [`DirectoryMonitor`] per watched directory.
///
/// Owns the only copy of the previous scan. Each [`DirectoryMonitor::step`]
/// scans, diffs against that copy, appends the events to the audit log and
/// swaps the new scan in. Nothing else reads or writes the retained state,
/// so several monitors can run side by side on different directories.
use super::diff::diff_states;
use crate::audit::AuditLog;
use crate::config::{MissingDirectoryPolicy, MonitorConfig};
use crate::error::{AuditLogError, MonitorError, ScanError};
use crate::model::{ChangeEvent, DirectoryState};
use crate::platform::{IdentityResolver, SystemIdentityResolver};
use crate::scanner::scan_directory;
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

/// Outcome of one successful step.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Detected events in emission order.
    pub events: Vec<ChangeEvent>,
    /// Appends that failed. The matching events are still in `events` but
    /// are not durably recorded.
    pub write_failures: Vec<AuditLogError>,
    /// `true` if this step only established the baseline.
    pub baseline: bool,
}

impl StepReport {
    /// Number of events that made it into the audit log.
    pub fn logged(&self) -> usize {
        self.events.len().saturating_sub(self.write_failures.len())
    }
}

pub struct DirectoryMonitor {
    config: MonitorConfig,
    log: AuditLog,
    resolver: Box<dyn IdentityResolver>,
    /// `None` until the first successful scan.
    previous: Option<DirectoryState>,
}

impl DirectoryMonitor {
    /// Create a monitor that resolves owners through the system databases.
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        Self::with_resolver(config, Box::new(SystemIdentityResolver::new()))
    }

    /// Create a monitor with a custom identity resolver.
    ///
    /// Validates `config` and opens the audit log, writing its header if the
    /// file is new.
    pub fn with_resolver(
        config: MonitorConfig,
        resolver: Box<dyn IdentityResolver>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;
        let log = AuditLog::open(&config.log_file)?;
        info!(
            "Monitor: watching {} (log {}, every {:?})",
            config.directory.display(),
            config.log_file.display(),
            config.interval()
        );
        Ok(Self {
            config,
            log,
            resolver,
            previous: None,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.log
    }

    /// The retained state, or `None` before the baseline scan.
    pub fn previous_state(&self) -> Option<&DirectoryState> {
        self.previous.as_ref()
    }

    /// Run one scan-and-diff cycle.
    ///
    /// The first successful scan only becomes the baseline and emits nothing.
    /// Afterwards every detected event is appended to the audit log and the
    /// retained state is replaced, whether or not the appends succeeded.
    ///
    /// A directory that cannot be listed yields `Err` and leaves the state
    /// untouched, unless the directory is gone and the
    /// [`MissingDirectoryPolicy::FlushDeleted`] policy is configured.
    pub fn step(&mut self) -> Result<StepReport, ScanError> {
        let now = Local::now();
        let current = match scan_directory(
            &self.config.directory,
            self.resolver.as_ref(),
            self.config.parallel_threshold,
        ) {
            Ok(state) => state,
            Err(err) => return self.on_scan_failure(err, now),
        };

        let Some(previous) = self.previous.as_ref() else {
            debug!(
                "Monitor: baseline of {} entries for {}",
                current.len(),
                self.config.directory.display()
            );
            self.previous = Some(current);
            return Ok(StepReport {
                baseline: true,
                ..StepReport::default()
            });
        };

        let events = diff_states(previous, &current, now);
        let write_failures = self.record(&events);
        self.previous = Some(current);

        Ok(StepReport {
            events,
            write_failures,
            baseline: false,
        })
    }

    fn on_scan_failure(
        &mut self,
        err: ScanError,
        now: DateTime<Local>,
    ) -> Result<StepReport, ScanError> {
        let flush = self.config.on_missing_directory == MissingDirectoryPolicy::FlushDeleted
            && err.is_not_found()
            && self.previous.as_ref().is_some_and(|s| !s.is_empty());

        if !flush {
            warn!("Monitor: {}", err);
            return Err(err);
        }

        warn!(
            "Monitor: {} disappeared, reporting all known entries as deleted",
            self.config.directory.display()
        );
        let empty = DirectoryState::default();
        let events = match self.previous.as_ref() {
            Some(previous) => diff_states(previous, &empty, now),
            None => Vec::new(),
        };
        let write_failures = self.record(&events);
        self.previous = Some(empty);

        Ok(StepReport {
            events,
            write_failures,
            baseline: false,
        })
    }

    /// Append each event to the audit log. Failures are logged and returned;
    /// one failed append does not stop the rest.
    fn record(&self, events: &[ChangeEvent]) -> Vec<AuditLogError> {
        let mut failures = Vec::new();
        for event in events {
            info!("{}", event);
            if let Err(err) = self.log.append(event) {
                error!("Monitor: {} not recorded: {}", event.name, err);
                failures.push(err);
            }
        }
        failures
    }
}

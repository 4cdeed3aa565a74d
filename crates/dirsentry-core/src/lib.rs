/// DirSentry Core: directory polling, diffing, and audit logging.
///
/// This crate contains all monitoring logic with zero CLI dependencies.
/// It is designed to be driven by any frontend (the bundled CLI, a service
/// wrapper, tests).
///
/// # Modules
///
/// - [`model`]: Snapshots, directory states, and change events.
/// - [`scanner`]: Metadata extraction and single-directory scans.
/// - [`monitor`]: Stateful differ and the background polling loop.
/// - [`audit`]: Append-only CSV audit log (writer and reader).
/// - [`analysis`]: Summaries over a parsed audit log.
/// - [`platform`]: Unix owner/group lookup and advisory file locks.
/// - [`config`]: Monitor configuration and JSON loading.
/// - [`error`]: Error types.
pub mod analysis;
pub mod audit;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod platform;
pub mod scanner;

/// End-to-end monitor tests.
///
/// These run the real scanner, differ and audit log against a temporary
/// directory, then read the CSV back with `read_log`. A fixed identity table
/// is used wherever owner/group names are asserted so results do not depend
/// on the host's user database.
use dirsentry_core::analysis::summarize;
use dirsentry_core::audit::read_log;
use dirsentry_core::config::MonitorConfig;
use dirsentry_core::model::{EventKind, FileKind};
use dirsentry_core::monitor::{start_monitor, DirectoryMonitor, MonitorMessage};
use dirsentry_core::platform::StaticIdentityResolver;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Temp root with an empty `watched/` directory; returns (guard, dir, log).
fn setup() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let dir = tmp.path().join("watched");
    fs::create_dir(&dir).unwrap();
    let log = tmp.path().join("directory_log.csv");
    (tmp, dir, log)
}

fn monitor(dir: &Path, log: &Path) -> DirectoryMonitor {
    DirectoryMonitor::with_resolver(
        MonitorConfig::new(dir, log),
        Box::new(StaticIdentityResolver::new()),
    )
    .expect("monitor must open")
}

fn write_bytes(path: &Path, n: usize) {
    fs::write(path, vec![b'x'; n]).unwrap();
}

fn append_bytes(path: &Path, n: usize) {
    let mut f = OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(&vec![b'y'; n]).unwrap();
}

fn data_rows(log: &Path) -> usize {
    read_log(log).unwrap().len()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Empty dir → create 10 bytes → append 5 → delete; the log ends up with
/// exactly CREATED, MODIFIED, DELETED in that order.
#[test]
fn create_modify_delete_scenario() {
    let (_tmp, dir, log) = setup();
    let mut m = monitor(&dir, &log);

    assert!(m.step().unwrap().events.is_empty());
    let header_only = fs::read_to_string(&log).unwrap();
    assert_eq!(header_only.lines().count(), 1, "log must hold only the header");
    assert_eq!(data_rows(&log), 0);

    let file = dir.join("a.txt");
    write_bytes(&file, 10);
    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Created);
    assert_eq!(report.events[0].name, "a.txt");
    let rows = read_log(&log).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event, EventKind::Created);
    assert_eq!(rows[0].size_bytes, 10);
    assert_eq!(rows[0].file_kind(), Some(FileKind::RegularFile));

    append_bytes(&file, 5);
    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Modified);
    assert!(
        report.events[0].details.contains("Size: 10->15"),
        "details were {:?}",
        report.events[0].details
    );

    fs::remove_file(&file).unwrap();
    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Deleted);
    assert_eq!(report.events[0].name, "a.txt");

    let kinds: Vec<EventKind> = read_log(&log).unwrap().iter().map(|r| r.event).collect();
    assert_eq!(
        kinds,
        [EventKind::Created, EventKind::Modified, EventKind::Deleted]
    );
}

/// Pre-existing entries never produce events on the first step.
#[test]
fn baseline_ignores_existing_entries() {
    let (_tmp, dir, log) = setup();
    for i in 0..5 {
        write_bytes(&dir.join(format!("pre{i}")), i);
    }
    fs::create_dir(dir.join("subdir")).unwrap();

    let mut m = monitor(&dir, &log);
    let report = m.step().unwrap();
    assert!(report.baseline);
    assert!(report.events.is_empty());
    assert_eq!(data_rows(&log), 0);
}

/// Two steps with no change in between: the second emits nothing.
#[test]
fn unchanged_directory_is_idempotent() {
    let (_tmp, dir, log) = setup();
    write_bytes(&dir.join("a"), 3);
    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    write_bytes(&dir.join("b"), 4);
    assert_eq!(m.step().unwrap().events.len(), 1);
    assert!(m.step().unwrap().events.is_empty());
    assert!(m.step().unwrap().events.is_empty());
    assert_eq!(data_rows(&log), 1);
}

/// Every added entry gets exactly one Created event with the right type.
#[test]
fn created_events_carry_entry_kind() {
    let (_tmp, dir, log) = setup();
    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    write_bytes(&dir.join("file"), 1);
    fs::create_dir(dir.join("dir")).unwrap();
    std::os::unix::fs::symlink(dir.join("dir"), dir.join("link")).unwrap();

    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 3);
    assert!(report.events.iter().all(|e| e.kind == EventKind::Created));

    let rows = read_log(&log).unwrap();
    let kind_of = |name: &str| {
        rows.iter()
            .find(|r| r.filename == name)
            .and_then(|r| r.file_kind())
    };
    assert_eq!(kind_of("file"), Some(FileKind::RegularFile));
    assert_eq!(kind_of("dir"), Some(FileKind::Directory));
    assert_eq!(kind_of("link"), Some(FileKind::SymbolicLink));
}

/// Deleted rows carry the metadata observed before removal.
#[test]
fn deleted_rows_use_last_observed_metadata() {
    let (_tmp, dir, log) = setup();
    let file = dir.join("doomed");
    write_bytes(&file, 7);
    fs::set_permissions(&file, fs::Permissions::from_mode(0o600)).unwrap();

    let mut m = monitor(&dir, &log);
    m.step().unwrap();
    fs::remove_file(&file).unwrap();
    m.step().unwrap();

    let rows = read_log(&log).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event, EventKind::Deleted);
    assert_eq!(rows[0].size_bytes, 7);
    assert_eq!(rows[0].permissions, "0o600");
    assert_eq!(rows[0].details, "File removed");
}

/// A chmod is reported with a Perms clause and nothing else.
#[test]
fn permission_change_mentions_only_permissions() {
    let (_tmp, dir, log) = setup();
    let file = dir.join("p");
    write_bytes(&file, 1);
    fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

    let mut m = monitor(&dir, &log);
    m.step().unwrap();
    fs::set_permissions(&file, fs::Permissions::from_mode(0o600)).unwrap();

    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Modified);
    assert_eq!(report.events[0].details, "Perms: 0o644->0o600");
}

/// Touching only the modification time is a generic content change.
#[test]
fn mtime_only_change_is_content_modified() {
    let (_tmp, dir, log) = setup();
    let file = dir.join("t");
    write_bytes(&file, 4);

    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    let earlier = SystemTime::now() - Duration::from_secs(3_600);
    OpenOptions::new()
        .write(true)
        .open(&file)
        .unwrap()
        .set_modified(earlier)
        .unwrap();

    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].details, "Content Modified");
}

/// Mixed batch: every category is classified exhaustively.
#[test]
fn mixed_changes_are_all_classified() {
    let (_tmp, dir, log) = setup();
    write_bytes(&dir.join("stay"), 1);
    write_bytes(&dir.join("grow"), 1);
    write_bytes(&dir.join("drop1"), 1);
    write_bytes(&dir.join("drop2"), 1);

    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    append_bytes(&dir.join("grow"), 9);
    fs::remove_file(dir.join("drop1")).unwrap();
    fs::remove_file(dir.join("drop2")).unwrap();
    write_bytes(&dir.join("new1"), 1);
    write_bytes(&dir.join("new2"), 1);

    let events = m.step().unwrap().events;
    let mut created: Vec<&str> = events
        .iter()
        .filter(|e| e.kind == EventKind::Created)
        .map(|e| e.name.as_str())
        .collect();
    let mut deleted: Vec<&str> = events
        .iter()
        .filter(|e| e.kind == EventKind::Deleted)
        .map(|e| e.name.as_str())
        .collect();
    let modified: Vec<&str> = events
        .iter()
        .filter(|e| e.kind == EventKind::Modified)
        .map(|e| e.name.as_str())
        .collect();
    created.sort_unstable();
    deleted.sort_unstable();

    assert_eq!(created, ["new1", "new2"]);
    assert_eq!(deleted, ["drop1", "drop2"]);
    assert_eq!(modified, ["grow"]);

    // Category order: Created, then Deleted, then Modified.
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    let mut sorted = kinds.clone();
    sorted.sort_by_key(|k| match k {
        EventKind::Created => 0,
        EventKind::Deleted => 1,
        EventKind::Modified => 2,
    });
    assert_eq!(kinds, sorted);
}

/// Names that are not valid UTF-8 and differ only in the invalid byte are
/// tracked as separate entries even though they display identically.
#[test]
fn non_utf8_names_are_not_merged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (_tmp, dir, log) = setup();
    let first = dir.join(OsStr::from_bytes(b"a\xff"));
    let second = dir.join(OsStr::from_bytes(b"a\xfe"));
    write_bytes(&first, 1);

    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    write_bytes(&second, 1);
    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Created);
    assert_eq!(m.previous_state().map(|s| s.len()), Some(2));

    fs::remove_file(&first).unwrap();
    let report = m.step().unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::Deleted);

    let rows = read_log(&log).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.filename == "a\u{FFFD}"));
}

/// Summary counts computed from a real log match the steps that wrote it.
#[test]
fn summary_of_real_log_matches_events() {
    let (_tmp, dir, log) = setup();
    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    write_bytes(&dir.join("busy"), 1);
    write_bytes(&dir.join("quiet"), 1);
    fs::create_dir(dir.join("sub")).unwrap();
    m.step().unwrap();

    append_bytes(&dir.join("busy"), 2);
    m.step().unwrap();
    append_bytes(&dir.join("busy"), 3);
    m.step().unwrap();

    fs::remove_file(dir.join("busy")).unwrap();
    m.step().unwrap();

    let records = read_log(&log).unwrap();
    let s = summarize(&records, 2);

    assert_eq!(s.total, 6);
    assert_eq!(s.count(EventKind::Created), 3);
    assert_eq!(s.count(EventKind::Modified), 2);
    assert_eq!(s.count(EventKind::Deleted), 1);

    let by_type: Vec<(&str, u64)> = s
        .by_file_type
        .iter()
        .map(|t| (t.file_type.as_str(), t.events))
        .collect();
    assert_eq!(by_type, [("Regular File", 5), ("Directory", 1)]);

    assert_eq!(s.most_active[0].name, "busy");
    assert_eq!(s.most_active[0].events, 4);
    assert_eq!(s.most_active.len(), 2);
    assert!(s.first_at <= s.last_at);
}

/// An owner with no name in the identity table is logged as its uid.
#[test]
fn unresolved_owner_is_logged_numerically() {
    let (_tmp, dir, log) = setup();
    let mut m = monitor(&dir, &log);
    m.step().unwrap();

    let file = dir.join("owned");
    write_bytes(&file, 2);
    let meta = fs::symlink_metadata(&file).unwrap();
    m.step().unwrap();

    let rows = read_log(&log).unwrap();
    assert_eq!(rows[0].owner, meta.uid().to_string());
    assert_eq!(rows[0].group, meta.gid().to_string());
}

/// Restarting a monitor on an existing log keeps old rows and the single
/// header.
#[test]
fn restart_appends_to_existing_log() {
    let (_tmp, dir, log) = setup();
    {
        let mut m = monitor(&dir, &log);
        m.step().unwrap();
        write_bytes(&dir.join("first"), 1);
        m.step().unwrap();
    }
    {
        let mut m = monitor(&dir, &log);
        m.step().unwrap();
        write_bytes(&dir.join("second"), 1);
        m.step().unwrap();
    }

    let text = fs::read_to_string(&log).unwrap();
    assert_eq!(text.matches("Timestamp,Event").count(), 1);
    let names: Vec<String> = read_log(&log)
        .unwrap()
        .into_iter()
        .map(|r| r.filename)
        .collect();
    assert_eq!(names, ["first", "second"]);
}

/// Two monitors on different directories sharing one log both land their
/// rows intact.
#[test]
fn two_monitors_share_one_log() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("shared.csv");
    let dir_a = tmp.path().join("a");
    let dir_b = tmp.path().join("b");
    fs::create_dir(&dir_a).unwrap();
    fs::create_dir(&dir_b).unwrap();

    let mut ma = monitor(&dir_a, &log);
    let mut mb = monitor(&dir_b, &log);
    ma.step().unwrap();
    mb.step().unwrap();

    for i in 0..20 {
        write_bytes(&dir_a.join(format!("a{i}")), 1);
        write_bytes(&dir_b.join(format!("b{i}")), 1);
    }
    std::thread::scope(|s| {
        s.spawn(|| ma.step().unwrap());
        s.spawn(|| mb.step().unwrap());
    });

    assert_eq!(data_rows(&log), 40);
}

/// The background loop reports changes over the channel and shuts down
/// cleanly, sending `Stopped` before disconnecting.
#[test]
fn background_monitor_reports_and_stops() {
    let (_tmp, dir, log) = setup();
    let mut config = MonitorConfig::new(&dir, &log);
    config.interval_ms = 20;
    let m = DirectoryMonitor::with_resolver(config, Box::new(StaticIdentityResolver::new()))
        .unwrap();
    let handle = start_monitor(m).unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    while !handle.stats().baseline_established {
        assert!(
            std::time::Instant::now() < deadline,
            "baseline not established"
        );
        std::thread::sleep(Duration::from_millis(5));
    }

    write_bytes(&dir.join("late.txt"), 3);

    let mut saw_created = false;
    while std::time::Instant::now() < deadline {
        match handle.receiver.recv_timeout(Duration::from_millis(50)) {
            Ok(MonitorMessage::Event(e)) if e.name == "late.txt" => {
                assert_eq!(e.kind, EventKind::Created);
                saw_created = true;
                break;
            }
            Ok(_) | Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    assert!(saw_created, "Created event must arrive within 30 s");

    handle.stop();
    let mut saw_stopped = false;
    loop {
        match handle.receiver.recv_timeout(Duration::from_secs(30)) {
            Ok(MonitorMessage::Stopped) => saw_stopped = true,
            Ok(_) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                panic!("monitor thread did not stop within 30 s")
            }
        }
    }
    assert!(saw_stopped);
    assert!(handle.stats().events_logged >= 1);
    handle.join().unwrap();
}

/// Scan failures are surfaced on the channel and do not end the loop.
#[test]
fn background_monitor_survives_missing_directory() {
    let (_tmp, dir, log) = setup();
    let mut config = MonitorConfig::new(dir.join("not-yet"), &log);
    config.interval_ms = 20;
    let m = DirectoryMonitor::with_resolver(config, Box::new(StaticIdentityResolver::new()))
        .unwrap();
    let handle = start_monitor(m).unwrap();

    let msg = handle
        .receiver
        .recv_timeout(Duration::from_secs(30))
        .expect("a message must arrive");
    assert!(matches!(msg, MonitorMessage::ScanFailed { .. }));

    fs::create_dir(dir.join("not-yet")).unwrap();
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    while !handle.stats().baseline_established {
        assert!(std::time::Instant::now() < deadline, "loop stopped retrying");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(handle.stats().scan_failures >= 1);
    handle.join().unwrap();
}

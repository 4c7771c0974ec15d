//! The `.update-pls` sentinel that signals a finished compstate update.
//!
//! After an update completes, the updater touches `<root>/.update-pls`.
//! The manager compares the sentinel's modification time with the one it
//! saw at its last load; any difference, including the file appearing or
//! disappearing, means the compstate changed. The compstate's own content
//! is never inspected for change detection.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the sentinel file inside a compstate directory.
pub const UPDATE_FILE: &str = ".update-pls";

/// Path of the sentinel file for the compstate at `root`.
pub fn sentinel_path(root: &Path) -> PathBuf {
    root.join(UPDATE_FILE)
}

/// What the sentinel looked like at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelStamp {
    /// The sentinel file did not exist.
    Missing,
    /// The sentinel file existed with this modification time.
    Modified(SystemTime),
}

/// The sentinel for one compstate root as observed by the manager.
///
/// The root is part of the observation so that pointing the manager at a
/// different compstate always counts as a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelObservation {
    /// Compstate root the sentinel belongs to.
    pub root: PathBuf,
    /// State of the sentinel file.
    pub stamp: SentinelStamp,
}

impl SentinelObservation {
    /// Stat the sentinel under `root`.
    ///
    /// Any failure to read the modification time is treated as the file
    /// being absent.
    pub fn observe(root: &Path) -> Self {
        let stamp = std::fs::metadata(sentinel_path(root))
            .and_then(|meta| meta.modified())
            .map_or(SentinelStamp::Missing, SentinelStamp::Modified);
        Self {
            root: root.to_path_buf(),
            stamp,
        }
    }
}

/// Create the sentinel under `root`, or bump its modification time.
pub fn touch(root: &Path) -> io::Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(sentinel_path(root))?;
    file.set_modified(SystemTime::now())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn absent_sentinel_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let seen = SentinelObservation::observe(dir.path());
        assert_eq!(seen.stamp, SentinelStamp::Missing);
        assert_eq!(seen.root, dir.path());
    }

    #[test]
    fn touch_creates_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path()).unwrap();
        let seen = SentinelObservation::observe(dir.path());
        assert!(matches!(seen.stamp, SentinelStamp::Modified(_)));
    }

    #[test]
    fn mtime_change_is_a_different_observation() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path()).unwrap();

        let file = OpenOptions::new()
            .write(true)
            .open(sentinel_path(dir.path()))
            .unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        let before = SentinelObservation::observe(dir.path());

        file.set_modified(UNIX_EPOCH + Duration::from_secs(2_000))
            .unwrap();
        let after = SentinelObservation::observe(dir.path());

        assert_ne!(before, after);
    }

    #[test]
    fn same_stamp_under_other_root_differs() {
        let a = SentinelObservation {
            root: PathBuf::from("/a"),
            stamp: SentinelStamp::Missing,
        };
        let b = SentinelObservation {
            root: PathBuf::from("/b"),
            stamp: SentinelStamp::Missing,
        };
        assert_ne!(a, b);
    }
}

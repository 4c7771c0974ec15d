//! Advisory locking on a compstate directory.
//!
//! The updater takes an exclusive lock while it rewrites the compstate on
//! disk; the [`StateManager`] takes a shared lock while it reads it. Both
//! lock the same file, `<root>/.update-lock`, so a load queues behind an
//! in-flight update and vice versa.
//!
//! The primitive sits behind [`LockBackend`] so the manager's algorithm
//! does not depend on OS file locks. [`FileLockBackend`] is the default,
//! built on `fs2`.
//!
//! Acquisition blocks with no timeout. An updater that never releases its
//! lock stalls every subsequent reload.
//!
//! [`StateManager`]: crate::manager::StateManager

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::LockError;

/// Name of the lock file inside a compstate directory.
pub const LOCK_FILE: &str = ".update-lock";

/// Path of the lock file for the compstate at `root`.
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

/// Whether a lock excludes other readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many holders at once; excludes [`LockMode::Exclusive`].
    Shared,
    /// A single holder; excludes everything else.
    Exclusive,
}

/// A held lock. Dropping the guard releases it.
pub struct LockGuard {
    _held: Box<dyn Send>,
}

impl LockGuard {
    /// Wrap a backend-specific value whose drop releases the lock.
    pub fn new<T: Send + 'static>(held: T) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish_non_exhaustive()
    }
}

/// A source of shared/exclusive locks scoped to a compstate directory.
pub trait LockBackend: Send + Sync {
    /// Block until a lock of the given mode on `root` is held.
    fn acquire(&self, root: &Path, mode: LockMode) -> Result<LockGuard, LockError>;
}

/// [`LockBackend`] using advisory locks on `<root>/.update-lock`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLockBackend;

impl LockBackend for FileLockBackend {
    fn acquire(&self, root: &Path, mode: LockMode) -> Result<LockGuard, LockError> {
        let path = lock_path(root);
        let acquire_err = |source| LockError::Acquire {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(acquire_err)?;

        debug!(path = %path.display(), ?mode, "waiting for compstate lock");
        match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        }
        .map_err(acquire_err)?;
        debug!(path = %path.display(), ?mode, "compstate lock held");

        Ok(LockGuard::new(HeldFile { file, path }))
    }
}

/// An open lock file holding an advisory lock.
struct HeldFile {
    file: File,
    path: PathBuf,
}

impl Drop for HeldFile {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock anyway; this just makes
        // the release point explicit.
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to unlock compstate");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn lock_file_lives_in_root() {
        assert_eq!(
            lock_path(Path::new("/srv/compstate")),
            PathBuf::from("/srv/compstate/.update-lock")
        );
    }

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let guard = FileLockBackend.acquire(dir.path(), LockMode::Shared).unwrap();
        assert!(lock_path(dir.path()).exists());
        drop(guard);
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileLockBackend.acquire(dir.path(), LockMode::Shared).unwrap();
        let second = FileLockBackend.acquire(dir.path(), LockMode::Shared).unwrap();
        drop(first);
        drop(second);
    }

    #[test]
    fn shared_waits_for_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let exclusive = FileLockBackend.acquire(&root, LockMode::Exclusive).unwrap();

        let acquired = Arc::new(AtomicBool::new(false));
        let reader = {
            let acquired = Arc::clone(&acquired);
            let root = root.clone();
            thread::spawn(move || {
                let _guard = FileLockBackend.acquire(&root, LockMode::Shared).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst), "reader got past the updater");

        drop(exclusive);
        reader.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn missing_root_is_an_acquire_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FileLockBackend.acquire(&missing, LockMode::Shared).unwrap_err();
        assert!(matches!(err, LockError::Acquire { .. }));
    }
}

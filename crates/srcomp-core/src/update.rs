//! Coordination for processes that rewrite a compstate on disk.
//!
//! An updater wraps its work in [`with_update_lock`]. The exclusive lock
//! keeps readers out while files are half-written, and the sentinel is
//! touched only if the work succeeds, which is what makes a running
//! [`StateManager`] pick the change up. A failed update leaves the
//! sentinel alone so the manager keeps serving the old data.
//!
//! [`StateManager`]: crate::manager::StateManager

use std::path::Path;

use tracing::{info, warn};

use crate::error::LockError;
use crate::lock::{FileLockBackend, LockBackend, LockMode};
use crate::sentinel;

/// Run `update` while holding the exclusive update lock on `root`, using
/// file locks.
///
/// See [`with_update_lock_using`].
pub fn with_update_lock<T, E, F>(root: &Path, update: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<LockError>,
{
    with_update_lock_using(&FileLockBackend, root, update)
}

/// Run `update` while holding the exclusive update lock on `root`.
///
/// On `Ok`, the sentinel is touched before the lock is released. On `Err`
/// (or a panic) the lock is still released but the sentinel is not
/// touched.
///
/// # Errors
///
/// Returns the error from `update` unchanged, or a [`LockError`]
/// converted into `E` if the lock cannot be taken or the sentinel cannot
/// be touched.
pub fn with_update_lock_using<T, E, F>(
    locks: &dyn LockBackend,
    root: &Path,
    update: F,
) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: From<LockError>,
{
    let _guard = locks.acquire(root, LockMode::Exclusive)?;
    info!(root = %root.display(), "Update lock acquired");

    match update() {
        Ok(value) => {
            sentinel::touch(root).map_err(|source| LockError::Signal {
                path: sentinel::sentinel_path(root),
                source,
            })?;
            info!(root = %root.display(), "Update complete, reload signalled");
            Ok(value)
        }
        Err(e) => {
            warn!(root = %root.display(), "Update failed, reload not signalled");
            Err(e)
        }
    }
}

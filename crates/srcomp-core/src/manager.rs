//! Reload-safe access to the current [`CompetitionState`].
//!
//! [`StateManager::get_state`] hands out the cached state as an
//! [`Arc`] and decides, on each call, whether it must first be rebuilt
//! from disk:
//!
//! 1. Nothing cached yet: load.
//! 2. Cached, and the last load is younger than the staleness window:
//!    serve the cache without touching the filesystem.
//! 3. Cached and older than the window: stat the update sentinel. If it
//!    differs from what the last load saw, reload; otherwise serve the
//!    cache.
//!
//! The whole check-then-maybe-reload sequence runs under one mutex, so
//! concurrent callers never load twice for the same change. Each load
//! holds a shared [`LockBackend`] lock on the compstate, queueing behind
//! an updater's exclusive lock.
//!
//! A new state replaces the old one by swapping the `Arc`. Callers hold
//! either the old state or the new one, never a mix. A failed load leaves
//! the cache exactly as it was.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use srcomp_types::CompetitionState;
use tracing::{info, warn};

use crate::compstate::YamlCompstateLoader;
use crate::error::StateLoadError;
use crate::lock::{FileLockBackend, LockBackend, LockMode};
use crate::sentinel::SentinelObservation;

/// Default minimum age of the cache before the sentinel is re-checked.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(5);

/// Builds a [`CompetitionState`] from a compstate directory.
///
/// Implementations are called with the compstate's shared lock held.
pub trait CompetitionLoader: Send + Sync {
    /// Construct a fresh state from the files under `root`.
    fn load(&self, root: &Path) -> Result<CompetitionState, StateLoadError>;
}

/// Tuning for a [`StateManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// How old the cache must be before the sentinel is re-checked.
    ///
    /// `None` loads once and never reloads.
    pub staleness: Option<Duration>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            staleness: Some(DEFAULT_STALENESS),
        }
    }
}

/// A successfully loaded state and when it was loaded.
struct Loaded {
    state: Arc<CompetitionState>,
    loaded_at: Instant,
}

/// Everything guarded by the manager's mutex.
#[derive(Default)]
struct Cache {
    current: Option<Loaded>,
    /// Sentinel as seen by the most recent load attempt.
    seen: Option<SentinelObservation>,
}

/// Owns the cached [`CompetitionState`] and reloads it when signalled.
///
/// Share it as `Arc<StateManager>`; every method takes `&self`.
pub struct StateManager {
    root_dir: RwLock<PathBuf>,
    options: ManagerOptions,
    loader: Arc<dyn CompetitionLoader>,
    locks: Arc<dyn LockBackend>,
    cache: Mutex<Cache>,
}

impl StateManager {
    /// Create a manager for the compstate at `root_dir` using the YAML
    /// loader and file locks.
    ///
    /// Nothing is loaded until the first [`get_state`](Self::get_state).
    pub fn new(root_dir: impl Into<PathBuf>, options: ManagerOptions) -> Self {
        Self::with_backends(
            root_dir,
            options,
            Arc::new(YamlCompstateLoader),
            Arc::new(FileLockBackend),
        )
    }

    /// Create a manager with an explicit loader and lock backend.
    pub fn with_backends(
        root_dir: impl Into<PathBuf>,
        options: ManagerOptions,
        loader: Arc<dyn CompetitionLoader>,
        locks: Arc<dyn LockBackend>,
    ) -> Self {
        Self {
            root_dir: RwLock::new(root_dir.into()),
            options,
            loader,
            locks,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// The compstate directory the next load will read.
    pub fn root_dir(&self) -> PathBuf {
        self.root_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point the manager at another compstate directory.
    ///
    /// The cached state stays in place. Once it is older than the
    /// staleness window the next call sees a sentinel for a different
    /// root and reloads.
    pub fn set_root_dir(&self, root_dir: impl Into<PathBuf>) {
        *self
            .root_dir
            .write()
            .unwrap_or_else(PoisonError::into_inner) = root_dir.into();
    }

    /// The options this manager was built with.
    pub const fn options(&self) -> ManagerOptions {
        self.options
    }

    /// Return the current state, reloading it first if it has changed.
    ///
    /// Blocks while a reload is in progress, including while waiting for
    /// an updater to release its exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns [`StateLoadError`] if a load was needed and failed. The
    /// previously cached state, if any, is left untouched and is served
    /// by later calls until the sentinel changes again.
    pub fn get_state(&self) -> Result<Arc<CompetitionState>, StateLoadError> {
        let root = self.root_dir();
        let mut cache = self.lock_cache();

        let needs_load = match &cache.current {
            None => true,
            Some(loaded) => self.is_stale(loaded) && {
                let observed = SentinelObservation::observe(&root);
                cache.seen.as_ref() != Some(&observed)
            },
        };

        if needs_load {
            self.reload(&mut cache, &root)?;
        }

        cache
            .current
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.state))
            .ok_or_else(|| StateLoadError::Invalid(String::from("no state loaded")))
    }

    fn is_stale(&self, loaded: &Loaded) -> bool {
        self.options
            .staleness
            .is_some_and(|window| loaded.loaded_at.elapsed() > window)
    }

    /// Build a new state under the shared lock and swap it in.
    fn reload(&self, cache: &mut Cache, root: &Path) -> Result<(), StateLoadError> {
        let _guard = self.locks.acquire(root, LockMode::Shared)?;

        // Remember the signal before loading so a failed load is not
        // retried until the updater signals again.
        cache.seen = Some(SentinelObservation::observe(root));

        let started = Instant::now();
        info!(root = %root.display(), "Loading compstate");
        match self.loader.load(root) {
            Ok(state) => {
                cache.current = Some(Loaded {
                    state: Arc::new(state),
                    loaded_at: Instant::now(),
                });
                info!(
                    root = %root.display(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Compstate loaded"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    root = %root.display(),
                    error = %e,
                    serving_previous = cache.current.is_some(),
                    "Compstate load failed"
                );
                Err(e)
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, Cache> {
        // The cache is only assigned whole values, so a panic elsewhere
        // cannot leave it half-written.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("root_dir", &self.root_dir())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

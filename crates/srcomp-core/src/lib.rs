//! Compstate loading, reload-safe state management and range filters for
//! the SRComp competition API.
//!
//! # Modules
//!
//! - [`manager`] -- [`StateManager`], the cached, sentinel-driven owner of
//!   the current [`CompetitionState`].
//! - [`lock`] -- Shared/exclusive advisory locks on a compstate directory.
//! - [`sentinel`] -- The `.update-pls` file that signals a finished update.
//! - [`update`] -- [`with_update_lock`] for processes that rewrite a
//!   compstate.
//! - [`compstate`] -- YAML compstate loader.
//! - [`schedule`] -- Queries over a loaded schedule.
//! - [`range`] -- The `a..b` range expression language used by match
//!   filters.
//! - [`error`] -- Load and lock errors.
//!
//! [`StateManager`]: manager::StateManager
//! [`CompetitionState`]: srcomp_types::CompetitionState
//! [`with_update_lock`]: update::with_update_lock

pub mod compstate;
pub mod error;
pub mod lock;
pub mod manager;
pub mod range;
pub mod schedule;
pub mod sentinel;
pub mod update;

pub use error::{LockError, StateLoadError};
pub use manager::{CompetitionLoader, ManagerOptions, StateManager};
pub use range::{RangeError, RangePredicate, compile_int_range, compile_range};
pub use update::with_update_lock;

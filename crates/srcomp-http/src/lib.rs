//! Read-only HTTP API over SRComp competition state.
//!
//! This crate provides an Axum HTTP server exposing the arenas, corners,
//! teams, schedule and scores of a competition as JSON:
//!
//! - **Resource endpoints** (`/arenas`, `/corners`, `/teams`) with
//!   single-item lookups
//! - **Match queries** (`/matches`) filtered with range expressions on
//!   number, arena, type and slot or game times
//! - **Live views** (`/current`, `/matches/last_scored`, `/knockout`,
//!   `/scores/league`)
//! - **Metadata** (`/state`, `/config`)
//!
//! # Architecture
//!
//! Every handler asks the shared [`StateManager`] for the current
//! [`CompetitionState`] and answers from that one snapshot, so a response
//! is never assembled from two different versions of the compstate. The
//! manager may block on a reload, so it is called on the blocking pool.
//!
//! [`StateManager`]: srcomp_core::StateManager
//! [`CompetitionState`]: srcomp_types::CompetitionState

pub mod error;
pub mod filters;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;

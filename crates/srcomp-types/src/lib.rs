//! Shared type definitions for the SRComp competition API.
//!
//! This crate is the single source of truth for the data served by the
//! HTTP layer. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` for the arena screens and scoreboards.
//!
//! # Modules
//!
//! - [`enums`] -- Enumeration types (match type)
//! - [`structs`] -- Arenas, corners, teams, the timed schedule, scores and
//!   the [`CompetitionState`] aggregate

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{MatchType, UnknownMatchType};
pub use structs::{
    Arena, CompetitionState, Corner, Delay, Match, MatchPeriod, MatchScore, MatchSlotLengths,
    Schedule, Scores, Team, TeamScore,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Writes `.ts` files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::enums::MatchType::export_all();

        let _ = crate::structs::Arena::export_all();
        let _ = crate::structs::Corner::export_all();
        let _ = crate::structs::Team::export_all();
        let _ = crate::structs::MatchSlotLengths::export_all();
        let _ = crate::structs::MatchPeriod::export_all();
        let _ = crate::structs::Delay::export_all();
        let _ = crate::structs::Match::export_all();
        let _ = crate::structs::Schedule::export_all();
        let _ = crate::structs::MatchScore::export_all();
        let _ = crate::structs::TeamScore::export_all();
        let _ = crate::structs::Scores::export_all();
        let _ = crate::structs::CompetitionState::export_all();
    }
}

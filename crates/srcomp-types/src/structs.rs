//! Core entity structs for a competition.
//!
//! These are produced by the compstate loader in `srcomp-core` and served
//! read-only by the HTTP layer. None of them are mutated after loading.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::MatchType;

// ---------------------------------------------------------------------------
// Venue
// ---------------------------------------------------------------------------

/// An arena in which matches are played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Arena {
    /// Short identifier used in schedules (e.g. `A`).
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Optional display colour (CSS colour string).
    pub colour: Option<String>,
}

/// A starting corner within an arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Corner {
    /// Zero-based corner number; also the team's position in a match.
    pub number: u8,
    /// Display colour for the corner.
    pub colour: String,
}

/// A competing team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Team {
    /// Three-letter acronym identifying the team.
    pub tla: String,
    /// Full team name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Lengths of the parts of a match slot, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchSlotLengths {
    /// Set-up time before the game starts.
    pub pre: u32,
    /// Duration of the game itself.
    #[serde(rename = "match")]
    pub game: u32,
    /// Clear-down time after the game.
    pub post: u32,
}

impl MatchSlotLengths {
    /// Total slot length in seconds, saturating on overflow.
    pub const fn total(&self) -> u32 {
        self.pre.saturating_add(self.game).saturating_add(self.post)
    }
}

/// A contiguous block of time in which matches of one type are played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchPeriod {
    /// Free-text description shown to spectators.
    pub description: String,
    /// When the first slot of the period may start.
    pub start_time: DateTime<Utc>,
    /// No slot may end after this time.
    pub end_time: DateTime<Utc>,
    /// The type of match played in this period.
    #[serde(rename = "type")]
    pub match_type: MatchType,
}

/// A delay applied to every slot starting at or after `time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Delay {
    /// Length of the delay in seconds.
    pub delay: u32,
    /// When the delay was called.
    pub time: DateTime<Utc>,
}

/// A single match in a single arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Match {
    /// Match number, shared by all arenas playing in the same slot.
    pub num: u32,
    /// Name of the arena the match is played in.
    pub arena: String,
    /// Team TLAs by corner; `None` marks an empty corner.
    pub teams: Vec<Option<String>>,
    /// League or knockout.
    #[serde(rename = "type")]
    pub match_type: MatchType,
    /// Start of the slot (includes set-up time).
    pub start_time: DateTime<Utc>,
    /// End of the slot (includes clear-down time).
    pub end_time: DateTime<Utc>,
    /// When the game itself starts.
    pub game_start_time: DateTime<Utc>,
    /// When the game itself ends.
    pub game_end_time: DateTime<Utc>,
}

impl Match {
    /// Spectator-facing name of the match.
    pub fn display_name(&self) -> String {
        format!("Match {}", self.num)
    }

    /// Whether the slot is in progress at `at` (start inclusive, end exclusive).
    pub fn in_progress_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }
}

/// The fully timed match schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Schedule {
    /// Slot part lengths used to time every match.
    pub match_slot_lengths: MatchSlotLengths,
    /// League and knockout periods in chronological order.
    pub periods: Vec<MatchPeriod>,
    /// Delays in chronological order.
    pub delays: Vec<Delay>,
    /// Slots indexed by match number, each mapping arena name to match.
    pub matches: Vec<BTreeMap<String, Match>>,
    /// Knockout matches grouped into rounds.
    pub knockout_rounds: Vec<Vec<Match>>,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Recorded result of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchScore {
    /// Game points per team TLA.
    pub game_points: BTreeMap<String, u32>,
    /// League points per team TLA; absent for knockout matches.
    pub league_points: Option<BTreeMap<String, u32>>,
}

/// Running totals for one team across all scored league matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamScore {
    /// Sum of league points.
    pub league_points: u32,
    /// Sum of game points.
    pub game_points: u32,
}

/// All recorded scores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scores {
    /// Scores keyed by match number, then arena name.
    pub matches: BTreeMap<u32, BTreeMap<String, MatchScore>>,
    /// League totals keyed by team TLA.
    pub teams: BTreeMap<String, TeamScore>,
    /// Highest league match number with a recorded score.
    pub last_scored_match: Option<u32>,
}

impl Scores {
    /// Look up the score recorded for `arena` in match `num`.
    pub fn for_match(&self, arena: &str, num: u32) -> Option<&MatchScore> {
        self.matches.get(&num).and_then(|by_arena| by_arena.get(arena))
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Everything known about one competition at one point in time.
///
/// Built wholesale from a compstate directory and never mutated in
/// place; a reload produces a brand-new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CompetitionState {
    /// Arenas keyed by name.
    pub arenas: BTreeMap<String, Arena>,
    /// Corners keyed by number.
    pub corners: BTreeMap<u8, Corner>,
    /// Teams keyed by TLA.
    pub teams: BTreeMap<String, Team>,
    /// The timed schedule.
    pub schedule: Schedule,
    /// Recorded scores.
    pub scores: Scores,
    /// Version label of the backing data (commit hash), if known.
    pub state: Option<String>,
}

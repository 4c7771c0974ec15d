//! Read-only queries over a loaded [`Schedule`].

use chrono::{DateTime, Utc};
use srcomp_types::{Match, Schedule};

/// Every match in number order, then arena order within a slot.
pub fn all_matches(schedule: &Schedule) -> impl Iterator<Item = &Match> {
    schedule.matches.iter().flat_map(|slot| slot.values())
}

/// Matches whose slot is in progress at `at`.
pub fn matches_at(schedule: &Schedule, at: DateTime<Utc>) -> Vec<&Match> {
    all_matches(schedule)
        .filter(|m| m.in_progress_at(at))
        .collect()
}

/// The match in `arena` whose slot is in progress at `at`.
///
/// Returns `None` between slots, including while a delay holds the next
/// slot back.
pub fn current_match<'a>(
    schedule: &'a Schedule,
    arena: &str,
    at: DateTime<Utc>,
) -> Option<&'a Match> {
    arena_matches(schedule, arena).find(|m| m.in_progress_at(at))
}

/// The first match in `arena` whose slot starts after `at`.
pub fn next_match<'a>(
    schedule: &'a Schedule,
    arena: &str,
    at: DateTime<Utc>,
) -> Option<&'a Match> {
    arena_matches(schedule, arena).find(|m| m.start_time > at)
}

/// The match in `arena` played before the current one, or before the
/// next one when no match is in progress.
///
/// Once the arena's last match is over there is nothing to anchor on, so
/// this is `None`.
pub fn previous_match<'a>(
    schedule: &'a Schedule,
    arena: &str,
    at: DateTime<Utc>,
) -> Option<&'a Match> {
    let anchor = current_match(schedule, arena, at).or_else(|| next_match(schedule, arena, at))?;
    arena_matches(schedule, arena)
        .take_while(|m| m.num < anchor.num)
        .last()
}

fn arena_matches<'a>(schedule: &'a Schedule, arena: &str) -> impl Iterator<Item = &'a Match> {
    schedule.matches.iter().filter_map(move |slot| slot.get(arena))
}

/// Total delay, in seconds, called at or before `at`.
pub fn delay_at(schedule: &Schedule, at: DateTime<Utc>) -> u32 {
    schedule
        .delays
        .iter()
        .filter(|d| d.time <= at)
        .fold(0, |total, d| total.saturating_add(d.delay))
}

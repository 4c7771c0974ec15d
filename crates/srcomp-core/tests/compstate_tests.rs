//! Loader tests against on-disk compstate fixtures.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use chrono::{DateTime, Utc};
use srcomp_core::StateLoadError;
use srcomp_core::compstate::load_compstate;
use srcomp_types::MatchType;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    common::write_compstate(dir.path());
    dir
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn loads_arenas_corners_and_teams() {
    let dir = fixture();
    let state = load_compstate(dir.path()).unwrap();

    assert_eq!(state.arenas.len(), 2);
    assert_eq!(state.arenas["A"].display_name, "Arena A");
    assert_eq!(state.arenas["A"].colour.as_deref(), Some("#ff0000"));
    assert_eq!(state.arenas["B"].colour, None);

    assert_eq!(state.corners.len(), 2);
    assert_eq!(state.corners[&1].colour, "#ff00ff");

    assert_eq!(state.teams.len(), 4);
    assert_eq!(state.teams["CCC"].name, "Charlie");
}

#[test]
fn times_league_and_knockout_matches() {
    let dir = fixture();
    let schedule = load_compstate(dir.path()).unwrap().schedule;

    assert_eq!(schedule.matches.len(), 3);

    let first = &schedule.matches[0]["A"];
    assert_eq!(first.start_time, at("2026-04-17T13:00:00Z"));
    assert_eq!(first.game_start_time, at("2026-04-17T13:01:00Z"));
    assert_eq!(first.game_end_time, at("2026-04-17T13:04:00Z"));
    assert_eq!(first.end_time, at("2026-04-17T13:05:00Z"));

    // The 13:06 delay lands after the second slot has started.
    assert_eq!(schedule.matches[1]["B"].start_time, at("2026-04-17T13:05:00Z"));

    let knockout = &schedule.matches[2]["A"];
    assert_eq!(knockout.num, 2);
    assert_eq!(knockout.match_type, MatchType::Knockout);
    assert_eq!(knockout.start_time, at("2026-04-17T15:01:00Z"));
    assert_eq!(schedule.knockout_rounds.len(), 1);
    assert_eq!(schedule.knockout_rounds[0][0].num, 2);

    assert_eq!(schedule.periods.len(), 2);
    assert_eq!(schedule.delays.len(), 1);
}

#[test]
fn scores_award_league_points() {
    let dir = fixture();
    let scores = load_compstate(dir.path()).unwrap().scores;

    assert_eq!(scores.last_scored_match, Some(0));
    assert_eq!(scores.teams["AAA"].league_points, 4);
    assert_eq!(scores.teams["AAA"].game_points, 5);
    assert_eq!(scores.teams["BBB"].league_points, 2);
    assert_eq!(scores.teams["DDD"].league_points, 0);

    let scored = scores.for_match("A", 0).unwrap();
    assert_eq!(scored.league_points.as_ref().unwrap()["AAA"], 4);
    assert!(scores.for_match("B", 0).is_none());
}

#[test]
fn scores_file_is_optional() {
    let dir = fixture();
    std::fs::remove_file(dir.path().join("scores.yaml")).unwrap();

    let scores = load_compstate(dir.path()).unwrap().scores;
    assert_eq!(scores.last_scored_match, None);
    assert!(scores.matches.is_empty());
    assert_eq!(scores.teams.len(), 4);
}

#[test]
fn missing_schedule_is_an_io_error() {
    let dir = fixture();
    std::fs::remove_file(dir.path().join("schedule.yaml")).unwrap();

    let err = load_compstate(dir.path()).unwrap_err();
    assert!(matches!(err, StateLoadError::Io { ref path, .. } if path.ends_with("schedule.yaml")));
}

#[test]
fn malformed_yaml_is_a_yaml_error() {
    let dir = fixture();
    std::fs::write(dir.path().join("teams.yaml"), "teams: [unclosed").unwrap();

    assert!(matches!(
        load_compstate(dir.path()),
        Err(StateLoadError::Yaml { .. })
    ));
}

fn rejects(file: &str, from: &str, to: &str) {
    let dir = fixture();
    let original = std::fs::read_to_string(dir.path().join(file)).unwrap();
    assert!(original.contains(from), "fixture lacks {from:?}");
    std::fs::write(dir.path().join(file), original.replacen(from, to, 1)).unwrap();

    let err = load_compstate(dir.path()).unwrap_err();
    assert!(matches!(err, StateLoadError::Invalid(_)), "got {err:?}");
}

#[test]
fn unknown_arena_rejected() {
    rejects("schedule.yaml", "    B: [CCC, DDD]", "    C: [CCC, DDD]");
}

#[test]
fn unknown_team_rejected() {
    rejects("schedule.yaml", "[AAA, BBB]", "[AAA, ZZZ]");
}

#[test]
fn gap_in_match_numbers_rejected() {
    rejects("schedule.yaml", "  1:\n", "  2:\n");
}

#[test]
fn score_for_absent_team_rejected() {
    rejects("scores.yaml", "BBB: 2", "CCC: 2");
}

#[test]
fn score_for_unscheduled_match_rejected() {
    rejects("scores.yaml", "num: 0", "num: 7");
}

#[test]
fn schedule_overflowing_periods_rejected() {
    rejects(
        "schedule.yaml",
        "end_time: \"2026-04-17T14:00:00Z\"",
        "end_time: \"2026-04-17T13:06:00Z\"",
    );
}

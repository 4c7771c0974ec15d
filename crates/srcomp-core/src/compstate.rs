//! Loading a [`CompetitionState`] from a compstate directory.
//!
//! A compstate is a directory of YAML files, normally a git checkout:
//!
//! - `arenas.yaml` -- `arenas` keyed by name, `corners` keyed by number
//! - `teams.yaml` -- `teams` keyed by TLA
//! - `schedule.yaml` -- slot lengths, match periods, delays, league
//!   matches keyed by number, knockout rounds
//! - `scores.yaml` -- optional; game points for played matches
//!
//! Loading times every match, applies delays, computes league points and
//! validates cross references. The result is immutable.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use srcomp_types::{
    Arena, CompetitionState, Corner, Delay, Match, MatchPeriod, MatchScore, MatchSlotLengths,
    MatchType, Schedule, Scores, Team, TeamScore,
};
use tracing::debug;

use crate::error::StateLoadError;
use crate::manager::CompetitionLoader;

/// Arena definitions file.
pub const ARENAS_FILE: &str = "arenas.yaml";
/// Team definitions file.
pub const TEAMS_FILE: &str = "teams.yaml";
/// Schedule definition file.
pub const SCHEDULE_FILE: &str = "schedule.yaml";
/// Recorded scores file (optional).
pub const SCORES_FILE: &str = "scores.yaml";

/// League points for first place in a match is this times the number of
/// scored teams; each lower position earns this much less.
const LEAGUE_POINTS_STEP: u32 = 2;

/// [`CompetitionLoader`] reading the YAML compstate layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCompstateLoader;

impl CompetitionLoader for YamlCompstateLoader {
    fn load(&self, root: &Path) -> Result<CompetitionState, StateLoadError> {
        load_compstate(root)
    }
}

// ---------------------------------------------------------------------------
// On-disk shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ArenasFile {
    arenas: BTreeMap<String, RawArena>,
    #[serde(default)]
    corners: BTreeMap<u8, RawCorner>,
}

#[derive(Debug, Deserialize)]
struct RawArena {
    display_name: String,
    #[serde(default)]
    colour: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCorner {
    colour: String,
}

#[derive(Debug, Deserialize)]
struct TeamsFile {
    teams: BTreeMap<String, RawTeam>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    match_slot_lengths: MatchSlotLengths,
    match_periods: RawPeriods,
    #[serde(default)]
    delays: Vec<Delay>,
    #[serde(default)]
    matches: BTreeMap<u32, BTreeMap<String, Vec<Option<String>>>>,
    #[serde(default)]
    knockout: Vec<Vec<RawKnockoutMatch>>,
}

#[derive(Debug, Deserialize)]
struct RawPeriods {
    #[serde(default)]
    league: Vec<RawPeriod>,
    #[serde(default)]
    knockout: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
struct RawPeriod {
    description: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawKnockoutMatch {
    arena: String,
    teams: Vec<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoresFile {
    #[serde(default)]
    league: Vec<RawScore>,
    #[serde(default)]
    knockout: Vec<RawScore>,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    arena: String,
    num: u32,
    game_points: BTreeMap<String, u32>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate the compstate at `root`.
///
/// # Errors
///
/// Returns [`StateLoadError`] if a required file is missing or
/// malformed, or if the files reference unknown arenas, teams or matches.
pub fn load_compstate(root: &Path) -> Result<CompetitionState, StateLoadError> {
    let arenas_file: ArenasFile = read_yaml(root, ARENAS_FILE)?;
    let teams_file: TeamsFile = read_yaml(root, TEAMS_FILE)?;
    let schedule_file: ScheduleFile = read_yaml(root, SCHEDULE_FILE)?;
    let scores_file: ScoresFile = read_optional_yaml(root, SCORES_FILE)?.unwrap_or_default();

    let arenas: BTreeMap<String, Arena> = arenas_file
        .arenas
        .into_iter()
        .map(|(name, raw)| {
            let arena = Arena {
                name: name.clone(),
                display_name: raw.display_name,
                colour: raw.colour,
            };
            (name, arena)
        })
        .collect();

    let corners = arenas_file
        .corners
        .into_iter()
        .map(|(number, raw)| {
            (
                number,
                Corner {
                    number,
                    colour: raw.colour,
                },
            )
        })
        .collect();

    let teams: BTreeMap<String, Team> = teams_file
        .teams
        .into_iter()
        .map(|(tla, raw)| {
            let team = Team {
                tla: tla.clone(),
                name: raw.name,
            };
            (tla, team)
        })
        .collect();

    let schedule = build_schedule(schedule_file, &arenas, &teams)?;
    let scores = build_scores(scores_file, &schedule, &teams)?;

    debug!(
        root = %root.display(),
        arenas = arenas.len(),
        teams = teams.len(),
        matches = schedule.matches.len(),
        "Compstate parsed"
    );

    Ok(CompetitionState {
        arenas,
        corners,
        teams,
        schedule,
        scores,
        state: state_label(root),
    })
}

fn read_yaml<T: DeserializeOwned>(root: &Path, name: &str) -> Result<T, StateLoadError> {
    let path = root.join(name);
    let contents = std::fs::read_to_string(&path).map_err(|source| StateLoadError::Io {
        path: path.clone(),
        source,
    })?;
    serde_yml::from_str(&contents).map_err(|source| StateLoadError::Yaml { path, source })
}

fn read_optional_yaml<T: DeserializeOwned>(
    root: &Path,
    name: &str,
) -> Result<Option<T>, StateLoadError> {
    if root.join(name).exists() {
        read_yaml(root, name).map(Some)
    } else {
        Ok(None)
    }
}

/// The commit the compstate checkout is at, if it is a git checkout.
fn state_label(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(root = %root.display(), "Compstate is not a git checkout; no state label");
        return None;
    }
    let label = String::from_utf8(output.stdout).ok()?;
    Some(label.trim().to_owned())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

fn build_schedule(
    file: ScheduleFile,
    arenas: &BTreeMap<String, Arena>,
    teams: &BTreeMap<String, Team>,
) -> Result<Schedule, StateLoadError> {
    let lengths = file.match_slot_lengths;
    let mut delays = file.delays;
    delays.sort_by_key(|d| d.time);

    let league_periods = into_periods(file.match_periods.league, MatchType::League);
    let knockout_periods = into_periods(file.match_periods.knockout, MatchType::Knockout);

    let mut layout = SlotLayout::new(lengths, &delays);

    let mut matches: Vec<BTreeMap<String, Match>> = Vec::with_capacity(file.matches.len());
    let league_starts = layout.starts(&league_periods, file.matches.len())?;
    for ((num, slot), start) in file.matches.into_iter().zip(league_starts) {
        if usize::try_from(num).ok() != Some(matches.len()) {
            return Err(StateLoadError::Invalid(format!(
                "league match numbers must run from 0 without gaps; found {num} at position {}",
                matches.len()
            )));
        }
        let mut by_arena = BTreeMap::new();
        for (arena, slot_teams) in slot {
            check_refs(num, &arena, &slot_teams, arenas, teams)?;
            let m = timed_match(num, arena.clone(), slot_teams, MatchType::League, start, lengths)?;
            by_arena.insert(arena, m);
        }
        matches.push(by_arena);
    }

    let knockout_count = file.knockout.iter().map(Vec::len).sum();
    let mut knockout_starts = layout.starts(&knockout_periods, knockout_count)?.into_iter();
    let mut knockout_rounds = Vec::with_capacity(file.knockout.len());
    for round in file.knockout {
        let mut round_matches = Vec::with_capacity(round.len());
        for raw in round {
            let num = u32::try_from(matches.len())
                .map_err(|e| StateLoadError::Invalid(format!("too many matches: {e}")))?;
            let start = knockout_starts.next().ok_or_else(|| {
                StateLoadError::Invalid(String::from("knockout slot count mismatch"))
            })?;
            check_refs(num, &raw.arena, &raw.teams, arenas, teams)?;
            let m = timed_match(
                num,
                raw.arena.clone(),
                raw.teams,
                MatchType::Knockout,
                start,
                lengths,
            )?;
            matches.push(BTreeMap::from([(raw.arena, m.clone())]));
            round_matches.push(m);
        }
        knockout_rounds.push(round_matches);
    }

    let mut periods = league_periods;
    periods.extend(knockout_periods);
    periods.sort_by_key(|p| p.start_time);

    Ok(Schedule {
        match_slot_lengths: lengths,
        periods,
        delays,
        matches,
        knockout_rounds,
    })
}

fn into_periods(raw: Vec<RawPeriod>, match_type: MatchType) -> Vec<MatchPeriod> {
    let mut periods: Vec<MatchPeriod> = raw
        .into_iter()
        .map(|p| MatchPeriod {
            description: p.description,
            start_time: p.start_time,
            end_time: p.end_time,
            match_type,
        })
        .collect();
    periods.sort_by_key(|p| p.start_time);
    periods
}

fn check_refs(
    num: u32,
    arena: &str,
    slot_teams: &[Option<String>],
    arenas: &BTreeMap<String, Arena>,
    teams: &BTreeMap<String, Team>,
) -> Result<(), StateLoadError> {
    if !arenas.contains_key(arena) {
        return Err(StateLoadError::Invalid(format!(
            "match {num} uses unknown arena {arena:?}"
        )));
    }
    if let Some(tla) = slot_teams.iter().flatten().find(|tla| !teams.contains_key(*tla)) {
        return Err(StateLoadError::Invalid(format!(
            "match {num} in arena {arena} uses unknown team {tla:?}"
        )));
    }
    Ok(())
}

fn timed_match(
    num: u32,
    arena: String,
    teams: Vec<Option<String>>,
    match_type: MatchType,
    start: DateTime<Utc>,
    lengths: MatchSlotLengths,
) -> Result<Match, StateLoadError> {
    let game_start_time = shift(start, seconds(lengths.pre))?;
    Ok(Match {
        num,
        arena,
        teams,
        match_type,
        start_time: start,
        end_time: shift(start, seconds(lengths.total()))?,
        game_start_time,
        game_end_time: shift(game_start_time, seconds(lengths.game))?,
    })
}

/// Lays slots out back to back through a sequence of periods.
///
/// Delays are cumulative across the whole day: once called, a delay
/// pushes back every later slot, in every later period.
struct SlotLayout<'a> {
    slot: TimeDelta,
    delays: &'a [Delay],
    next_delay: usize,
    applied: TimeDelta,
}

impl<'a> SlotLayout<'a> {
    fn new(lengths: MatchSlotLengths, delays: &'a [Delay]) -> Self {
        Self {
            slot: seconds(lengths.total()),
            delays,
            next_delay: 0,
            applied: TimeDelta::zero(),
        }
    }

    /// Start times for `count` consecutive slots in `periods`.
    fn starts(
        &mut self,
        periods: &[MatchPeriod],
        count: usize,
    ) -> Result<Vec<DateTime<Utc>>, StateLoadError> {
        let mut starts = Vec::with_capacity(count);
        let mut periods = periods.iter();
        let mut current: Option<(&MatchPeriod, DateTime<Utc>)> = None;

        while starts.len() < count {
            let (period, cursor) = match current {
                Some(open) => open,
                None => {
                    let period = periods.next().ok_or_else(|| {
                        StateLoadError::Invalid(format!(
                            "{count} slots do not fit in the match periods"
                        ))
                    })?;
                    (period, period.start_time)
                }
            };

            let slot_end = shift(cursor, self.slot)?;
            if slot_end > period.end_time {
                current = None;
                continue;
            }

            starts.push(self.delayed(cursor)?);
            current = Some((period, slot_end));
        }

        Ok(starts)
    }

    /// Apply every delay called at or before the (delayed) slot start.
    fn delayed(&mut self, cursor: DateTime<Utc>) -> Result<DateTime<Utc>, StateLoadError> {
        let mut start = shift(cursor, self.applied)?;
        while let Some(delay) = self.delays.get(self.next_delay) {
            if delay.time > start {
                break;
            }
            self.applied = self
                .applied
                .checked_add(&seconds(delay.delay))
                .ok_or_else(|| StateLoadError::Invalid(String::from("delay overflow")))?;
            self.next_delay = self.next_delay.saturating_add(1);
            start = shift(cursor, self.applied)?;
        }
        Ok(start)
    }
}

fn seconds(secs: u32) -> TimeDelta {
    TimeDelta::seconds(i64::from(secs))
}

fn shift(at: DateTime<Utc>, by: TimeDelta) -> Result<DateTime<Utc>, StateLoadError> {
    at.checked_add_signed(by)
        .ok_or_else(|| StateLoadError::Invalid(format!("time out of range: {at} + {by}")))
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

fn build_scores(
    file: ScoresFile,
    schedule: &Schedule,
    teams: &BTreeMap<String, Team>,
) -> Result<Scores, StateLoadError> {
    let mut scores = Scores {
        teams: teams
            .keys()
            .map(|tla| (tla.clone(), TeamScore::default()))
            .collect(),
        ..Scores::default()
    };

    for raw in file.league {
        check_score(&raw, schedule, MatchType::League)?;
        let league_points = rank_league_points(&raw.game_points);
        for (tla, game) in &raw.game_points {
            let league = league_points.get(tla).copied().unwrap_or_default();
            let total = scores.teams.entry(tla.clone()).or_default();
            total.game_points = total.game_points.saturating_add(*game);
            total.league_points = total.league_points.saturating_add(league);
        }
        scores.last_scored_match = scores.last_scored_match.max(Some(raw.num));
        scores.matches.entry(raw.num).or_default().insert(
            raw.arena,
            MatchScore {
                game_points: raw.game_points,
                league_points: Some(league_points),
            },
        );
    }

    for raw in file.knockout {
        check_score(&raw, schedule, MatchType::Knockout)?;
        scores.matches.entry(raw.num).or_default().insert(
            raw.arena,
            MatchScore {
                game_points: raw.game_points,
                league_points: None,
            },
        );
    }

    Ok(scores)
}

fn check_score(
    raw: &RawScore,
    schedule: &Schedule,
    expected: MatchType,
) -> Result<(), StateLoadError> {
    let scheduled = usize::try_from(raw.num)
        .ok()
        .and_then(|idx| schedule.matches.get(idx))
        .and_then(|slot| slot.get(&raw.arena))
        .filter(|m| m.match_type == expected)
        .ok_or_else(|| {
            StateLoadError::Invalid(format!(
                "score for unknown {expected} match {} in arena {}",
                raw.num, raw.arena
            ))
        })?;

    let playing = |tla: &String| scheduled.teams.iter().flatten().any(|t| t == tla);
    if let Some(tla) = raw.game_points.keys().find(|&tla| !playing(tla)) {
        return Err(StateLoadError::Invalid(format!(
            "score for match {} in arena {} names {tla:?}, who did not play",
            raw.num, raw.arena
        )));
    }
    Ok(())
}

/// League points for one match from its game points.
///
/// Teams are ranked by game points; tied teams share the best position
/// they cover. Position `p` (0-based) earns `2 * (n - p)` for `n` teams.
pub fn rank_league_points(game_points: &BTreeMap<String, u32>) -> BTreeMap<String, u32> {
    let entrants = u32::try_from(game_points.len()).unwrap_or(u32::MAX);
    game_points
        .iter()
        .map(|(tla, points)| {
            let beaten_by = game_points.values().filter(|other| *other > points).count();
            let position = u32::try_from(beaten_by).unwrap_or(u32::MAX);
            let league = entrants
                .saturating_sub(position)
                .saturating_mul(LEAGUE_POINTS_STEP);
            (tla.clone(), league)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn points(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries
            .iter()
            .map(|(tla, pts)| ((*tla).to_owned(), *pts))
            .collect()
    }

    #[test]
    fn league_points_by_rank() {
        let league = rank_league_points(&points(&[("AAA", 9), ("BBB", 5), ("CCC", 3), ("DDD", 0)]));
        assert_eq!(league, points(&[("AAA", 8), ("BBB", 6), ("CCC", 4), ("DDD", 2)]));
    }

    #[test]
    fn tied_teams_share_best_position() {
        let league = rank_league_points(&points(&[("AAA", 4), ("BBB", 4), ("CCC", 1)]));
        assert_eq!(league, points(&[("AAA", 6), ("BBB", 6), ("CCC", 2)]));
    }

    #[test]
    fn no_entrants_no_points() {
        assert!(rank_league_points(&BTreeMap::new()).is_empty());
    }

    fn period(start: &str, end: &str) -> MatchPeriod {
        MatchPeriod {
            description: String::from("test"),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            match_type: MatchType::League,
        }
    }

    const FIVE_MINUTES: MatchSlotLengths = MatchSlotLengths {
        pre: 60,
        game: 180,
        post: 60,
    };

    #[test]
    fn slots_run_back_to_back() {
        let periods = [period("2026-04-17T13:00:00Z", "2026-04-17T14:00:00Z")];
        let mut layout = SlotLayout::new(FIVE_MINUTES, &[]);
        let starts = layout.starts(&periods, 3).unwrap();
        let expected: Vec<DateTime<Utc>> = [
            "2026-04-17T13:00:00Z",
            "2026-04-17T13:05:00Z",
            "2026-04-17T13:10:00Z",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn overflowing_slot_moves_to_next_period() {
        let periods = [
            period("2026-04-17T13:00:00Z", "2026-04-17T13:07:00Z"),
            period("2026-04-17T15:00:00Z", "2026-04-17T16:00:00Z"),
        ];
        let mut layout = SlotLayout::new(FIVE_MINUTES, &[]);
        let starts = layout.starts(&periods, 2).unwrap();
        assert_eq!(starts.last().copied(), "2026-04-17T15:00:00Z".parse().ok());
    }

    #[test]
    fn too_many_slots_is_invalid() {
        let periods = [period("2026-04-17T13:00:00Z", "2026-04-17T13:07:00Z")];
        let mut layout = SlotLayout::new(FIVE_MINUTES, &[]);
        assert!(matches!(
            layout.starts(&periods, 2),
            Err(StateLoadError::Invalid(_))
        ));
    }

    #[test]
    fn delay_pushes_later_slots() {
        let periods = [period("2026-04-17T13:00:00Z", "2026-04-17T14:00:00Z")];
        let delays = [Delay {
            delay: 90,
            time: "2026-04-17T13:02:00Z".parse().unwrap(),
        }];
        let mut layout = SlotLayout::new(FIVE_MINUTES, &delays);
        let starts = layout.starts(&periods, 3).unwrap();
        let expected: Vec<DateTime<Utc>> = [
            "2026-04-17T13:00:00Z",
            "2026-04-17T13:06:30Z",
            "2026-04-17T13:11:30Z",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
        assert_eq!(starts, expected);
    }
}

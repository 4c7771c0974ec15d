//! REST API endpoint handlers.
//!
//! Every handler takes one [`CompetitionState`] snapshot from the
//! shared [`AppState`] and answers from it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Links to the other endpoints |
//! | `GET` | `/arenas` | All arenas |
//! | `GET` | `/arenas/{name}` | Single arena |
//! | `GET` | `/arenas/{name}/current` | Previous, current and next match in an arena |
//! | `GET` | `/corners` | All corners |
//! | `GET` | `/corners/{number}` | Single corner |
//! | `GET` | `/teams` | All teams with point totals |
//! | `GET` | `/teams/{tla}` | Single team |
//! | `GET` | `/matches` | Filtered matches |
//! | `GET` | `/matches/last_scored` | Last scored match number |
//! | `GET` | `/matches/periods` | League and knockout periods in time order |
//! | `GET` | `/current` | Matches in progress now and the current delay |
//! | `GET` | `/knockout` | Knockout rounds |
//! | `GET` | `/scores/league` | League and game points per team |
//! | `GET` | `/state` | Compstate revision label |
//! | `GET` | `/config` | API version and slot lengths |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde_json::{Value, json};
use srcomp_core::schedule::{
    all_matches, current_match, delay_at, matches_at, next_match, previous_match,
};
use srcomp_types::{CompetitionState, Match, Team};

use crate::error::ApiError;
use crate::filters::{FILTER_KEYS, MatchFilter, match_json, unique_params};
use crate::state::AppState;

/// Result type for JSON handlers.
pub type ApiResult = Result<Json<Value>, ApiError>;

// ---------------------------------------------------------------------------
// GET / -- index
// ---------------------------------------------------------------------------

/// Links to the other endpoints.
pub async fn index() -> Json<Value> {
    Json(json!({
        "arenas": "/arenas",
        "corners": "/corners",
        "teams": "/teams",
        "matches": {
            "all": "/matches",
            "filters": FILTER_KEYS,
            "last_scored": "/matches/last_scored",
            "periods": "/matches/periods",
        },
        "current": "/current",
        "knockout": "/knockout",
        "scores": { "league": "/scores/league" },
        "state": "/state",
        "config": "/config",
    }))
}

// ---------------------------------------------------------------------------
// Arenas and corners
// ---------------------------------------------------------------------------

/// All arenas, keyed by name.
pub async fn list_arenas(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    Ok(Json(json!({ "arenas": comp.arenas })))
}

/// A single arena.
pub async fn get_arena(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult {
    let comp = state.competition().await?;
    let arena = comp
        .arenas
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("arena {name}")))?;
    Ok(Json(json!(arena)))
}

/// The previous, current and next match in one arena.
///
/// Each entry is `null` when there is no such match.
pub async fn arena_current(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult {
    let comp = state.competition().await?;
    if !comp.arenas.contains_key(&name) {
        return Err(ApiError::NotFound(format!("arena {name}")));
    }

    let now = Utc::now();
    let describe = |m: Option<&Match>| m.map(|m| match_json(m, &comp.scores));
    Ok(Json(json!({
        "time": now,
        "previous": describe(previous_match(&comp.schedule, &name, now)),
        "current": describe(current_match(&comp.schedule, &name, now)),
        "next": describe(next_match(&comp.schedule, &name, now)),
    })))
}

/// All corners, keyed by number.
pub async fn list_corners(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    Ok(Json(json!({ "corners": comp.corners })))
}

/// A single corner.
///
/// A number that does not parse is reported the same way as one that
/// does not exist.
pub async fn get_corner(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> ApiResult {
    let comp = state.competition().await?;
    let corner = number
        .parse::<u8>()
        .ok()
        .and_then(|n| comp.corners.get(&n))
        .ok_or_else(|| ApiError::NotFound(format!("corner {number}")))?;
    Ok(Json(json!(corner)))
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// All teams with their point totals, keyed by TLA.
pub async fn list_teams(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    let teams: BTreeMap<&str, Value> = comp
        .teams
        .values()
        .map(|team| (team.tla.as_str(), team_json(&comp, team)))
        .collect();
    Ok(Json(json!({ "teams": teams })))
}

/// A single team with its point totals.
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(tla): Path<String>,
) -> ApiResult {
    let comp = state.competition().await?;
    let team = comp
        .teams
        .get(&tla)
        .ok_or_else(|| ApiError::NotFound(format!("team {tla}")))?;
    Ok(Json(team_json(&comp, team)))
}

fn team_json(comp: &CompetitionState, team: &Team) -> Value {
    let totals = comp.scores.teams.get(&team.tla).copied().unwrap_or_default();
    json!({
        "tla": team.tla,
        "name": team.name,
        "scores": {
            "league": totals.league_points,
            "game": totals.game_points,
        },
    })
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Matches selected by range filters.
///
/// # Query Parameters
///
/// Any of the keys in [`FILTER_KEYS`], each holding a range expression,
/// plus `limit`. Unknown and repeated keys are rejected.
pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult {
    let filter = MatchFilter::from_query(&unique_params(params)?)?;
    let comp = state.competition().await?;

    let matches: Vec<Value> = filter
        .apply(all_matches(&comp.schedule))
        .into_iter()
        .map(|m| match_json(m, &comp.scores))
        .collect();

    Ok(Json(json!({ "matches": matches })))
}

/// The number of the most recently scored match.
pub async fn last_scored(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    Ok(Json(json!({ "last_scored": comp.scores.last_scored_match })))
}

/// Match periods in time order.
pub async fn periods(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    Ok(Json(json!({ "periods": comp.schedule.periods })))
}

/// Matches whose slot contains the current time, and the delay so far.
pub async fn current(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    let now = Utc::now();

    let matches: Vec<Value> = matches_at(&comp.schedule, now)
        .into_iter()
        .map(|m| match_json(m, &comp.scores))
        .collect();

    Ok(Json(json!({
        "time": now,
        "delay": delay_at(&comp.schedule, now),
        "matches": matches,
    })))
}

/// Knockout matches grouped by round.
pub async fn knockout(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    let rounds: Vec<Vec<Value>> = comp
        .schedule
        .knockout_rounds
        .iter()
        .map(|round| round.iter().map(|m| match_json(m, &comp.scores)).collect())
        .collect();
    Ok(Json(json!({ "rounds": rounds })))
}

// ---------------------------------------------------------------------------
// Scores, state and config
// ---------------------------------------------------------------------------

/// League and game point totals per team.
pub async fn league_scores(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    let league: BTreeMap<&str, u32> = comp
        .scores
        .teams
        .iter()
        .map(|(tla, totals)| (tla.as_str(), totals.league_points))
        .collect();
    let game: BTreeMap<&str, u32> = comp
        .scores
        .teams
        .iter()
        .map(|(tla, totals)| (tla.as_str(), totals.game_points))
        .collect();

    Ok(Json(json!({
        "league_points": league,
        "game_points": game,
        "last_scored": comp.scores.last_scored_match,
    })))
}

/// The compstate revision the served state was loaded from.
pub async fn state_label(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    Ok(Json(json!({ "state": comp.state })))
}

/// API version and match slot lengths.
pub async fn config(State(state): State<Arc<AppState>>) -> ApiResult {
    let comp = state.competition().await?;
    let slots = comp.schedule.match_slot_lengths;
    Ok(Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "match_slots": {
            "pre": slots.pre,
            "match": slots.game,
            "post": slots.post,
            "total": slots.total(),
        },
    })))
}

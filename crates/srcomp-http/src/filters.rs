//! Match filtering and JSON shaping for match endpoints.
//!
//! `/matches` accepts one range expression per filter key:
//!
//! | Key | Value type | Example |
//! |-----|------------|---------|
//! | `num` | integer | `num=4..10` |
//! | `arena` | arena name | `arena=A` |
//! | `type` | `league` / `knockout` | `type=knockout` |
//! | `slot_start_time`, `slot_end_time` | RFC 3339 time | `slot_start_time=2026-04-17T13:00:00Z..` |
//! | `game_start_time`, `game_end_time` | RFC 3339 time | `game_end_time=..2026-04-17T14:00:00Z` |
//!
//! plus `limit`, the maximum number of matches returned. Filters are
//! combined with AND. Each key may appear once; a repeated key is a 400.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use srcomp_core::{RangePredicate, compile_range};
use srcomp_types::{Match, MatchType, Scores};

use crate::error::ApiError;

/// Query key limiting the number of returned matches.
pub const LIMIT_KEY: &str = "limit";

/// Every key [`MatchFilter::from_query`] accepts as a filter.
pub const FILTER_KEYS: [&str; 7] = [
    "num",
    "arena",
    "type",
    "slot_start_time",
    "slot_end_time",
    "game_start_time",
    "game_end_time",
];

/// A compiled `/matches` query.
#[derive(Debug, Default)]
pub struct MatchFilter {
    num: Option<RangePredicate<i64>>,
    arena: Option<RangePredicate<String>>,
    match_type: Option<RangePredicate<MatchType>>,
    slot_start: Option<RangePredicate<DateTime<Utc>>>,
    slot_end: Option<RangePredicate<DateTime<Utc>>>,
    game_start: Option<RangePredicate<DateTime<Utc>>>,
    game_end: Option<RangePredicate<DateTime<Utc>>>,
    /// Maximum number of matches to return.
    pub limit: Option<usize>,
}

impl MatchFilter {
    /// Compile the filter from raw query parameters.
    ///
    /// # Errors
    ///
    /// - [`ApiError::UnknownMatchFilter`] for a key that is not a filter.
    /// - [`ApiError::InvalidRange`] for an expression that does not compile.
    /// - [`ApiError::InvalidQuery`] for a `limit` that is not a count.
    pub fn from_query(query: &BTreeMap<String, String>) -> Result<Self, ApiError> {
        let mut filter = Self::default();

        for (key, spec) in query {
            let invalid = |source| ApiError::InvalidRange {
                key: key.clone(),
                source,
            };
            match key.as_str() {
                "num" => filter.num = Some(compile_range(spec, str::parse::<i64>).map_err(invalid)?),
                "arena" => filter.arena = Some(compile_range(spec, identity).map_err(invalid)?),
                "type" => {
                    filter.match_type =
                        Some(compile_range(spec, str::parse::<MatchType>).map_err(invalid)?);
                }
                "slot_start_time" => filter.slot_start = Some(time_range(spec).map_err(invalid)?),
                "slot_end_time" => filter.slot_end = Some(time_range(spec).map_err(invalid)?),
                "game_start_time" => filter.game_start = Some(time_range(spec).map_err(invalid)?),
                "game_end_time" => filter.game_end = Some(time_range(spec).map_err(invalid)?),
                LIMIT_KEY => {
                    let limit = spec.parse::<usize>().map_err(|e| {
                        ApiError::InvalidQuery(format!("limit {spec:?}: {e}"))
                    })?;
                    filter.limit = Some(limit);
                }
                other => return Err(ApiError::UnknownMatchFilter(other.to_owned())),
            }
        }

        Ok(filter)
    }

    /// Whether `m` passes every filter present.
    pub fn matches(&self, m: &Match) -> bool {
        fn check<T: PartialOrd>(range: Option<&RangePredicate<T>>, value: &T) -> bool {
            range.is_none_or(|r| r.matches(value))
        }

        check(self.num.as_ref(), &i64::from(m.num))
            && check(self.arena.as_ref(), &m.arena)
            && check(self.match_type.as_ref(), &m.match_type)
            && check(self.slot_start.as_ref(), &m.start_time)
            && check(self.slot_end.as_ref(), &m.end_time)
            && check(self.game_start.as_ref(), &m.game_start_time)
            && check(self.game_end.as_ref(), &m.game_end_time)
    }

    /// Apply the filters and the limit to `matches`, preserving order.
    pub fn apply<'a>(&self, matches: impl Iterator<Item = &'a Match>) -> Vec<&'a Match> {
        matches
            .filter(|m| self.matches(m))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Collect query pairs into a map, rejecting any key given twice.
///
/// # Errors
///
/// [`ApiError::InvalidQuery`] naming the first repeated key.
pub fn unique_params(pairs: Vec<(String, String)>) -> Result<BTreeMap<String, String>, ApiError> {
    let mut params = BTreeMap::new();
    for (key, value) in pairs {
        match params.entry(key) {
            Entry::Occupied(e) => {
                return Err(ApiError::InvalidQuery(format!("{} given more than once", e.key())));
            }
            Entry::Vacant(e) => {
                e.insert(value);
            }
        }
    }
    Ok(params)
}

fn identity(token: &str) -> Result<String, core::convert::Infallible> {
    Ok(token.to_owned())
}

fn time_range(spec: &str) -> Result<RangePredicate<DateTime<Utc>>, srcomp_core::RangeError> {
    compile_range(spec, |token| {
        DateTime::parse_from_rfc3339(token).map(|t| t.with_timezone(&Utc))
    })
}

// ---------------------------------------------------------------------------
// JSON shaping
// ---------------------------------------------------------------------------

/// JSON description of a match, with its scores if it has been scored.
pub fn match_json(m: &Match, scores: &Scores) -> Value {
    let mut info = json!({
        "num": m.num,
        "display_name": m.display_name(),
        "arena": m.arena,
        "teams": m.teams,
        "type": m.match_type,
        "times": {
            "slot": { "start": m.start_time, "end": m.end_time },
            "game": { "start": m.game_start_time, "end": m.game_end_time },
        },
    });

    if let (Some(score), Some(obj)) = (scores.for_match(&m.arena, m.num), info.as_object_mut()) {
        let mut scored = json!({ "game": score.game_points });
        if let (Some(league), Some(scored_obj)) = (&score.league_points, scored.as_object_mut()) {
            scored_obj.insert(String::from("league"), json!(league));
        }
        obj.insert(String::from("scores"), scored);
    }

    info
}

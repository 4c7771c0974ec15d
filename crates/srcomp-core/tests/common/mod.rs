//! Compstate fixtures shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::fs::File;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use srcomp_core::sentinel::sentinel_path;

pub const ARENAS: &str = r##"
arenas:
  A:
    display_name: Arena A
    colour: "#ff0000"
  B:
    display_name: Arena B
corners:
  0:
    colour: "#00ff00"
  1:
    colour: "#ff00ff"
"##;

pub const TEAMS: &str = "
teams:
  AAA: {name: Alpha}
  BBB: {name: Bravo}
  CCC: {name: Charlie}
  DDD: {name: Delta}
";

pub const SCHEDULE: &str = r#"
match_slot_lengths:
  pre: 60
  match: 180
  post: 60
match_periods:
  league:
    - description: Morning
      start_time: "2026-04-17T13:00:00Z"
      end_time: "2026-04-17T14:00:00Z"
  knockout:
    - description: Finals
      start_time: "2026-04-17T15:00:00Z"
      end_time: "2026-04-17T16:00:00Z"
delays:
  - delay: 60
    time: "2026-04-17T13:06:00Z"
matches:
  0:
    A: [AAA, BBB]
    B: [CCC, DDD]
  1:
    A: [CCC, AAA]
    B: [DDD, BBB]
knockout:
  - - arena: A
      teams: [AAA, CCC]
"#;

pub const SCORES: &str = "
league:
  - arena: A
    num: 0
    game_points: {AAA: 5, BBB: 2}
";

/// Write the standard four-file compstate into `root`.
pub fn write_compstate(root: &Path) {
    std::fs::write(root.join("arenas.yaml"), ARENAS).unwrap();
    std::fs::write(root.join("teams.yaml"), TEAMS).unwrap();
    std::fs::write(root.join("schedule.yaml"), SCHEDULE).unwrap();
    std::fs::write(root.join("scores.yaml"), SCORES).unwrap();
}

/// Set the sentinel's mtime to a fixed value, creating it if needed.
pub fn bump_sentinel(root: &Path, secs: u64) {
    let file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(sentinel_path(root))
        .unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

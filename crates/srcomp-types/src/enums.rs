//! Enumeration types for the competition API.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of a scheduled match.
///
/// League matches award league points; knockout matches only record
/// game points and decide progression through the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum MatchType {
    /// A match played during a league period.
    League,
    /// A match played during a knockout period.
    Knockout,
}

impl MatchType {
    /// The wire name of this match type, as used in JSON and query filters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::League => "league",
            Self::Knockout => "knockout",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a [`MatchType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match type: {0}")]
pub struct UnknownMatchType(pub String);

impl FromStr for MatchType {
    type Err = UnknownMatchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "league" => Ok(Self::League),
            "knockout" => Ok(Self::Knockout),
            other => Err(UnknownMatchType(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_type_wire_names() {
        assert_eq!(MatchType::League.to_string(), "league");
        assert_eq!(MatchType::Knockout.to_string(), "knockout");
        assert_eq!(
            serde_json::to_string(&MatchType::Knockout).ok().as_deref(),
            Some("\"knockout\"")
        );
    }

    #[test]
    fn match_type_parses_wire_names_only() {
        assert_eq!("league".parse::<MatchType>(), Ok(MatchType::League));
        assert_eq!("knockout".parse::<MatchType>(), Ok(MatchType::Knockout));
        assert!("League".parse::<MatchType>().is_err());
        assert!("".parse::<MatchType>().is_err());
    }
}

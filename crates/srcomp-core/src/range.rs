//! Range expressions for filtering matches.
//!
//! A range expression selects values of some ordered type:
//!
//! | Expression | Matches |
//! |------------|---------|
//! | `a`        | exactly `a` |
//! | `a..`      | `a` or greater |
//! | `..b`      | `b` or less |
//! | `a..b`     | `a` to `b` inclusive |
//!
//! Bounds are converted by a caller-supplied function, so the same
//! grammar filters match numbers, arena names, match types and times.
//! A compiled [`RangePredicate`] holds no mutable state and can be
//! evaluated any number of times.

use core::fmt::Display;
use core::str::FromStr;

/// Separates the lower and upper bound.
pub const SEPARATOR: &str = "..";

/// Errors from [`compile_range`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The expression was only the separator.
    #[error("must specify at least one bound")]
    EmptyRange,

    /// The separator appeared more than once.
    #[error("malformed range {0:?}: more than one '..'")]
    MalformedRange(String),

    /// The lower bound is greater than the upper bound.
    #[error("bounds are the wrong way around: {lower:?} > {upper:?}")]
    InvertedBounds {
        /// The lower bound as written.
        lower: String,
        /// The upper bound as written.
        upper: String,
    },

    /// A bound could not be converted to the value type.
    #[error("invalid value {token:?}: {reason}")]
    ValueParse {
        /// The offending bound as written.
        token: String,
        /// Why conversion failed.
        reason: String,
    },
}

/// A compiled range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangePredicate<T> {
    /// `a`
    Exact(T),
    /// `a..`
    AtLeast(T),
    /// `..b`
    AtMost(T),
    /// `a..b`, with `a <= b`.
    Between(T, T),
}

impl<T: PartialOrd> RangePredicate<T> {
    /// Whether `value` is selected by this range.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Exact(exact) => value == exact,
            Self::AtLeast(lower) => value >= lower,
            Self::AtMost(upper) => value <= upper,
            Self::Between(lower, upper) => lower <= value && value <= upper,
        }
    }

    /// Turn the range into a plain predicate closure.
    pub fn into_fn(self) -> impl Fn(&T) -> bool {
        move |value: &T| self.matches(value)
    }
}

/// Compile `spec` into a [`RangePredicate`], converting bounds with
/// `convert`.
///
/// # Errors
///
/// - [`RangeError::EmptyRange`] for `".."`.
/// - [`RangeError::MalformedRange`] if `..` appears more than once.
/// - [`RangeError::InvertedBounds`] for `a..b` with `a > b`.
/// - [`RangeError::ValueParse`] if `convert` rejects a bound.
pub fn compile_range<T, E, F>(spec: &str, convert: F) -> Result<RangePredicate<T>, RangeError>
where
    T: PartialOrd,
    E: Display,
    F: Fn(&str) -> Result<T, E>,
{
    if spec == SEPARATOR {
        return Err(RangeError::EmptyRange);
    }

    let bound = |token: &str| {
        convert(token).map_err(|e| RangeError::ValueParse {
            token: token.to_owned(),
            reason: e.to_string(),
        })
    };

    let mut tokens = spec.split(SEPARATOR);
    let first = tokens.next().unwrap_or_default();
    let Some(second) = tokens.next() else {
        return Ok(RangePredicate::Exact(bound(first)?));
    };
    if tokens.next().is_some() {
        return Err(RangeError::MalformedRange(spec.to_owned()));
    }

    match (first.is_empty(), second.is_empty()) {
        (_, true) => Ok(RangePredicate::AtLeast(bound(first)?)),
        (true, false) => Ok(RangePredicate::AtMost(bound(second)?)),
        (false, false) => {
            let lower = bound(first)?;
            let upper = bound(second)?;
            if lower > upper {
                return Err(RangeError::InvertedBounds {
                    lower: first.to_owned(),
                    upper: second.to_owned(),
                });
            }
            Ok(RangePredicate::Between(lower, upper))
        }
    }
}

/// Compile `spec` with integer bounds.
pub fn compile_int_range(spec: &str) -> Result<RangePredicate<i64>, RangeError> {
    spec.parse()
}

impl<T> FromStr for RangePredicate<T>
where
    T: FromStr + PartialOrd,
    T::Err: Display,
{
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile_range(s, str::parse::<T>)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn int(spec: &str) -> RangePredicate<i64> {
        compile_int_range(spec).unwrap()
    }

    #[test]
    fn exact_value() {
        assert!(int("4").matches(&4));
        assert!(!int("4").matches(&6));
        assert!(!int("4").matches(&2));
    }

    #[test]
    fn upper_bound_only() {
        assert!(int("..4").matches(&2));
        assert!(int("..4").matches(&4));
        assert!(!int("..4").matches(&6));
    }

    #[test]
    fn lower_bound_only() {
        assert!(int("4..").matches(&6));
        assert!(int("4..").matches(&4));
        assert!(!int("4..").matches(&2));
    }

    #[test]
    fn both_bounds_inclusive() {
        let range = int("4..6");
        assert!(!range.matches(&2));
        assert!(range.matches(&4));
        assert!(range.matches(&5));
        assert!(range.matches(&6));
        assert!(!range.matches(&8));
    }

    #[test]
    fn equal_bounds_are_allowed() {
        let range = int("5..5");
        assert!(range.matches(&5));
        assert!(!range.matches(&4));
    }

    #[test]
    fn separator_alone_is_empty() {
        assert_eq!(compile_int_range(".."), Err(RangeError::EmptyRange));
    }

    #[test]
    fn two_separators_are_malformed() {
        assert_eq!(
            compile_int_range("1..2..3"),
            Err(RangeError::MalformedRange(String::from("1..2..3")))
        );
    }

    #[test]
    fn inverted_bounds_rejected() {
        assert_eq!(
            compile_int_range("6..4"),
            Err(RangeError::InvertedBounds {
                lower: String::from("6"),
                upper: String::from("4"),
            })
        );
    }

    #[test]
    fn unparseable_bound_carries_token() {
        let err = compile_int_range("cheese").unwrap_err();
        assert!(matches!(err, RangeError::ValueParse { ref token, .. } if token == "cheese"));

        let err = compile_int_range("3..x").unwrap_err();
        assert!(matches!(err, RangeError::ValueParse { ref token, .. } if token == "x"));
    }

    #[test]
    fn empty_string_is_a_parse_error_for_integers() {
        assert!(matches!(
            compile_int_range(""),
            Err(RangeError::ValueParse { .. })
        ));
    }

    #[test]
    fn string_lower_bound() {
        let range: RangePredicate<String> = "cheese..".parse().unwrap();
        assert!(range.matches(&String::from("cheese")));
        assert!(range.matches(&String::from("crackers")));
        assert!(!range.matches(&String::new()));
    }

    #[test]
    fn custom_converter() {
        let range = compile_range("B..C", |s: &str| {
            s.chars().next().ok_or("empty arena")
        })
        .unwrap();
        assert!(range.matches(&'B'));
        assert!(!range.matches(&'A'));
    }

    #[test]
    fn predicate_is_reusable_as_closure() {
        let check = int("10..20").into_fn();
        let selected: Vec<i64> = (0..30).filter(|n| check(n)).collect();
        assert_eq!(selected.first(), Some(&10));
        assert_eq!(selected.last(), Some(&20));
        assert_eq!(selected.len(), 11);
    }
}

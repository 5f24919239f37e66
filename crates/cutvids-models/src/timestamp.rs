//! Timestamp parsing for task files.
//!
//! Supports `SS`, `MM:SS` and `HH:MM:SS` with non-negative integer fields,
//! plus `-` for "unspecified". There are no fractional seconds.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{TaskParseError, TaskParseResult};

/// Token that stands for "no trim point".
pub const UNSPECIFIED: &str = "-";

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:(?P<hours>[0-9]+):)?(?P<minutes>[0-9]+):)?(?P<secs>[0-9]+)$")
        .expect("timestamp pattern is valid")
});

/// Parse a timestamp token into seconds.
///
/// Returns `Ok(None)` for [`UNSPECIFIED`].
///
/// # Examples
/// ```
/// use cutvids_models::timestamp::parse_seconds;
/// assert_eq!(parse_seconds("-").unwrap(), None);
/// assert_eq!(parse_seconds("123").unwrap(), Some(123));
/// assert_eq!(parse_seconds("1:01:40").unwrap(), Some(3700));
/// ```
pub fn parse_seconds(token: &str) -> TaskParseResult<Option<u64>> {
    if token == UNSPECIFIED {
        return Ok(None);
    }

    let malformed = || TaskParseError::MalformedTime(token.to_string());
    let caps = TIMESTAMP.captures(token).ok_or_else(malformed)?;

    let field = |name: &str| -> TaskParseResult<u64> {
        match caps.name(name) {
            Some(m) => m.as_str().parse::<u64>().map_err(|_| malformed()),
            None => Ok(0),
        }
    };

    let hours = field("hours")?;
    let minutes = field("minutes")?;
    let secs = field("secs")?;

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(secs))
        .map(Some)
        .ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unspecified() {
        assert_eq!(parse_seconds("-").unwrap(), None);
    }

    #[test]
    fn test_parse_plain_seconds() {
        assert_eq!(parse_seconds("123").unwrap(), Some(123));
        assert_eq!(parse_seconds("0").unwrap(), Some(0));
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!(parse_seconds("5:30").unwrap(), Some(330));
        assert_eq!(parse_seconds("1:1:40").unwrap(), Some(3700));
        assert_eq!(parse_seconds("1:01:40").unwrap(), Some(3700));
        // Fields are not range-checked, like the shell tools that write these files.
        assert_eq!(parse_seconds("90:00").unwrap(), Some(5400));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["1:2:3:4", "", "abc", "12.5", "-5", "1:", ":30", " 10", "--"] {
            assert!(
                matches!(parse_seconds(bad), Err(TaskParseError::MalformedTime(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_overflow_is_malformed() {
        let huge = "99999999999999999999";
        assert!(matches!(parse_seconds(huge), Err(TaskParseError::MalformedTime(_))));
        let huge_hours = format!("{}:00:00", u64::MAX / 1000);
        assert!(parse_seconds(&huge_hours).is_err());
    }
}

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

/// Returns whether `format` is a valid `chrono` format string.
pub fn is_valid_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Formats a post date for display.
///
/// Dates that fail to parse, or that can't be written with `format`, are
/// returned unchanged.
pub fn format_date(date: &str, format: &str, timezone: Tz) -> String {
    let parsed = if date.contains('T') {
        DateTime::parse_from_rfc3339(date)
            .ok()
            .map(|date| date.with_timezone(&timezone))
    } else {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .and_then(|date| date.and_local_timezone(timezone).earliest())
    };

    let Some(parsed) = parsed else {
        return date.to_string();
    };

    let mut formatted = String::new();
    match write!(formatted, "{}", parsed.format(format)) {
        Ok(()) => formatted,
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date("2025-12-24", "%b %-d, %Y", Tz::UTC),
            "Dec 24, 2025"
        );
        assert_eq!(
            format_date("2025-12-24", "%Y년 %-m월 %-d일", Tz::Asia__Seoul),
            "2025년 12월 24일"
        );
    }

    #[test]
    fn test_format_rfc3339_date() {
        assert_eq!(
            format_date("2024-01-01T03:00:00Z", "%Y-%m-%d %H:%M", Tz::Asia__Seoul),
            "2024-01-01 12:00"
        );
    }

    #[test]
    fn test_invalid_format_keeps_the_date() {
        assert!(!is_valid_format("%Q"));
        assert!(is_valid_format("%b %-d, %Y"));
        assert_eq!(format_date("2024-01-01", "%Q", Tz::UTC), "2024-01-01");
    }

    #[test]
    fn test_unparseable_date_is_kept() {
        assert_eq!(format_date("someday", "%Y", Tz::UTC), "someday");
        assert_eq!(format_date("", "%Y", Tz::UTC), "");
    }
}

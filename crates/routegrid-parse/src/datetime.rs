use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc,
    offset::LocalResult,
};
use chrono_tz::Tz;

use crate::error::TimeError;

/// Output format for anchored timestamps: ISO-8601 with numeric offset.
pub const ISO_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Accepted absolute timestamp formats, first successful parse wins.
const UTC_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

/// Largest day offset the relative grammar accepts.
pub const MAX_RELATIVE_DAYS: i64 = 100;

/// A parsed relative time: clock time plus a whole-day calendar offset.
///
/// Day offsets are kept as calendar days (not 86400-second blocks) so
/// anchoring stays correct across DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeTime {
    pub time: NaiveTime,
    pub days: i64,
}

/// Parse an absolute ISO-8601-like timestamp (`Z` suffix or numeric
/// offset, with or without fractional seconds).
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    let text = text.trim();
    for format in UTC_FORMATS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    Err(TimeError::InvalidTimestamp {
        value: text.to_string(),
    })
}

/// Parse a plan date: a plain calendar date, or the date part of an
/// accepted absolute timestamp.
pub fn parse_plan_date(text: &str) -> Result<NaiveDate, TimeError> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_timestamp(text)
        .map(|ts| ts.date_naive())
        .map_err(|_| TimeError::InvalidDate {
            value: text.to_string(),
        })
}

/// Parse the relative time grammar: `HH:mm` or `HH:mm:ss`, optionally
/// followed by exactly one `+Nd` / `-Nd` day-offset group
/// (case-insensitive `d`, `N` a non-negative integer of at most
/// [`MAX_RELATIVE_DAYS`]).
pub fn parse_relative_time(text: &str) -> Result<RelativeTime, TimeError> {
    let trimmed = text.trim();

    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M:%S") {
        return Ok(RelativeTime { time, days: 0 });
    }
    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
        return Ok(RelativeTime { time, days: 0 });
    }

    // Recursive descent over the day-offset suffix: peel exactly one
    // sign group, validate the `d` terminal, recurse on the head.
    let invalid = || TimeError::InvalidRelativeTime {
        value: text.to_string(),
    };

    let mut signs = trimmed.match_indices(['+', '-']);
    let (sign_at, sign) = signs.next().ok_or_else(invalid)?;
    if signs.next().is_some() {
        return Err(invalid());
    }

    let head = trimmed[..sign_at].trim_end();
    let suffix = &trimmed[sign_at + 1..];
    let digits = suffix
        .strip_suffix(['d', 'D'])
        .ok_or_else(invalid)?
        .trim();
    let days: i64 = digits.parse().map_err(|_| invalid())?;
    if days > MAX_RELATIVE_DAYS {
        return Err(TimeError::RelativeDayOffsetTooLarge { days });
    }

    let base = parse_relative_time(head)?;
    let days = if sign == "-" { -days } else { days };
    Ok(RelativeTime {
        time: base.time,
        days: base.days + days,
    })
}

/// Relative time as a flat duration offset from local midnight.
pub fn time_to_duration(text: &str) -> Result<Duration, TimeError> {
    let rel = parse_relative_time(text)?;
    Ok(Duration::days(rel.days)
        + Duration::seconds(i64::from(rel.time.num_seconds_from_midnight())))
}

/// Resolve a timezone name against the IANA database.
pub fn resolve_zone(zone: &str) -> Result<Tz, TimeError> {
    zone.parse().map_err(|_| TimeError::UnknownTimezone {
        zone: zone.to_string(),
    })
}

/// Anchor a relative time to the plan date in the given zone.
pub fn anchor(rel: RelativeTime, plan_date: NaiveDate, zone: Tz) -> Result<DateTime<Tz>, TimeError> {
    let day = plan_date
        .checked_add_signed(Duration::days(rel.days))
        .ok_or_else(|| TimeError::InvalidDate {
            value: plan_date.to_string(),
        })?;
    let local = day.and_time(rel.time);
    match zone.from_local_datetime(&local) {
        LocalResult::Single(ts) => Ok(ts),
        // fall-back transition: take the earlier offset
        LocalResult::Ambiguous(earlier, _) => Ok(earlier),
        LocalResult::None => Err(TimeError::NonexistentLocalTime {
            value: local.to_string(),
            zone: zone.to_string(),
        }),
    }
}

/// Anchor a relative time string and format it as an absolute ISO-8601
/// timestamp with numeric offset.
pub fn time_to_timestamp(time: &str, plan_date: &str, zone: &str) -> Result<String, TimeError> {
    let zone = resolve_zone(zone)?;
    let date = parse_plan_date(plan_date)?;
    let rel = parse_relative_time(time)?;
    Ok(anchor(rel, date, zone)?.format(ISO_OFFSET_FORMAT).to_string())
}

/// Non-throwing variant for cell-level diagnostics: on failure, returns
/// the original text together with the error message.
pub fn time_to_timestamp_checked(
    time: &str,
    plan_date: &str,
    zone: &str,
) -> (String, Option<String>) {
    match time_to_timestamp(time, plan_date, zone) {
        Ok(ts) => (ts, None),
        Err(err) => (time.to_string(), Some(err.to_string())),
    }
}

/// Reverse anchoring: format an absolute timestamp as a relative time
/// string against the plan date, in the given zone. Seconds are written
/// only when non-zero; the day-offset group only when the local
/// calendar day differs from the plan date.
pub fn timestamp_to_time(ts: &str, plan_date: &str, zone: &str) -> Result<String, TimeError> {
    let zone = resolve_zone(zone)?;
    let date = parse_plan_date(plan_date)?;
    let local = parse_timestamp(ts)?.with_timezone(&zone);

    let mut out = if local.time().second() != 0 {
        local.format("%H:%M:%S").to_string()
    } else {
        local.format("%H:%M").to_string()
    };

    let days = (local.date_naive() - date).num_days();
    if days != 0 {
        let sign = if days > 0 { "+" } else { "" };
        out.push_str(&format!(" {sign}{days}d"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ_LISBON: &str = "Europe/Lisbon";
    const TZ_MOSCOW: &str = "Europe/Moscow";
    const DATE_LISBON_GMT_0: &str = "2018-02-01";
    const DATE_LISBON_GMT_1: &str = "2018-06-01";

    #[test]
    fn relative_times_anchor_in_the_target_zone() {
        assert_eq!(
            time_to_timestamp("11:00 -1d", DATE_LISBON_GMT_0, TZ_MOSCOW).unwrap(),
            "2018-01-31T11:00:00+03:00"
        );
        assert_eq!(
            time_to_timestamp("11:00 -1d", DATE_LISBON_GMT_0, TZ_LISBON).unwrap(),
            "2018-01-31T11:00:00+00:00"
        );
        // summer offset
        assert_eq!(
            time_to_timestamp("11:00 -1d", DATE_LISBON_GMT_1, TZ_LISBON).unwrap(),
            "2018-05-31T11:00:00+01:00"
        );
    }

    #[test]
    fn timestamps_reverse_into_relative_times() {
        assert_eq!(
            timestamp_to_time("2018-02-02T14:00:00.000+03:00", DATE_LISBON_GMT_0, TZ_LISBON)
                .unwrap(),
            "11:00 +1d"
        );
        assert_eq!(
            timestamp_to_time("2018-02-01T14:00:00.000+03:00", DATE_LISBON_GMT_0, TZ_LISBON)
                .unwrap(),
            "11:00"
        );
        assert_eq!(
            timestamp_to_time("2018-01-31T14:00:10.000+03:00", DATE_LISBON_GMT_0, TZ_LISBON)
                .unwrap(),
            "11:00:10 -1d"
        );
    }

    #[test]
    fn clock_grammar_accepts_optional_seconds() {
        let rel = parse_relative_time("08:30").unwrap();
        assert_eq!((rel.days, rel.time.to_string().as_str()), (0, "08:30:00"));

        let rel = parse_relative_time("08:30:45 +2d").unwrap();
        assert_eq!((rel.days, rel.time.to_string().as_str()), (2, "08:30:45"));

        let rel = parse_relative_time("23:59 -3D").unwrap();
        assert_eq!(rel.days, -3);
    }

    #[test]
    fn day_offset_bound_is_inclusive() {
        assert!(parse_relative_time("11:00 +100d").is_ok());
        let err = parse_relative_time("11:00 +101d").unwrap_err();
        assert!(matches!(
            err,
            TimeError::RelativeDayOffsetTooLarge { days: 101 }
        ));
    }

    #[test]
    fn malformed_suffixes_are_rejected() {
        for bad in ["11:00 +1", "11:00 +1w", "11:00 +1d -2d", "26:00", "noon", ""] {
            assert!(
                matches!(
                    parse_relative_time(bad),
                    Err(TimeError::InvalidRelativeTime { .. })
                ),
                "expected rejection of `{bad}`"
            );
        }
    }

    #[test]
    fn absolute_formats_parse_in_declared_order() {
        assert!(parse_timestamp("2018-02-01T10:00:00Z").is_ok());
        assert!(parse_timestamp("2018-02-01T10:00:00.500Z").is_ok());
        assert!(parse_timestamp("2018-02-01T10:00:00+03:00").is_ok());
        assert!(parse_timestamp("2018-02-01T10:00:00.250+03:00").is_ok());
        assert!(parse_timestamp("01/02/2018").is_err());
    }

    #[test]
    fn checked_anchoring_keeps_the_original_on_failure() {
        let (value, error) = time_to_timestamp_checked("nope", DATE_LISBON_GMT_0, TZ_LISBON);
        assert_eq!(value, "nope");
        assert!(error.is_some());

        let (value, error) = time_to_timestamp_checked("11:00", DATE_LISBON_GMT_0, TZ_LISBON);
        assert_eq!(value, "2018-02-01T11:00:00+00:00");
        assert!(error.is_none());
    }
}

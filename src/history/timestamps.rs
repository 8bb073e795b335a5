use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "Europe/London";

/// Stamp for the seed commit and for collections an archive did not touch.
const EPOCH_SENTINEL: (i32, u32, u32, u32, u32, u32) = (1998, 12, 17, 22, 33, 36);

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|err| anyhow!("invalid timezone `{name}`: {err}"))
}

/// Attach `tz` to a wall-clock time recorded without zone information.
///
/// Ambiguous times (clocks going back) resolve to standard time, the later
/// of the two instants. Times inside a spring-forward gap move one hour on.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => Ok(at),
        LocalResult::Ambiguous(_, standard) => Ok(standard),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .latest()
            .ok_or_else(|| anyhow!("local time {naive} does not exist in {tz}")),
    }
}

fn naive(parts: (i32, u32, u32, u32, u32, u32)) -> Result<NaiveDateTime> {
    let (year, month, day, hour, minute, second) = parts;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| anyhow!("invalid date/time {parts:?}"))
}

pub fn epoch_sentinel(tz: Tz) -> Result<DateTime<Tz>> {
    localize(tz, naive(EPOCH_SENTINEL)?)
}

/// Convert a zip entry's DOS timestamp.
///
/// `None` when the entry carries no stamp or one that is not a real calendar
/// date; the caller decides what to substitute and reports it.
pub fn from_zip(tz: Tz, stamp: Option<zip::DateTime>) -> Result<Option<DateTime<Tz>>> {
    let Some(stamp) = stamp else {
        return Ok(None);
    };
    let parts = (
        i32::from(stamp.year()),
        u32::from(stamp.month()),
        u32::from(stamp.day()),
        u32::from(stamp.hour()),
        u32::from(stamp.minute()),
        u32::from(stamp.second()),
    );
    match naive(parts) {
        Ok(at) => localize(tz, at).map(Some),
        Err(_) => Ok(None),
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS` as wall-clock time in `tz`.
pub fn parse_local(tz: Tz, raw: &str) -> Result<DateTime<Tz>> {
    let at = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|err| anyhow!("invalid local timestamp `{raw}`: {err}"))?;
    localize(tz, at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn london() -> Tz {
        parse_timezone(DEFAULT_TIMEZONE).expect("london")
    }

    #[test]
    fn sentinel_is_winter_time() {
        let at = epoch_sentinel(london()).expect("sentinel");
        assert_eq!(at.to_rfc3339(), "1998-12-17T22:33:36+00:00");
    }

    #[test]
    fn summer_time_carries_offset() {
        let at = parse_local(london(), "2003-07-01T12:00:00").expect("parse");
        assert_eq!(at.to_rfc3339(), "2003-07-01T12:00:00+01:00");
    }

    #[test]
    fn ambiguous_time_prefers_standard_time() {
        let at = parse_local(london(), "2010-10-31T01:30:00").expect("parse");
        assert_eq!(at.to_rfc3339(), "2010-10-31T01:30:00+00:00");
    }

    #[test]
    fn gap_time_moves_forward() {
        let at = parse_local(london(), "2010-03-28T01:30:00").expect("parse");
        assert_eq!(at.to_rfc3339(), "2010-03-28T02:30:00+01:00");
    }

    #[test]
    fn zip_stamp_converts_in_zone() {
        let stamp = zip::DateTime::from_date_and_time(2001, 6, 2, 9, 15, 30).expect("stamp");
        let at = from_zip(london(), Some(stamp))
            .expect("convert")
            .expect("dated");
        assert_eq!(at.to_rfc3339(), "2001-06-02T09:15:30+01:00");
    }

    #[test]
    fn missing_zip_stamp_is_reported_as_undated() {
        assert_eq!(from_zip(london(), None).expect("convert"), None);
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}

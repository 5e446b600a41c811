use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid time range: start must be before end")]
pub struct InvalidTimeRange;

/// Half-open interval [start, end). `start < end` always holds; the only
/// way to construct one is through `new`, and deserialization goes through
/// the same check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange", into = "RawTimeRange")]
pub struct TimeRange {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawTimeRange {
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end: OffsetDateTime,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = InvalidTimeRange;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl From<TimeRange> for RawTimeRange {
    fn from(range: TimeRange) -> Self {
        RawTimeRange {
            start: range.start,
            end: range.end,
        }
    }
}

impl TimeRange {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, InvalidTimeRange> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidTimeRange)
        }
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Half-open intersection; touching endpoints do not count as overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// "1h" for whole hours, otherwise total minutes ("90m").
    pub fn duration_string(&self) -> String {
        let minutes = self.duration().whole_minutes();
        if minutes % 60 == 0 {
            format!("{}h", minutes / 60)
        } else {
            format!("{minutes}m")
        }
    }

    #[allow(unused)]
    pub fn short_time_string(&self) -> String {
        format_short_time(self.start)
    }

    #[allow(unused)]
    pub fn time_range_string(&self) -> String {
        format!(
            "{} - {}",
            format_short_time(self.start),
            format_short_time(self.end)
        )
    }
}

fn format_short_time(t: OffsetDateTime) -> String {
    let hour = t.hour();
    let period = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour12, t.minute(), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn at(ms: i64) -> OffsetDateTime {
        datetime!(2026-03-01 00:00 UTC) + Duration::milliseconds(ms)
    }

    fn range(start_ms: i64, end_ms: i64) -> TimeRange {
        TimeRange::new(at(start_ms), at(end_ms)).unwrap()
    }

    #[test]
    fn construction_rejects_unordered_endpoints() {
        assert_eq!(TimeRange::new(at(1000), at(1000)), Err(InvalidTimeRange));
        assert_eq!(TimeRange::new(at(2000), at(1000)), Err(InvalidTimeRange));
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (range(0, 1000), range(500, 1500)),
            (range(0, 1000), range(1000, 2000)),
            (range(0, 1000), range(2500, 3500)),
            (range(0, 5000), range(1000, 2000)),
        ];
        for (a, b) in cases {
            assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }

    #[test]
    fn range_overlaps_itself() {
        let a = range(1000, 2000);
        assert!(a.overlaps(&a));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        assert!(!range(0, 1000).overlaps(&range(1000, 2000)));
    }

    #[test]
    fn partially_overlapping_ranges_overlap() {
        assert!(range(1000, 2000).overlaps(&range(1500, 2500)));
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        assert!(!range(1000, 2000).overlaps(&range(2500, 3500)));
    }

    #[test]
    fn contained_range_overlaps() {
        assert!(range(0, 5000).overlaps(&range(1000, 2000)));
    }

    #[test]
    fn duration_string_renders_whole_hours() {
        let one_hour = TimeRange::new(
            datetime!(2026-03-01 10:00 UTC),
            datetime!(2026-03-01 11:00 UTC),
        )
        .unwrap();
        assert_eq!(one_hour.duration_string(), "1h");
    }

    #[test]
    fn duration_string_renders_partial_hours_as_minutes() {
        let ninety = TimeRange::new(
            datetime!(2026-03-01 10:00 UTC),
            datetime!(2026-03-01 11:30 UTC),
        )
        .unwrap();
        assert_eq!(ninety.duration_string(), "90m");
    }

    #[test]
    fn time_strings_use_twelve_hour_clock() {
        let afternoon = TimeRange::new(
            datetime!(2026-03-01 15:00 UTC),
            datetime!(2026-03-01 16:30 UTC),
        )
        .unwrap();
        assert_eq!(afternoon.short_time_string(), "3:00 PM");
        assert_eq!(afternoon.time_range_string(), "3:00 PM - 4:30 PM");

        let midnight = TimeRange::new(
            datetime!(2026-03-01 00:05 UTC),
            datetime!(2026-03-01 01:00 UTC),
        )
        .unwrap();
        assert_eq!(midnight.short_time_string(), "12:05 AM");
    }

    #[test]
    fn deserialization_validates_ordering() {
        let bad = r#"{"start":"2026-03-01T12:00:00Z","end":"2026-03-01T11:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeRange>(bad).is_err());

        let good = r#"{"start":"2026-03-01T11:00:00Z","end":"2026-03-01T12:00:00Z"}"#;
        let parsed: TimeRange = serde_json::from_str(good).unwrap();
        assert_eq!(parsed.duration_string(), "1h");
    }
}

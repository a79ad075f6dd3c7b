//! Period values: period types, fact periods and the period-format grammar.
//!
//! Timestamps follow the XBRL convention that a bare end date means the end
//! of that day, i.e. midnight at the start of the following day.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::qname::PeriodAnchor;

static PERIOD_FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})(Y|H[12]|Q[1-4]|M(?:0[1-9]|1[0-2])|-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01]))(?:@(start|end))?$",
    )
    .expect("period format pattern is a valid regex")
});

/// The kind of period a concept or constraint requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Instant,
    Duration,
    None,
}

impl PeriodType {
    /// The lexical values accepted by `periodType` properties.
    pub const VALUES: &'static [&'static str] = &["instant", "duration", "none"];

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "instant" => Some(PeriodType::Instant),
            "duration" => Some(PeriodType::Duration),
            "none" => Some(PeriodType::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Instant => "instant",
            PeriodType::Duration => "duration",
            PeriodType::None => "none",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Midnight at the start of the day after `date`.
pub fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.succ_opt().map(start_of_day)
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Parses an `xs:gMonthDay` of the form `--MM-DD` into `(month, day)`.
pub fn parse_month_day(text: &str) -> Option<(u32, u32)> {
    let rest = text.strip_prefix("--")?;
    let (month, day) = rest.split_once('-')?;
    if month.len() != 2 || day.len() != 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    // 2000 is a leap year so --02-29 is accepted.
    NaiveDate::from_ymd_opt(2000, month, day).map(|_| (month, day))
}

/// Parses one side of a period: a full timestamp is taken as-is, a bare
/// date is widened to the start or end of that day.
pub fn parse_boundary(text: &str, anchor: PeriodAnchor) -> Option<NaiveDateTime> {
    if let Some(at) = parse_date_time(text) {
        return Some(at);
    }
    let date = parse_date(text)?;
    match anchor {
        PeriodAnchor::Start => Some(start_of_day(date)),
        PeriodAnchor::End => end_of_day(date),
    }
}

/// The period aspect of a fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactPeriod {
    Instant(NaiveDateTime),
    Duration {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl FactPeriod {
    /// Parses `instant` or `start/end`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.split_once('/') {
            Some((start, end)) => {
                let start = parse_boundary(start, PeriodAnchor::Start)?;
                let end = parse_boundary(end, PeriodAnchor::End)?;
                if end < start {
                    return None;
                }
                Some(FactPeriod::Duration { start, end })
            }
            None => parse_boundary(text, PeriodAnchor::End).map(FactPeriod::Instant),
        }
    }

    pub fn period_type(&self) -> PeriodType {
        match self {
            FactPeriod::Instant(_) => PeriodType::Instant,
            FactPeriod::Duration { .. } => PeriodType::Duration,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        match self {
            FactPeriod::Instant(at) => *at,
            FactPeriod::Duration { start, .. } => *start,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        match self {
            FactPeriod::Instant(at) => *at,
            FactPeriod::Duration { end, .. } => *end,
        }
    }

    pub fn boundary(&self, anchor: PeriodAnchor) -> NaiveDateTime {
        match anchor {
            PeriodAnchor::Start => self.start(),
            PeriodAnchor::End => self.end(),
        }
    }

    /// The last calendar day covered by the period.
    pub fn last_day(&self) -> NaiveDate {
        let end = self.end();
        if end.time() == NaiveTime::MIN {
            end.date().pred_opt().unwrap_or(end.date())
        } else {
            end.date()
        }
    }
}

/// Errors from [`PeriodFormat::parse`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PeriodFormatError {
    #[error("'{0}' does not match the period format grammar")]
    Syntax(String),

    #[error("'{0}' names a day that does not exist")]
    InvalidDate(String),
}

/// The calendar unit a period format names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodPart {
    Year,
    Half(u32),
    Quarter(u32),
    Month(u32),
    Day { month: u32, day: u32 },
}

/// A parsed period format such as `2023Y`, `2023Q2`, `2023M06` or
/// `2023-12-31@end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodFormat {
    year: i32,
    part: PeriodPart,
    anchor: Option<PeriodAnchor>,
}

impl PeriodFormat {
    pub fn parse(text: &str) -> Result<Self, PeriodFormatError> {
        let caps = PERIOD_FORMAT_RE
            .captures(text)
            .ok_or_else(|| PeriodFormatError::Syntax(text.to_string()))?;
        let syntax = || PeriodFormatError::Syntax(text.to_string());

        let year: i32 = caps[1].parse().map_err(|_| syntax())?;
        let unit = &caps[2];
        let digits = |s: &str| s.parse::<u32>().map_err(|_| syntax());
        let part = match unit.as_bytes().first() {
            Some(b'Y') => PeriodPart::Year,
            Some(b'H') => PeriodPart::Half(digits(&unit[1..])?),
            Some(b'Q') => PeriodPart::Quarter(digits(&unit[1..])?),
            Some(b'M') => PeriodPart::Month(digits(&unit[1..])?),
            Some(b'-') => {
                let month = digits(&unit[1..3])?;
                let day = digits(&unit[4..6])?;
                if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                    return Err(PeriodFormatError::InvalidDate(text.to_string()));
                }
                PeriodPart::Day { month, day }
            }
            _ => return Err(syntax()),
        };
        let anchor = caps.get(3).and_then(|m| PeriodAnchor::parse(m.as_str()));

        Ok(Self { year, part, anchor })
    }

    pub fn anchor(&self) -> Option<PeriodAnchor> {
        self.anchor
    }

    pub fn part(&self) -> PeriodPart {
        self.part
    }

    /// The `[start, end)` range the format denotes.
    pub fn range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let (first_month, months) = match self.part {
            PeriodPart::Year => (1, 12),
            PeriodPart::Half(h) => (1 + 6 * (h - 1), 6),
            PeriodPart::Quarter(q) => (1 + 3 * (q - 1), 3),
            PeriodPart::Month(m) => (m, 1),
            PeriodPart::Day { month, day } => {
                let date = NaiveDate::from_ymd_opt(self.year, month, day)?;
                let next = date.checked_add_days(Days::new(1))?;
                return Some((start_of_day(date), start_of_day(next)));
            }
        };
        let start = NaiveDate::from_ymd_opt(self.year, first_month, 1)?;
        let end = start.checked_add_months(Months::new(months))?;
        Some((start_of_day(start), start_of_day(end)))
    }

    /// Whether a fact period is exactly the period this format names.
    ///
    /// An anchored format names a single instant; an unanchored one names a
    /// duration, or its end instant when matched against an instant fact.
    pub fn matches(&self, period: &FactPeriod) -> bool {
        let Some((start, end)) = self.range() else {
            return false;
        };
        match (self.anchor, period) {
            (Some(PeriodAnchor::Start), FactPeriod::Instant(at)) => *at == start,
            (Some(PeriodAnchor::End), FactPeriod::Instant(at)) => *at == end,
            (Some(_), FactPeriod::Duration { .. }) => false,
            (None, FactPeriod::Duration { start: s, end: e }) => *s == start && *e == end,
            (None, FactPeriod::Instant(at)) => *at == end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        start_of_day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_fact_period_parse_duration() {
        let p = FactPeriod::parse("2023-01-01T00:00:00/2024-01-01T00:00:00").unwrap();
        assert_eq!(p.period_type(), PeriodType::Duration);
        assert_eq!(p.start(), midnight(2023, 1, 1));
        assert_eq!(p.end(), midnight(2024, 1, 1));
        assert_eq!(p.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_fact_period_bare_dates_widen() {
        let p = FactPeriod::parse("2023-01-01/2023-12-31").unwrap();
        assert_eq!(p.start(), midnight(2023, 1, 1));
        assert_eq!(p.end(), midnight(2024, 1, 1));

        let instant = FactPeriod::parse("2023-12-31").unwrap();
        assert_eq!(instant, FactPeriod::Instant(midnight(2024, 1, 1)));
    }

    #[test]
    fn test_fact_period_rejects_inverted_and_garbage() {
        assert!(FactPeriod::parse("2024-01-01/2023-01-01").is_none());
        assert!(FactPeriod::parse("yesterday").is_none());
    }

    #[test]
    fn test_period_format_ranges() {
        let q2 = PeriodFormat::parse("2023Q2").unwrap();
        assert_eq!(q2.range(), Some((midnight(2023, 4, 1), midnight(2023, 7, 1))));

        let h2 = PeriodFormat::parse("2023H2").unwrap();
        assert_eq!(h2.range(), Some((midnight(2023, 7, 1), midnight(2024, 1, 1))));

        let m12 = PeriodFormat::parse("2023M12").unwrap();
        assert_eq!(m12.range(), Some((midnight(2023, 12, 1), midnight(2024, 1, 1))));
    }

    #[test]
    fn test_period_format_anchor() {
        let f = PeriodFormat::parse("2023-12-31@end").unwrap();
        assert_eq!(f.anchor(), Some(PeriodAnchor::End));
        assert!(f.matches(&FactPeriod::Instant(midnight(2024, 1, 1))));
        assert!(!f.matches(&FactPeriod::Duration {
            start: midnight(2023, 12, 31),
            end: midnight(2024, 1, 1)
        }));

        let start = PeriodFormat::parse("2023Y@start").unwrap();
        assert!(start.matches(&FactPeriod::Instant(midnight(2023, 1, 1))));
    }

    #[test]
    fn test_period_format_year_matches_duration() {
        let y = PeriodFormat::parse("2023Y").unwrap();
        let fy = FactPeriod::parse("2023-01-01T00:00:00/2024-01-01T00:00:00").unwrap();
        assert!(y.matches(&fy));
        let q = FactPeriod::parse("2023-01-01T00:00:00/2023-04-01T00:00:00").unwrap();
        assert!(!y.matches(&q));
    }

    #[test]
    fn test_period_format_errors() {
        assert!(matches!(
            PeriodFormat::parse("2023Q5"),
            Err(PeriodFormatError::Syntax(_))
        ));
        assert!(matches!(
            PeriodFormat::parse("2023-02-30"),
            Err(PeriodFormatError::InvalidDate(_))
        ));
        assert!(matches!(
            PeriodFormat::parse("2023Y@middle"),
            Err(PeriodFormatError::Syntax(_))
        ));
    }

    #[test]
    fn test_month_day() {
        assert_eq!(parse_month_day("--12-31"), Some((12, 31)));
        assert_eq!(parse_month_day("--02-29"), Some((2, 29)));
        assert_eq!(parse_month_day("--13-01"), None);
        assert_eq!(parse_month_day("12-31"), None);
    }
}

//! `xs:duration` values.
//!
//! Year/month components cannot be expressed as a fixed number of seconds,
//! so durations keep months and days apart and are applied with calendar
//! arithmetic.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;
use serde::{Serialize, Serializer};

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d+))?S)?)?$",
    )
    .expect("duration pattern is a valid regex")
});

/// A parsed `xs:duration` such as `P1Y`, `P3M`, `-P1D` or `PT12H`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XsdDuration {
    negative: bool,
    months: u32,
    days: u32,
    millis: u64,
    lexical: String,
}

impl XsdDuration {
    /// Parses the lexical form; returns `None` for anything that is not a
    /// complete duration (`P`, `PT`, `P1YT` are all rejected).
    pub fn parse(text: &str) -> Option<Self> {
        if text.ends_with('P') || text.ends_with('T') {
            return None;
        }
        let caps = DURATION_RE.captures(text)?;
        let number = |idx: usize| -> Option<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u64>().ok(),
                None => Some(0),
            }
        };

        let years = number(2)?;
        let months = number(3)?;
        let days = number(4)?;
        let hours = number(5)?;
        let minutes = number(6)?;
        let seconds = number(7)?;
        let fraction_millis = caps
            .get(8)
            .map(|m| {
                let digits: String = m.as_str().chars().chain("000".chars()).take(3).collect();
                digits.parse::<u64>().unwrap_or(0)
            })
            .unwrap_or(0);

        let total_months = years.checked_mul(12)?.checked_add(months)?;
        let millis = hours
            .checked_mul(3_600_000)?
            .checked_add(minutes.checked_mul(60_000)?)?
            .checked_add(seconds.checked_mul(1000)?)?
            .checked_add(fraction_millis)?;

        Some(Self {
            negative: caps.get(1).is_some(),
            months: u32::try_from(total_months).ok()?,
            days: u32::try_from(days).ok()?,
            millis,
            lexical: text.to_string(),
        })
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whole months (years folded in).
    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// True when the duration has no length at all.
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.millis == 0
    }

    fn time_delta(&self) -> Option<TimeDelta> {
        let days = TimeDelta::try_days(i64::from(self.days))?;
        let millis = TimeDelta::try_milliseconds(i64::try_from(self.millis).ok()?)?;
        days.checked_add(&millis)
    }

    /// Shifts a timestamp by this duration (months first, then days and time).
    pub fn add_to(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let months = Months::new(self.months);
        let delta = self.time_delta()?;
        if self.negative {
            at.checked_sub_months(months)?.checked_sub_signed(delta)
        } else {
            at.checked_add_months(months)?.checked_add_signed(delta)
        }
    }

    /// Shifts a calendar date; sub-day components are ignored.
    pub fn add_to_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let months = Months::new(self.months);
        let days = chrono::Days::new(u64::from(self.days));
        if self.negative {
            date.checked_sub_months(months)?.checked_sub_days(days)
        } else {
            date.checked_add_months(months)?.checked_add_days(days)
        }
    }
}

impl fmt::Display for XsdDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

impl Serialize for XsdDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.lexical)
    }
}

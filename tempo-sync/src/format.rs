//! Relative-time formatting
//!
//! Turns a signed millisecond delta into an English label such as
//! `"3 hours ago"` or `"in 2 weeks"`, and picks how often such a label needs
//! refreshing. Months and years are fixed nominal durations (30 and 365
//! days), never calendar arithmetic.

use std::fmt;

use crate::types::{DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, SECOND_MS, WEEK_MS, YEAR_MS};

/// Label shown for any delta under one minute, past or future
pub const JUST_NOW: &str = "just now";

/// Calendar-free units a label can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    /// All units, smallest first
    pub const ALL: [Unit; 6] = [
        Unit::Minute,
        Unit::Hour,
        Unit::Day,
        Unit::Week,
        Unit::Month,
        Unit::Year,
    ];

    /// Size of one unit in milliseconds
    pub fn size_ms(self) -> u64 {
        match self {
            Unit::Minute => MINUTE_MS,
            Unit::Hour => HOUR_MS,
            Unit::Day => DAY_MS,
            Unit::Week => WEEK_MS,
            Unit::Month => MONTH_MS,
            Unit::Year => YEAR_MS,
        }
    }

    /// Exclusive upper bound of the magnitudes expressed in this unit
    ///
    /// `None` for the top unit, which is unbounded.
    pub fn upper_bound_ms(self) -> Option<u64> {
        match self {
            Unit::Minute => Some(HOUR_MS),
            Unit::Hour => Some(DAY_MS),
            Unit::Day => Some(WEEK_MS),
            Unit::Week => Some(MONTH_MS),
            Unit::Month => Some(YEAR_MS),
            Unit::Year => None,
        }
    }

    /// Singular English name
    pub fn name(self) -> &'static str {
        match self {
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::Day => "day",
            Unit::Week => "week",
            Unit::Month => "month",
            Unit::Year => "year",
        }
    }

    /// Pick the unit for a magnitude of at least one minute
    pub fn for_magnitude(magnitude_ms: u64) -> Unit {
        Unit::ALL
            .into_iter()
            .find(|unit| unit.upper_bound_ms().map_or(true, |bound| magnitude_ms < bound))
            .unwrap_or(Unit::Year)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a delta relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tense {
    Past,
    Future,
}

/// A delta broken down into the pieces of its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    /// Less than a minute either way
    JustNow,
    /// Whole number of units in the past or future
    Span { count: u64, unit: Unit, tense: Tense },
}

impl RelativeTime {
    /// Break down `delta_ms` (`now - origin`; negative means the origin is ahead)
    pub fn from_delta(delta_ms: i64) -> Self {
        let magnitude = delta_ms.unsigned_abs();
        if magnitude < MINUTE_MS {
            return RelativeTime::JustNow;
        }

        let unit = Unit::for_magnitude(magnitude);
        let tense = if delta_ms < 0 { Tense::Future } else { Tense::Past };
        RelativeTime::Span {
            count: magnitude / unit.size_ms(),
            unit,
            tense,
        }
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RelativeTime::JustNow => f.write_str(JUST_NOW),
            RelativeTime::Span { count, unit, tense } => {
                let plural = if count == 1 { "" } else { "s" };
                match tense {
                    Tense::Past => write!(f, "{count} {unit}{plural} ago"),
                    Tense::Future => write!(f, "in {count} {unit}{plural}"),
                }
            }
        }
    }
}

/// Format a delta (`now - origin`, in milliseconds) as an English label
///
/// # Example
/// ```
/// use tempo_sync::format_relative;
///
/// assert_eq!(format_relative(30_000), "just now");
/// assert_eq!(format_relative(120_000), "2 minutes ago");
/// assert_eq!(format_relative(-3_600_000), "in 1 hour");
/// ```
pub fn format_relative(delta_ms: i64) -> String {
    RelativeTime::from_delta(delta_ms).to_string()
}

/// How often a label of the given age needs re-rendering
///
/// Always one of 1 s, 1 min, 1 h or 1 day.
pub fn refresh_granularity(age_ms: u64) -> u64 {
    if age_ms < MINUTE_MS {
        SECOND_MS
    } else if age_ms < HOUR_MS {
        MINUTE_MS
    } else if age_ms < DAY_MS {
        HOUR_MS
    } else {
        DAY_MS
    }
}

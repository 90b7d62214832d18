//! Time-indexed scalar series and the transforms applied before aggregation.

use crate::error::{Error, Result};
use crate::stats::Accumulator;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Ordered `(timestamp, value)` pairs; `NaN` marks a missing value.
///
/// Timestamps keep source order and are not re-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    times: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(
        name: impl Into<String>,
        times: Vec<NaiveDateTime>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if times.len() != values.len() {
            return Err(Error::invalid(format!(
                "series '{name}' has {} timestamps but {} values",
                times.len(),
                values.len()
            )));
        }
        Ok(Self {
            name,
            times,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of non-missing values.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|val| !val.is_nan()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Copy with every value multiplied by `scale_factor` and every timestamp moved by `offset`.
    pub fn adjusted(&self, scale_factor: f64, offset: LocalOffset) -> Self {
        Self {
            name: self.name.clone(),
            times: self.times.iter().map(|&time| offset.apply(time)).collect(),
            values: self.values.iter().map(|&val| val * scale_factor).collect(),
        }
    }

    /// Average over fixed-width bins aligned to midnight of the earliest day.
    ///
    /// Bins are labelled by their left edge. Every bin between the first and the last
    /// occupied one is emitted; bins without a valid value hold `NaN`.
    pub fn resample(&self, interval: Interval) -> Self {
        let Some(&first) = self.times.iter().min() else {
            return self.clone();
        };
        let origin = first.date().and_time(NaiveTime::MIN);
        let step = interval.as_millis();

        let mut bins: BTreeMap<i64, Accumulator> = BTreeMap::new();
        for (time, val) in self.iter() {
            let i_bin = (time - origin).num_milliseconds().div_euclid(step);
            bins.entry(i_bin).or_default().add(val);
        }

        let (Some(&i_first), Some(&i_last)) = (bins.keys().next(), bins.keys().next_back())
        else {
            return self.clone();
        };

        let (times, values) = (i_first..=i_last)
            .map(|i_bin| {
                let edge = origin + TimeDelta::milliseconds(i_bin * step);
                let mean = bins.get(&i_bin).map_or(f64::NAN, Accumulator::mean);
                (edge, mean)
            })
            .unzip();

        Self {
            name: self.name.clone(),
            times,
            values,
        }
    }
}

/// Whole hours added to UTC timestamps to approximate local time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalOffset(pub i32);

impl LocalOffset {
    pub const UTC: Self = Self(0);

    pub fn hours(self) -> i32 {
        self.0
    }

    pub fn is_utc(self) -> bool {
        self.0 == 0
    }

    pub fn apply(self, time: NaiveDateTime) -> NaiveDateTime {
        time + TimeDelta::hours(i64::from(self.0))
    }
}

/// Resampling bin width, parsed from strings such as `30min`, `2 hours` or `1D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    amount: u32,
    unit: IntervalUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl IntervalUnit {
    fn millis(self) -> i64 {
        match self {
            Self::Second => 1_000,
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Minute => "min",
            Self::Hour => "h",
            Self::Day => "D",
        }
    }
}

impl Interval {
    pub fn minutes(amount: u32) -> Result<Self> {
        Self::new(amount, IntervalUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self> {
        Self::new(amount, IntervalUnit::Hour)
    }

    fn new(amount: u32, unit: IntervalUnit) -> Result<Self> {
        if amount == 0 {
            return Err(Error::invalid("resample interval must be positive"));
        }
        Ok(Self { amount, unit })
    }

    pub fn as_millis(self) -> i64 {
        i64::from(self.amount) * self.unit.millis()
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::milliseconds(self.as_millis())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (amount, unit) = s.split_at(split);
        let amount = if amount.is_empty() {
            1
        } else {
            amount
                .parse()
                .map_err(|_| Error::invalid(format!("invalid resample interval '{s}'")))?
        };
        let unit = match unit.trim() {
            "s" | "S" | "sec" | "secs" | "second" | "seconds" => IntervalUnit::Second,
            "T" | "min" | "mins" | "minute" | "minutes" => IntervalUnit::Minute,
            "h" | "H" | "hr" | "hrs" | "hour" | "hours" => IntervalUnit::Hour,
            "d" | "D" | "day" | "days" => IntervalUnit::Day,
            other => {
                return Err(Error::invalid(format!(
                    "unknown unit '{other}' in resample interval '{s}'"
                )));
            }
        };
        Self::new(amount, unit)
    }
}

impl TryFrom<String> for Interval {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

/// Closed time range, used both as a display window and as a zoom around a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time <= self.end
    }
}

//! Summary statistics, largest values and the time windows around them.

use crate::error::{Error, Result};
use crate::series::{Interval, LocalOffset, TimeSeries, TimeWindow};
use crate::stats::SummaryStats;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PeakOptions {
    pub resample: Option<Interval>,
    /// Number of peaks to keep.
    pub n: usize,
    pub scale_factor: f64,
    pub local_offset: LocalOffset,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            resample: None,
            n: 5,
            scale_factor: 1.0,
            local_offset: LocalOffset::UTC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakReport {
    pub stats: SummaryStats,
    /// Largest first; equal values keep their order in the series.
    pub peaks: Vec<Peak>,
}

impl PeakReport {
    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.peaks.iter().map(|peak| peak.time).collect()
    }

    pub fn windows(&self, hours_before: u32, hours_after: u32) -> Result<Vec<TimeWindow>> {
        peak_windows(&self.times(), hours_before, hours_after)
    }
}

/// Statistics and the `options.n` largest values of the (resampled) series.
///
/// Missing values, including empty bins left by resampling, are ignored.
pub fn extract_peaks(series: &TimeSeries, options: &PeakOptions) -> Result<PeakReport> {
    if options.n == 0 {
        return Err(Error::invalid("number of peaks must be positive"));
    }

    let mut series = series.adjusted(options.scale_factor, options.local_offset);
    if let Some(interval) = options.resample {
        series = series.resample(interval);
    }

    let stats = SummaryStats::from_values(series.values()).ok_or_else(|| {
        Error::invalid(format!("series '{}' has no valid values", series.name()))
    })?;

    let mut valid: Vec<Peak> = series
        .iter()
        .filter(|(_, value)| !value.is_nan())
        .map(|(time, value)| Peak { time, value })
        .collect();
    // Stable sort, so ties (signed zeros included) stay in series order.
    valid.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    valid.truncate(options.n);

    Ok(PeakReport {
        stats,
        peaks: valid,
    })
}

/// One `(t - hours_before, t + hours_after)` window per timestamp, in input order.
///
/// Windows are neither merged nor deduplicated and may overlap. Fails when a window
/// would reach past the representable dates.
pub fn peak_windows(
    times: &[NaiveDateTime],
    hours_before: u32,
    hours_after: u32,
) -> Result<Vec<TimeWindow>> {
    let before = TimeDelta::hours(i64::from(hours_before));
    let after = TimeDelta::hours(i64::from(hours_after));
    times
        .iter()
        .map(|&time| {
            let start = time.checked_sub_signed(before);
            let end = time.checked_add_signed(after);
            match (start, end) {
                (Some(start), Some(end)) => Ok(TimeWindow::new(start, end)),
                _ => Err(Error::invalid(format!(
                    "window of -{hours_before}h/+{hours_after}h around {time} is out of range"
                ))),
            }
        })
        .collect()
}

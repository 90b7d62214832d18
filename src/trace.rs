use crate::render::Rgb;
use crate::series::{LocalOffset, TimeSeries};
use serde::Deserialize;

/// Per-series presentation options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Multiplies every value, e.g. `1e12` to turn mixing ratios into pptv.
    pub scale_factor: f64,
    /// `None` takes the offset of the primary trace, or UTC for the primary itself.
    pub local_offset: Option<LocalOffset>,
    pub label: Option<String>,
    pub color: Option<Rgb>,
    pub ylim: Option<(f64, f64)>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            local_offset: None,
            label: None,
            color: None,
            ylim: None,
        }
    }
}

/// A series together with how to present it.
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    pub series: &'a TimeSeries,
    pub options: TraceOptions,
}

impl<'a> Trace<'a> {
    pub fn new(series: &'a TimeSeries) -> Self {
        Self {
            series,
            options: TraceOptions::default(),
        }
    }

    pub fn with_options(series: &'a TimeSeries, options: TraceOptions) -> Self {
        Self { series, options }
    }

    pub fn offset(&self) -> LocalOffset {
        self.options.local_offset.unwrap_or(LocalOffset::UTC)
    }

    pub fn label(&self) -> &str {
        self.options.label.as_deref().unwrap_or(self.series.name())
    }

    /// Scaled and shifted copy of the series.
    pub fn adjusted(&self, offset: LocalOffset) -> TimeSeries {
        self.series.adjusted(self.options.scale_factor, offset)
    }
}

//! Diurnal cycles, resampled time series and peak windows for NACHTT 2011 campaign
//! observations and chemical-transport-model output.

pub mod config;
pub mod dataset;
pub mod diurnal;
pub mod error;
pub mod manager;
pub mod peaks;
pub mod render;
pub mod series;
pub mod stats;
pub mod timeline;
pub mod trace;

pub use dataset::{Array, Dataset, TableDataset, load_series};
pub use diurnal::{HourlyAggregate, hourly_aggregate, plot_diurnal_variation};
pub use error::{Error, Result};
pub use peaks::{Peak, PeakOptions, PeakReport, extract_peaks, peak_windows};
pub use render::{FigureStyle, Frame, Rendered, Rgb, open_canvases};
pub use series::{Interval, LocalOffset, TimeSeries, TimeWindow};
pub use stats::SummaryStats;
pub use timeline::{TimelineOptions, plot_time_series};
pub use trace::{Trace, TraceOptions};

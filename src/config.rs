use crate::peaks::PeakOptions;
use crate::render::{FigureStyle, Rgb};
use crate::series::{Interval, LocalOffset, TimeWindow};
use crate::timeline::TimelineOptions;
use crate::trace::TraceOptions;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    fs,
    ops::RangeBounds,
    path::{Path, PathBuf},
};

/// Analysis configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Figure geometry and colors.
    #[serde(default)]
    pub style: FigureStyle,

    /// Dataset files by key, relative to the analysis directory.
    pub datasets: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub diurnal: Vec<DiurnalJob>,
    #[serde(default)]
    pub timeseries: Vec<TimeseriesJob>,
    #[serde(default)]
    pub peaks: Vec<PeaksJob>,
}

/// Where a series comes from and how to present it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesSource {
    /// Key into [`Config::datasets`].
    pub dataset: String,
    pub variable: String,
    /// Name of the time coordinate.
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    pub local_offset: Option<LocalOffset>,
    pub label: Option<String>,
    pub color: Option<Rgb>,
    pub ylim: Option<(f64, f64)>,
}

impl SeriesSource {
    pub fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            scale_factor: self.scale_factor,
            local_offset: self.local_offset,
            label: self.label.clone(),
            color: self.color,
            ylim: self.ylim,
        }
    }
}

/// Diurnal cycle figure, optionally with a second series on a right-hand axis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiurnalJob {
    pub output: PathBuf,
    pub primary: SeriesSource,
    pub secondary: Option<SeriesSource>,
}

/// Time-series figure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeseriesJob {
    pub output: PathBuf,
    pub series: SeriesSource,
    pub resample: Option<Interval>,
    pub window: Option<TimeWindow>,
}

impl TimeseriesJob {
    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            resample: self.resample,
            window: self.window,
        }
    }
}

/// Peak extraction with one zoomed figure per peak.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeaksJob {
    /// Prefix of the report and figure file names.
    pub name: String,
    pub output_dir: PathBuf,
    pub series: SeriesSource,
    pub resample: Option<Interval>,
    #[serde(default = "default_n_peaks")]
    pub n: usize,
    #[serde(default = "default_window_hours")]
    pub hours_before: u32,
    #[serde(default = "default_window_hours")]
    pub hours_after: u32,
    /// Image format of the per-peak figures, `png` or `svg`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl PeaksJob {
    pub fn peak_options(&self) -> PeakOptions {
        PeakOptions {
            resample: self.resample,
            n: self.n,
            scale_factor: self.series.scale_factor,
            local_offset: self.series.local_offset.unwrap_or_default(),
        }
    }

    pub fn report_file(&self) -> PathBuf {
        self.output_dir.join(format!("{}-peaks.toml", self.name))
    }

    pub fn figure_file(&self, i_peak: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}-peak-{i_peak:02}.{}", self.name, self.format))
    }

    /// Glob pattern matching every per-peak figure of this job.
    pub fn figure_pattern(&self) -> PathBuf {
        self.output_dir.join(format!("{}-peak-*.{}", self.name, self.format))
    }
}

fn default_time() -> String {
    "time".to_owned()
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_n_peaks() -> usize {
    5
}

fn default_window_hours() -> u32 {
    12
}

fn default_format() -> String {
    "png".to_owned()
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let text = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&text).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.style.dpi, 1..=1200).context("invalid dpi")?;
        check_num(self.style.width_in, 0.5..=50.0).context("invalid figure width")?;
        check_num(self.style.height_in, 0.5..=50.0).context("invalid figure height")?;

        for (i_job, job) in self.diurnal.iter().enumerate() {
            self.check_source(&job.primary)
                .with_context(|| format!("invalid primary series of diurnal job {i_job}"))?;
            if let Some(secondary) = &job.secondary {
                self.check_source(secondary)
                    .with_context(|| format!("invalid secondary series of diurnal job {i_job}"))?;
            }
        }

        for (i_job, job) in self.timeseries.iter().enumerate() {
            self.check_source(&job.series)
                .with_context(|| format!("invalid series of timeseries job {i_job}"))?;
            if let Some(window) = &job.window {
                if window.start > window.end {
                    bail!("window of timeseries job {i_job} ends before it starts");
                }
            }
        }

        let mut names = BTreeSet::new();
        for job in &self.peaks {
            if job.name.is_empty() || !names.insert(job.name.as_str()) {
                bail!("peak job names must be unique and non-empty, got {:?}", job.name);
            }
            self.check_source(&job.series)
                .with_context(|| format!("invalid series of peak job {:?}", job.name))?;
            check_num(job.n, 1..=1000).context("invalid number of peaks")?;
            check_num(job.hours_before, 0..=8784).context("invalid hours before peak")?;
            check_num(job.hours_after, 0..=8784).context("invalid hours after peak")?;
            if !matches!(job.format.as_str(), "png" | "svg") {
                bail!("figure format must be png or svg, but is {:?}", job.format);
            }
        }

        Ok(())
    }

    fn check_source(&self, source: &SeriesSource) -> Result<()> {
        if !self.datasets.contains_key(&source.dataset) {
            bail!("unknown dataset {:?}", source.dataset);
        }
        if !source.scale_factor.is_finite() {
            bail!("scale factor must be finite");
        }
        if let Some((lo, hi)) = source.ylim {
            if !(lo < hi) {
                bail!("y limits must be increasing, but are ({lo}, {hi})");
            }
        }
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

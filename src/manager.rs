use crate::config::{Config, PeaksJob, SeriesSource};
use crate::dataset;
use crate::diurnal::plot_diurnal_variation;
use crate::peaks::{Peak, extract_peaks};
use crate::render::Rendered;
use crate::series::{Interval, TimeSeries, TimeWindow};
use crate::stats::SummaryStats;
use crate::timeline::{TimelineOptions, plot_time_series};
use crate::trace::Trace;
use anyhow::{Context, Result};
use glob::glob;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Runs the jobs of an analysis directory holding a `config.toml`.
pub struct Manager {
    analysis_dir: PathBuf,
    cfg: Config,
}

/// Contents of a `<name>-peaks.toml` report.
#[derive(Serialize)]
struct PeakSummary<'a> {
    name: &'a str,
    variable: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resample: Option<Interval>,
    stats: SummaryStats,
    peaks: &'a [Peak],
    windows: &'a [TimeWindow],
}

impl Manager {
    pub fn new<P: AsRef<Path>>(analysis_dir: P) -> Result<Self> {
        let analysis_dir = analysis_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(analysis_dir.join("config.toml"))
            .context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { analysis_dir, cfg })
    }

    pub fn plot_diurnal(&self) -> Result<()> {
        for job in &self.cfg.diurnal {
            let primary = self
                .load_series(&job.primary)
                .context("failed to load primary series")?;
            let secondary = match &job.secondary {
                Some(source) => Some((
                    self.load_series(source)
                        .context("failed to load secondary series")?,
                    source,
                )),
                None => None,
            };

            let primary_trace = Trace::with_options(&primary, job.primary.trace_options());
            let secondary_trace = secondary
                .as_ref()
                .map(|(series, source)| Trace::with_options(series, source.trace_options()));

            let output = self.output_file(&job.output)?;
            let rendered = plot_diurnal_variation(
                &primary_trace,
                secondary_trace.as_ref(),
                &self.cfg.style,
                Some(&output),
            )
            .with_context(|| format!("failed to plot diurnal variation of {}", primary.name()))?;
            log_rendered(&rendered);
        }

        Ok(())
    }

    pub fn plot_timeseries(&self) -> Result<()> {
        for job in &self.cfg.timeseries {
            let series = self
                .load_series(&job.series)
                .context("failed to load series")?;
            let trace = Trace::with_options(&series, job.series.trace_options());

            let output = self.output_file(&job.output)?;
            let rendered = plot_time_series(
                &trace,
                &job.timeline_options(),
                &self.cfg.style,
                Some(&output),
            )
            .with_context(|| format!("failed to plot time series of {}", series.name()))?;
            log_rendered(&rendered);
        }

        Ok(())
    }

    pub fn analyze_peaks(&self) -> Result<()> {
        for job in &self.cfg.peaks {
            self.analyze_peak_job(job)
                .with_context(|| format!("failed to analyze peaks of {:?}", job.name))?;
        }

        Ok(())
    }

    fn analyze_peak_job(&self, job: &PeaksJob) -> Result<()> {
        let series = self
            .load_series(&job.series)
            .context("failed to load series")?;

        let report = extract_peaks(&series, &job.peak_options()).context("failed to extract peaks")?;
        log::info!("{}: {:?}", job.name, report.stats);
        for peak in &report.peaks {
            log::info!("{}: peak {} at {}", job.name, peak.value, peak.time);
        }

        let windows = report
            .windows(job.hours_before, job.hours_after)
            .context("failed to derive peak windows")?;

        let summary = PeakSummary {
            name: &job.name,
            variable: &job.series.variable,
            resample: job.resample,
            stats: report.stats,
            peaks: &report.peaks,
            windows: &windows,
        };
        let report_file = self.output_file(&job.report_file())?;
        let text = toml::to_string(&summary).context("failed to serialize peak report")?;
        fs::write(&report_file, text).with_context(|| format!("failed to write {report_file:?}"))?;
        log::info!("saved {report_file:?}");

        let trace = Trace::with_options(&series, job.series.trace_options());
        for (i_peak, window) in windows.into_iter().enumerate() {
            let options = TimelineOptions {
                resample: job.resample,
                window: Some(window),
            };
            let output = self.output_file(&job.figure_file(i_peak))?;
            let rendered = plot_time_series(&trace, &options, &self.cfg.style, Some(&output))
                .with_context(|| format!("failed to plot window {i_peak}"))?;
            log_rendered(&rendered);
        }

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = Vec::new();
        files.extend(self.cfg.diurnal.iter().map(|job| job.output.clone()));
        files.extend(self.cfg.timeseries.iter().map(|job| job.output.clone()));
        for job in &self.cfg.peaks {
            files.push(job.report_file());

            let pattern = self.analysis_dir.join(job.figure_pattern());
            let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
            let figures = glob(pattern)
                .context("failed to glob peak figures")?
                .filter_map(|entry| entry.ok());
            files.extend(figures);
        }

        for file in files {
            let file = self.analysis_dir.join(file);
            if !file.is_file() {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }

        Ok(())
    }

    fn load_series(&self, source: &SeriesSource) -> Result<TimeSeries> {
        let file = self
            .cfg
            .datasets
            .get(&source.dataset)
            .with_context(|| format!("unknown dataset {:?}", source.dataset))?;
        let file = self.analysis_dir.join(file);

        let ds = dataset::open(&file).with_context(|| format!("failed to open {file:?}"))?;
        let series = dataset::load_series(ds.as_ref(), &source.time, &source.variable)
            .with_context(|| format!("failed to read {:?} from {file:?}", source.variable))?;
        log::info!(
            "loaded {} ({} points, {} valid) from {file:?}",
            series.name(),
            series.len(),
            series.valid_count()
        );

        Ok(series)
    }

    /// Resolve `file` against the analysis directory and create its parent directory.
    fn output_file(&self, file: &Path) -> Result<PathBuf> {
        let file = self.analysis_dir.join(file);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
        }
        Ok(file)
    }
}

fn log_rendered(rendered: &Rendered) {
    match rendered {
        Rendered::Saved(file) => log::info!("saved {file:?}"),
        Rendered::Displayed(frame) => {
            log::info!("rendered {}x{} frame", frame.width, frame.height)
        }
    }
}

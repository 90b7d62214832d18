//! Line plots of raw or resampled series.

use crate::error::Result;
use crate::render::{Canvas, Draw, FigureStyle, Rendered, value_range};
use crate::series::{Interval, TimeWindow};
use crate::trace::Trace;
use chrono::{DateTime, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;
use std::{ops::Range, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    /// Average over bins of this width before plotting.
    pub resample: Option<Interval>,
    /// Restricts the visible x range only; averaging always sees the whole series.
    pub window: Option<TimeWindow>,
}

/// Plot `trace` against time, averaged over `options.resample` when set.
///
/// A window reaching past the data just leaves that part of the plot empty.
pub fn plot_time_series(
    trace: &Trace,
    options: &TimelineOptions,
    style: &FigureStyle,
    save_path: Option<&Path>,
) -> Result<Rendered> {
    let offset = trace.offset();
    let mut series = trace.adjusted(offset);
    if let Some(interval) = options.resample {
        series = series.resample(interval);
    }

    let visible: Vec<(NaiveDateTime, f64)> = series
        .iter()
        .filter(|&(time, _)| options.window.is_none_or(|window| window.contains(time)))
        .collect();

    let x_range = match options.window {
        Some(window) => to_secs(window.start)..to_secs(window.end),
        None => time_extent(series.times()),
    };
    let x_range = if x_range.end > x_range.start {
        x_range
    } else {
        (x_range.start - 3600.0)..(x_range.end + 3600.0)
    };

    let figure = TimelineFigure {
        style,
        title: match options.resample {
            Some(interval) => format!("{} ({interval} average)", series.name()),
            None => series.name().to_owned(),
        },
        x_desc: if offset.is_utc() {
            "Time (UTC)"
        } else {
            "Time (Local Time)"
        },
        y_desc: trace.label().to_owned(),
        color: trace
            .options
            .color
            .map_or(style.primary_color.to_color(), |rgb| rgb.to_color()),
        y_range: value_range(visible.iter().map(|&(_, val)| val), trace.options.ylim),
        x_range,
        runs: split_runs(&visible),
    };

    let mut canvas = Canvas::new(style, save_path);
    canvas.render(&figure)?;
    canvas.finish()
}

fn to_secs(time: NaiveDateTime) -> f64 {
    time.and_utc().timestamp_millis() as f64 / 1000.0
}

fn time_label(secs: &f64) -> String {
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        .map(|time| time.naive_utc().format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn time_extent(times: &[NaiveDateTime]) -> Range<f64> {
    match (times.iter().min(), times.iter().max()) {
        (Some(&first), Some(&last)) => to_secs(first)..to_secs(last),
        _ => 0.0..0.0,
    }
}

/// Consecutive stretches of non-missing values; a gap breaks the line.
fn split_runs(points: &[(NaiveDateTime, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut run = Vec::new();
    for &(time, val) in points {
        if val.is_nan() {
            if !run.is_empty() {
                runs.push(std::mem::take(&mut run));
            }
            continue;
        }
        run.push((to_secs(time), val));
    }
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

struct TimelineFigure<'a> {
    style: &'a FigureStyle,
    title: String,
    x_desc: &'static str,
    y_desc: String,
    color: RGBColor,
    x_range: Range<f64>,
    y_range: Range<f64>,
    runs: Vec<Vec<(f64, f64)>>,
}

impl Draw for TimelineFigure<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let style = self.style;
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, style.font(14.0))
            .margin(style.px(10.0))
            .x_label_area_size(style.px(40.0))
            .y_label_area_size(style.px(56.0))
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(6)
            .x_label_formatter(&time_label)
            .x_desc(self.x_desc)
            .y_desc(&self.y_desc)
            .label_style(style.font(10.0))
            .axis_desc_style(style.font(12.0))
            .draw()?;

        for run in &self.runs {
            if let [point] = run.as_slice() {
                chart.draw_series(std::iter::once(Circle::new(
                    *point,
                    style.px(1.5) as i32,
                    self.color.filled(),
                )))?;
                continue;
            }
            chart.draw_series(LineSeries::new(
                run.iter().copied(),
                self.color.stroke_width(style.px(1.0)),
            ))?;
        }

        Ok(())
    }
}

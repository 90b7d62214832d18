//! Diurnal cycles: every day of a record collapsed onto 24 hour-of-day buckets.

use crate::error::Result;
use crate::render::{Canvas, Draw, FigureStyle, Rendered, value_range};
use crate::series::{LocalOffset, TimeSeries};
use crate::stats::{Accumulator, AccumulatorReport};
use crate::trace::Trace;
use chrono::Timelike;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::{collections::BTreeMap, ops::Range, path::Path};

/// Mean, standard deviation and count per hour of day.
///
/// Hours without a single valid observation are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyAggregate {
    hours: BTreeMap<u32, AccumulatorReport>,
}

impl HourlyAggregate {
    /// Bucket an already scaled and shifted series by hour of day.
    pub fn from_series(series: &TimeSeries) -> Self {
        let mut accs: BTreeMap<u32, Accumulator> = BTreeMap::new();
        for (time, val) in series.iter() {
            accs.entry(time.hour()).or_default().add(val);
        }

        let hours = accs
            .into_iter()
            .filter(|(_, acc)| acc.count() > 0)
            .map(|(hour, acc)| (hour, acc.report()))
            .collect();
        Self { hours }
    }

    pub fn get(&self, hour: u32) -> Option<&AccumulatorReport> {
        self.hours.get(&hour)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &AccumulatorReport)> + '_ {
        self.hours.iter().map(|(&hour, report)| (hour, report))
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Number of observations over all buckets.
    pub fn total_count(&self) -> usize {
        self.hours.values().map(|report| report.count).sum()
    }
}

/// Scale, shift and bucket `series` by hour of day.
pub fn hourly_aggregate(
    series: &TimeSeries,
    scale_factor: f64,
    offset: LocalOffset,
) -> HourlyAggregate {
    HourlyAggregate::from_series(&series.adjusted(scale_factor, offset))
}

/// Plot the diurnal cycle of `primary`, and of `secondary` on a right-hand axis.
///
/// The two traces are aggregated independently; they need not share a time range or a
/// sampling rate. A secondary trace without its own offset takes the primary one.
pub fn plot_diurnal_variation(
    primary: &Trace,
    secondary: Option<&Trace>,
    style: &FigureStyle,
    save_path: Option<&Path>,
) -> Result<Rendered> {
    let offset = primary.offset();
    let primary_layer = Layer::new(primary, offset, style.primary_color.to_color());

    let secondary_layer = secondary.map(|trace| {
        let offset = trace.options.local_offset.unwrap_or(offset);
        Layer::new(trace, offset, style.secondary_color.to_color())
    });

    let figure = DiurnalFigure {
        style,
        title: primary.series.name(),
        x_desc: if offset.is_utc() {
            "Hour of Day (UTC)"
        } else {
            "Hour of Day (Local Time)"
        },
        primary: primary_layer,
        secondary: secondary_layer,
    };

    let mut canvas = Canvas::new(style, save_path);
    canvas.render(&figure)?;
    canvas.finish()
}

struct Layer {
    points: Vec<(i32, f64)>,
    label: String,
    color: RGBColor,
    y_range: Range<f64>,
}

impl Layer {
    fn new(trace: &Trace, offset: LocalOffset, default_color: RGBColor) -> Self {
        let aggregate = HourlyAggregate::from_series(&trace.adjusted(offset));
        let points: Vec<(i32, f64)> = aggregate
            .iter()
            .map(|(hour, report)| (hour as i32, report.mean))
            .collect();
        let y_range = value_range(points.iter().map(|&(_, mean)| mean), trace.options.ylim);

        Self {
            points,
            label: trace.label().to_owned(),
            color: trace.options.color.map_or(default_color, |rgb| rgb.to_color()),
            y_range,
        }
    }
}

struct DiurnalFigure<'a> {
    style: &'a FigureStyle,
    title: &'a str,
    x_desc: &'static str,
    primary: Layer,
    secondary: Option<Layer>,
}

// One spare tick on each side keeps the first and last markers off the axes.
const HOUR_AXIS: Range<i32> = -1..24;

fn hour_label(hour: &i32) -> String {
    if (0..24).contains(hour) {
        hour.to_string()
    } else {
        String::new()
    }
}

impl Draw for DiurnalFigure<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let style = self.style;
        let line_width = style.px(1.5);
        let marker_size = style.px(3.0) as i32;

        root.fill(&WHITE)?;

        let mut builder = ChartBuilder::on(root);
        builder
            .caption(self.title, style.font(14.0))
            .margin(style.px(10.0))
            .x_label_area_size(style.px(40.0))
            .y_label_area_size(style.px(56.0));
        if self.secondary.is_some() {
            builder.right_y_label_area_size(style.px(56.0));
        }

        let primary = &self.primary;
        let mut chart = builder.build_cartesian_2d(HOUR_AXIS, primary.y_range.clone())?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(26)
            .x_label_formatter(&hour_label)
            .x_desc(self.x_desc)
            .y_desc(&primary.label)
            .label_style(style.font(10.0))
            .y_label_style(style.font(10.0).color(&primary.color))
            .axis_desc_style(style.font(12.0))
            .draw()?;

        chart.draw_series(LineSeries::new(
            primary.points.iter().copied(),
            primary.color.stroke_width(line_width),
        ))?;
        chart.draw_series(PointSeries::of_element(
            primary.points.iter().copied(),
            marker_size,
            primary.color.filled(),
            &|coord, size, shape| Circle::new(coord, size, shape),
        ))?;

        let Some(secondary) = &self.secondary else {
            return Ok(());
        };

        let mut chart = chart.set_secondary_coord(HOUR_AXIS, secondary.y_range.clone());
        chart
            .configure_secondary_axes()
            .y_desc(&secondary.label)
            .label_style(style.font(10.0).color(&secondary.color))
            .axis_desc_style(style.font(12.0))
            .draw()?;

        chart.draw_secondary_series(LineSeries::new(
            secondary.points.iter().copied(),
            secondary.color.stroke_width(line_width),
        ))?;
        chart.draw_secondary_series(PointSeries::of_element(
            secondary.points.iter().copied(),
            marker_size,
            secondary.color.filled(),
            &|coord, size, shape| {
                EmptyElement::at(coord) + Rectangle::new([(-size, -size), (size, size)], shape)
            },
        ))?;

        Ok(())
    }
}

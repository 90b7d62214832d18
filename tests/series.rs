use chrono::{NaiveDateTime, TimeDelta};
use nachtt::{Error, Interval, LocalOffset, TimeSeries};

fn at(s: &str) -> NaiveDateTime {
    s.parse().expect("failed to parse timestamp")
}

fn series(points: &[(&str, f64)]) -> TimeSeries {
    let (times, values) = points.iter().map(|&(time, val)| (at(time), val)).unzip();
    TimeSeries::new("x", times, values).expect("failed to build series")
}

fn same(a: &TimeSeries, b: &TimeSeries) -> bool {
    a.times() == b.times()
        && a.values().len() == b.values().len()
        && a.values()
            .iter()
            .zip(b.values())
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}

#[test]
fn rejects_mismatched_lengths() {
    let result = TimeSeries::new("x", vec![at("2011-03-01T00:00:00")], vec![1.0, 2.0]);
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn averages_into_left_labelled_bins() {
    let s = series(&[
        ("2011-03-01T00:05:00", 1.0),
        ("2011-03-01T00:20:00", 3.0),
        ("2011-03-01T00:31:00", 10.0),
        ("2011-03-01T00:59:59", f64::NAN),
    ]);

    let resampled = s.resample(Interval::minutes(30).unwrap());

    assert_eq!(
        resampled.times(),
        &[at("2011-03-01T00:00:00"), at("2011-03-01T00:30:00")]
    );
    assert_eq!(resampled.values(), &[2.0, 10.0]);
    assert_eq!(resampled.name(), "x");
}

#[test]
fn empty_bins_between_data_are_missing() {
    let s = series(&[("2011-03-01T01:10:00", 1.0), ("2011-03-01T03:50:00", 5.0)]);

    let resampled = s.resample(Interval::hours(1).unwrap());

    assert_eq!(resampled.len(), 3);
    assert_eq!(resampled.times()[0], at("2011-03-01T01:00:00"));
    assert_eq!(resampled.values()[0], 1.0);
    assert!(resampled.values()[1].is_nan());
    assert_eq!(resampled.values()[2], 5.0);
    assert_eq!(resampled.valid_count(), 2);
}

#[test]
fn bins_align_to_midnight_of_the_first_day() {
    let s = series(&[("2011-03-01T13:07:00", 1.0), ("2011-03-02T02:00:00", 2.0)]);

    let resampled = s.resample("7h".parse().unwrap());

    // Edges at 00:00, 07:00, 14:00, 21:00, 04:00 (next day) ...
    assert_eq!(resampled.times()[0], at("2011-03-01T07:00:00"));
    assert_eq!(*resampled.times().last().unwrap(), at("2011-03-01T21:00:00"));
}

#[test]
fn resampling_is_idempotent() {
    let start = at("2011-02-17T05:13:27");
    let (times, values): (Vec<_>, Vec<_>) = (0..2000i64)
        .filter(|i| i % 97 > 20)
        .map(|i| {
            let val = if i % 13 == 0 {
                f64::NAN
            } else {
                (i as f64 * 0.11).cos() * 40.0
            };
            (start + TimeDelta::seconds(i * 47), val)
        })
        .unzip();
    let s = TimeSeries::new("x", times, values).unwrap();

    for interval in ["1min", "30min", "1h", "7h", "1D"] {
        let interval: Interval = interval.parse().unwrap();
        let once = s.resample(interval);
        let twice = once.resample(interval);
        assert!(same(&once, &twice), "not idempotent at {interval}");
    }
}

#[test]
fn unsorted_input_is_binned_in_time_order() {
    let s = series(&[
        ("2011-03-01T02:10:00", 3.0),
        ("2011-03-01T00:10:00", 1.0),
        ("2011-03-01T02:40:00", 5.0),
    ]);

    let resampled = s.resample(Interval::hours(1).unwrap());

    assert_eq!(resampled.times()[0], at("2011-03-01T00:00:00"));
    assert_eq!(resampled.values()[0], 1.0);
    assert_eq!(resampled.values()[2], 4.0);
}

#[test]
fn resampling_empty_series_is_empty() {
    let s = TimeSeries::new("x", Vec::new(), Vec::new()).unwrap();
    assert!(s.resample(Interval::minutes(30).unwrap()).is_empty());
}

#[test]
fn adjusting_scales_and_shifts_a_copy() {
    let s = series(&[("2011-03-01T12:00:00", 2.0), ("2011-03-01T13:00:00", f64::NAN)]);

    let adjusted = s.adjusted(1e3, LocalOffset(-7));

    assert_eq!(adjusted.times()[0], at("2011-03-01T05:00:00"));
    assert_eq!(adjusted.values()[0], 2000.0);
    assert!(adjusted.values()[1].is_nan());
    assert_eq!(s.values()[0], 2.0);
    assert_eq!(s.times()[0], at("2011-03-01T12:00:00"));
}

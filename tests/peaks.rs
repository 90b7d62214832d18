use chrono::{NaiveDateTime, TimeDelta};
use nachtt::{
    Error, Interval, LocalOffset, PeakOptions, TimeSeries, TimeWindow, extract_peaks,
    peak_windows,
};

fn at(s: &str) -> NaiveDateTime {
    s.parse().expect("failed to parse timestamp")
}

fn hourly(values: Vec<f64>) -> TimeSeries {
    let start = at("2011-03-01T00:00:00");
    let times = (0..values.len() as i64)
        .map(|i| start + TimeDelta::hours(i))
        .collect();
    TimeSeries::new("x", times, values).expect("failed to build series")
}

fn top(n: usize) -> PeakOptions {
    PeakOptions {
        n,
        ..PeakOptions::default()
    }
}

#[test]
fn picks_largest_values_in_descending_order() {
    let series = hourly(vec![10.0, 5.0, 8.0]);

    let report = extract_peaks(&series, &top(2)).expect("failed to extract peaks");

    let peaks: Vec<(NaiveDateTime, f64)> =
        report.peaks.iter().map(|peak| (peak.time, peak.value)).collect();
    assert_eq!(
        peaks,
        vec![
            (at("2011-03-01T00:00:00"), 10.0),
            (at("2011-03-01T02:00:00"), 8.0)
        ]
    );
}

#[test]
fn ties_keep_the_earlier_timestamp() {
    let series = hourly(vec![3.0, 7.0, 1.0, 7.0, 7.0]);

    let report = extract_peaks(&series, &top(2)).unwrap();

    assert_eq!(report.times(), vec![at("2011-03-01T01:00:00"), at("2011-03-01T03:00:00")]);
}

#[test]
fn peaks_bound_every_excluded_value() {
    let values: Vec<f64> = (0..300)
        .map(|i| if i % 11 == 0 { f64::NAN } else { ((i * 37) % 101) as f64 })
        .collect();
    let series = hourly(values.clone());

    for n in [1, 5, 17, 60] {
        let report = extract_peaks(&series, &top(n)).unwrap();
        assert_eq!(report.peaks.len(), n);
        assert!(report.peaks.windows(2).all(|pair| pair[0].value >= pair[1].value));

        let min_kept = report.peaks.last().unwrap().value;
        let n_above = values.iter().filter(|val| **val > min_kept).count();
        assert!(n_above < n);
    }
}

#[test]
fn returns_at_most_the_valid_points() {
    let series = hourly(vec![1.0, f64::NAN, 2.0]);

    let report = extract_peaks(&series, &top(5)).unwrap();

    assert_eq!(report.peaks.len(), 2);
}

#[test]
fn summary_skips_missing_values() {
    let series = hourly(vec![4.0, f64::NAN, 1.0, 3.0, 2.0]);

    let stats = extract_peaks(&series, &top(1)).unwrap().stats;

    assert_eq!(stats.mean, 2.5);
    assert_eq!(stats.median, 2.5);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);
    assert!((stats.std_dev - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
}

#[test]
fn resamples_offsets_and_scales_before_ranking() {
    // 10-minute data; the 01:00-02:00 UTC hour averages highest.
    let start = at("2011-03-01T00:00:00");
    let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0, 7.0, 8.0, 8.0, 8.0, 8.0, 2.0];
    let times = (0..values.len() as i64)
        .map(|i| start + TimeDelta::minutes(10 * i))
        .collect();
    let series = TimeSeries::new("x", times, values.to_vec()).unwrap();

    let options = PeakOptions {
        resample: Some(Interval::hours(1).unwrap()),
        n: 1,
        scale_factor: 10.0,
        local_offset: LocalOffset(-7),
    };
    let report = extract_peaks(&series, &options).unwrap();

    assert_eq!(report.peaks[0].time, at("2011-02-28T18:00:00"));
    assert_eq!(report.peaks[0].value, 80.0);
    assert_eq!(report.stats.max, 80.0);
    assert_eq!(report.stats.min, 10.0);
}

#[test]
fn rejects_zero_peaks() {
    let series = hourly(vec![1.0, 2.0]);
    assert!(matches!(
        extract_peaks(&series, &top(0)),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn rejects_series_without_valid_values() {
    let empty = hourly(Vec::new());
    let missing = hourly(vec![f64::NAN; 4]);

    for series in [empty, missing] {
        let options = PeakOptions {
            resample: Some(Interval::minutes(30).unwrap()),
            ..PeakOptions::default()
        };
        assert!(matches!(
            extract_peaks(&series, &options),
            Err(Error::InvalidInput(_))
        ));
    }
}

#[test]
fn windows_surround_each_peak() {
    let windows = peak_windows(&[at("2011-03-01T12:00:00")], 12, 12).unwrap();
    assert_eq!(
        windows,
        vec![TimeWindow::new(at("2011-03-01T00:00:00"), at("2011-03-02T00:00:00"))]
    );
}

#[test]
fn windows_keep_order_and_overlap() {
    let times = [
        at("2011-03-05T06:00:00"),
        at("2011-03-01T12:00:00"),
        at("2011-03-05T08:00:00"),
        at("2011-03-05T06:00:00"),
    ];

    let windows = peak_windows(&times, 3, 24).unwrap();

    assert_eq!(windows.len(), times.len());
    for (window, time) in windows.iter().zip(times) {
        assert_eq!(window.start, time - TimeDelta::hours(3));
        assert_eq!(window.end, time + TimeDelta::hours(24));
    }
    assert_eq!(windows[0], windows[3]);
    assert!(windows[2].contains(windows[0].end));
}

#[test]
fn no_peaks_no_windows() {
    assert!(peak_windows(&[], 12, 12).unwrap().is_empty());
}

#[test]
fn report_windows_follow_peak_order() {
    let series = hourly(vec![10.0, 5.0, 8.0]);
    let report = extract_peaks(&series, &top(2)).unwrap();

    let windows = report.windows(1, 2).unwrap();

    assert_eq!(windows[0].start, at("2011-02-28T23:00:00"));
    assert_eq!(windows[1].end, at("2011-03-01T04:00:00"));
}

#[test]
fn signed_zeros_tie() {
    let series = hourly(vec![-0.0, 0.0, -1.0]);

    let report = extract_peaks(&series, &top(1)).unwrap();

    assert_eq!(report.times(), vec![at("2011-03-01T00:00:00")]);
}

#[test]
fn windows_past_the_calendar_are_rejected() {
    let late = NaiveDateTime::MAX - TimeDelta::hours(1);
    let early = NaiveDateTime::MIN + TimeDelta::hours(1);

    assert!(matches!(
        peak_windows(&[late], 0, u32::MAX),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        peak_windows(&[early], u32::MAX, 0),
        Err(Error::InvalidInput(_))
    ));
    assert!(peak_windows(&[late], 0, 1).is_ok());
}

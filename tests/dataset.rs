use nachtt::{Array, Error, TableDataset, dataset, load_series};
use std::{fs, path::PathBuf};

fn test_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).expect("failed to create test directory");
    dir
}

fn campaign() -> TableDataset {
    TableDataset::new()
        .with_coord(
            "time",
            Array::new(vec![0.0, 30.0, 60.0], Some("minutes since 2011-02-20 00:00:00")),
        )
        .with_variable("ClNO2_pptv", Array::new(vec![12.5, f64::NAN, 14.0], None))
}

#[test]
fn loads_series_from_named_arrays() {
    let series = load_series(&campaign(), "time", "ClNO2_pptv").expect("failed to load series");

    assert_eq!(series.name(), "ClNO2_pptv");
    assert_eq!(series.len(), 3);
    assert_eq!(series.times()[1], "2011-02-20T00:30:00".parse().unwrap());
    assert!(series.values()[1].is_nan());
    assert_eq!(series.valid_count(), 2);
}

#[test]
fn missing_names_are_not_found() {
    let ds = campaign();

    let err = load_series(&ds, "Time", "ClNO2_pptv").unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "coordinate", ref name } if name == "Time"));

    let err = load_series(&ds, "time", "N2O5").unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "variable", ref name } if name == "N2O5"));
}

#[test]
fn time_without_units_is_rejected() {
    let ds = TableDataset::new()
        .with_coord("time", Array::new(vec![0.0], None))
        .with_variable("x", Array::new(vec![1.0], None));

    assert!(matches!(
        load_series(&ds, "time", "x"),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn variable_must_match_time_length() {
    let ds = campaign().with_variable("short", Array::new(vec![1.0], None));

    assert!(matches!(
        load_series(&ds, "time", "short"),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn reads_table_files() {
    let dir = test_dir("dataset_table");
    let path = dir.join("obs.toml");
    fs::write(
        &path,
        r#"
[coords.time]
units = "hours since 2011-03-01T00:00:00"
values = [0.0, 1.0, 2.0]

[variables.N2O5]
units = "pptv"
values = [3.0, nan, 5.0]
"#,
    )
    .expect("failed to write dataset");

    let ds = dataset::open(&path).expect("failed to open dataset");
    let series = load_series(ds.as_ref(), "time", "N2O5").expect("failed to load series");

    assert_eq!(series.times()[2], "2011-03-01T02:00:00".parse().unwrap());
    assert_eq!(series.values()[2], 5.0);
    assert!(series.values()[1].is_nan());
}

#[test]
fn bad_files_are_reported() {
    let dir = test_dir("dataset_bad");

    let missing = dir.join("absent.toml");
    assert!(matches!(dataset::open(&missing), Err(Error::Io { .. })));

    let malformed = dir.join("malformed.toml");
    fs::write(&malformed, "[coords.time]\nvalues = \"oops\"\n").unwrap();
    assert!(matches!(dataset::open(&malformed), Err(Error::Parse { .. })));

    let unknown = dir.join("data.csv");
    fs::write(&unknown, "time,x\n").unwrap();
    assert!(matches!(dataset::open(&unknown), Err(Error::InvalidInput(_))));
}

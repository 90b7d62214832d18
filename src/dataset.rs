//! Labelled array datasets, reduced to the two lookups the analysis needs.

use crate::error::{Error, Result};
use crate::series::TimeSeries;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};

/// One-dimensional array with its `units` attribute, if any.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Array {
    pub values: Vec<f64>,
    #[serde(default)]
    pub units: Option<String>,
}

impl Array {
    pub fn new(values: Vec<f64>, units: Option<&str>) -> Self {
        Self {
            values,
            units: units.map(str::to_owned),
        }
    }
}

/// Source of named coordinates and variables.
pub trait Dataset {
    fn coordinate(&self, name: &str) -> Result<Array>;
    fn variable(&self, name: &str) -> Result<Array>;
}

/// Build a series from the time coordinate `time_name` and the variable `var_name`.
pub fn load_series(dataset: &dyn Dataset, time_name: &str, var_name: &str) -> Result<TimeSeries> {
    let time = dataset.coordinate(time_name)?;
    let units = time.units.as_deref().ok_or_else(|| {
        Error::invalid(format!("time coordinate '{time_name}' has no units attribute"))
    })?;
    let times = decode_times(&time.values, units)?;

    let var = dataset.variable(var_name)?;
    TimeSeries::new(var_name, times, var.values)
}

/// Open a dataset file, picking the reader from the file extension.
pub fn open(path: &Path) -> Result<Box<dyn Dataset>> {
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match ext {
        "toml" => Ok(Box::new(TableDataset::from_file(path)?)),
        #[cfg(feature = "netcdf")]
        "nc" | "nc4" | "cdf" => Ok(Box::new(netcdf_dataset::NetcdfDataset::open(path)?)),
        _ => Err(Error::invalid(format!(
            "unsupported dataset format {path:?}{}",
            if cfg!(feature = "netcdf") {
                ""
            } else {
                " (netcdf support is disabled)"
            }
        ))),
    }
}

/// In-memory dataset, also readable from TOML:
///
/// ```toml
/// [coords.time]
/// units = "minutes since 2011-02-17 00:00:00"
/// values = [0.0, 1.0, 2.0]
///
/// [variables.ClNO2_pptv]
/// values = [12.5, nan, 14.0]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDataset {
    #[serde(default)]
    coords: BTreeMap<String, Array>,
    #[serde(default)]
    variables: BTreeMap<String, Array>,
}

impl TableDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coord(mut self, name: &str, array: Array) -> Self {
        self.coords.insert(name.to_owned(), array);
        self
    }

    pub fn with_variable(mut self, name: &str, array: Array) -> Self {
        self.variables.insert(name.to_owned(), array);
        self
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        toml::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Dataset for TableDataset {
    fn coordinate(&self, name: &str) -> Result<Array> {
        self.coords.get(name).cloned().ok_or_else(|| Error::NotFound {
            kind: "coordinate",
            name: name.to_owned(),
        })
    }

    fn variable(&self, name: &str) -> Result<Array> {
        self.variables.get(name).cloned().ok_or_else(|| Error::NotFound {
            kind: "variable",
            name: name.to_owned(),
        })
    }
}

/// Decode CF-style numeric times such as `hours since 2011-02-17 00:00:00`.
pub fn decode_times(values: &[f64], units: &str) -> Result<Vec<NaiveDateTime>> {
    let malformed = || Error::invalid(format!("malformed time units '{units}'"));

    let (unit, reference) = units.split_once(" since ").ok_or_else(malformed)?;
    let unit_millis = match unit.trim().to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        _ => return Err(malformed()),
    };
    let reference = parse_reference(reference).ok_or_else(malformed)?;

    values
        .iter()
        .map(|&val| {
            if !val.is_finite() {
                return Err(Error::invalid(format!(
                    "time value {val} cannot be converted to a timestamp"
                )));
            }
            let millis = (val * unit_millis).round() as i64;
            TimeDelta::try_milliseconds(millis)
                .and_then(|delta| reference.checked_add_signed(delta))
                .ok_or_else(|| {
                    Error::invalid(format!("time value {val} is out of the representable range"))
                })
        })
        .collect()
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let s = s
        .strip_suffix("UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s)
        .trim_end();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
}

#[cfg(feature = "netcdf")]
mod netcdf_dataset {
    use super::{Array, Dataset};
    use crate::error::{Error, Result};
    use netcdf::AttrValue;
    use std::path::{Path, PathBuf};

    /// NetCDF file opened read-only.
    pub struct NetcdfDataset {
        file: netcdf::File,
        path: PathBuf,
    }

    impl NetcdfDataset {
        pub fn open(path: &Path) -> Result<Self> {
            let file = netcdf::open(path)?;
            log::debug!("opened {path:?}");
            Ok(Self {
                file,
                path: path.to_path_buf(),
            })
        }

        fn read(&self, name: &str, kind: &'static str) -> Result<Array> {
            let var = self.file.variable(name).ok_or_else(|| Error::NotFound {
                kind,
                name: name.to_owned(),
            })?;

            let data = var.values::<f64>(None, None)?;
            if data.ndim() != 1 {
                return Err(Error::invalid(format!(
                    "{kind} '{name}' in {:?} has {} dimensions, expected 1",
                    self.path,
                    data.ndim()
                )));
            }

            let fill = fill_value(&var);
            let values = data
                .iter()
                .map(|&val| if Some(val) == fill { f64::NAN } else { val })
                .collect();

            let units = match var.attribute("units").map(|attr| attr.value()) {
                Some(Ok(AttrValue::Str(units))) => Some(units),
                _ => None,
            };

            Ok(Array { values, units })
        }
    }

    fn fill_value(var: &netcdf::Variable) -> Option<f64> {
        for attr_name in ["_FillValue", "missing_value"] {
            let Some(attr) = var.attribute(attr_name) else {
                continue;
            };
            let fill = match attr.value() {
                Ok(AttrValue::Double(val)) => val,
                Ok(AttrValue::Float(val)) => f64::from(val),
                Ok(AttrValue::Int(val)) => f64::from(val),
                Ok(AttrValue::Short(val)) => f64::from(val),
                Ok(AttrValue::Longlong(val)) => val as f64,
                _ => continue,
            };
            return Some(fill);
        }
        None
    }

    impl Dataset for NetcdfDataset {
        fn coordinate(&self, name: &str) -> Result<Array> {
            self.read(name, "coordinate")
        }

        fn variable(&self, name: &str) -> Result<Array> {
            self.read(name, "variable")
        }
    }
}

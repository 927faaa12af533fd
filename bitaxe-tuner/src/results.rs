//! Result file persistence.
//!
//! The report layout matches what earlier versions of the benchmark tool
//! wrote, so existing tooling that reads the JSON keeps working.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ranking::Rankings;
use crate::types::{BenchmarkEntry, BenchmarkResults};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One measured setting as written to the report.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub core_voltage: u32,
    pub frequency: u32,
    pub average_hash_rate: f64,
    pub average_temperature: f64,
    #[serde(rename = "efficiencyJTH")]
    pub efficiency_jth: f64,
    #[serde(rename = "averageVRTemp", skip_serializing_if = "Option::is_none", default)]
    pub average_vr_temp: Option<f64>,
}

impl From<&BenchmarkEntry> for ResultRecord {
    fn from(entry: &BenchmarkEntry) -> Self {
        let m = &entry.measurement;
        Self {
            core_voltage: entry.point.core_voltage_mv,
            frequency: entry.point.frequency_mhz,
            average_hash_rate: m.average_hashrate_ghs,
            average_temperature: m.average_chip_temp_c,
            efficiency_jth: m.efficiency_jth,
            average_vr_temp: m.average_vr_temp_c,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RankedRecord {
    pub rank: usize,
    #[serde(flatten)]
    pub record: ResultRecord,
}

/// Complete result file contents.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BenchmarkReport {
    pub all_results: Vec<ResultRecord>,
    pub top_performers: Vec<RankedRecord>,
    pub most_efficient: Vec<RankedRecord>,
}

impl BenchmarkReport {
    pub fn new(results: &BenchmarkResults, rankings: &Rankings) -> Self {
        fn ranked(entries: &[BenchmarkEntry]) -> Vec<RankedRecord> {
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| RankedRecord {
                    rank: i + 1,
                    record: entry.into(),
                })
                .collect()
        }

        Self {
            all_results: results.entries().iter().map(ResultRecord::from).collect(),
            top_performers: ranked(&rankings.top_hashrate),
            most_efficient: ranked(&rankings.most_efficient),
        }
    }
}

/// Destination for benchmark reports.
pub trait ResultStore: Send + Sync {
    /// Replace any previously saved report with `report`.
    fn save(&self, report: &BenchmarkReport) -> Result<(), StoreError>;

    /// Human-readable location, for log and console output.
    fn location(&self) -> String;
}

/// Writes the report as pretty-printed JSON.
///
/// The file is written beside its destination and renamed into place, so
/// an interrupted write never leaves a truncated report.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `bitaxe_benchmark_results_<address>.json` in `dir`.
    pub fn for_device(dir: &Path, address: &str) -> Self {
        let host: String = address
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        Self::new(dir.join(format!("bitaxe_benchmark_results_{host}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for JsonFileStore {
    fn save(&self, report: &BenchmarkReport) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(report)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ranking::rank;
    use crate::test_support::measurement;
    use crate::types::{Measurement, SweepPoint};

    fn results() -> BenchmarkResults {
        let mut results = BenchmarkResults::new();
        results.push(SweepPoint::new(1150, 500), measurement(550.0, 20.0));
        results.push(
            SweepPoint::new(1200, 525),
            Measurement {
                average_vr_temp_c: Some(63.5),
                ..measurement(600.0, 18.0)
            },
        );
        results
    }

    #[test]
    fn file_name_derives_from_address() {
        let dir = Path::new("/tmp/out");
        assert_eq!(
            JsonFileStore::for_device(dir, "192.168.2.26").path(),
            Path::new("/tmp/out/bitaxe_benchmark_results_192.168.2.26.json")
        );
        assert_eq!(
            JsonFileStore::for_device(dir, "http://bitaxe.local:8080/").path(),
            Path::new("/tmp/out/bitaxe_benchmark_results_bitaxe.local_8080.json")
        );
    }

    #[test]
    fn report_uses_legacy_field_names() {
        let results = results();
        let report = BenchmarkReport::new(&results, &rank(&results, 5));

        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(
            value["all_results"][0],
            json!({
                "coreVoltage": 1150,
                "frequency": 500,
                "averageHashRate": 550.0,
                "averageTemperature": 55.0,
                "efficiencyJTH": 20.0
            })
        );
        assert_eq!(value["all_results"][1]["averageVRTemp"], json!(63.5));
        assert_eq!(value["top_performers"][0]["rank"], json!(1));
        assert_eq!(value["top_performers"][0]["frequency"], json!(525));
        assert_eq!(value["most_efficient"][1]["frequency"], json!(500));
    }

    #[test]
    fn save_writes_and_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::for_device(dir.path(), "10.0.0.5");

        let mut results = results();
        store
            .save(&BenchmarkReport::new(&results, &rank(&results, 5)))
            .unwrap();
        results.push(SweepPoint::new(1220, 550), measurement(610.0, 18.5));
        let report = BenchmarkReport::new(&results, &rank(&results, 5));
        store.save(&report).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let read: BenchmarkReport = serde_json::from_str(&text).unwrap();
        assert_eq!(read, report);
        assert_eq!(read.all_results.len(), 3);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing").join("out.json"));
        let results = results();

        let err = store
            .save(&BenchmarkReport::new(&results, &rank(&results, 5)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}

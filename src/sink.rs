//! Result sinks.
//!
//! The session hands finished results to a [`ResultSink`]: named key/value
//! records (single-point summaries), named two-column numeric tables
//! (setpoint/measurement pairs), and named charts (a table plus axis and
//! title metadata). How a chart is actually rendered is not this program's
//! concern; [`DirectorySink`] persists the chart's data and metadata so an
//! external plotter can draw it.

use crate::error::{BenchError, BenchResult};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Data and metadata for one chart. Titles carry the computed summary
/// values (efficiency, THD, drive level) the bench report expects.
#[derive(Clone, Debug, Serialize)]
pub struct ChartSpec {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(skip)]
    pub x: Vec<f64>,
    #[serde(skip)]
    pub y: Vec<f64>,
    pub log_y: bool,
}

/// Consumer of finished bench results.
#[async_trait]
pub trait ResultSink: Send {
    /// Persists a named key/value summary record.
    async fn write_record(&mut self, name: &str, entries: &[(String, String)]) -> BenchResult<()>;

    /// Persists a named paired-column table; row order is meaningful.
    async fn write_table(
        &mut self,
        name: &str,
        x_label: &str,
        y_label: &str,
        x: &[f64],
        y: &[f64],
    ) -> BenchResult<()>;

    /// Persists a named chart (data plus axis/title metadata).
    async fn write_chart(&mut self, chart: &ChartSpec) -> BenchResult<()>;
}

/// Sink writing text records, CSV tables, and chart CSV + JSON metadata
/// into one output directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> BenchResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        info!("result sink writing to '{}'", dir.display());
        Ok(Self { dir })
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    fn write_csv(&self, file_name: &str, header: [&str; 2], x: &[f64], y: &[f64]) -> BenchResult<()> {
        if x.len() != y.len() {
            return Err(BenchError::Sink(format!(
                "table '{file_name}' has mismatched column lengths ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        let mut writer = csv::Writer::from_path(self.path(file_name))?;
        writer
            .write_record(header)
            .map_err(|err| BenchError::Sink(err.to_string()))?;
        for (a, b) in x.iter().zip(y.iter()) {
            writer
                .write_record(&[a.to_string(), b.to_string()])
                .map_err(|err| BenchError::Sink(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| BenchError::Sink(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for DirectorySink {
    async fn write_record(&mut self, name: &str, entries: &[(String, String)]) -> BenchResult<()> {
        let mut file = File::create(self.path(&format!("{name}.txt")))?;
        writeln!(file, "# {name} recorded {}", Utc::now().to_rfc3339())?;
        for (key, value) in entries {
            writeln!(file, "{key}: {value}")?;
        }
        info!("wrote record '{name}'");
        Ok(())
    }

    async fn write_table(
        &mut self,
        name: &str,
        x_label: &str,
        y_label: &str,
        x: &[f64],
        y: &[f64],
    ) -> BenchResult<()> {
        self.write_csv(&format!("{name}.csv"), [x_label, y_label], x, y)?;
        info!("wrote table '{name}' ({} rows)", x.len());
        Ok(())
    }

    async fn write_chart(&mut self, chart: &ChartSpec) -> BenchResult<()> {
        self.write_csv(
            &format!("{}_chart.csv", chart.name),
            [chart.x_label.as_str(), chart.y_label.as_str()],
            &chart.x,
            &chart.y,
        )?;
        let meta = serde_json::to_string_pretty(chart)
            .map_err(|err| BenchError::Sink(err.to_string()))?;
        std::fs::write(self.path(&format!("{}_chart.json", chart.name)), meta)?;
        info!("wrote chart '{}' ({})", chart.name, chart.title);
        Ok(())
    }
}

impl From<csv::Error> for BenchError {
    fn from(err: csv::Error) -> Self {
        BenchError::Sink(err.to_string())
    }
}

/// Collected artifacts for assertions in tests.
#[derive(Debug, Default)]
pub struct SinkLog {
    pub records: Vec<(String, Vec<(String, String)>)>,
    pub tables: Vec<(String, Vec<f64>, Vec<f64>)>,
    pub charts: Vec<ChartSpec>,
}

/// In-memory sink; clone the handle to inspect artifacts after a run.
#[derive(Clone, Default)]
pub struct MemorySink {
    log: Arc<Mutex<SinkLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `inspect` against everything written so far.
    pub fn with_log<T>(&self, inspect: impl FnOnce(&SinkLog) -> T) -> T {
        let guard = match self.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inspect(&guard)
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn write_record(&mut self, name: &str, entries: &[(String, String)]) -> BenchResult<()> {
        self.with_log_mut(|log| log.records.push((name.to_string(), entries.to_vec())));
        Ok(())
    }

    async fn write_table(
        &mut self,
        name: &str,
        _x_label: &str,
        _y_label: &str,
        x: &[f64],
        y: &[f64],
    ) -> BenchResult<()> {
        self.with_log_mut(|log| log.tables.push((name.to_string(), x.to_vec(), y.to_vec())));
        Ok(())
    }

    async fn write_chart(&mut self, chart: &ChartSpec) -> BenchResult<()> {
        self.with_log_mut(|log| log.charts.push(chart.clone()));
        Ok(())
    }
}

impl MemorySink {
    fn with_log_mut(&self, mutate: impl FnOnce(&mut SinkLog)) {
        let mut guard = match self.log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        mutate(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_directory_sink_writes_all_artifact_kinds() {
        let dir = tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path()).unwrap();

        sink.write_record(
            "power_summary",
            &[("Supply voltage".to_string(), "12 V".to_string())],
        )
        .await
        .unwrap();

        sink.write_table("pout", "frequency_hz", "power_w", &[4.0e6, 8.0e6], &[0.5, 1.5])
            .await
            .unwrap();

        sink.write_chart(&ChartSpec {
            name: "pout".to_string(),
            title: "PA frequency response".to_string(),
            x_label: "Frequency [MHz]".to_string(),
            y_label: "RF output power [W]".to_string(),
            x: vec![4.0, 8.0],
            y: vec![0.5, 1.5],
            log_y: true,
        })
        .await
        .unwrap();

        let record = std::fs::read_to_string(dir.path().join("power_summary.txt")).unwrap();
        assert!(record.contains("Supply voltage: 12 V"));

        let table = std::fs::read_to_string(dir.path().join("pout.csv")).unwrap();
        assert!(table.starts_with("frequency_hz,power_w"));

        let meta = std::fs::read_to_string(dir.path().join("pout_chart.json")).unwrap();
        assert!(meta.contains("PA frequency response"));
        assert!(meta.contains("\"log_y\": true"));
    }

    #[tokio::test]
    async fn test_mismatched_columns_rejected() {
        let dir = tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path()).unwrap();
        let err = sink
            .write_table("bad", "x", "y", &[1.0, 2.0], &[1.0])
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Sink(_)));
    }

    #[tokio::test]
    async fn test_memory_sink_accumulates() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle
            .write_table("spectrum", "n", "w", &[1.0], &[0.02])
            .await
            .unwrap();
        sink.with_log(|log| {
            assert_eq!(log.tables.len(), 1);
            assert_eq!(log.tables[0].0, "spectrum");
        });
    }
}

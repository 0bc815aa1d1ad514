use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GdmError;

pub const METRICS: [&str; 2] = ["gpu_time_ms", "edge_throughput"];
pub const STATISTICS: [&str; 5] = ["mean", "median", "std", "min", "max"];
const KEY_COLUMNS: [&str; 3] = ["graph", "source", "success"];

/// One benchmark invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRow {
    pub graph: String,
    pub source: Option<u64>,
    pub success: bool,
    pub gpu_time_ms: Option<f64>,
    pub edge_throughput: Option<f64>,
}

impl RunRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "gpu_time_ms" => self.gpu_time_ms,
            "edge_throughput" => self.edge_throughput,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// `None` for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        Some(Self {
            mean,
            median,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
        })
    }

    pub fn get(&self, statistic: &str) -> Option<f64> {
        match statistic {
            "mean" => Some(self.mean),
            "median" => Some(self.median),
            "std" => Some(self.std),
            "min" => Some(self.min),
            "max" => Some(self.max),
            _ => None,
        }
    }
}

/// Per-graph summary over all of its runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub graph: String,
    pub source: Option<u64>,
    pub success: bool,
    pub gpu_time_ms: Option<Stats>,
    pub edge_throughput: Option<Stats>,
}

impl AggregateRow {
    pub fn metric(&self, name: &str) -> Option<&Stats> {
        match name {
            "gpu_time_ms" => self.gpu_time_ms.as_ref(),
            "edge_throughput" => self.edge_throughput.as_ref(),
            _ => None,
        }
    }
}

/// Groups rows by graph name (groups come out sorted by name). The source is
/// taken from the first run, success is the AND over all runs, and missing
/// metric values are ignored.
pub fn aggregate(rows: &[RunRow]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<&str, Vec<&RunRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.graph.as_str()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(graph, group)| {
            let stats = |metric: &str| {
                let values: Vec<f64> = group.iter().filter_map(|row| row.metric(metric)).collect();
                Stats::from_values(&values)
            };
            AggregateRow {
                graph: graph.to_string(),
                source: group[0].source,
                success: group.iter().all(|row| row.success),
                gpu_time_ms: stats("gpu_time_ms"),
                edge_throughput: stats("edge_throughput"),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    Raw(Vec<RunRow>),
    Aggregated(Vec<AggregateRow>),
}

impl ResultSet {
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
        match self {
            ResultSet::Raw(_) => headers.extend(METRICS.iter().map(|m| m.to_string())),
            ResultSet::Aggregated(_) => {
                for metric in METRICS {
                    for statistic in STATISTICS {
                        headers.push(format!("{metric}_{statistic}"));
                    }
                }
            }
        }
        headers
    }

    /// Cells as text; absent values are `None`.
    pub fn records(&self) -> Vec<Vec<Option<String>>> {
        match self {
            ResultSet::Raw(rows) => rows
                .iter()
                .map(|row| {
                    let mut record = key_cells(&row.graph, row.source, row.success);
                    record.extend(METRICS.iter().map(|m| row.metric(m).map(format_float)));
                    record
                })
                .collect(),
            ResultSet::Aggregated(rows) => rows
                .iter()
                .map(|row| {
                    let mut record = key_cells(&row.graph, row.source, row.success);
                    for metric in METRICS {
                        for statistic in STATISTICS {
                            record.push(
                                row.metric(metric)
                                    .and_then(|stats| stats.get(statistic))
                                    .map(format_float),
                            );
                        }
                    }
                    record
                })
                .collect(),
        }
    }

    pub fn write_csv_to<W: io::Write>(&self, writer: W) -> Result<(), GdmError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(self.headers())
            .map_err(|err| GdmError::Csv(err.to_string()))?;
        for record in self.records() {
            writer
                .write_record(record.iter().map(|cell| cell.as_deref().unwrap_or("")))
                .map_err(|err| GdmError::Csv(err.to_string()))?;
        }
        writer.flush().map_err(|err| GdmError::Csv(err.to_string()))?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), GdmError> {
        let file = std::fs::File::create(path)
            .map_err(|err| GdmError::Filesystem(format!("{}: {err}", path.display())))?;
        self.write_csv_to(file)
    }

    /// Right-aligned text table with a leading row index.
    pub fn to_table(&self) -> String {
        let headers = self.headers();
        let records = self.records();

        let mut columns: Vec<Vec<String>> = Vec::with_capacity(headers.len() + 1);
        columns.push(
            std::iter::once(String::new())
                .chain((0..records.len()).map(|i| i.to_string()))
                .collect(),
        );
        for (idx, header) in headers.iter().enumerate() {
            columns.push(
                std::iter::once(header.clone())
                    .chain(records.iter().map(|record| {
                        record[idx].clone().unwrap_or_else(|| "NaN".to_string())
                    }))
                    .collect(),
            );
        }

        let widths: Vec<usize> = columns
            .iter()
            .map(|column| column.iter().map(|cell| cell.len()).max().unwrap_or(0))
            .collect();

        let mut out = String::new();
        for line in 0..=records.len() {
            let cells: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(column, width)| format!("{:>width$}", column[line], width = *width))
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        }
        out
    }
}

fn key_cells(graph: &str, source: Option<u64>, success: bool) -> Vec<Option<String>> {
    vec![
        Some(graph.to_string()),
        source.map(|s| s.to_string()),
        Some(success.to_string()),
    ]
}

fn format_float(value: f64) -> String {
    format!("{value}")
}

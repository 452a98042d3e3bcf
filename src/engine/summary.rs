//! Aggregated run data and summary outputs
//!
//! [`SummaryData`] is what the summary hook receives once all virtual users
//! have finished. It is serializable so a run can be exported as JSON and
//! rendered again later.

use std::collections::BTreeMap;
use std::path::PathBuf;

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

use super::executor::Options;
use crate::common::paths::ensure_parent_dir;
use crate::common::{Error, Result};

/// Everything recorded during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryData {
    pub options: Options,
    pub state: RunState,
    /// Check tallies grouped by group path (`""` is the root group)
    pub groups: Vec<GroupChecks>,
    pub metrics: BTreeMap<String, MetricSummary>,
}

impl SummaryData {
    /// Look up a metric by name
    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    /// Total `(passes, fails)` over every check
    pub fn check_totals(&self) -> (u64, u64) {
        self.groups
            .iter()
            .flat_map(|g| g.checks.iter())
            .fold((0, 0), |(p, f), c| (p + c.passes, f + c.fails))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub test_run_duration_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChecks {
    pub path: String,
    pub checks: Vec<CheckSummary>,
}

impl GroupChecks {
    pub fn name(&self) -> &str {
        group_name(&self.path)
    }
}

/// Last segment of a group path, e.g. `LOGIN` for `::LOGIN`
pub fn group_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or("")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricSummary {
    Trend(TrendStats),
    Counter { count: u64, rate: f64 },
    Rate { passes: u64, fails: u64, rate: f64 },
}

/// Significant figures kept by trend histograms
const HISTOGRAM_SIGFIGS: u8 = 3;

/// Statistics of a trend, values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    #[serde(rename = "p(90)")]
    pub p90: f64,
    #[serde(rename = "p(95)")]
    pub p95: f64,
}

impl TrendStats {
    /// Compute stats; `None` for an empty trend
    ///
    /// Samples go through a histogram at microsecond resolution. Count, avg,
    /// min and max are exact; percentiles come from the histogram and stay
    /// within `[min, max]`.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut histogram = Histogram::<u64>::new(HISTOGRAM_SIGFIGS).ok()?;
        let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
        for &ms in samples {
            histogram.record(to_micros(ms)).ok()?;
            min = min.min(ms);
            max = max.max(ms);
            sum += ms;
        }
        let quantile = |q: f64| (histogram.value_at_quantile(q) as f64 / 1000.0).max(min).min(max);

        Some(Self {
            count: samples.len(),
            avg: sum / samples.len() as f64,
            min,
            med: quantile(0.5),
            max,
            p90: quantile(0.9),
            p95: quantile(0.95),
        })
    }
}

fn to_micros(ms: f64) -> u64 {
    (ms.max(0.0) * 1000.0).round() as u64
}

/// Where a rendered summary goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Rendered summary content keyed by destination
#[derive(Debug, Clone, Default)]
pub struct SummaryOutputs {
    entries: Vec<(OutputTarget, String)>,
}

impl SummaryOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, target: OutputTarget, content: String) -> Self {
        self.entries.retain(|(t, _)| t != &target);
        self.entries.push((target, content));
        self
    }

    pub fn get(&self, target: &OutputTarget) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, content)| content.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write files (creating parent directories) and print stdout entries
    pub fn write(&self) -> Result<()> {
        for (target, content) in &self.entries {
            match target {
                OutputTarget::Stdout => println!("{}", content),
                OutputTarget::File(path) => {
                    ensure_parent_dir(path).map_err(|e| Error::report_write(path, &e))?;
                    std::fs::write(path, content).map_err(|e| Error::report_write(path, &e))?;
                    tracing::info!("Wrote summary to {}", path.display());
                }
            }
        }
        Ok(())
    }
}

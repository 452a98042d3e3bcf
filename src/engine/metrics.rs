//! Metric registry shared by all virtual users
//!
//! Trends, counters, rates and check tallies are append-only during a run.
//! Everything sits behind one mutex; appends are tiny compared to the HTTP
//! calls they measure.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::executor::Options;
use super::summary::{CheckSummary, GroupChecks, MetricSummary, RunState, SummaryData, TrendStats};

pub const CHECKS: &str = "checks";
pub const GROUP_DURATION: &str = "group_duration";
pub const HTTP_REQS: &str = "http_reqs";
pub const HTTP_REQ_DURATION: &str = "http_req_duration";
pub const HTTP_REQ_FAILED: &str = "http_req_failed";
pub const HTTP_REQ_WAITING: &str = "http_req_waiting";
pub const ITERATIONS: &str = "iterations";
pub const ITERATIONS_ABORTED: &str = "iterations_aborted";
pub const ITERATION_DURATION: &str = "iteration_duration";

#[derive(Default)]
struct Registry {
    trends: BTreeMap<String, Vec<f64>>,
    counters: BTreeMap<String, u64>,
    /// (non-zero samples, total samples)
    rates: BTreeMap<String, (u64, u64)>,
    /// Groups in first-seen order
    groups: Vec<GroupChecks>,
}

impl Registry {
    fn add_rate(&mut self, name: &str, value: bool) {
        let entry = self.rates.entry(name.to_string()).or_default();
        if value {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
}

/// Concurrent append-only metric store
#[derive(Default)]
pub struct Metrics {
    inner: Mutex<Registry>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A panicking VU cannot leave a half-applied append behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a sample to a named trend
    pub fn add_trend(&self, name: &str, value: f64) {
        self.lock()
            .trends
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    /// Increment a named counter
    pub fn add_counter(&self, name: &str, n: u64) {
        *self.lock().counters.entry(name.to_string()).or_default() += n;
    }

    /// Add a boolean sample to a named rate
    pub fn add_rate(&self, name: &str, value: bool) {
        self.lock().add_rate(name, value);
    }

    /// Tally a check result under its group and feed the `checks` rate
    pub fn record_check(&self, group: &str, name: &str, passed: bool, tags: &[(&str, &str)]) {
        let mut registry = self.lock();
        registry.add_rate(CHECKS, passed);

        let index = match registry.groups.iter().position(|g| g.path == group) {
            Some(index) => index,
            None => {
                registry.groups.push(GroupChecks {
                    path: group.to_string(),
                    checks: Vec::new(),
                });
                registry.groups.len() - 1
            }
        };
        let checks = &mut registry.groups[index].checks;

        let check = match checks.iter().position(|c| c.name == name) {
            Some(i) => &mut checks[i],
            None => {
                checks.push(CheckSummary {
                    name: name.to_string(),
                    passes: 0,
                    fails: 0,
                    tags: BTreeMap::new(),
                });
                let last = checks.len() - 1;
                &mut checks[last]
            }
        };

        if passed {
            check.passes += 1;
        } else {
            check.fails += 1;
        }
        for (key, value) in tags {
            check.tags.insert(key.to_string(), value.to_string());
        }
    }

    /// All samples of a trend, in append order
    pub fn trend_values(&self, name: &str) -> Vec<f64> {
        self.lock().trends.get(name).cloned().unwrap_or_default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// `(non-zero, total)` samples of a rate, if any were added
    pub fn rate(&self, name: &str) -> Option<(u64, u64)> {
        self.lock().rates.get(name).copied()
    }

    /// Tallies for one check, as `(passes, fails)`
    pub fn check(&self, group: &str, name: &str) -> Option<(u64, u64)> {
        self.lock()
            .groups
            .iter()
            .find(|g| g.path == group)
            .and_then(|g| g.checks.iter().find(|c| c.name == name))
            .map(|c| (c.passes, c.fails))
    }

    /// Aggregate everything recorded so far for the summary hook
    pub fn snapshot(&self, options: &Options, elapsed: Duration) -> SummaryData {
        let registry = self.lock();
        let secs = elapsed.as_secs_f64();
        let mut metrics = BTreeMap::new();

        for (name, samples) in &registry.trends {
            if let Some(stats) = TrendStats::from_samples(samples) {
                metrics.insert(name.clone(), MetricSummary::Trend(stats));
            }
        }
        for (name, count) in &registry.counters {
            let rate = if secs > 0.0 { *count as f64 / secs } else { 0.0 };
            metrics.insert(name.clone(), MetricSummary::Counter { count: *count, rate });
        }
        for (name, (passes, total)) in &registry.rates {
            let rate = if *total > 0 {
                *passes as f64 / *total as f64
            } else {
                0.0
            };
            metrics.insert(
                name.clone(),
                MetricSummary::Rate {
                    passes: *passes,
                    fails: total - passes,
                    rate,
                },
            );
        }

        SummaryData {
            options: options.clone(),
            state: RunState {
                test_run_duration_ms: secs * 1000.0,
            },
            groups: registry.groups.clone(),
            metrics,
        }
    }
}

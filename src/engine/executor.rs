//! Virtual user executor
//!
//! Runs a fixed number of virtual users, each executing the scenario's
//! iteration a fixed number of times, then hands the aggregated data to the
//! scenario's summary hook.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Instrument;

use super::group::Group;
use super::http::{HttpClient, TransportError};
use super::metrics::{self, Metrics};
use super::summary::{SummaryData, SummaryOutputs};
use crate::common::Result;

/// Virtual users and iterations per virtual user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default = "default_vus")]
    pub vus: usize,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            vus: default_vus(),
            iterations: default_iterations(),
        }
    }
}

fn default_vus() -> usize {
    2
}
fn default_iterations() -> usize {
    2
}

/// Why an iteration stopped early
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IterationError {
    /// A fatal validation failure; later phases of the iteration are skipped
    #[error("Iteration aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl IterationError {
    pub fn abort(reason: impl Into<String>) -> Self {
        Self::Aborted(reason.into())
    }
}

/// Per-iteration handle to the engine
pub struct IterationContext {
    pub vu: usize,
    pub iteration: usize,
    http: HttpClient,
    metrics: Arc<Metrics>,
}

impl IterationContext {
    pub fn new(vu: usize, iteration: usize, http: HttpClient, metrics: Arc<Metrics>) -> Self {
        Self {
            vu,
            iteration,
            http,
            metrics,
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Enter a top-level group
    pub fn group(&self, name: &str) -> Group {
        Group::root(self.metrics.clone()).enter(name)
    }
}

/// What a load test defines: one iteration and the summary hook
#[async_trait]
pub trait Scenario: Send + Sync + 'static {
    async fn iteration(&self, ctx: &IterationContext) -> std::result::Result<(), IterationError>;

    /// Called once after every virtual user finished
    fn handle_summary(&self, data: &SummaryData) -> Result<SummaryOutputs>;
}

/// Result of a complete run
#[derive(Debug)]
pub struct RunOutcome {
    pub data: SummaryData,
    pub outputs: SummaryOutputs,
}

pub struct Executor {
    options: Options,
    http: HttpClient,
    metrics: Arc<Metrics>,
}

impl Executor {
    pub fn new(options: Options, http: HttpClient, metrics: Arc<Metrics>) -> Self {
        Self {
            options,
            http,
            metrics,
        }
    }

    /// Run all virtual users to completion and invoke the summary hook
    pub async fn run<S: Scenario>(&self, scenario: Arc<S>) -> Result<RunOutcome> {
        let started = Instant::now();
        tracing::info!(
            vus = self.options.vus,
            iterations = self.options.iterations,
            "Starting load test"
        );

        let handles: Vec<_> = (1..=self.options.vus)
            .map(|vu| {
                tokio::spawn(run_vu(
                    vu,
                    self.options.iterations,
                    scenario.clone(),
                    self.http.clone(),
                    self.metrics.clone(),
                ))
            })
            .collect();

        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::error!("Virtual user task failed: {}", e);
            }
        }

        let data = self.metrics.snapshot(&self.options, started.elapsed());
        tracing::info!(
            duration_ms = data.state.test_run_duration_ms,
            "Load test finished"
        );

        let outputs = scenario.handle_summary(&data)?;
        Ok(RunOutcome { data, outputs })
    }
}

async fn run_vu<S: Scenario>(
    vu: usize,
    iterations: usize,
    scenario: Arc<S>,
    http: HttpClient,
    registry: Arc<Metrics>,
) {
    for iteration in 0..iterations {
        let ctx = IterationContext::new(vu, iteration, http.clone(), registry.clone());
        let span = tracing::info_span!("iteration", vu, iter = iteration);
        let started = Instant::now();

        let result = scenario.iteration(&ctx).instrument(span).await;

        registry.add_trend(
            metrics::ITERATION_DURATION,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        registry.add_counter(metrics::ITERATIONS, 1);

        if let Err(e) = result {
            tracing::warn!(vu, iter = iteration, "{}", e);
            registry.add_counter(metrics::ITERATIONS_ABORTED, 1);
        }
    }
}

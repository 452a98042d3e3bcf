//! CLI command handling
//!
//! Builds the engine from configuration, runs the scenario and writes the
//! summary outputs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::Commands;
use crate::common::config::{Config, Overrides};
use crate::common::paths::ensure_parent_dir;
use crate::common::{Error, Result};
use crate::engine::{Executor, HttpClient, Metrics, ReqwestTransport, SummaryData};
use crate::scenario::CarsScenario;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            vus,
            iterations,
            base_url,
            http_debug,
            summary_export,
        } => {
            let config = Config::load(config.as_deref())?.with_overrides(Overrides {
                base_url,
                vus,
                iterations,
                http_debug,
            })?;

            let data = run(&config).await?;

            if let Some(path) = summary_export {
                export_summary(&data, &path)?;
            }
            Ok(())
        }

        Commands::Report { input, config } => {
            let config = Config::load(config.as_deref())?;
            let content = std::fs::read_to_string(&input).map_err(|e| Error::FileRead {
                path: input.display().to_string(),
                error: e.to_string(),
            })?;
            let data: SummaryData = serde_json::from_str(&content)?;

            CarsScenario::from_config(&config)
                .handle_summary(&data)?
                .write()
        }
    }
}

/// Run the scenario with the given configuration and write its outputs
pub async fn run(config: &Config) -> Result<SummaryData> {
    let transport = ReqwestTransport::new(Duration::from_secs(config.http.request_timeout_secs))?;
    let metrics = Arc::new(Metrics::new());
    let http = HttpClient::new(Arc::new(transport), metrics.clone(), config.http_debug);
    let executor = Executor::new(config.options.clone(), http, metrics);

    tracing::info!(base_url = %config.api_root(), "Target API");
    let outcome = executor
        .run(Arc::new(CarsScenario::from_config(config)))
        .await?;

    outcome.outputs.write()?;
    Ok(outcome.data)
}

fn export_summary(data: &SummaryData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    ensure_parent_dir(path).map_err(|e| Error::report_write(path, &e))?;
    std::fs::write(path, json).map_err(|e| Error::report_write(path, &e))?;
    tracing::info!("Wrote summary export to {}", path.display());
    Ok(())
}

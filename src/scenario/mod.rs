//! The cars API scenario
//!
//! One iteration logs in, forwards the access token to the cars listing and
//! validates both responses. Each phase runs in its own group and appends its
//! time-to-first-byte to a dedicated trend before it is validated, so a
//! phase that got a response always contributes a sample.

mod body;
mod phases;

pub use body::{CarsBody, ExpectedBody, LoginBody, ResponseBody, EXPECTED_CARS};
pub use phases::{
    get_cars, is_response_valid, login, validate_cars, validate_login, ACCESS_TOKEN_HEADER,
    CHECK_BODY, CHECK_STATUS, CHECK_TOKEN_SENT,
};

pub use crate::engine::IterationError;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::config::Config;
use crate::common::Result;
use crate::engine::render::{html_report, text_summary, TextOptions};
use crate::engine::{IterationContext, OutputTarget, Scenario, SummaryData, SummaryOutputs};

/// Trend of LOGIN time-to-first-byte samples
pub const LOGIN_TTFB: &str = "LOGIN_TTFB";
/// Trend of CARS time-to-first-byte samples
pub const CARS_TTFB: &str = "CARS_TTFB";

const REPORT_TITLE: &str = "Cars API load test";

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "tester".to_string(),
            password: "passw0rd".to_string(),
        }
    }
}

/// LOGIN → CARS against one API root
#[derive(Debug, Clone)]
pub struct CarsScenario {
    api_root: String,
    credentials: Credentials,
    html_path: PathBuf,
}

impl CarsScenario {
    pub fn new(api_root: &str, credentials: Credentials, html_path: PathBuf) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            credentials,
            html_path,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_root(),
            config.credentials.clone(),
            config.summary.html_path.clone(),
        )
    }

    /// Run one LOGIN → CARS iteration
    pub async fn run_iteration(
        &self,
        ctx: &IterationContext,
    ) -> std::result::Result<(), IterationError> {
        let http = ctx.http();

        let access_token = {
            let group = ctx.group("LOGIN");
            let response = login(
                http,
                &self.api_root,
                &self.credentials.username,
                &self.credentials.password,
            )
            .await?;
            group.metrics().add_trend(LOGIN_TTFB, response.timings.waiting);

            let access_token = response.header(ACCESS_TOKEN_HEADER).map(str::to_owned);
            validate_login(&group, &response)?;
            access_token
        };

        let access_token = access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| IterationError::abort("Access-Token missing from login response"))?;

        let group = ctx.group("CARS");
        let response = get_cars(http, &self.api_root, &access_token).await?;
        group.metrics().add_trend(CARS_TTFB, response.timings.waiting);
        validate_cars(&group, &response)?;

        tracing::debug!("Iteration completed");
        Ok(())
    }

    /// Render the HTML report and the console summary
    pub fn handle_summary(&self, data: &SummaryData) -> Result<SummaryOutputs> {
        let html = html_report(data, REPORT_TITLE)?;

        Ok(SummaryOutputs::new()
            .insert(OutputTarget::File(self.html_path.clone()), html)
            .insert(
                OutputTarget::Stdout,
                text_summary(
                    data,
                    &TextOptions {
                        indent: " ",
                        enable_colors: true,
                    },
                ),
            ))
    }
}

#[async_trait]
impl Scenario for CarsScenario {
    async fn iteration(&self, ctx: &IterationContext) -> std::result::Result<(), IterationError> {
        self.run_iteration(ctx).await
    }

    fn handle_summary(&self, data: &SummaryData) -> Result<SummaryOutputs> {
        CarsScenario::handle_summary(self, data)
    }
}

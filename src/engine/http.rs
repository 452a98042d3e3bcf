//! HTTP primitives
//!
//! [`Transport`] is the seam between the scenario and the network: the
//! reqwest implementation is used for real runs, and tests drive the
//! scenario with canned [`ResponseRecord`]s instead.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metrics::{self, Metrics};
use crate::common::{Error, Result};

/// HTTP methods used by the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a request header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Response headers with case-insensitive lookup
///
/// Names are stored lowercased; repeated headers are joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Insert a header, appending to an existing value of the same name
    pub fn append(&mut self, name: &str, value: &str) {
        self.0
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Look up a header by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_header_map(map: &reqwest::header::HeaderMap) -> Self {
        let mut headers = Self::default();
        for (name, value) in map {
            headers.append(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        headers
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Headers {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut headers = Self::default();
        for (name, value) in pairs {
            headers.append(name, value);
        }
        headers
    }
}

/// Timing breakdown of a request, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Time from sending the request until the response headers arrived
    pub waiting: f64,
    /// Total time including reading the body
    pub duration: f64,
}

impl Timings {
    pub fn from_durations(waiting: Duration, duration: Duration) -> Self {
        Self {
            waiting: waiting.as_secs_f64() * 1000.0,
            duration: duration.as_secs_f64() * 1000.0,
        }
    }
}

/// The result of one HTTP call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub method: Method,
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    /// Raw body text, not yet interpreted
    pub body: String,
    pub timings: Timings,
}

impl ResponseRecord {
    /// Shorthand for a header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// A request that never produced a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{method} {url} failed: {message}")]
pub struct TransportError {
    pub method: Method,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(method: Method, url: &str, message: impl ToString) -> Self {
        Self {
            method,
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Sends requests and measures their timings
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> std::result::Result<ResponseRecord, TransportError>;
}

/// Transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qatools-loadtest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> std::result::Result<ResponseRecord, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(request.method, &request.url, e))?;
        let waiting = started.elapsed();

        let status = response.status().as_u16();
        let headers = Headers::from_header_map(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(request.method, &request.url, e))?;
        let duration = started.elapsed();

        Ok(ResponseRecord {
            method: request.method,
            url: request.url,
            status,
            headers,
            body,
            timings: Timings::from_durations(waiting, duration),
        })
    }
}

/// Client handed to iterations
///
/// Wraps a transport and records the built-in request metrics for every
/// call. Cloning is cheap.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    metrics: Arc<Metrics>,
    debug: bool,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, metrics: Arc<Metrics>, debug: bool) -> Self {
        Self {
            transport,
            metrics,
            debug,
        }
    }

    /// Send a request, recording `http_reqs`, `http_req_failed` and timings
    pub async fn request(
        &self,
        request: Request,
    ) -> std::result::Result<ResponseRecord, TransportError> {
        let method = request.method;
        let url = request.url.clone();
        self.metrics.add_counter(metrics::HTTP_REQS, 1);

        match self.transport.send(request).await {
            Ok(response) => {
                self.metrics
                    .add_rate(metrics::HTTP_REQ_FAILED, response.status >= 400);
                self.metrics
                    .add_trend(metrics::HTTP_REQ_WAITING, response.timings.waiting);
                self.metrics
                    .add_trend(metrics::HTTP_REQ_DURATION, response.timings.duration);

                tracing::debug!(
                    %method,
                    %url,
                    status = response.status,
                    waiting_ms = response.timings.waiting,
                    "Response received"
                );
                if self.debug {
                    log_response(&response);
                }
                Ok(response)
            }
            Err(e) => {
                self.metrics.add_rate(metrics::HTTP_REQ_FAILED, true);
                tracing::debug!(%method, %url, error = %e.message, "Request failed");
                Err(e)
            }
        }
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> std::result::Result<ResponseRecord, TransportError> {
        let request = headers
            .iter()
            .fold(Request::new(Method::Get, url), |req, (name, value)| {
                req.header(name, value)
            });
        self.request(request).await
    }

    pub async fn post(&self, url: &str) -> std::result::Result<ResponseRecord, TransportError> {
        self.request(Request::new(Method::Post, url)).await
    }
}

fn log_response(response: &ResponseRecord) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => tracing::info!("Response metrics\n{}", json),
        Err(e) => tracing::warn!("Could not serialize response: {}", e),
    }
}

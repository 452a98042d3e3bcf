//! Minimal load-testing engine
//!
//! Provides what a scenario needs from its runtime: an HTTP client with
//! timings, grouped checks, named trends, a fixed virtual-user executor and
//! summary rendering. Ramp-up schedules and distributed execution are not
//! supported.

pub mod executor;
pub mod group;
pub mod http;
pub mod metrics;
pub mod render;
pub mod summary;

pub use executor::{Executor, IterationContext, IterationError, Options, RunOutcome, Scenario};
pub use group::Group;
pub use http::{
    Headers, HttpClient, Method, ReqwestTransport, Request, ResponseRecord, Timings, Transport,
    TransportError,
};
pub use metrics::Metrics;
pub use summary::{OutputTarget, SummaryData, SummaryOutputs};

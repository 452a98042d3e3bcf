//! End-to-end tests for the load test
//!
//! These tests run the real reqwest transport against a small HTTP/1.1 stub
//! of the cars API listening on localhost:
//! 1. Starting the stub on an ephemeral port
//! 2. Running the scenario through the executor
//! 3. Verifying trends, check tallies and the rendered outputs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use loadtest::engine::{metrics, Executor, HttpClient, Metrics, Options, OutputTarget, ReqwestTransport};
use loadtest::scenario::{Credentials, CARS_TTFB, CHECK_BODY, CHECK_TOKEN_SENT, LOGIN_TTFB};
use loadtest::CarsScenario;

const TOKEN: &str = "tok-123";

/// How the stub answers the cars listing
#[derive(Clone, Copy)]
enum CarsMode {
    Correct,
    Shuffled,
    Garbage,
}

/// Start the stub API and return its base URL
async fn start_stub(cars_mode: CarsMode) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("Stub has no local address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&buf).to_string();
                let response = respond(&request, cars_mode);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

fn respond(request: &str, cars_mode: CarsMode) -> String {
    let mut lines = request.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let token = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("access-token"))
        .map(|(_, value)| value.trim().to_string());

    match (method, target) {
        ("POST", "/api/login.php?username=tester&password=passw0rd") => http_response(
            200,
            &[("Access-Token", TOKEN)],
            r#"{"status":"authorized"}"#,
        ),
        ("POST", t) if t.starts_with("/api/login.php") => {
            http_response(401, &[], r#"{"status":"unauthorized"}"#)
        }
        ("GET", "/api/cars") if token.as_deref() == Some(TOKEN) => {
            let body = match cars_mode {
                CarsMode::Correct => r#"["Ford Fiesta","BMW X5","Porsche 911","Lamborghini"]"#,
                CarsMode::Shuffled => r#"["BMW X5","Ford Fiesta","Porsche 911","Lamborghini"]"#,
                CarsMode::Garbage => "<html>oops</html>",
            };
            http_response(200, &[], body)
        }
        ("GET", "/api/cars") => http_response(401, &[], r#"{"error":"forbidden"}"#),
        _ => http_response(404, &[], "not found"),
    }
}

fn http_response(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str("\r\n");
    response.push_str(body);
    response
}

struct Run {
    registry: Arc<Metrics>,
    outcome: loadtest::engine::RunOutcome,
}

async fn run_against(base_url: &str, credentials: Credentials, options: Options) -> Run {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).expect("Failed to build client");
    let registry = Arc::new(Metrics::new());
    let http = HttpClient::new(Arc::new(transport), registry.clone(), false);
    let executor = Executor::new(options, http, registry.clone());
    let scenario = CarsScenario::new(base_url, credentials, PathBuf::from("reports/summary.html"));

    let outcome = executor
        .run(Arc::new(scenario))
        .await
        .expect("Summary hook failed");
    Run { registry, outcome }
}

#[tokio::test]
async fn test_full_run_against_stub() {
    let base_url = start_stub(CarsMode::Correct).await;

    let run = run_against(&base_url, Credentials::default(), Options::default()).await;

    assert_eq!(run.registry.counter(metrics::ITERATIONS), 4);
    assert_eq!(run.registry.counter(metrics::ITERATIONS_ABORTED), 0);
    assert_eq!(run.registry.counter(metrics::HTTP_REQS), 8);
    assert_eq!(run.registry.trend_values(LOGIN_TTFB).len(), 4);
    assert_eq!(run.registry.trend_values(CARS_TTFB).len(), 4);
    assert!(run
        .registry
        .trend_values(LOGIN_TTFB)
        .iter()
        .all(|ms| *ms >= 0.0));
    assert_eq!(run.registry.check("::LOGIN", CHECK_TOKEN_SENT), Some((4, 0)));
    assert_eq!(run.outcome.data.check_totals(), (20, 0));
}

#[tokio::test]
async fn test_wrong_credentials_abort_every_iteration() {
    let base_url = start_stub(CarsMode::Correct).await;
    let credentials = Credentials {
        username: "tester".to_string(),
        password: "wrong".to_string(),
    };

    let run = run_against(&base_url, credentials, Options { vus: 1, iterations: 3 }).await;

    assert_eq!(run.registry.counter(metrics::ITERATIONS_ABORTED), 3);
    assert_eq!(run.registry.counter(metrics::HTTP_REQS), 3);
    assert_eq!(run.registry.trend_values(LOGIN_TTFB).len(), 3);
    assert!(run.registry.trend_values(CARS_TTFB).is_empty());
}

#[tokio::test]
async fn test_shuffled_cars_fail_body_check() {
    let base_url = start_stub(CarsMode::Shuffled).await;

    let run = run_against(&base_url, Credentials::default(), Options { vus: 1, iterations: 1 }).await;

    assert_eq!(run.registry.counter(metrics::ITERATIONS_ABORTED), 1);
    assert_eq!(run.registry.check("::CARS", CHECK_BODY), Some((0, 1)));
    assert_eq!(run.registry.trend_values(CARS_TTFB).len(), 1);
}

#[tokio::test]
async fn test_garbage_body_is_a_check_failure_not_a_crash() {
    let base_url = start_stub(CarsMode::Garbage).await;

    let run = run_against(&base_url, Credentials::default(), Options { vus: 2, iterations: 1 }).await;

    assert_eq!(run.registry.counter(metrics::ITERATIONS), 2);
    assert_eq!(run.registry.check("::CARS", CHECK_BODY), Some((0, 2)));
}

#[tokio::test]
async fn test_unreachable_api_aborts_with_transport_error() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let run = run_against(&base_url, Credentials::default(), Options { vus: 1, iterations: 2 }).await;

    assert_eq!(run.registry.counter(metrics::ITERATIONS_ABORTED), 2);
    assert_eq!(run.registry.rate(metrics::HTTP_REQ_FAILED), Some((2, 2)));
    assert!(run.registry.trend_values(LOGIN_TTFB).is_empty());
}

#[tokio::test]
async fn test_summary_outputs_render_run() {
    let base_url = start_stub(CarsMode::Correct).await;

    let run = run_against(&base_url, Credentials::default(), Options { vus: 1, iterations: 1 }).await;

    let html = run
        .outcome
        .outputs
        .get(&OutputTarget::File(PathBuf::from("reports/summary.html")))
        .expect("HTML report missing");
    assert!(html.contains("LOGIN_TTFB"));
    assert!(html.contains("CARS_TTFB"));

    let text = run
        .outcome
        .outputs
        .get(&OutputTarget::Stdout)
        .expect("Text summary missing");
    assert!(text.contains("LOGIN"));
    assert!(text.contains("status was 200"));
}

#[tokio::test]
async fn test_summary_export_roundtrip_renders_same_checks() {
    let base_url = start_stub(CarsMode::Correct).await;
    let run = run_against(&base_url, Credentials::default(), Options { vus: 1, iterations: 1 }).await;

    let json = serde_json::to_string(&run.outcome.data).unwrap();
    let data: loadtest::engine::SummaryData = serde_json::from_str(&json).unwrap();

    assert_eq!(data.check_totals(), run.outcome.data.check_totals());
    assert_eq!(data.metrics.len(), run.outcome.data.metrics.len());
}

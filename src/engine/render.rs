//! Summary renderers
//!
//! `text_summary` produces the console summary (checks per group, then one
//! line per metric); `html_report` fills the `templates/summary.html` page.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};
use minijinja::{context, Environment};
use serde::Serialize;

use super::metrics;
use super::summary::{group_name, CheckSummary, MetricSummary, SummaryData, TrendStats};

/// Options for [`text_summary`]
#[derive(Debug, Clone)]
pub struct TextOptions<'a> {
    pub indent: &'a str,
    pub enable_colors: bool,
}

impl Default for TextOptions<'_> {
    fn default() -> Self {
        Self {
            indent: " ",
            enable_colors: true,
        }
    }
}

/// Format milliseconds the way durations are shown in summaries
pub fn format_duration(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.2}µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

fn trend_line(stats: &TrendStats) -> String {
    format!(
        "avg={} min={} med={} max={} p(90)={} p(95)={}",
        format_duration(stats.avg),
        format_duration(stats.min),
        format_duration(stats.med),
        format_duration(stats.max),
        format_duration(stats.p90),
        format_duration(stats.p95),
    )
}

fn percent(passes: u64, fails: u64) -> f64 {
    let total = passes + fails;
    if total == 0 {
        0.0
    } else {
        passes as f64 / total as f64 * 100.0
    }
}

/// Render the console summary
pub fn text_summary(data: &SummaryData, options: &TextOptions<'_>) -> String {
    let paint = |s: &str, f: fn(&str) -> ColoredString| -> String {
        if options.enable_colors {
            f(s).to_string()
        } else {
            s.to_string()
        }
    };
    let indent = options.indent;
    let mut out = String::new();

    for group in &data.groups {
        let depth = group.path.matches("::").count();
        let pad = format!("{}{}", indent, "  ".repeat(depth));

        if !group.path.is_empty() {
            let header = format!("█ {}", group.name());
            let _ = writeln!(out, "{}{}\n", indent, paint(&header, |s| s.bold()));
        }

        for check in &group.checks {
            write_check(&mut out, &pad, check, &paint);
        }
        out.push('\n');
    }

    let width = data.metrics.keys().map(|name| name.len()).max().unwrap_or(0) + 3;
    for (name, metric) in &data.metrics {
        let label = format!("{:.<width$}:", name, width = width);
        let value = match metric {
            MetricSummary::Trend(stats) => trend_line(stats),
            MetricSummary::Counter { count, rate } => format!("{:<6} {:.6}/s", count, rate),
            MetricSummary::Rate { passes, fails, rate } => {
                let line = format!("{:.2}% ✓ {} ✗ {}", rate * 100.0, passes, fails);
                // For checks a low rate is bad; for http_req_failed a high one is
                let bad = match name.as_str() {
                    metrics::HTTP_REQ_FAILED => *passes > 0,
                    _ => *fails > 0,
                };
                if bad {
                    paint(&line, |s| s.red())
                } else {
                    paint(&line, |s| s.green())
                }
            }
        };
        let _ = writeln!(out, "{}{} {}", indent, label, value);
    }

    out
}

fn write_check(
    out: &mut String,
    pad: &str,
    check: &CheckSummary,
    paint: &dyn Fn(&str, fn(&str) -> ColoredString) -> String,
) {
    if check.fails == 0 {
        let _ = writeln!(out, "{}{}", pad, paint(&format!("✓ {}", check.name), |s| s.green()));
        return;
    }

    let _ = writeln!(out, "{}{}", pad, paint(&format!("✗ {}", check.name), |s| s.red()));
    let _ = writeln!(
        out,
        "{} {}",
        pad,
        paint(
            &format!(
                "↳  {:.0}% — ✓ {} / ✗ {}",
                percent(check.passes, check.fails),
                check.passes,
                check.fails
            ),
            |s| s.dimmed()
        )
    );
}

const SUMMARY_TEMPLATE: &str = include_str!("templates/summary.html");

/// One headline number at the top of the HTML report
#[derive(Serialize)]
struct Tile {
    label: &'static str,
    value: u64,
    failing: bool,
}

fn tiles(data: &SummaryData) -> Vec<Tile> {
    let count = |name: &str| match data.metric(name) {
        Some(MetricSummary::Counter { count, .. }) => *count,
        _ => 0,
    };
    let failed_requests = match data.metric(metrics::HTTP_REQ_FAILED) {
        Some(MetricSummary::Rate { passes, .. }) => *passes,
        _ => 0,
    };
    let aborted = count(metrics::ITERATIONS_ABORTED);
    let (check_passes, check_fails) = data.check_totals();

    let tile = |label: &'static str, value: u64, failing: bool| Tile {
        label,
        value,
        failing,
    };
    vec![
        tile("Total requests", count(metrics::HTTP_REQS), false),
        tile("Failed requests", failed_requests, failed_requests > 0),
        tile("Iterations", count(metrics::ITERATIONS), false),
        tile("Aborted iterations", aborted, aborted > 0),
        tile("Checks passed", check_passes, false),
        tile("Checks failed", check_fails, check_fails > 0),
    ]
}

fn fixed(value: f64) -> String {
    format!("{:.2}", value)
}

fn group_label(path: String) -> String {
    group_name(&path).to_string()
}

/// Render a standalone HTML report
///
/// The template name ends in `.html`, so every interpolated value is
/// HTML-escaped.
pub fn html_report(data: &SummaryData, title: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_filter("duration", format_duration);
    env.add_filter("fixed", fixed);
    env.add_filter("group_name", group_label);
    env.add_template("summary.html", SUMMARY_TEMPLATE)?;

    env.get_template("summary.html")?.render(context! {
        title => title,
        data => data,
        tiles => tiles(data),
    })
}

//! Load-generator report parsing
//!
//! The report is free text, so parsing is an ordered list of line
//! classifiers, first match wins, each one pure and table-testable.
//! Parsing never fails outright: unrecognized lines are ignored, missing
//! fields stay zero, and numeric tokens that fail to convert degrade to
//! zero with a warning.

use crate::models::MetricsRecord;
use tracing::warn;

/// Percentile points tracked from the latency distribution.
pub const TRACKED_PERCENTILES: [u8; 5] = [10, 50, 75, 90, 99];

const RATE_LABEL: &str = "Requests/sec:";
const SIZE_LABEL: &str = "Size/request:";
const DURATION_MARKER: &str = "secs";

/// One classified report line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineValue {
    RequestsPerSec(f64),
    /// Bytes per response.
    SizePerRequest(f64),
    /// Response count for one status code.
    StatusCount { code: u16, count: u64 },
    /// Latency at one tracked percentile, in seconds.
    Percentile { point: u8, seconds: f64 },
}

/// Parse one raw report into a structured record.
///
/// `concurrency` is the controlled parameter of the current test case;
/// the report does not reliably state it, so the caller supplies it.
/// When a field appears on several lines the last match wins — the
/// report's final pass is authoritative.
pub fn parse(raw: &str, concurrency: u32) -> MetricsRecord {
    let mut record = MetricsRecord::empty(concurrency);
    for line in raw.lines() {
        match classify(line) {
            Some(LineValue::RequestsPerSec(v)) => record.requests_per_sec = v,
            Some(LineValue::SizePerRequest(v)) => record.size_per_request = v,
            Some(LineValue::StatusCount { code, count }) => {
                record.status_counts.insert(code, count);
            }
            Some(LineValue::Percentile { point, seconds }) => match point {
                10 => record.latency_p10 = seconds,
                50 => record.latency_p50 = seconds,
                75 => record.latency_p75 = seconds,
                90 => record.latency_p90 = seconds,
                99 => record.latency_p99 = seconds,
                _ => {}
            },
            None => {}
        }
    }
    record
}

/// Classify a single report line. Returns `None` for lines that carry
/// none of the tracked fields.
pub fn classify(line: &str) -> Option<LineValue> {
    let line = line.trim();
    if let Some(rest) = after_label(line, RATE_LABEL) {
        return Some(LineValue::RequestsPerSec(number_or_zero(rest.trim(), line)));
    }
    if let Some(rest) = after_label(line, SIZE_LABEL) {
        // First token only; trailing units ("bytes") are ignored.
        let token = rest.split_whitespace().next().unwrap_or("");
        return Some(LineValue::SizePerRequest(number_or_zero(token, line)));
    }
    if let Some(value) = classify_status(line) {
        return Some(value);
    }
    classify_percentile(line)
}

/// Suffix of `line` after `label`, if the label occurs anywhere in it.
fn after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.find(label).map(|at| &line[at + label.len()..])
}

/// Lines of the form `[NNN] <count> responses`, for any status code.
fn classify_status(line: &str) -> Option<LineValue> {
    let rest = line.strip_prefix('[')?;
    let (code_part, rest) = rest.split_once(']')?;
    let code: u16 = code_part.trim().parse().ok()?;
    let count = match rest.split_whitespace().next() {
        Some(token) => match token.parse::<u64>() {
            Ok(count) => count,
            Err(_) => {
                warn!(line, "unparseable response count in report line");
                0
            }
        },
        None => {
            warn!(line, "status line without a response count");
            0
        }
    };
    Some(LineValue::StatusCount { code, count })
}

/// Latency-distribution lines of the form `NN% in <seconds> secs`. Only
/// the tracked percentile points are kept.
fn classify_percentile(line: &str) -> Option<LineValue> {
    let (pct_part, rest) = line.split_once('%')?;
    let point: u8 = pct_part.trim().parse().ok()?;
    if !TRACKED_PERCENTILES.contains(&point) {
        return None;
    }
    let (duration_part, _) = rest.split_once(DURATION_MARKER)?;
    // First token after the percent sign that converts; hey prints
    // "50% in 0.0120 secs".
    let seconds = duration_part
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok());
    let seconds = seconds.unwrap_or_else(|| {
        warn!(line, "unparseable latency value in report line");
        0.0
    });
    Some(LineValue::Percentile { point, seconds })
}

fn number_or_zero(token: &str, line: &str) -> f64 {
    token.parse().unwrap_or_else(|_| {
        warn!(line, "unparseable numeric token in report line");
        0.0
    })
}

//! Run metrics
//!
//! One `Recorder` handle is shared by every actor in a run. It keeps
//! per-endpoint request statistics keyed by normalized label, per-action
//! outcome tallies, and per-kind actor counts, and turns into a `RunReport`
//! when the run ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::action::{ActionResult, Completion};

/// Latency statistics for one endpoint label
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub samples: Vec<Duration>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    /// Calculate percentile (0-100)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted = self.samples.clone();
        sorted.sort();

        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p95(&self) -> Option<Duration> {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }
}

/// Request statistics for one endpoint label
#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    pub requests: u64,
    pub failures: u64,
    pub latency: LatencyStats,
}

/// Outcome tallies for one (kind, action) pair
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionTally {
    pub ok: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Actor counts for one kind
#[derive(Debug, Clone, Copy, Default)]
pub struct KindTally {
    pub started: u64,
    pub bootstrap_failed: u64,
    pub completed: u64,
}

#[derive(Default)]
struct RecorderInner {
    endpoints: Mutex<HashMap<String, EndpointStats>>,
    actions: Mutex<HashMap<(&'static str, &'static str), ActionTally>>,
    kinds: Mutex<HashMap<&'static str, KindTally>>,
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    live: AtomicUsize,
}

/// Shared, internally synchronized metrics sink
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<RecorderInner>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request under its normalized label
    pub fn request(&self, label: &str, ok: bool, latency: Duration) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.inner.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        let mut endpoints = self
            .inner
            .endpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stats = endpoints.entry(label.to_string()).or_default();
        stats.requests += 1;
        if !ok {
            stats.failures += 1;
        }
        stats.latency.record(latency);
    }

    /// Record the outcome of one action iteration
    pub fn action(&self, kind: &'static str, name: &'static str, result: &ActionResult) {
        let mut actions = self
            .inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let tally = actions.entry((kind, name)).or_default();
        match result {
            Ok(Completion::Done) => tally.ok += 1,
            Ok(Completion::Skipped) => tally.skipped += 1,
            Err(_) => tally.failed += 1,
        }
    }

    pub fn actor_started(&self, kind: &'static str) {
        self.kind_tally(kind, |t| t.started += 1);
        self.inner.live.fetch_add(1, Ordering::SeqCst);
    }

    pub fn actor_finished(&self, kind: &'static str) {
        self.kind_tally(kind, |t| t.completed += 1);
        self.inner.live.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn actor_bootstrap_failed(&self, kind: &'static str) {
        self.kind_tally(kind, |t| t.bootstrap_failed += 1);
    }

    fn kind_tally(&self, kind: &'static str, update: impl FnOnce(&mut KindTally)) {
        let mut kinds = self
            .inner
            .kinds
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        update(kinds.entry(kind).or_default());
    }

    /// Actors currently past bootstrap and not yet exited
    pub fn live_actors(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub fn requests_total(&self) -> u64 {
        self.inner.requests_total.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.inner.requests_failed.load(Ordering::Relaxed)
    }

    /// Snapshot of one endpoint's stats, if any request was recorded for it
    pub fn endpoint(&self, label: &str) -> Option<EndpointStats> {
        self.inner
            .endpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .cloned()
    }

    /// Snapshot of one (kind, action) tally
    pub fn action_tally(&self, kind: &str, name: &str) -> Option<ActionTally> {
        self.inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, name))
            .copied()
    }

    /// Snapshot of one kind's actor counts
    pub fn kind(&self, kind: &str) -> Option<KindTally> {
        self.inner
            .kinds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .copied()
    }

    /// Build the final report for a finished run
    pub fn report(&self, run_id: Uuid, started_at: DateTime<Utc>, duration: Duration) -> RunReport {
        let mut kinds: Vec<KindReport> = self
            .inner
            .kinds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(kind, tally)| KindReport {
                kind: kind.to_string(),
                started: tally.started,
                bootstrap_failed: tally.bootstrap_failed,
                completed: tally.completed,
            })
            .collect();
        kinds.sort_by(|a, b| a.kind.cmp(&b.kind));

        let mut actions: Vec<ActionReport> = self
            .inner
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|((kind, action), tally)| ActionReport {
                kind: kind.to_string(),
                action: action.to_string(),
                ok: tally.ok,
                failed: tally.failed,
                skipped: tally.skipped,
            })
            .collect();
        actions.sort_by(|a, b| (&a.kind, &a.action).cmp(&(&b.kind, &b.action)));

        let mut endpoints: Vec<EndpointReport> = self
            .inner
            .endpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(label, stats)| EndpointReport {
                label: label.clone(),
                requests: stats.requests,
                failures: stats.failures,
                p50_ms: stats.latency.p50().map(to_ms),
                p95_ms: stats.latency.p95().map(to_ms),
                p99_ms: stats.latency.p99().map(to_ms),
            })
            .collect();
        endpoints.sort_by(|a, b| a.label.cmp(&b.label));

        let requests_total = self.requests_total();
        let requests_failed = self.requests_failed();
        let duration_secs = duration.as_secs_f64();
        let throughput_rps = if duration_secs > 0.0 {
            requests_total as f64 / duration_secs
        } else {
            0.0
        };
        let error_rate = if requests_total > 0 {
            requests_failed as f64 / requests_total as f64
        } else {
            0.0
        };

        RunReport {
            run_id,
            started_at,
            duration_secs,
            kinds,
            actions,
            endpoints,
            requests_total,
            requests_failed,
            throughput_rps,
            error_rate,
        }
    }
}

fn to_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Per-kind actor counts in the final report
#[derive(Debug, Clone, Serialize)]
pub struct KindReport {
    pub kind: String,
    pub started: u64,
    pub bootstrap_failed: u64,
    pub completed: u64,
}

/// Per-action outcome tallies in the final report
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub kind: String,
    pub action: String,
    pub ok: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Per-endpoint request stats in the final report
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub label: String,
    pub requests: u64,
    pub failures: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

/// Final summary of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub kinds: Vec<KindReport>,
    pub actions: Vec<ActionReport>,
    pub endpoints: Vec<EndpointReport>,
    pub requests_total: u64,
    pub requests_failed: u64,
    pub throughput_rps: f64,
    pub error_rate: f64,
}

impl RunReport {
    /// Generate the stdout summary
    pub fn render(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Shipload Run Report ===\n\n");

        report.push_str(&format!("Run:        {}\n", self.run_id));
        report.push_str(&format!(
            "Started:    {}\n",
            self.started_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
        report.push_str(&format!("Duration:   {:.2}s\n", self.duration_secs));
        report.push_str(&format!(
            "Requests:   {} total, {} failed ({:.2}% errors)\n",
            self.requests_total,
            self.requests_failed,
            self.error_rate * 100.0
        ));
        report.push_str(&format!("Throughput: {:.1} req/s\n", self.throughput_rps));

        report.push_str("\nActors:\n");
        report.push_str(&format!(
            "  {:<18} {:>8} {:>12} {:>10}\n",
            "kind", "started", "boot-failed", "completed"
        ));
        for kind in &self.kinds {
            report.push_str(&format!(
                "  {:<18} {:>8} {:>12} {:>10}\n",
                kind.kind, kind.started, kind.bootstrap_failed, kind.completed
            ));
        }

        report.push_str("\nActions:\n");
        report.push_str(&format!(
            "  {:<18} {:<22} {:>7} {:>7} {:>8}\n",
            "kind", "action", "ok", "failed", "skipped"
        ));
        for action in &self.actions {
            report.push_str(&format!(
                "  {:<18} {:<22} {:>7} {:>7} {:>8}\n",
                action.kind, action.action, action.ok, action.failed, action.skipped
            ));
        }

        report.push_str("\nEndpoints:\n");
        report.push_str(&format!(
            "  {:<44} {:>7} {:>6} {:>9} {:>9} {:>9}\n",
            "label", "reqs", "fail", "p50", "p95", "p99"
        ));
        for endpoint in &self.endpoints {
            report.push_str(&format!(
                "  {:<44} {:>7} {:>6} {:>9} {:>9} {:>9}\n",
                endpoint.label,
                endpoint.requests,
                endpoint.failures,
                fmt_ms(endpoint.p50_ms),
                fmt_ms(endpoint.p95_ms),
                fmt_ms(endpoint.p99_ms),
            ));
        }

        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn fmt_ms(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => format!("{ms:.1}ms"),
        None => "-".to_string(),
    }
}

// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring sift performance

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::models::{Severity, Task};

/// Global performance metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Metrics are collected over the lifetime of the process and logged on
/// shutdown when stat logging is enabled.
#[derive(Debug)]
pub struct Metrics {
    /// Total bytes of tool output ingested
    pub bytes_ingested: AtomicU64,

    /// Number of raw chunks ingested
    pub chunks_ingested: AtomicU64,

    /// Error tasks extracted
    pub tasks_errors: AtomicUsize,

    /// Warning tasks extracted
    pub tasks_warnings: AtomicUsize,

    /// Unknown-severity tasks extracted
    pub tasks_unknown: AtomicUsize,

    /// Complete sift runs finished
    pub runs_completed: AtomicUsize,

    /// Total wall-clock parse time in milliseconds
    pub total_parse_time_ms: AtomicU64,

    /// Process start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            bytes_ingested: AtomicU64::new(0),
            chunks_ingested: AtomicU64::new(0),
            tasks_errors: AtomicUsize::new(0),
            tasks_warnings: AtomicUsize::new(0),
            tasks_unknown: AtomicUsize::new(0),
            runs_completed: AtomicUsize::new(0),
            total_parse_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one ingested chunk of raw output
    pub fn record_chunk(&self, bytes: usize) {
        self.chunks_ingested.fetch_add(1, Ordering::Relaxed);
        self.bytes_ingested
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record an extracted task by severity
    pub fn record_task(&self, task: &Task) {
        let counter = match task.severity {
            Severity::Error => &self.tasks_errors,
            Severity::Warning => &self.tasks_warnings,
            Severity::Unknown => &self.tasks_unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed sift run and its duration
    pub fn record_run(&self, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.total_parse_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average parse time per run in milliseconds
    pub fn avg_parse_time_ms(&self) -> f64 {
        let total = self.total_parse_time_ms.load(Ordering::Relaxed);
        let count = self.runs_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Total tasks extracted across all severities
    pub fn tasks_total(&self) -> usize {
        self.tasks_errors.load(Ordering::Relaxed)
            + self.tasks_warnings.load(Ordering::Relaxed)
            + self.tasks_unknown.load(Ordering::Relaxed)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Performance Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Ingested: {} bytes in {} chunks",
            self.bytes_ingested.load(Ordering::Relaxed),
            self.chunks_ingested.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Tasks: {} errors, {} warnings, {} unknown",
            self.tasks_errors.load(Ordering::Relaxed),
            self.tasks_warnings.load(Ordering::Relaxed),
            self.tasks_unknown.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Runs: {} completed, total parse time {:.2}s (avg: {:.2}ms per run)",
            self.runs_completed.load(Ordering::Relaxed),
            self.total_parse_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_parse_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

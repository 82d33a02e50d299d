//! Process-wide request counters
//!
//! Atomic counters only; read them through [`MetricsCollector::get_metrics`].

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

pub struct MetricsCollector {
    started_at: u64,
    questions_received: AtomicU64,
    questions_classified: AtomicU64,
    questions_unknown: AtomicU64,
    canned_answers: AtomicU64,
    missing_answers: AtomicU64,
    resolver_calls: AtomicU64,
    resolver_failures: AtomicU64,
    uploads_saved: AtomicU64,
    upload_failures: AtomicU64,
    catalog_reloads: AtomicU64,
    catalog_reload_failures: AtomicU64,
    request_errors: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub questions_received: u64,
    pub questions_classified: u64,
    pub questions_unknown: u64,
    pub canned_answers: u64,
    pub missing_answers: u64,
    pub resolver_calls: u64,
    pub resolver_failures: u64,
    pub uploads_saved: u64,
    pub upload_failures: u64,
    pub catalog_reloads: u64,
    pub catalog_reload_failures: u64,
    pub request_errors: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            started_at: current_timestamp(),
            questions_received: AtomicU64::new(0),
            questions_classified: AtomicU64::new(0),
            questions_unknown: AtomicU64::new(0),
            canned_answers: AtomicU64::new(0),
            missing_answers: AtomicU64::new(0),
            resolver_calls: AtomicU64::new(0),
            resolver_failures: AtomicU64::new(0),
            uploads_saved: AtomicU64::new(0),
            upload_failures: AtomicU64::new(0),
            catalog_reloads: AtomicU64::new(0),
            catalog_reload_failures: AtomicU64::new(0),
            request_errors: AtomicU64::new(0),
        }
    }

    pub fn question_received(&self) {
        self.questions_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a classification outcome
    pub fn question_classified(&self, unknown: bool) {
        if unknown {
            self.questions_unknown.fetch_add(1, Ordering::Relaxed);
        } else {
            self.questions_classified.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a table lookup; `found` is false when the fallback text was used
    pub fn canned_answer(&self, found: bool) {
        if found {
            self.canned_answers.fetch_add(1, Ordering::Relaxed);
        } else {
            self.missing_answers.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn resolver_call(&self, success: bool) {
        self.resolver_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.resolver_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn upload(&self, success: bool) {
        if success {
            self.uploads_saved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.upload_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn catalog_reload(&self, success: bool) {
        if success {
            self.catalog_reloads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.catalog_reload_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn request_error(&self) {
        self.request_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_seconds: current_timestamp().saturating_sub(self.started_at),
            questions_received: self.questions_received.load(Ordering::Relaxed),
            questions_classified: self.questions_classified.load(Ordering::Relaxed),
            questions_unknown: self.questions_unknown.load(Ordering::Relaxed),
            canned_answers: self.canned_answers.load(Ordering::Relaxed),
            missing_answers: self.missing_answers.load(Ordering::Relaxed),
            resolver_calls: self.resolver_calls.load(Ordering::Relaxed),
            resolver_failures: self.resolver_failures.load(Ordering::Relaxed),
            uploads_saved: self.uploads_saved.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            catalog_reloads: self.catalog_reloads.load(Ordering::Relaxed),
            catalog_reload_failures: self.catalog_reload_failures.load(Ordering::Relaxed),
            request_errors: self.request_errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

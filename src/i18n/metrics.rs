//! Translation metrics and observability module.
//!
//! Each engine owns one `TranslationMetrics`. Counters are relaxed atomics so
//! recording never blocks a lookup.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one engine.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of `translate` calls
    translations: AtomicUsize,

    /// Lookups answered by the fallback language
    fallback_hits: AtomicUsize,

    /// Lookups missing in both languages (path echoed back)
    missing_paths: AtomicUsize,

    /// Loader invocations
    loads_started: AtomicUsize,

    /// Loader invocations that failed
    load_failures: AtomicUsize,

    /// Effective language changes
    language_changes: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translation(&self) {
        self.translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_path(&self) {
        self.missing_paths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_started(&self) {
        self.loads_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_language_change(&self) {
        self.language_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn report(&self) -> MetricsReport {
        let translations = self.translations.load(Ordering::Relaxed);
        let fallback_hits = self.fallback_hits.load(Ordering::Relaxed);
        let missing_paths = self.missing_paths.load(Ordering::Relaxed);
        let rate = |count: usize| {
            if translations > 0 {
                (count as f64 / translations as f64) * 100.0
            } else {
                0.0
            }
        };

        MetricsReport {
            translations,
            fallback_hits,
            fallback_rate: rate(fallback_hits),
            missing_paths,
            missing_rate: rate(missing_paths),
            loads_started: self.loads_started.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            language_changes: self.language_changes.load(Ordering::Relaxed),
        }
    }
}

/// Serializable snapshot of [`TranslationMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub translations: usize,
    pub fallback_hits: usize,
    /// Percentage of translations answered by the fallback language
    pub fallback_rate: f64,
    pub missing_paths: usize,
    /// Percentage of translations that echoed the path
    pub missing_rate: f64,
    pub loads_started: usize,
    pub load_failures: usize,
    pub language_changes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_new_metrics_are_zero() {
        let report = TranslationMetrics::new().report();
        assert_eq!(report.translations, 0);
        assert_eq!(report.fallback_rate, 0.0);
        assert_eq!(report.missing_rate, 0.0);
        assert_eq!(report.loads_started, 0);
    }

    #[test]
    fn test_rates() {
        let metrics = TranslationMetrics::new();

        // 4 lookups: 1 fallback, 1 echo
        for _ in 0..4 {
            metrics.record_translation();
        }
        metrics.record_fallback_hit();
        metrics.record_missing_path();

        let report = metrics.report();
        assert_eq!(report.translations, 4);
        assert_eq!(report.fallback_rate, 25.0);
        assert_eq!(report.missing_rate, 25.0);
    }

    #[test]
    fn test_load_and_change_counters() {
        let metrics = TranslationMetrics::new();
        metrics.record_load_started();
        metrics.record_load_started();
        metrics.record_load_failure();
        metrics.record_language_change();

        let report = metrics.report();
        assert_eq!(report.loads_started, 2);
        assert_eq!(report.load_failures, 1);
        assert_eq!(report.language_changes, 1);
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(TranslationMetrics::new().report()).unwrap();
        assert_eq!(json["translations"], 0);
        assert!(json.get("fallback_rate").is_some());
    }
}

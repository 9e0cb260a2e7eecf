//! Analytics recording implementation using Prometheus.

use prometheus::{register_int_counter_vec_with_registry, Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::debug;

/// Category every login attempt is recorded under.
pub const LOGIN_CATEGORY: &str = "Login";

/// Trait for recording analytics events.
pub trait AnalyticsRecorder: Clone + Send + Sync + 'static {
    /// Records a single event, e.g. `("Login", "Successfully logged in via JWT")`.
    fn record_event(&self, category: &str, action: &str);
}

/// Prometheus-backed analytics collector.
#[derive(Clone)]
pub struct Analytics {
    registry: Arc<Registry>,
    events_total: IntCounterVec,
}

impl Analytics {
    /// Creates a new analytics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let events_total = register_int_counter_vec_with_registry!(
            Opts::new(
                "analytics_events_total",
                "Total number of analytics events by category and action"
            ),
            &["category", "action"],
            registry.clone()
        )
        .expect("Failed to register analytics_events_total");

        Analytics {
            registry,
            events_total,
        }
    }

    /// How many times an event has been recorded.
    pub fn event_count(&self, category: &str, action: &str) -> u64 {
        self.events_total
            .with_label_values(&[category, action])
            .get()
    }

    /// Renders all analytics counters in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode analytics");
        String::from_utf8(buffer).expect("Analytics encoding produced invalid UTF-8")
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsRecorder for Analytics {
    fn record_event(&self, category: &str, action: &str) {
        debug!(
            event_name = "analytics.event",
            event_domain = "analytics",
            category,
            action,
            "analytics event recorded"
        );
        self.events_total
            .with_label_values(&[category, action])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_counted_per_action() {
        let analytics = Analytics::new();
        analytics.record_event(LOGIN_CATEGORY, "Successfully logged in via JWT");
        analytics.record_event(LOGIN_CATEGORY, "Successfully logged in via JWT");
        analytics.record_event(LOGIN_CATEGORY, "Failed to log in via JWT");

        assert_eq!(
            analytics.event_count(LOGIN_CATEGORY, "Successfully logged in via JWT"),
            2
        );
        assert_eq!(
            analytics.event_count(LOGIN_CATEGORY, "Failed to log in via JWT"),
            1
        );
        assert_eq!(analytics.event_count(LOGIN_CATEGORY, "Other"), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let analytics = Analytics::new();
        analytics
            .clone()
            .record_event(LOGIN_CATEGORY, "Failed to log in via ICAT");

        assert_eq!(
            analytics.event_count(LOGIN_CATEGORY, "Failed to log in via ICAT"),
            1
        );
        assert!(analytics.render().contains("analytics_events_total"));
    }
}

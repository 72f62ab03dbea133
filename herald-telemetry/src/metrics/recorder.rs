//! Herald metric names and recording helpers.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Pre-defined metrics for the Herald notification service.
///
/// All metrics follow the naming convention: `herald_<category>_<metric>_<unit>`
pub struct HeraldMetrics;

impl HeraldMetrics {
    /// Register all metric descriptions.
    pub fn register() {
        describe_counter!(
            "herald_notifications_ingested_total",
            "Total number of notifications persisted by ingestion"
        );
        describe_counter!(
            "herald_notifications_rejected_total",
            "Total number of inbound events rejected by validation"
        );
        describe_counter!(
            "herald_notifications_read_total",
            "Total number of notifications marked read"
        );
        describe_gauge!(
            "herald_notifications_stored",
            "Records held by the notification store"
        );

        describe_counter!(
            "herald_deliveries_total",
            "Delivery attempts by outcome"
        );
        describe_histogram!(
            "herald_delivery_latency_seconds",
            "Time spent handing one frame to a push channel"
        );
        describe_counter!(
            "herald_broadcast_delivered_total",
            "Announcement frames accepted by a session"
        );
        describe_counter!(
            "herald_broadcast_failed_total",
            "Announcement frames a session failed to accept"
        );

        describe_gauge!("herald_sessions_active", "Registered push sessions");
    }

    /// Record a persisted notification.
    pub fn notification_ingested() {
        counter!("herald_notifications_ingested_total").increment(1);
    }

    /// Record an inbound event refused before persistence.
    pub fn notification_rejected() {
        counter!("herald_notifications_rejected_total").increment(1);
    }

    /// Record a false to true read transition.
    pub fn notification_read() {
        counter!("herald_notifications_read_total").increment(1);
    }

    /// Set the number of stored records.
    #[allow(clippy::cast_precision_loss)]
    pub fn stored_notifications(count: usize) {
        gauge!("herald_notifications_stored").set(count as f64);
    }

    /// Record the outcome of a single-recipient delivery attempt.
    pub fn delivery_outcome(outcome: &'static str) {
        counter!("herald_deliveries_total", "outcome" => outcome).increment(1);
    }

    /// Record how long one push attempt took.
    pub fn delivery_latency(latency_seconds: f64) {
        histogram!("herald_delivery_latency_seconds").record(latency_seconds);
    }

    /// Record the tally of an announcement broadcast.
    pub fn broadcast_finished(delivered: usize, failed: usize) {
        counter!("herald_broadcast_delivered_total").increment(to_u64(delivered));
        counter!("herald_broadcast_failed_total").increment(to_u64(failed));
    }

    /// Set the number of registered sessions.
    #[allow(clippy::cast_precision_loss)]
    pub fn active_sessions(count: usize) {
        gauge!("herald_sessions_active").set(count as f64);
    }
}

fn to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

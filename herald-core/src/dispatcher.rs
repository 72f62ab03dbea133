//! Single-attempt delivery of records to live sessions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use herald_telemetry::metrics::HeraldMetrics;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::Validatable;
use crate::error::ConfigError;
use crate::record::NotificationRecord;
use crate::session::{ChannelError, ChannelHandle, SessionRegistry};

/// Delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Upper bound for one push attempt, in milliseconds.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Copy every dispatched record to the monitoring channel.
    #[serde(default = "default_mirror_to_monitor")]
    pub mirror_to_monitor: bool,
}

const fn default_send_timeout_ms() -> u64 {
    5_000
}

const fn default_mirror_to_monitor() -> bool {
    true
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            mirror_to_monitor: default_mirror_to_monitor(),
        }
    }
}

impl DeliveryConfig {
    /// Send timeout as a [`Duration`].
    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Validatable for DeliveryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "delivery.send_timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The frame was handed to the recipient's channel.
    Delivered,
    /// The recipient holds no session. The record stays queryable.
    NoActiveSession,
    /// The push failed or timed out.
    DeliveryFailed(String),
}

impl DeliveryOutcome {
    /// Short label used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::NoActiveSession => "no_active_session",
            Self::DeliveryFailed(_) => "delivery_failed",
        }
    }

    /// Returns true for [`DeliveryOutcome::Delivered`].
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Tally of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Sessions that accepted the frame.
    pub delivered: usize,
    /// Sessions whose push failed or timed out.
    pub failed: usize,
}

/// Pushes serialized records down registered channels.
///
/// Each attempt is made exactly once. Failures are logged and returned as an
/// outcome; nothing here propagates an error to the caller.
#[derive(Debug)]
pub struct DeliveryDispatcher {
    registry: Arc<SessionRegistry>,
    config: DeliveryConfig,
    monitor_channel: String,
}

impl DeliveryDispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        config: DeliveryConfig,
        monitor_channel: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            config,
            monitor_channel: monitor_channel.into(),
        }
    }

    /// The registry this dispatcher reads from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Attempts to push `record` to its recipient's session.
    #[instrument(skip(self, record), fields(recipient_id = %record.recipient_id, notification_id = ?record.id))]
    pub async fn try_deliver(&self, record: &NotificationRecord) -> DeliveryOutcome {
        let frame = match serde_json::to_string(record) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to serialize notification");
                return DeliveryOutcome::DeliveryFailed(e.to_string());
            }
        };

        let outcome = match self.registry.lookup(&record.recipient_id) {
            Some(channel) => self.push(&channel, frame.clone()).await,
            None => DeliveryOutcome::NoActiveSession,
        };
        HeraldMetrics::delivery_outcome(outcome.as_str());

        match &outcome {
            DeliveryOutcome::DeliveryFailed(reason) => {
                warn!(outcome = outcome.as_str(), %reason, "Notification not delivered");
            }
            _ => debug!(outcome = outcome.as_str(), "Delivery attempt finished"),
        }

        if self.config.mirror_to_monitor && record.recipient_id != self.monitor_channel {
            self.mirror(frame).await;
        }

        outcome
    }

    /// Pushes `record` to every registered session.
    ///
    /// Sessions are taken from a snapshot and pushed concurrently; one failed
    /// channel does not affect the others.
    #[instrument(skip(self, record), fields(notification_id = ?record.id))]
    pub async fn broadcast(&self, record: &NotificationRecord) -> BroadcastReport {
        let frame = match serde_json::to_string(record) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to serialize broadcast");
                return BroadcastReport::default();
            }
        };

        let sessions = self.registry.snapshot();
        let attempts = sessions.iter().map(|(user_id, channel)| {
            let frame = frame.clone();
            async move {
                let outcome = self.push(channel, frame).await;
                if let DeliveryOutcome::DeliveryFailed(reason) = &outcome {
                    warn!(recipient_id = %user_id, channel_id = %channel.id(), %reason, "Broadcast push failed");
                }
                outcome
            }
        });

        let report = join_all(attempts)
            .await
            .into_iter()
            .fold(BroadcastReport::default(), |mut report, outcome| {
                if outcome.is_delivered() {
                    report.delivered += 1;
                } else {
                    report.failed += 1;
                }
                report
            });

        HeraldMetrics::broadcast_finished(report.delivered, report.failed);
        debug!(delivered = report.delivered, failed = report.failed, "Broadcast finished");
        report
    }

    async fn mirror(&self, frame: String) {
        let Some(channel) = self.registry.lookup(&self.monitor_channel) else {
            return;
        };
        let outcome = self.push(&channel, frame).await;
        debug!(channel_id = %channel.id(), outcome = outcome.as_str(), "Mirrored to monitor");
    }

    async fn push(&self, channel: &ChannelHandle, frame: String) -> DeliveryOutcome {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.config.send_timeout(), channel.push(frame)).await {
            Ok(Ok(())) => DeliveryOutcome::Delivered,
            Ok(Err(e)) => DeliveryOutcome::DeliveryFailed(e.to_string()),
            Err(_) => DeliveryOutcome::DeliveryFailed(ChannelError::Timeout.to_string()),
        };
        HeraldMetrics::delivery_latency(started.elapsed().as_secs_f64());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::DEFAULT_MONITOR_CHANNEL;
    use crate::record::NotificationId;
    use crate::session::{PushChannel, QueuedChannel};
    use crate::test_support::RecordingChannel;

    fn dispatcher(registry: &Arc<SessionRegistry>, config: DeliveryConfig) -> DeliveryDispatcher {
        DeliveryDispatcher::new(Arc::clone(registry), config, DEFAULT_MONITOR_CHANNEL)
    }

    fn saved_record(recipient: &str) -> NotificationRecord {
        let mut record = NotificationRecord::new(recipient, "NEW_TASK", "Task X assigned");
        record.id = Some(NotificationId::generate());
        record
    }

    #[tokio::test]
    async fn test_no_active_session() {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let outcome = dispatcher.try_deliver(&saved_record("u1")).await;
        assert_eq!(outcome, DeliveryOutcome::NoActiveSession);
    }

    #[tokio::test]
    async fn test_delivered_frame_is_record_json() {
        let registry = Arc::new(SessionRegistry::new());
        let channel = Arc::new(RecordingChannel::new());
        registry.register("u1", channel.clone());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let record = saved_record("u1");
        let outcome = dispatcher.try_deliver(&record).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        let frames = channel.frames();
        assert_eq!(frames.len(), 1);
        let decoded: NotificationRecord = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(decoded, record);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register(
            "u1",
            Arc::new(RecordingChannel::failing(ChannelError::Transport("reset".into()))),
        );
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let outcome = dispatcher.try_deliver(&saved_record("u1")).await;
        assert!(matches!(outcome, DeliveryOutcome::DeliveryFailed(reason) if reason.contains("reset")));
    }

    #[tokio::test]
    async fn test_slow_channel_times_out() {
        let registry = Arc::new(SessionRegistry::new());
        registry.register("u1", Arc::new(RecordingChannel::slow(Duration::from_secs(5))));
        let config = DeliveryConfig {
            send_timeout_ms: 20,
            ..DeliveryConfig::default()
        };
        let dispatcher = dispatcher(&registry, config);

        let outcome = dispatcher.try_deliver(&saved_record("u1")).await;
        assert!(matches!(outcome, DeliveryOutcome::DeliveryFailed(reason) if reason.contains("timed out")));
    }

    #[tokio::test]
    async fn test_full_queue_fails_immediately() {
        let registry = Arc::new(SessionRegistry::new());
        let (user, _user_rx) = QueuedChannel::new(1);
        let (monitor, _monitor_rx) = QueuedChannel::new(1);
        registry.register("u1", Arc::new(user));
        registry.register(DEFAULT_MONITOR_CHANNEL, Arc::new(monitor));
        let config = DeliveryConfig {
            send_timeout_ms: 5_000,
            ..DeliveryConfig::default()
        };
        let dispatcher = dispatcher(&registry, config);

        assert!(dispatcher.try_deliver(&saved_record("u1")).await.is_delivered());

        let started = std::time::Instant::now();
        let outcome = dispatcher.try_deliver(&saved_record("u1")).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::DeliveryFailed("channel queue full".to_string())
        );
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_delivered_frame_survives_close() {
        let registry = Arc::new(SessionRegistry::new());
        let (channel, mut rx) = QueuedChannel::new(8);
        let channel = Arc::new(channel);
        registry.register("u1", channel.clone());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let record = saved_record("u1");
        assert!(dispatcher.try_deliver(&record).await.is_delivered());
        channel.close();

        let frame = rx.recv().await.unwrap();
        let decoded: NotificationRecord = serde_json::from_str(&frame).unwrap();
        assert_eq!(decoded, record);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mirror_copies_to_monitor() {
        let registry = Arc::new(SessionRegistry::new());
        let user = Arc::new(RecordingChannel::new());
        let monitor = Arc::new(RecordingChannel::new());
        registry.register("u1", user.clone());
        registry.register(DEFAULT_MONITOR_CHANNEL, monitor.clone());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        dispatcher.try_deliver(&saved_record("u1")).await;
        // Offline recipients are still mirrored.
        dispatcher.try_deliver(&saved_record("u2")).await;

        assert_eq!(user.frames().len(), 1);
        assert_eq!(monitor.frames().len(), 2);
    }

    #[tokio::test]
    async fn test_mirror_disabled() {
        let registry = Arc::new(SessionRegistry::new());
        let monitor = Arc::new(RecordingChannel::new());
        registry.register(DEFAULT_MONITOR_CHANNEL, monitor.clone());
        let config = DeliveryConfig {
            mirror_to_monitor: false,
            ..DeliveryConfig::default()
        };
        let dispatcher = dispatcher(&registry, config);

        dispatcher.try_deliver(&saved_record("u1")).await;
        assert!(monitor.frames().is_empty());
    }

    #[tokio::test]
    async fn test_monitor_recipient_not_duplicated() {
        let registry = Arc::new(SessionRegistry::new());
        let monitor = Arc::new(RecordingChannel::new());
        registry.register(DEFAULT_MONITOR_CHANNEL, monitor.clone());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let outcome = dispatcher.try_deliver(&saved_record(DEFAULT_MONITOR_CHANNEL)).await;
        assert!(outcome.is_delivered());
        assert_eq!(monitor.frames().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_isolates_failures() {
        let registry = Arc::new(SessionRegistry::new());
        let healthy_a = Arc::new(RecordingChannel::new());
        let healthy_b = Arc::new(RecordingChannel::new());
        let broken = Arc::new(RecordingChannel::new());
        broken.close();
        registry.register("a", healthy_a.clone());
        registry.register("b", healthy_b.clone());
        registry.register("c", broken.clone());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());

        let report = dispatcher.broadcast(&saved_record("*")).await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert_eq!(healthy_a.frames().len(), 1);
        assert_eq!(healthy_b.frames().len(), 1);
        assert!(broken.frames().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_sessions() {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = dispatcher(&registry, DeliveryConfig::default());
        let report = dispatcher.broadcast(&saved_record("*")).await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[test]
    fn test_config_validation() {
        assert!(DeliveryConfig::default().validate().is_ok());
        let config = DeliveryConfig {
            send_timeout_ms: 0,
            ..DeliveryConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! Concurrent user → channel registry.

use std::sync::Arc;

use dashmap::DashMap;
use herald_telemetry::metrics::HeraldMetrics;
use tracing::{debug, info};

use super::channel::{ChannelId, PushChannel};

/// Shared reference to a registered channel.
pub type ChannelHandle = Arc<dyn PushChannel>;

/// Registry of live push sessions, keyed by user id.
///
/// Every operation clones the channel `Arc` out of the map and returns, so
/// no map lock is ever held while a caller awaits on a channel.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, ChannelHandle>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Stores `channel` for `user_id`, replacing any previous entry.
    ///
    /// The superseded channel is returned and left open; closing it is up to
    /// the caller.
    pub fn register(&self, user_id: impl Into<String>, channel: ChannelHandle) -> Option<ChannelHandle> {
        let user_id = user_id.into();
        let channel_id = channel.id();
        let previous = self.sessions.insert(user_id.clone(), channel);

        match &previous {
            Some(old) => info!(%user_id, %channel_id, replaced = %old.id(), "Session replaced"),
            None => debug!(%user_id, %channel_id, "Session registered"),
        }
        HeraldMetrics::active_sessions(self.sessions.len());
        previous
    }

    /// Removes the entry for `user_id`. Removing an absent entry is a no-op.
    pub fn unregister(&self, user_id: &str) -> Option<ChannelHandle> {
        let removed = self.sessions.remove(user_id).map(|(_, channel)| channel);
        if let Some(channel) = &removed {
            debug!(%user_id, channel_id = %channel.id(), "Session unregistered");
            HeraldMetrics::active_sessions(self.sessions.len());
        }
        removed
    }

    /// Removes the entry for `user_id` only if it still holds `channel_id`.
    ///
    /// Returns true if an entry was removed. A session that has already been
    /// replaced leaves its successor in place.
    pub fn release(&self, user_id: &str, channel_id: ChannelId) -> bool {
        let removed = self
            .sessions
            .remove_if(user_id, |_, channel| channel.id() == channel_id)
            .is_some();
        debug!(%user_id, %channel_id, removed, "Session released");
        if removed {
            HeraldMetrics::active_sessions(self.sessions.len());
        }
        removed
    }

    /// Returns the channel registered for `user_id`.
    #[must_use]
    pub fn lookup(&self, user_id: &str) -> Option<ChannelHandle> {
        self.sessions.get(user_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns true if `user_id` has a registered channel.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    /// Returns a point-in-time copy of every registration.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, ChannelHandle)> {
        self.sessions
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Visits every registration in a snapshot taken before the first call.
    pub fn for_each(&self, mut visitor: impl FnMut(&str, &ChannelHandle)) {
        for (user_id, channel) in self.snapshot() {
            visitor(&user_id, &channel);
        }
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registers `channel` and returns a lease that releases the
    /// registration when dropped, together with the superseded channel.
    pub fn lease(
        self: &Arc<Self>,
        user_id: impl Into<String>,
        channel: ChannelHandle,
    ) -> (SessionLease, Option<ChannelHandle>) {
        let user_id = user_id.into();
        let channel_id = channel.id();
        let previous = self.register(user_id.clone(), channel);
        let lease = SessionLease {
            registry: Arc::clone(self),
            user_id,
            channel_id,
            released: false,
        };
        (lease, previous)
    }
}

/// Releases a session registration exactly once.
///
/// Release happens on [`SessionLease::release`] or on drop, whichever comes
/// first, so an aborted session task still cleans up.
#[derive(Debug)]
pub struct SessionLease {
    registry: Arc<SessionRegistry>,
    user_id: String,
    channel_id: ChannelId,
    released: bool,
}

impl SessionLease {
    /// The user the lease belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The leased channel.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Releases the registration now. Returns true if the entry was still
    /// ours and has been removed.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.registry.release(&self.user_id, self.channel_id)
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(&self.user_id, self.channel_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QueuedChannel;

    fn channel() -> ChannelHandle {
        let (channel, _rx) = QueuedChannel::new(4);
        Arc::new(channel)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        let c = channel();
        assert!(registry.register("u1", Arc::clone(&c)).is_none());

        let found = registry.lookup("u1").unwrap();
        assert_eq!(found.id(), c.id());
        assert!(registry.lookup("u2").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_previous() {
        let registry = SessionRegistry::new();
        let c1 = channel();
        let c2 = channel();

        registry.register("u1", Arc::clone(&c1));
        let previous = registry.register("u1", Arc::clone(&c2)).unwrap();

        assert_eq!(previous.id(), c1.id());
        assert_eq!(registry.lookup("u1").unwrap().id(), c2.id());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.register("u1", channel());

        assert!(registry.unregister("u1").is_some());
        assert!(registry.lookup("u1").is_none());
        assert!(registry.unregister("u1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_ignores_replaced_channel() {
        let registry = SessionRegistry::new();
        let c1 = channel();
        let c2 = channel();
        registry.register("u1", Arc::clone(&c1));
        registry.register("u1", Arc::clone(&c2));

        assert!(!registry.release("u1", c1.id()));
        assert_eq!(registry.lookup("u1").unwrap().id(), c2.id());

        assert!(registry.release("u1", c2.id()));
        assert!(registry.lookup("u1").is_none());
    }

    #[test]
    fn test_lease_releases_once_on_drop() {
        let registry = Arc::new(SessionRegistry::new());
        let (lease, previous) = registry.lease("u1", channel());
        assert!(previous.is_none());
        assert!(registry.contains("u1"));

        drop(lease);
        assert!(!registry.contains("u1"));
    }

    #[test]
    fn test_stale_lease_keeps_successor() {
        let registry = Arc::new(SessionRegistry::new());
        let (old_lease, _) = registry.lease("u1", channel());
        let successor = channel();
        let (new_lease, previous) = registry.lease("u1", Arc::clone(&successor));
        assert!(previous.is_some());

        assert!(!old_lease.release());
        assert_eq!(registry.lookup("u1").unwrap().id(), successor.id());

        assert!(new_lease.release());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_active_sessions_gauge_tracks_registry() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let registry = SessionRegistry::new();

        metrics::with_local_recorder(&recorder, || {
            let c1 = channel();
            registry.register("u1", Arc::clone(&c1));
            registry.register("u2", channel());
            registry.register("u1", channel());
            assert!(!registry.release("u1", c1.id()));
            registry.unregister("u2");
        });

        assert!(handle.render().contains("herald_sessions_active 1"));
    }

    #[test]
    fn test_for_each_visits_snapshot() {
        let registry = SessionRegistry::new();
        registry.register("u1", channel());
        registry.register("u2", channel());

        let mut seen = Vec::new();
        registry.for_each(|user_id, _| {
            // Mutating the registry mid-iteration must not deadlock.
            registry.unregister(user_id);
            seen.push(user_id.to_string());
        });

        seen.sort();
        assert_eq!(seen, vec!["u1".to_string(), "u2".to_string()]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_register_unregister() {
        let registry = Arc::new(SessionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let user = format!("user-{}", i % 16);
                        if (i + t) % 3 == 0 {
                            registry.unregister(&user);
                        } else {
                            registry.register(user.clone(), channel());
                            if let Some(found) = registry.lookup(&user) {
                                assert!(found.id().as_u64() > 0);
                            }
                        }
                        let _ = registry.snapshot();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(registry.len() <= 16);
    }
}

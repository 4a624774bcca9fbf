//! Live fan-out of stamped readings to connected viewers.
//!
//! Every subscriber owns a bounded queue. [`Broadcaster::publish`] never
//! waits on a subscriber: it offers the reading to each queue with
//! `try_send` and moves on.
//!
//! - Full queue (slow consumer): that one delivery is skipped.
//! - Closed queue (viewer gone): the subscriber is removed.
//!
//! Subscribers only see readings published after they subscribed; history
//! comes from the [`ReadingStore`](crate::store::ReadingStore).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, gauge};
use parking_lot::RwLock;
use pothole_core::StampedReading;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Default per-subscriber queue capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Opaque handle identifying one subscription.
pub type SubscriptionId = u64;

/// Outcome of one [`Broadcaster::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the reading was queued for.
    pub delivered: usize,
    /// Subscribers skipped because their queue was full.
    pub dropped_full: usize,
    /// Subscribers removed because their queue was closed.
    pub dropped_closed: usize,
}

struct Registry {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<SubscriptionId, mpsc::Sender<StampedReading>>>,
}

impl Registry {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let removed = subscribers.remove(&id).is_some();
        if removed {
            gauge!("broadcast_subscribers").set(subscribers.len() as f64);
        }
        removed
    }
}

/// Registry of live subscribers with non-blocking fan-out.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
    buffer: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl Broadcaster {
    /// Create a broadcaster whose subscribers each buffer up to `buffer`
    /// undelivered readings (at least one).
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                subscribers: RwLock::new(HashMap::new()),
            }),
            buffer: buffer.max(1),
        }
    }

    /// Register a new live subscriber.
    ///
    /// The returned [`Subscription`] unregisters itself when dropped.
    pub fn subscribe(&self) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);

        let count = {
            let mut subscribers = self.registry.subscribers.write();
            subscribers.insert(id, sender);
            subscribers.len()
        };
        gauge!("broadcast_subscribers").set(count as f64);
        debug!(subscription = id, subscribers = count, "subscriber registered");

        Subscription {
            id,
            receiver,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Remove a subscriber. Returns whether it was still registered;
    /// removing an unknown or already-removed handle is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            debug!(subscription = id, "subscriber unregistered");
        }
        removed
    }

    /// Offer a reading to every registered subscriber without waiting.
    pub fn publish(&self, reading: &StampedReading) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        {
            let subscribers = self.registry.subscribers.read();
            for (&id, sender) in subscribers.iter() {
                match sender.try_send(*reading) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped_full += 1;
                        debug!(subscription = id, "subscriber queue full, skipping delivery");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(id),
                }
            }
        }

        for id in closed {
            if self.registry.remove(id) {
                report.dropped_closed += 1;
                debug!(subscription = id, "subscriber disconnected, removed");
            }
        }

        counter!("broadcast_deliveries_total").increment(report.delivered as u64);
        if report.dropped_full > 0 {
            counter!("broadcast_dropped_total", "reason" => "full")
                .increment(report.dropped_full as u64);
        }
        if report.dropped_closed > 0 {
            counter!("broadcast_dropped_total", "reason" => "closed")
                .increment(report.dropped_closed as u64);
        }

        report
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.read().len()
    }
}

/// A live subscription; yields readings published after it was created.
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<StampedReading>,
    registry: Arc<Registry>,
}

impl Subscription {
    /// Handle for [`Broadcaster::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next reading.
    ///
    /// Returns `None` once the subscription has been removed and every
    /// queued reading has been drained.
    pub async fn recv(&mut self) -> Option<StampedReading> {
        self.receiver.recv().await
    }

    /// Take a queued reading without waiting.
    pub fn try_recv(&mut self) -> Option<StampedReading> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            debug!(subscription = self.id, "subscription dropped");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

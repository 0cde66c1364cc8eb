//! Per-product registry of live connections.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use storefront_auth::Role;
use storefront_core::ProductId;

use crate::live::protocol::Outbound;

/// Messages queued per connection before fan-out starts dropping for it.
pub const OUTBOX_CAPACITY: usize = 256;

#[derive(Debug)]
struct Subscriber {
    role: Role,
    outbox: mpsc::Sender<Outbound>,
}

#[derive(Debug, Default)]
struct Registry {
    next_connection: u64,
    /// Connection ids grow monotonically, so map order is registration order.
    products: HashMap<ProductId, BTreeMap<u64, Subscriber>>,
}

/// Shared registry of live feedback connections, keyed by product.
///
/// The lock is never held across an `.await`: registration, removal and
/// fan-out are each a single critical section, and fan-out only enqueues
/// into per-connection channels. Those channels are bounded; a connection
/// that stops draining loses messages instead of growing its queue.
#[derive(Debug, Clone, Default)]
pub struct LiveHub {
    inner: Arc<Mutex<Registry>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection on `product_id`. The returned guard removes it
    /// again when dropped; the receiver yields what is broadcast to it.
    pub fn register(
        &self,
        product_id: ProductId,
        role: Role,
    ) -> (Registration, mpsc::Receiver<Outbound>) {
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let mut registry = self.registry();
        let connection_id = registry.next_connection;
        registry.next_connection += 1;

        let subscribers = registry.products.entry(product_id).or_default();
        subscribers.insert(connection_id, Subscriber { role, outbox });
        tracing::info!(
            product_id = %product_id,
            connection_id,
            role = %role,
            subscribers = subscribers.len(),
            "live connection registered"
        );

        let registration = Registration {
            hub: self.clone(),
            product_id,
            connection_id,
        };
        (registration, inbox)
    }

    /// Send to every connection on `product_id` in registration order,
    /// choosing the message per subscriber role. Returns how many
    /// connections accepted it.
    pub fn broadcast<F>(&self, product_id: ProductId, message_for: F) -> usize
    where
        F: Fn(Role) -> Outbound,
    {
        let registry = self.registry();
        let Some(subscribers) = registry.products.get(&product_id) else {
            return 0;
        };

        let mut delivered = 0;
        let mut dropped = 0;
        for (connection_id, subscriber) in subscribers {
            match subscriber.outbox.try_send(message_for(subscriber.role)) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    tracing::warn!(
                        product_id = %product_id,
                        connection_id,
                        "live outbox full; message dropped"
                    );
                }
                // Connection is shutting down; its own guard removes it.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        tracing::debug!(product_id = %product_id, delivered, dropped, "live broadcast");
        delivered
    }

    pub fn subscriber_count(&self, product_id: ProductId) -> usize {
        self.registry()
            .products
            .get(&product_id)
            .map_or(0, BTreeMap::len)
    }

    /// Number of products with at least one live connection.
    pub fn active_products(&self) -> usize {
        self.registry().products.len()
    }

    fn unregister(&self, product_id: ProductId, connection_id: u64) -> usize {
        let mut registry = self.registry();
        let remaining = match registry.products.get_mut(&product_id) {
            Some(subscribers) => {
                subscribers.remove(&connection_id);
                subscribers.len()
            }
            None => 0,
        };
        if remaining == 0 {
            registry.products.remove(&product_id);
        }
        remaining
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registry updates cannot leave it half-written, so a poisoned lock
        // is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one connection in the hub; dropping it unregisters.
#[derive(Debug)]
pub struct Registration {
    hub: LiveHub,
    product_id: ProductId,
    connection_id: u64,
}

impl Registration {
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let remaining = self.hub.unregister(self.product_id, self.connection_id);
        tracing::info!(
            product_id = %self.product_id,
            connection_id = self.connection_id,
            subscribers = remaining,
            "live connection unregistered"
        );
    }
}

#[cfg(test)]
mod tests {
    use storefront_core::FeedbackId;

    use super::*;

    fn product(id: i64) -> ProductId {
        ProductId::new(id)
    }

    fn html_for(role: Role) -> Outbound {
        Outbound::Created {
            feedback_html: role.as_str().to_string(),
        }
    }

    #[test]
    fn broadcast_picks_message_per_role() {
        let hub = LiveHub::new();
        let (_admin, mut admin_rx) = hub.register(product(1), Role::Admin);
        let (_user, mut user_rx) = hub.register(product(1), Role::User);
        let (_guest, mut guest_rx) = hub.register(product(1), Role::Guest);

        assert_eq!(hub.broadcast(product(1), html_for), 3);

        assert_eq!(admin_rx.try_recv().unwrap(), html_for(Role::Admin));
        assert_eq!(user_rx.try_recv().unwrap(), html_for(Role::User));
        assert_eq!(guest_rx.try_recv().unwrap(), html_for(Role::Guest));
    }

    #[test]
    fn broadcast_is_scoped_to_one_product() {
        let hub = LiveHub::new();
        let (_a, mut rx_a) = hub.register(product(1), Role::User);
        let (_b, mut rx_b) = hub.register(product(2), Role::User);

        let deleted = Outbound::Deleted {
            feedback_id: FeedbackId::new(5),
        };
        assert_eq!(hub.broadcast(product(2), |_| deleted.clone()), 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), deleted);
    }

    #[test]
    fn dropping_registration_unregisters_and_prunes_empty_products() {
        let hub = LiveHub::new();
        let (first, _rx1) = hub.register(product(7), Role::User);
        let (second, _rx2) = hub.register(product(7), Role::Admin);
        assert_eq!(hub.subscriber_count(product(7)), 2);
        assert_ne!(first.connection_id(), second.connection_id());

        drop(first);
        assert_eq!(hub.subscriber_count(product(7)), 1);
        assert_eq!(hub.active_products(), 1);

        drop(second);
        assert_eq!(hub.subscriber_count(product(7)), 0);
        assert_eq!(hub.active_products(), 0);
    }

    #[test]
    fn closed_receivers_do_not_count_as_delivered() {
        let hub = LiveHub::new();
        let (_live, _live_rx) = hub.register(product(3), Role::User);
        let (_gone, gone_rx) = hub.register(product(3), Role::User);
        drop(gone_rx);

        assert_eq!(hub.broadcast(product(3), html_for), 1);
    }

    #[test]
    fn stalled_receiver_queue_stays_bounded() {
        let hub = LiveHub::new();
        let (_stalled, stalled_rx) = hub.register(product(4), Role::Guest);
        let (_reader, mut reader_rx) = hub.register(product(4), Role::User);

        for round in 0..(OUTBOX_CAPACITY * 4) {
            let delivered = hub.broadcast(product(4), html_for);
            // The draining reader always gets its copy.
            assert!(delivered >= 1, "round {round} delivered {delivered}");
            assert_eq!(reader_rx.try_recv().unwrap(), html_for(Role::User));
        }

        assert_eq!(stalled_rx.len(), OUTBOX_CAPACITY);
        assert_eq!(hub.broadcast(product(4), html_for), 1);
    }

    #[test]
    fn broadcast_to_unknown_product_reaches_nobody() {
        let hub = LiveHub::new();
        assert_eq!(hub.broadcast(product(99), html_for), 0);
    }

    #[test]
    fn concurrent_registration_and_broadcast_stay_consistent() {
        let hub = LiveHub::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let hub = hub.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let (registration, _rx) = hub.register(product(1), Role::User);
                        hub.broadcast(product(1), html_for);
                        drop(registration);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(hub.active_products(), 0);
    }
}

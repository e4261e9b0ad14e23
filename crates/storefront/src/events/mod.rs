//! Post-commit order notifications.
//!
//! When an order placement commits, an [`OrderCreated`] event fans out to
//! every registered [`OrderSubscriber`]. Delivery is send-robust: a failing
//! subscriber is logged and skipped, never affecting the committed order or
//! the remaining subscribers.
//!
//! Subscribers are registered at startup on the [`EventNotifier`]; nothing
//! else in the system knows which subscribers exist.

pub mod email;

pub use email::EmailSubscriber;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use marketrow_core::{CustomerId, Email, Money, OrderId};

use crate::models::{Customer, OrderWithItems};

/// Boxed error type subscribers may return.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Details of a freshly committed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    /// Identifier of the new order.
    pub order_id: OrderId,
    /// Customer who placed it.
    pub customer_id: CustomerId,
    /// Where to send the confirmation.
    pub customer_email: Email,
    /// Order total at placement prices.
    pub total: Money,
    /// Number of distinct line items.
    pub line_count: usize,
}

impl OrderCreated {
    /// Build the event from a committed order and its customer.
    #[must_use]
    pub fn new(order: &OrderWithItems, customer: &Customer) -> Self {
        Self {
            order_id: order.order.id,
            customer_id: order.order.customer_id,
            customer_email: customer.email.clone(),
            total: order.total(),
            line_count: order.items.len(),
        }
    }
}

/// A receiver of order-created events.
#[async_trait]
pub trait OrderSubscriber: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// May fail; the notifier logs and ignores the failure.
    async fn order_created(&self, event: &OrderCreated) -> Result<(), SubscriberError>;
}

/// Fans order events out to registered subscribers.
#[derive(Clone, Default)]
pub struct EventNotifier {
    subscribers: Vec<Arc<dyn OrderSubscriber>>,
}

impl EventNotifier {
    /// An empty notifier with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber.
    #[must_use]
    pub fn with(mut self, subscriber: Arc<dyn OrderSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every subscriber in registration order.
    ///
    /// A subscriber error is logged at warn level and swallowed; later
    /// subscribers still receive the event.
    pub async fn order_created(&self, event: &OrderCreated) {
        for subscriber in &self.subscribers {
            if let Err(error) = subscriber.order_created(event).await {
                tracing::warn!(
                    subscriber = subscriber.name(),
                    order_id = %event.order_id,
                    %error,
                    "order notification failed"
                );
            }
        }
    }
}

/// Subscriber that records each order in the application log.
pub struct LoggingSubscriber;

#[async_trait]
impl OrderSubscriber for LoggingSubscriber {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn order_created(&self, event: &OrderCreated) -> Result<(), SubscriberError> {
        tracing::info!(
            order_id = %event.order_id,
            customer_id = %event.customer_id,
            total = %event.total,
            line_count = event.line_count,
            "order placed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn sample_event() -> OrderCreated {
        OrderCreated {
            order_id: OrderId::new(7),
            customer_id: CustomerId::new(3),
            customer_email: "jo@example.com".parse().unwrap(),
            total: Money::from_cents(2500),
            line_count: 2,
        }
    }

    struct Failing;

    #[async_trait]
    impl OrderSubscriber for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn order_created(&self, _event: &OrderCreated) -> Result<(), SubscriberError> {
            Err("smtp relay unreachable".into())
        }
    }

    #[derive(Default)]
    struct Counting {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl OrderSubscriber for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn order_created(&self, _event: &OrderCreated) -> Result<(), SubscriberError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_the_rest() {
        let counting = Arc::new(Counting::default());
        let notifier = EventNotifier::new()
            .with(Arc::new(Failing))
            .with(Arc::clone(&counting) as Arc<dyn OrderSubscriber>);

        notifier.order_created(&sample_event()).await;

        assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn event_reaches_every_subscriber() {
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        let notifier = EventNotifier::new()
            .with(Arc::clone(&first) as Arc<dyn OrderSubscriber>)
            .with(Arc::clone(&second) as Arc<dyn OrderSubscriber>);

        notifier.order_created(&sample_event()).await;
        notifier.order_created(&sample_event()).await;

        assert_eq!(first.seen.load(Ordering::SeqCst), 2);
        assert_eq!(second.seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn event_carries_order_summary() {
        let event = sample_event();
        assert_eq!(event.total, Money::from_cents(2500));
        assert_eq!(event.line_count, 2);
    }
}

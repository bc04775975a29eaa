//! Notification of committed transformations.
//!
//! Callers pass an observer explicitly to the engine; nothing is broadcast
//! implicitly. [`BusNotifier`] adapts an [`EventBus`] for consumers that want
//! pub/sub fan-out (dashboards, stock alerts).

use koperasi_events::{EventBus, EventEnvelope};
use koperasi_inventory::{TransformationEvent, TransformationRecord};

/// Called once per committed transformation, after the audit sink.
pub trait TransformationObserver {
    fn on_transformed(&self, record: &TransformationRecord);
}

impl<F> TransformationObserver for F
where
    F: Fn(&TransformationRecord),
{
    fn on_transformed(&self, record: &TransformationRecord) {
        self(record)
    }
}

/// Publishes `inventory.stock.transformed` envelopes on an event bus.
#[derive(Debug)]
pub struct BusNotifier<B> {
    bus: B,
}

impl<B> BusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> TransformationObserver for BusNotifier<B>
where
    B: EventBus<EventEnvelope<TransformationEvent>>,
{
    fn on_transformed(&self, record: &TransformationRecord) {
        let envelope = EventEnvelope::wrap(TransformationEvent::StockTransformed(record.clone()));
        let event_id = envelope.event_id();

        if let Err(err) = self.bus.publish(envelope) {
            tracing::warn!(
                transformation_id = %record.id,
                %event_id,
                error = ?err,
                "failed to publish stock transformation event"
            );
        }
    }
}

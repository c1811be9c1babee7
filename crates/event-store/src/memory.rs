use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventStoreError, InstanceId, Result, Version,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// In-memory event store implementation.
///
/// Stores all events in memory behind an async lock. This is the store the
/// tests run against and the default for a single-process deployment; a
/// durable backend implements the same [`EventStore`] trait.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let instance_id = first_event.instance_id.clone();

        let mut store = self.events.write().await;

        // Current version for this instance
        let current_version = store
            .iter()
            .filter(|e| e.instance_id == instance_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                instance_id,
                expected,
                actual: current_version,
            });
        }

        // Version conflicts (unique constraint simulation)
        let first_new_version = first_event.version;
        if first_new_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                instance_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        store.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_instance(
        &self,
        instance_id: &InstanceId,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| &e.instance_id == instance_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    async fn get_instance_version(&self, instance_id: &InstanceId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = store
            .iter()
            .filter(|e| &e.instance_id == instance_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStoreExt;

    fn create_test_event(
        instance_id: &InstanceId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .instance_id(instance_id.clone())
            .instance_type("TestInstance")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let instance_id = InstanceId::new("ORD-1");
        let event = create_test_event(&instance_id, Version::first(), "TestEvent");

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.get_events_for_instance(&instance_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_multiple_events() {
        let store = InMemoryEventStore::new();
        let instance_id = InstanceId::new("ORD-1");

        let events = vec![
            create_test_event(&instance_id, Version::new(1), "Event1"),
            create_test_event(&instance_id, Version::new(2), "Event2"),
            create_test_event(&instance_id, Version::new(3), "Event3"),
        ];

        let result = store.append(events, AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::new(3));

        let stored = store.get_events_for_instance(&instance_id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_version() {
        let store = InMemoryEventStore::new();
        let instance_id = InstanceId::new("ORD-1");

        let event1 = create_test_event(&instance_id, Version::first(), "Event1");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = create_test_event(&instance_id, Version::new(2), "Event2");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::initial()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_with_correct_expected_version() {
        let store = InMemoryEventStore::new();
        let instance_id = InstanceId::new("ORD-1");

        let event1 = create_test_event(&instance_id, Version::first(), "Event1");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = create_test_event(&instance_id, Version::new(2), "Event2");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn streams_are_isolated_by_instance() {
        let store = InMemoryEventStore::new();
        let order = InstanceId::new("ORD-1");
        let shipping = InstanceId::new("ship-ORD-1");

        store
            .append(
                vec![create_test_event(&order, Version::first(), "OrderStarted")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(
                    &shipping,
                    Version::first(),
                    "ShipmentStarted",
                )],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        assert_eq!(store.get_events_for_instance(&order).await.unwrap().len(), 1);
        assert_eq!(
            store.get_events_for_instance(&shipping).await.unwrap().len(),
            1
        );
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn get_events_by_type() {
        let store = InMemoryEventStore::new();
        let id1 = InstanceId::new("ORD-1");
        let id2 = InstanceId::new("ORD-2");

        store
            .append(
                vec![create_test_event(&id1, Version::first(), "OrderCanceled")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(&id2, Version::first(), "OrderShipped")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(&id1, Version::new(2), "OrderCanceled")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let canceled = store.get_events_by_type("OrderCanceled").await.unwrap();
        assert_eq!(canceled.len(), 2);

        let shipped = store.get_events_by_type("OrderShipped").await.unwrap();
        assert_eq!(shipped.len(), 1);
    }

    #[tokio::test]
    async fn instance_version_and_existence() {
        let store = InMemoryEventStore::new();
        let instance_id = InstanceId::new("ORD-1");

        assert!(!store.instance_exists(&instance_id).await.unwrap());
        assert!(
            store
                .get_instance_version(&instance_id)
                .await
                .unwrap()
                .is_none()
        );

        let events = vec![
            create_test_event(&instance_id, Version::new(1), "Event1"),
            create_test_event(&instance_id, Version::new(2), "Event2"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        assert!(store.instance_exists(&instance_id).await.unwrap());
        assert_eq!(
            store.get_instance_version(&instance_id).await.unwrap(),
            Some(Version::new(2))
        );
    }

    #[tokio::test]
    async fn rejects_empty_batch() {
        let store = InMemoryEventStore::new();
        let result = store.append(vec![], AppendOptions::new()).await;
        assert!(matches!(result, Err(EventStoreError::Validation(_))));
    }

    #[tokio::test]
    async fn rejects_mixed_instance_batch() {
        let store = InMemoryEventStore::new();
        let events = vec![
            create_test_event(&InstanceId::new("ORD-1"), Version::new(1), "Event1"),
            create_test_event(&InstanceId::new("ORD-2"), Version::new(2), "Event2"),
        ];
        let result = store.append(events, AppendOptions::new()).await;
        assert!(matches!(result, Err(EventStoreError::Validation(_))));
    }
}

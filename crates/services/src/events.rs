use std::sync::Arc;

use async_trait::async_trait;
use portal_core::DomainEvent;
use storage::repository::StorageError;
use tokio::sync::RwLock;

/// Reacts to domain events published by the services.
///
/// Handlers are best effort: a failure is logged by the bus and never reaches
/// the service that published the event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns `StorageError` if the handler's own document cannot be updated.
    async fn handle(&self, event: &DomainEvent) -> Result<(), StorageError>;
}

/// In-process fan-out of domain events to registered handlers, in
/// registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_handler(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    pub async fn publish(&self, event: DomainEvent) {
        let handlers = self.handlers.read().await;
        tracing::debug!(
            event = event.name(),
            course = %event.course_id(),
            handlers = handlers.len(),
            "publishing domain event"
        );
        for handler in handlers.iter() {
            if let Err(err) = handler.handle(&event).await {
                tracing::warn!(
                    handler = handler.name(),
                    event = event.name(),
                    %err,
                    "event handler failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::CourseId;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, event: &DomainEvent) -> Result<(), StorageError> {
            self.seen.lock().unwrap().push(event.name());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _event: &DomainEvent) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_the_others() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        bus.register_handler(Arc::new(Failing)).await;
        bus.register_handler(recorder.clone()).await;

        bus.publish(DomainEvent::CourseDeleted {
            course_id: CourseId::new("c1"),
        })
        .await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["course_deleted"]);
    }
}

// Fold capability set: one pure `apply(prior_state, event) -> new_state` per aggregate type.
//
// Purpose
// - Let the projector stay generic. It asks the registry which fold owns an
//   event type and never inspects `data` itself.
//
// Boundaries
// - Folds are pure. No input or output, no clock, no store access.

use crate::shared::infrastructure::event_store::StoredEvent;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FoldError {
    #[error("event {event_id} carries malformed data: {reason}")]
    MalformedData { event_id: Uuid, reason: String },
}

pub trait AggregateFold: Send + Sync {
    fn aggregate_type(&self) -> &str;

    fn handles(&self, event_type: &str) -> bool;

    /// `state` is `None` for the first event of an aggregate.
    fn apply(&self, state: Option<&Value>, event: &StoredEvent) -> Result<Value, FoldError>;
}

#[derive(Clone, Default)]
pub struct FoldRegistry {
    folds: Vec<Arc<dyn AggregateFold>>,
}

impl FoldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, fold: impl AggregateFold + 'static) -> Self {
        self.folds.push(Arc::new(fold));
        self
    }

    /// First registered fold that handles the event type wins.
    pub fn resolve(&self, event_type: &str) -> Option<&dyn AggregateFold> {
        self.folds
            .iter()
            .find(|fold| fold.handles(event_type))
            .map(|fold| fold.as_ref())
    }

    pub fn aggregate_types(&self) -> Vec<&str> {
        self.folds.iter().map(|fold| fold.aggregate_type()).collect()
    }
}

#[cfg(test)]
mod fold_registry_tests {
    use super::*;
    use rstest::rstest;

    struct Counting(&'static str);

    impl AggregateFold for Counting {
        fn aggregate_type(&self) -> &str {
            self.0
        }

        fn handles(&self, event_type: &str) -> bool {
            event_type.starts_with(self.0)
        }

        fn apply(&self, state: Option<&Value>, _event: &StoredEvent) -> Result<Value, FoldError> {
            let count = state.and_then(Value::as_u64).unwrap_or(0);
            Ok(Value::from(count + 1))
        }
    }

    #[rstest]
    fn it_should_dispatch_on_the_event_type() {
        let registry = FoldRegistry::new()
            .register(Counting("order"))
            .register(Counting("invoice"));
        assert_eq!(
            registry.resolve("invoice.paid").map(|f| f.aggregate_type()),
            Some("invoice")
        );
        assert_eq!(
            registry.resolve("order.placed").map(|f| f.aggregate_type()),
            Some("order")
        );
        assert!(registry.resolve("shipment.sent").is_none());
        assert_eq!(registry.aggregate_types(), vec!["order", "invoice"]);
    }

    #[rstest]
    fn it_should_start_empty() {
        let registry = FoldRegistry::new();
        assert!(registry.aggregate_types().is_empty());
        assert!(registry.resolve("anything").is_none());
    }
}

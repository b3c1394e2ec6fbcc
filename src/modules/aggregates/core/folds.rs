// Built-in fold with patch semantics for JSON aggregates.
//
// - `<namespace><aggregate>.deleted` tombstones the state with `"deleted": true`.
// - Any other `<namespace><aggregate>.*` type merges the keys of `data` into
//   the prior state (shallow) and stamps `id` with the subject.
// - Non-object `data` is malformed and stalls only the affected aggregate.

use crate::modules::aggregates::core::fold::{AggregateFold, FoldError};
use crate::shared::infrastructure::event_store::StoredEvent;
use serde_json::{Map, Value};

pub const DELETED_SUFFIX: &str = "deleted";

pub struct MergeFold {
    aggregate_type: String,
    prefix: String,
}

impl MergeFold {
    pub fn new(namespace: &str, aggregate_type: impl Into<String>) -> Self {
        let aggregate_type = aggregate_type.into();
        let prefix = format!("{namespace}{aggregate_type}.");
        Self {
            aggregate_type,
            prefix,
        }
    }
}

impl AggregateFold for MergeFold {
    fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    fn handles(&self, event_type: &str) -> bool {
        event_type.len() > self.prefix.len() && event_type.starts_with(&self.prefix)
    }

    fn apply(&self, state: Option<&Value>, event: &StoredEvent) -> Result<Value, FoldError> {
        let mut next = match state {
            Some(Value::Object(prior)) => prior.clone(),
            _ => Map::new(),
        };
        next.insert("id".into(), Value::String(event.subject.clone()));

        let action = &event.event_type[self.prefix.len()..];
        if action == DELETED_SUFFIX {
            next.insert("deleted".into(), Value::Bool(true));
            return Ok(Value::Object(next));
        }

        let Value::Object(patch) = &event.data else {
            return Err(FoldError::MalformedData {
                event_id: event.id,
                reason: format!("expected a JSON object, got {}", kind(&event.data)),
            });
        };
        for (key, value) in patch {
            if key != "id" {
                next.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(next))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

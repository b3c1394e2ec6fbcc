// Shared test fixture for events entering the log.
//
// Every builder starts from a fresh UUID so concurrent fixtures never collide
// on the deduplication key.

use crate::shared::core::primitives::Version;
use crate::shared::infrastructure::event_store::{
    DEFAULT_DATA_CONTENT_TYPE, DEFAULT_SPEC_VERSION, NewEvent,
};
use serde_json::{Value, json};
use uuid::Uuid;

pub const VERTRETER_CREATED: &str = "space.maatini.vertreter.created";
pub const VERTRETER_UPDATED: &str = "space.maatini.vertreter.updated";
pub const VERTRETER_DELETED: &str = "space.maatini.vertreter.deleted";

pub struct NewEventBuilder {
    inner: NewEvent,
}

impl Default for NewEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewEventBuilder {
    pub fn new() -> Self {
        Self {
            inner: NewEvent {
                id: Uuid::new_v4(),
                source: "/tests".to_string(),
                event_type: VERTRETER_CREATED.to_string(),
                subject: "v-0001".to_string(),
                aggregate_version: 1,
                data: json!({ "name": "Max Mustermann", "email": "max@example.com" }),
                dataschema: None,
                specversion: DEFAULT_SPEC_VERSION.to_string(),
                datacontenttype: DEFAULT_DATA_CONTENT_TYPE.to_string(),
            },
        }
    }

    pub fn id(mut self, v: Uuid) -> Self {
        self.inner.id = v;
        self
    }

    pub fn event_type(mut self, v: impl Into<String>) -> Self {
        self.inner.event_type = v.into();
        self
    }

    pub fn subject(mut self, v: impl Into<String>) -> Self {
        self.inner.subject = v.into();
        self
    }

    pub fn aggregate_version(mut self, v: Version) -> Self {
        self.inner.aggregate_version = v;
        self
    }

    pub fn data(mut self, v: Value) -> Self {
        self.inner.data = v;
        self
    }

    pub fn dataschema(mut self, v: impl Into<String>) -> Self {
        self.inner.dataschema = Some(v.into());
        self
    }

    pub fn build(self) -> NewEvent {
        self.inner
    }

    /// The same event in the shape a client posts to `/events`.
    pub fn body(self) -> Value {
        let event = self.inner;
        let mut body = json!({
            "id": event.id,
            "source": event.source,
            "type": event.event_type,
            "subject": event.subject,
            "aggregateVersion": event.aggregate_version,
            "data": event.data,
        });
        if let Some(schema) = event.dataschema {
            body["dataschema"] = Value::String(schema);
        }
        body
    }
}

#[cfg(test)]
mod new_event_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn it_should_generate_a_fresh_id_per_builder() {
        let first = NewEventBuilder::new().build();
        let second = NewEventBuilder::new().build();
        assert_ne!(first.id, second.id);
        assert_eq!(first.aggregate_version, 1);
        assert_eq!(first.specversion, DEFAULT_SPEC_VERSION);
    }

    #[rstest]
    fn it_should_render_the_posted_body_in_camel_case() {
        let body = NewEventBuilder::new()
            .subject("A")
            .aggregate_version(2)
            .dataschema("schema.json")
            .body();
        assert_eq!(body["subject"], "A");
        assert_eq!(body["aggregateVersion"], 2);
        assert_eq!(body["type"], VERTRETER_CREATED);
        assert_eq!(body["dataschema"], "schema.json");
    }
}

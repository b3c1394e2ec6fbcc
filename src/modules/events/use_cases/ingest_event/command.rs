// Ingestion command: the client's event exactly as posted, before validation.
//
// Purpose
// - Accept every field as optional so a missing field becomes a readable 400
//   instead of an opaque deserialization failure.
//
// Responsibilities
// - Check structural well-formedness only. `data` stays opaque.

use crate::shared::core::primitives::Version;
use crate::shared::infrastructure::event_store::{
    DEFAULT_DATA_CONTENT_TYPE, DEFAULT_SPEC_VERSION, NewEvent,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("aggregateVersion must be at least 1, got {0}")]
    VersionOutOfRange(i64),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEvent {
    pub id: Option<Uuid>,
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub subject: Option<String>,
    pub aggregate_version: Option<i64>,
    pub data: Option<Value>,
    pub dataschema: Option<String>,
    pub specversion: Option<String>,
    pub datacontenttype: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(value)
}

impl IngestEvent {
    pub fn validate(self) -> Result<NewEvent, ValidationError> {
        let id = self.id.ok_or(ValidationError::Missing("id"))?;
        let source = required(self.source, "source")?;
        let event_type = required(self.event_type, "type")?;
        let subject = required(self.subject, "subject")?;
        let raw_version = self
            .aggregate_version
            .ok_or(ValidationError::Missing("aggregateVersion"))?;
        if raw_version < 1 {
            return Err(ValidationError::VersionOutOfRange(raw_version));
        }
        let data = self.data.ok_or(ValidationError::Missing("data"))?;

        Ok(NewEvent {
            id,
            source,
            event_type,
            subject,
            aggregate_version: raw_version as Version,
            data,
            dataschema: self.dataschema.filter(|s| !s.trim().is_empty()),
            specversion: self
                .specversion
                .unwrap_or_else(|| DEFAULT_SPEC_VERSION.to_string()),
            datacontenttype: self
                .datacontenttype
                .unwrap_or_else(|| DEFAULT_DATA_CONTENT_TYPE.to_string()),
        })
    }
}

#[cfg(test)]
mod ingest_event_command_tests {
    use super::*;
    use crate::tests::fixtures::events::NewEventBuilder;
    use rstest::{fixture, rstest};

    #[fixture]
    fn valid() -> IngestEvent {
        serde_json::from_value(NewEventBuilder::new().subject("A").body()).unwrap()
    }

    #[rstest]
    fn it_should_accept_a_well_formed_event_and_apply_defaults(valid: IngestEvent) {
        let event = valid.validate().expect("expected a valid event");
        assert_eq!(event.subject, "A");
        assert_eq!(event.aggregate_version, 1);
        assert_eq!(event.specversion, DEFAULT_SPEC_VERSION);
        assert_eq!(event.datacontenttype, DEFAULT_DATA_CONTENT_TYPE);
        assert_eq!(event.dataschema, None);
    }

    #[rstest]
    fn it_should_reject_a_missing_id(mut valid: IngestEvent) {
        valid.id = None;
        assert_eq!(valid.validate(), Err(ValidationError::Missing("id")));
    }

    #[rstest]
    #[case::source("source")]
    #[case::event_type("type")]
    #[case::subject("subject")]
    fn it_should_reject_a_blank_required_field(
        mut valid: IngestEvent,
        #[case] field: &'static str,
    ) {
        match field {
            "source" => valid.source = Some("  ".into()),
            "type" => valid.event_type = Some(String::new()),
            _ => valid.subject = Some(" ".into()),
        }
        assert_eq!(valid.validate(), Err(ValidationError::Blank(field)));
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn it_should_reject_a_version_below_one(mut valid: IngestEvent, #[case] version: i64) {
        valid.aggregate_version = Some(version);
        assert_eq!(
            valid.validate(),
            Err(ValidationError::VersionOutOfRange(version))
        );
    }

    #[rstest]
    fn it_should_reject_null_data() {
        let mut body = NewEventBuilder::new().body();
        body["data"] = Value::Null;
        let command: IngestEvent = serde_json::from_value(body).unwrap();
        assert_eq!(command.validate(), Err(ValidationError::Missing("data")));
    }
}

//! Typed decoding of pending documents
//!
//! Turns the loosely typed source document into an [`AnalyticsRecord`]. Every
//! field has a fallback, so decoding never fails; each fallback taken is
//! recorded as a [`DecodeWarning`].

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use thiserror::Error;

use super::types::{AnalyticsRecord, PendingDocument};

pub const FIELD_EVENT_TYPE: &str = "event_type";
pub const FIELD_SOURCE: &str = "source";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_PAYLOAD: &str = "payload";
pub const FIELD_META: &str = "meta";

/// A field that could not be typed cleanly and was defaulted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    #[error("field `{field}` is missing")]
    Missing { field: &'static str },

    #[error("field `{field}` is {found}, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("field `{field}` is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

impl DecodeWarning {
    pub fn field(&self) -> &'static str {
        match self {
            DecodeWarning::Missing { field }
            | DecodeWarning::WrongType { field, .. }
            | DecodeWarning::InvalidTimestamp { field, .. } => field,
        }
    }
}

/// Decoded record plus the fallbacks applied to build it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub record: AnalyticsRecord,
    pub warnings: Vec<DecodeWarning>,
}

pub fn decode_document(document: &PendingDocument) -> DecodedDocument {
    let body = &document.body;
    let mut warnings = Vec::new();

    let record = AnalyticsRecord {
        mongo_id: document.id.key(),
        event_timestamp: timestamp_field(body, FIELD_TIMESTAMP, &mut warnings),
        source: string_field(body, FIELD_SOURCE, &mut warnings),
        event_type: string_field(body, FIELD_EVENT_TYPE, &mut warnings),
        payload: json_field(body, FIELD_PAYLOAD, &mut warnings),
        meta: json_field(body, FIELD_META, &mut warnings),
    };

    DecodedDocument { record, warnings }
}

fn present<'a>(body: &'a Document, field: &str) -> Option<&'a Bson> {
    body.get(field).filter(|v| !matches!(v, Bson::Null | Bson::Undefined))
}

fn string_field(body: &Document, field: &'static str, warnings: &mut Vec<DecodeWarning>) -> String {
    match present(body, field) {
        Some(Bson::String(s)) => s.clone(),
        Some(other) => {
            warnings.push(DecodeWarning::WrongType {
                field,
                expected: "string",
                found: type_name(other),
            });
            String::new()
        },
        None => {
            warnings.push(DecodeWarning::Missing { field });
            String::new()
        },
    }
}

fn timestamp_field(
    body: &Document,
    field: &'static str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<DateTime<Utc>> {
    let value = match present(body, field) {
        Some(value) => value,
        None => {
            warnings.push(DecodeWarning::Missing { field });
            return None;
        },
    };

    let parsed = match value {
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis()),
        Bson::Timestamp(ts) => DateTime::from_timestamp(i64::from(ts.time), 0),
        Bson::Int64(secs) => DateTime::from_timestamp(*secs, 0),
        Bson::Int32(secs) => DateTime::from_timestamp(i64::from(*secs), 0),
        Bson::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        other => {
            warnings.push(DecodeWarning::WrongType {
                field,
                expected: "timestamp",
                found: type_name(other),
            });
            return None;
        },
    };

    if parsed.is_none() {
        warnings.push(DecodeWarning::InvalidTimestamp {
            field,
            value: value.to_string(),
        });
    }

    parsed
}

fn json_field(
    body: &Document,
    field: &'static str,
    warnings: &mut Vec<DecodeWarning>,
) -> serde_json::Value {
    match body.get(field) {
        Some(value) => value.clone().into_relaxed_extjson(),
        None => {
            warnings.push(DecodeWarning::Missing { field });
            serde_json::Value::Null
        },
    }
}

fn type_name(value: &Bson) -> String {
    format!("{:?}", value.element_type()).to_lowercase()
}

//! Field-level validation of JSON request bodies.
//!
//! Payload types describe their fields with [`FieldRule`]s; the REST layer
//! checks the raw JSON against those rules before deserializing, so every
//! problem is reported at once with the offending field path.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::timestamp;

/// One validation problem, serialized into the 422 `detail` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FieldIssue {
    pub fn new(loc: &[&str], kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.iter().map(|part| part.to_string()).collect(),
            msg: msg.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: usize },
    /// Three uppercase ASCII letters, ISO 4217 style.
    CurrencyCode,
    /// RFC 3339 timestamp.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            nullable: false,
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }
}

/// Implemented by every request body type.
pub trait BodySchema {
    const RULES: &'static [FieldRule];
}

const CURRENCY_PATTERN: &str = "^[A-Z]{3}$";

pub fn check_body(body: &Value, rules: &[FieldRule]) -> Result<(), Vec<FieldIssue>> {
    let Some(object) = body.as_object() else {
        return Err(vec![FieldIssue::new(
            &["body"],
            "model_attributes_type",
            "Input should be a valid dictionary or object to extract fields from",
        )]);
    };

    let issues: Vec<FieldIssue> = rules
        .iter()
        .filter_map(|rule| check_field(object, rule))
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_field(object: &Map<String, Value>, rule: &FieldRule) -> Option<FieldIssue> {
    let loc = ["body", rule.name];
    let value = match object.get(rule.name) {
        None if rule.required => {
            return Some(FieldIssue::new(&loc, "missing", "Field required"));
        }
        None => return None,
        Some(Value::Null) if rule.nullable => return None,
        Some(value) => value,
    };

    match rule.kind {
        FieldKind::Text { max_len } => {
            let Some(text) = value.as_str() else {
                return Some(FieldIssue::new(
                    &loc,
                    "string_type",
                    "Input should be a valid string",
                ));
            };
            if text.chars().count() > max_len {
                return Some(FieldIssue::new(
                    &loc,
                    "string_too_long",
                    format!("String should have at most {max_len} characters"),
                ));
            }
            None
        }
        FieldKind::CurrencyCode => {
            let Some(text) = value.as_str() else {
                return Some(FieldIssue::new(
                    &loc,
                    "string_type",
                    "Input should be a valid string",
                ));
            };
            if text.len() != 3 || !text.bytes().all(|b| b.is_ascii_uppercase()) {
                return Some(FieldIssue::new(
                    &loc,
                    "string_pattern_mismatch",
                    format!("String should match pattern '{CURRENCY_PATTERN}'"),
                ));
            }
            None
        }
        FieldKind::Timestamp => {
            let Some(text) = value.as_str() else {
                return Some(FieldIssue::new(
                    &loc,
                    "datetime_type",
                    "Input should be a valid datetime",
                ));
            };
            match timestamp::decode(text) {
                Ok(ts) if timestamp::is_storable(&ts) => None,
                Ok(_) => Some(FieldIssue::new(
                    &loc,
                    "datetime_parsing",
                    "Input should be a valid datetime, year out of range once converted to UTC",
                )),
                Err(err) => Some(FieldIssue::new(
                    &loc,
                    "datetime_parsing",
                    format!("Input should be a valid datetime, {err}"),
                )),
            }
        }
    }
}

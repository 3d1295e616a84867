//! Per-field validation messages

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Field name to messages, in the order the fields were reported.
///
/// Displays as `title: too short | author: required, too long`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was reported
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Parse an API error body of the form `{"field": ["msg", ...]}`.
    ///
    /// Single string values are accepted as one message. Returns `None` when
    /// the body is not a non-empty JSON object.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let map: IndexMap<String, Value> = serde_json::from_slice(body).ok()?;
        let mut errors = Self::new();
        for (field, value) in map {
            match value {
                Value::Array(items) => {
                    for item in items {
                        errors.add(field.clone(), message_text(item));
                    }
                }
                other => errors.add(field, message_text(other)),
            }
        }
        (!errors.is_empty()).then_some(errors)
    }
}

fn message_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

//! Event schemas: a name plus the kind of every field an event may carry.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{Ident, IdentKind};
use crate::store::Resource;

/// Declared kind of an event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 text.
    String,
    /// Signed 32-bit integer.
    Integer,
    /// Signed 64-bit integer.
    Long,
    /// Signed 16-bit integer.
    Short,
    /// Signed 8-bit integer.
    Byte,
    /// 64-bit float.
    Double,
    /// 32-bit float.
    Float,
    /// `true` / `false`.
    Boolean,
    /// RFC 3339 timestamp or epoch milliseconds.
    Date,
    /// Base64 text.
    Binary,
}

impl FieldKind {
    /// Returns `true` if `value` is acceptable for a field of this kind.
    ///
    /// `null` is accepted for every kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::String | Self::Binary => value.is_string(),
            Self::Integer => fits::<i32>(value),
            Self::Long => value.is_i64() || value.is_u64(),
            Self::Short => fits::<i16>(value),
            Self::Byte => fits::<i8>(value),
            Self::Double | Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => match value {
                Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
                Value::Number(n) => n.is_i64() || n.is_u64(),
                _ => false,
            },
        }
    }
}

fn fits<T: TryFrom<i64>>(value: &Value) -> bool {
    value.as_i64().is_some_and(|n| T::try_from(n).is_ok())
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::Double => "double",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A registered event schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    /// Identifier (`ET<n>`).
    pub event_type_id: Ident,
    /// Unique name.
    pub name: String,
    /// Field name to field kind.
    pub mapping: BTreeMap<String, FieldKind>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
    /// Creation time.
    pub created_on: DateTime<Utc>,
}

impl EventType {
    /// Checks event data against the mapping.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first undeclared field or the first
    /// value whose kind does not match.
    pub fn validate_data(&self, data: &Map<String, Value>) -> Result<(), String> {
        for (field, value) in data {
            let Some(kind) = self.mapping.get(field) else {
                return Err(format!(
                    "field {field:?} is not declared by event type {}",
                    self.name
                ));
            };
            if !kind.accepts(value) {
                return Err(format!("field {field:?} expects {kind}, got {value}"));
            }
        }
        Ok(())
    }
}

impl Resource for EventType {
    const KIND: IdentKind = IdentKind::EventType;
    const COLLECTION: &'static str = "eventtypes";

    fn id(&self) -> &Ident {
        &self.event_type_id
    }
}

/// Input for registering an event type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEventType {
    /// Unique name.
    pub name: String,
    /// Field name to field kind. Must not be empty.
    pub mapping: BTreeMap<String, FieldKind>,
    /// Creator.
    #[serde(default)]
    pub created_by: String,
}

impl NewEventType {
    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns a message if the name or mapping is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("event type name must not be empty".to_string());
        }
        if self.mapping.is_empty() {
            return Err("event type mapping must not be empty".to_string());
        }
        if let Some(field) = self.mapping.keys().find(|k| k.trim().is_empty()) {
            return Err(format!("mapping contains an empty field name: {field:?}"));
        }
        Ok(())
    }
}

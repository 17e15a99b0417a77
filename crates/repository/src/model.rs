//! Model contract for entities served by repositories
//!
//! A model is any serde type that knows its table. Rows travel between the
//! repository and its backend as [`Attributes`]; the model is only decoded
//! at the edge, after criteria and eager loading have done their work.

use std::fmt::Debug;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RepositoryError, RepositoryResult};
use crate::key::Key;
use crate::relations::Relation;

/// Column name to value map for a single row
pub type Attributes = serde_json::Map<String, Value>;

/// Core trait for entities persisted through a repository
pub trait Model: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key column name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Primary key value of this instance, if it has been persisted
    fn primary_key(&self) -> Option<Key>;

    /// Attributes that may be mass-assigned through `store` and `update`
    ///
    /// An empty slice allows every attribute.
    fn fillable() -> &'static [&'static str] {
        &[]
    }

    /// Check if this model uses timestamps (created_at, updated_at)
    fn uses_timestamps() -> bool {
        false
    }

    /// Relationships that may be eager loaded by name
    fn relationships() -> Vec<Relation> {
        Vec::new()
    }

    /// Look up a declared relationship by name
    fn relationship(name: &str) -> Option<Relation> {
        Self::relationships()
            .into_iter()
            .find(|relation| relation.name() == name)
    }

    /// Check whether an attribute passes the mass-assignment guard
    fn is_fillable(attribute: &str) -> bool {
        let fillable = Self::fillable();
        fillable.is_empty() || fillable.contains(&attribute)
    }

    /// Attributes of a fresh, unsaved instance
    fn new_instance() -> Attributes {
        Attributes::new()
    }

    /// Mass-assign `data` onto `attributes`, silently discarding guarded keys
    ///
    /// Returns the attributes that were actually assigned.
    fn fill(attributes: &mut Attributes, data: Attributes) -> Attributes {
        let mut assigned = Attributes::new();
        for (key, value) in data {
            if Self::is_fillable(&key) {
                attributes.insert(key.clone(), value.clone());
                assigned.insert(key, value);
            } else {
                tracing::trace!("Discarding guarded attribute '{}' on {}", key, Self::table_name());
            }
        }
        assigned
    }

    /// Serialize this instance into attributes
    fn to_attributes(&self) -> RepositoryResult<Attributes> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(RepositoryError::Serialization(format!(
                "{} serialized to {} instead of an object",
                Self::table_name(),
                json_kind(&other)
            ))),
        }
    }

    /// Decode a row into an instance
    fn from_attributes(attributes: Attributes) -> RepositoryResult<Self> {
        serde_json::from_value(Value::Object(attributes)).map_err(|e| {
            RepositoryError::Serialization(format!(
                "Failed to decode {} row: {}",
                Self::table_name(),
                e
            ))
        })
    }
}

/// Current time as stored in `created_at` / `updated_at`
pub fn fresh_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Convert caller-supplied data into attributes
///
/// Accepts a JSON object; anything else is rejected rather than guessed at.
pub fn into_attributes(data: Value) -> RepositoryResult<Attributes> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(RepositoryError::Serialization(format!(
            "expected an object of attributes, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

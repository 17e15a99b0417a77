//! Primary key values accepted by `find`, `update` and `delete`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Primary key value identifying a single row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Auto-incrementing integer primary key
    Integer(i64),
    /// UUID primary key
    Uuid(Uuid),
    /// Natural string primary key
    String(String),
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Integer(id) => write!(f, "{}", id),
            Key::Uuid(id) => write!(f, "{}", id),
            Key::String(id) => write!(f, "{}", id),
        }
    }
}

impl Key {
    /// Extract as i64 if this is an Integer key
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Key::Integer(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract as UUID if this is a Uuid key
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Key::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    /// JSON value used when binding the key into a query
    pub fn to_value(&self) -> Value {
        match self {
            Key::Integer(id) => Value::from(*id),
            Key::Uuid(id) => Value::String(id.to_string()),
            Key::String(id) => Value::String(id.clone()),
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        key.to_value()
    }
}

macro_rules! integer_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Integer(value as i64)
                }
            }
        )*
    };
}

integer_key!(i16, i32, i64, u16, u32);

impl From<Uuid> for Key {
    fn from(value: Uuid) -> Self {
        Key::Uuid(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_string())
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

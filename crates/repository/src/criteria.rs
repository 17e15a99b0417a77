//! Criteria maps and their translation into where conditions
//!
//! A [`Criteria`] is an ordered field to [`Criterion`] map. Applying it
//! appends one AND-ed condition per entry, in insertion order.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::key::Key;
use crate::query::WhereGroup;

/// Caller-supplied predicate appended as a nested group
#[derive(Clone)]
pub struct RawPredicate(Arc<dyn Fn(WhereGroup) -> WhereGroup + Send + Sync>);

impl RawPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(WhereGroup) -> WhereGroup + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Run the predicate against `group`
    pub fn apply(&self, group: WhereGroup) -> WhereGroup {
        (self.0)(group)
    }
}

impl fmt::Debug for RawPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPredicate(..)")
    }
}

/// Filter value for a single field
#[derive(Debug, Clone)]
pub enum Criterion {
    /// `column = value`
    Equals(Value),
    /// `column IS NULL`
    IsNull,
    /// `column IN (values)`; an empty set matches nothing
    In(Vec<Value>),
    /// Arbitrary conditions built by a closure
    Raw(RawPredicate),
}

impl Criterion {
    /// Wrap a closure as a raw criterion
    pub fn raw<F>(predicate: F) -> Self
    where
        F: Fn(WhereGroup) -> WhereGroup + Send + Sync + 'static,
    {
        Criterion::Raw(RawPredicate::new(predicate))
    }

    /// Append this criterion for `column` to `group`
    pub fn apply(&self, column: &str, group: WhereGroup) -> WhereGroup {
        match self {
            Criterion::IsNull => group.where_null(column),
            Criterion::In(values) => group.where_in(column, values.clone()),
            Criterion::Raw(predicate) => group.where_nested(|nested| predicate.apply(nested)),
            Criterion::Equals(value) => group.where_eq(column, value.clone()),
        }
    }
}

impl From<Value> for Criterion {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Criterion::IsNull,
            Value::Array(values) => Criterion::In(values),
            other => Criterion::Equals(other),
        }
    }
}

macro_rules! equals_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Criterion {
                fn from(value: $ty) -> Self {
                    Criterion::Equals(Value::from(value))
                }
            }
        )*
    };
}

equals_from!(bool, i16, i32, i64, u16, u32, u64, f64, String, &str);

impl From<Key> for Criterion {
    fn from(key: Key) -> Self {
        Criterion::Equals(key.to_value())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Criterion {
    fn from(values: Vec<T>) -> Self {
        Criterion::In(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Criterion>> From<Option<T>> for Criterion {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Criterion::IsNull)
    }
}

/// Ordered, key-unique map of criteria
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    entries: Vec<(String, Criterion)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field`, replacing an existing entry in place
    pub fn insert<C: Into<Criterion>>(&mut self, field: &str, criterion: C) {
        let criterion = criterion.into();
        match self.entries.iter_mut().find(|(key, _)| key == field) {
            Some(entry) => entry.1 = criterion,
            None => self.entries.push((field.to_string(), criterion)),
        }
    }

    /// Builder form of [`Criteria::insert`]
    pub fn with<C: Into<Criterion>>(mut self, field: &str, criterion: C) -> Self {
        self.insert(field, criterion);
        self
    }

    /// Add an equality criterion; JSON `null` and arrays become `IsNull` and `In`
    ///
    /// On PostgreSQL, text that parses as a UUID or an RFC 3339 timestamp is
    /// bound as `uuid` / `timestamptz` and only compares against columns of
    /// that type.
    pub fn eq<T: Into<Value>>(self, field: &str, value: T) -> Self {
        self.with(field, Criterion::from(value.into()))
    }

    pub fn is_null(self, field: &str) -> Self {
        self.with(field, Criterion::IsNull)
    }

    pub fn is_in<T: Into<Value>>(self, field: &str, values: Vec<T>) -> Self {
        self.with(field, Criterion::from(values))
    }

    /// Add a raw criterion; `field` only names the entry for merging
    pub fn raw<F>(self, field: &str, predicate: F) -> Self
    where
        F: Fn(WhereGroup) -> WhereGroup + Send + Sync + 'static,
    {
        self.with(field, Criterion::raw(predicate))
    }

    /// Insert every entry of `other` in its order; `other` wins on collisions
    pub fn merge(&mut self, other: &Criteria) {
        for (field, criterion) in &other.entries {
            self.insert(field, criterion.clone());
        }
    }

    /// Non-mutating [`Criteria::merge`]
    pub fn merged(&self, other: &Criteria) -> Criteria {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, criterion)| criterion)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries
            .iter()
            .map(|(field, criterion)| (field.as_str(), criterion))
    }

    pub fn fields(&self) -> Vec<&str> {
        self.entries.iter().map(|(field, _)| field.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<S: Into<String>, C: Into<Criterion>> FromIterator<(S, C)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (S, C)>>(iter: I) -> Self {
        let mut criteria = Criteria::new();
        for (field, criterion) in iter {
            criteria.insert(&field.into(), criterion);
        }
        criteria
    }
}

/// Append every criterion to `group` in map order
pub fn apply_criteria(group: WhereGroup, criteria: &Criteria) -> WhereGroup {
    criteria
        .iter()
        .fold(group, |group, (field, criterion)| criterion.apply(field, group))
}

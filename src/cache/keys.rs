//! Cache key derivation.
//!
//! Keys take the shape `<namespace>-<operation>[?<encoded-filter>]`. The filter part is a
//! flattened, lower-cased rendering of a [`FilterMap`]:
//!
//! - each entry becomes `key=value`, entries joined by `+`;
//! - a nested map recurses, producing `key=inner=value+...`;
//! - a list (nested lists included) flattens to a comma-joined run of its scalars.
//!
//! A [`FilterMap`] keeps entries in insertion order. Typed filters insert their fields in
//! declaration order, and maps converted from JSON objects arrive sorted by key, so two
//! logically equal filters always produce the same key.

use std::fmt;

use serde_json::Value;

/// A leaf value inside a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => write!(f, "{value}"),
            Scalar::Text(value) => f.write_str(value),
        }
    }
}

/// Any value a filter can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Scalar),
    List(Vec<FilterValue>),
    Map(FilterMap),
}

/// Ordered string-keyed map of filter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMap {
    entries: Vec<(String, FilterValue)>,
}

impl FilterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced entry keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only when a value is present; absent fields never reach the encoder.
    pub fn insert_some<V: Into<FilterValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Conversion of a typed filter into its cache-key representation.
pub trait ToFilter {
    fn to_filter(&self) -> FilterMap;
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<FilterMap> for FilterValue {
    fn from(value: FilterMap) -> Self {
        FilterValue::Map(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Scalar(Scalar::Int(value.into()))
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Scalar(Scalar::Int(value.into()))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(Scalar::Text(value))
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for FilterValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FilterValue::Scalar(Scalar::Null),
            Value::Bool(flag) => FilterValue::Scalar(Scalar::Bool(*flag)),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(int), _) => FilterValue::Scalar(Scalar::Int(int)),
                (None, Some(float)) => FilterValue::Scalar(Scalar::Float(float)),
                (None, None) => FilterValue::Scalar(Scalar::Text(number.to_string())),
            },
            Value::String(text) => FilterValue::Scalar(Scalar::Text(text.clone())),
            Value::Array(items) => FilterValue::List(items.iter().map(FilterValue::from).collect()),
            Value::Object(object) => FilterValue::Map(
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), FilterValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// What a read operation contributes to its cache key.
#[derive(Debug, Clone, Copy)]
pub enum KeyInput<'a> {
    Absent,
    Id(&'a str),
    Filter(&'a FilterMap),
}

/// Build the cache key for `operation` under `namespace`.
pub fn encode_key(namespace: &str, operation: &str, input: KeyInput<'_>) -> String {
    let encoded = match input {
        KeyInput::Absent => String::new(),
        KeyInput::Id(id) if id.is_empty() => String::new(),
        KeyInput::Id(id) => format!("key={id}"),
        KeyInput::Filter(filter) => encode_filter(filter),
    };

    if encoded.is_empty() {
        format!("{namespace}-{operation}")
    } else {
        format!("{namespace}-{operation}?{}", encoded.to_lowercase())
    }
}

/// Flatten a filter into `key=value` pairs joined by `+`. Case is preserved.
pub fn encode_filter(filter: &FilterMap) -> String {
    filter
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_value(value)))
        .collect::<Vec<_>>()
        .join("+")
}

fn encode_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Scalar(scalar) => scalar.to_string(),
        FilterValue::Map(map) => encode_filter(map),
        FilterValue::List(items) => {
            let mut flat = Vec::new();
            flatten_list(items, &mut flat);
            flat.join(",")
        }
    }
}

fn flatten_list(items: &[FilterValue], out: &mut Vec<String>) {
    for item in items {
        match item {
            FilterValue::List(inner) => flatten_list(inner, out),
            FilterValue::Map(map) => out.push(encode_filter(map)),
            FilterValue::Scalar(scalar) => out.push(scalar.to_string()),
        }
    }
}

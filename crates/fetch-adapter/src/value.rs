//! Dynamic request values and their type guards
//!
//! Request data, query parameters and header values arrive from the host
//! client library with no fixed shape. They are modelled here as a closed
//! [`Value`] enum, and every shape probe the translators need is a plain
//! predicate over it.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A dynamically shaped value supplied by the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value at all
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(serde_json::Number),
    /// String
    String(String),
    /// Point in time
    Date(DateTime<Utc>),
    /// Binary buffer
    Bytes(Vec<u8>),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Plain object, entries kept in insertion order
    Object(Vec<(String, Value)>),
    /// Multipart form data
    FormData(FormData),
    /// `application/x-www-form-urlencoded` parameters
    SearchParams(UrlSearchParams),
}

impl Value {
    /// Build a plain object from `(key, value)` pairs, keeping their order
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an array from values
    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// True for [`Value::Array`]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// True for [`Value::FormData`]
    pub fn is_form_data(&self) -> bool {
        matches!(self, Value::FormData(_))
    }

    /// True for [`Value::Date`]
    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    /// True for every non-null compound value: arrays, objects, dates,
    /// buffers, form data and search params.
    pub fn is_object(&self) -> bool {
        !matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// True for [`Value::SearchParams`]
    pub fn is_url_search_params(&self) -> bool {
        matches!(self, Value::SearchParams(_))
    }

    /// True for [`Value::Undefined`]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for [`Value::Undefined`] and [`Value::Null`]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Look up an entry of a plain object by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Coerce to a string the way the host runtime's `String(value)` does
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(n),
            Value::String(s) => s.clone(),
            Value::Date(date) => date.format("%a %b %d %Y %H:%M:%S GMT+0000").to_string(),
            Value::Bytes(bytes) => bytes
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::FormData(_) => "[object FormData]".to_string(),
            Value::SearchParams(params) => params.to_string(),
        }
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => float_to_string(f),
        _ => n.to_string(),
    }
}

/// Shortest round-trip form, switching to exponent notation outside
/// `[1e-6, 1e21)` with an explicit sign on positive exponents
fn float_to_string(f: f64) -> String {
    let magnitude = f.abs();
    if f == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return format!("{f}");
    }

    let exp = format!("{f:e}");
    match exp.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exp,
    }
}

/// ISO-8601 rendering with millisecond precision and a `Z` suffix
pub fn iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// True if `value` is an array
pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

/// True if `value` is multipart form data
pub fn is_form_data(value: &Value) -> bool {
    value.is_form_data()
}

/// True if `value` is a date
pub fn is_date(value: &Value) -> bool {
    value.is_date()
}

/// True if `value` is a non-null compound value
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// True if `value` is a set of urlencoded search params
pub fn is_url_search_params(value: &Value) -> bool {
    value.is_url_search_params()
}

/// True if `value` is undefined
pub fn is_undefined(value: &Value) -> bool {
    value.is_undefined()
}

/// Position of an item handed to a [`for_each`] callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    /// Index into an array
    Index(usize),
    /// Property name of an object
    Name(&'a str),
}

/// Iterate over a collection, calling `f(item, key, collection)` in natural order.
///
/// Nothing happens for undefined or null. Scalars are wrapped into a
/// one-element array, which is what `f` then receives as the collection.
/// Dates, form data and search params have no enumerable entries.
pub fn for_each<F>(value: &Value, mut f: F)
where
    F: FnMut(&Value, Key<'_>, &Value),
{
    match value {
        Value::Undefined | Value::Null => {}
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                f(item, Key::Index(i), value);
            }
        }
        Value::Object(entries) => {
            for (key, item) in entries {
                f(item, Key::Name(key), value);
            }
        }
        Value::Bytes(bytes) => {
            for (i, byte) in bytes.iter().enumerate() {
                f(&Value::from(*byte), Key::Index(i), value);
            }
        }
        Value::Date(_) | Value::FormData(_) | Value::SearchParams(_) => {}
        scalar => {
            let wrapped = Value::Array(vec![scalar.clone()]);
            f(scalar, Key::Index(0), &wrapped);
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(date) => serializer.serialize_str(&iso_string(date)),
            Value::Bytes(bytes) => {
                let mut map = serializer.serialize_map(Some(bytes.len()))?;
                for (i, byte) in bytes.iter().enumerate() {
                    map.serialize_entry(&i.to_string(), byte)?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(entries) => {
                let mut map = serializer.serialize_map(None)?;
                for (key, item) in entries.iter().filter(|(_, v)| !v.is_undefined()) {
                    map.serialize_entry(key, item)?;
                }
                map.end()
            }
            Value::FormData(_) | Value::SearchParams(_) => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n.into())
                }
            }
        )*
    };
}

impl_from_integer!(u8, u16, u32, u64, i8, i16, i32, i64, usize, isize);

impl From<f64> for Value {
    /// Non-finite numbers have no JSON representation and become null.
    fn from(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return Value::Number((f as i64).into());
        }
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<FormData> for Value {
    fn from(form: FormData) -> Self {
        Value::FormData(form)
    }
}

impl From<UrlSearchParams> for Value {
    fn from(params: UrlSearchParams) -> Self {
        Value::SearchParams(params)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Undefined)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}

/// One entry of a [`FormData`]
#[derive(Debug, Clone, PartialEq)]
pub enum FormDataValue {
    /// Plain text field
    Text(String),
    /// File upload
    File(FormDataFile),
}

/// File part of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct FormDataFile {
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the part, if known
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Ordered multipart form fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormData {
    entries: Vec<(String, FormDataValue)>,
}

impl FormData {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((name.into(), FormDataValue::Text(value.into())));
    }

    /// Append a file field
    pub fn append_file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) {
        self.entries.push((
            name.into(),
            FormDataValue::File(FormDataFile {
                file_name: file_name.into(),
                content_type: content_type.map(str::to_string),
                bytes,
            }),
        ));
    }

    /// First value stored under `name`
    pub fn get(&self, name: &str) -> Option<&FormDataValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Iterate over fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormDataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the form has no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered `application/x-www-form-urlencoded` pairs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UrlSearchParams {
    pairs: Vec<(String, String)>,
}

impl UrlSearchParams {
    /// Create an empty set of params
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Append a pair
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// First value stored under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True if there are no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlSearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for UrlSearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

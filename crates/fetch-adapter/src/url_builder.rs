//! URL joining and query string building

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::config::ParamsSerializer;
use crate::value::{for_each, iso_string, Key, Value};

static ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([a-z][a-z\d+\-.]*:)?//").expect("valid absolute URL pattern"));

/// Characters left untouched by `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escapes restored after component encoding, in order
const RESTORED: [(&str, &str); 7] = [
    ("%3A", ":"),
    ("%24", "$"),
    ("%2C", ","),
    ("%20", "+"),
    ("%5B", "["),
    ("%5D", "]"),
    ("%40", "@"),
];

/// Join `base` and `relative` with exactly one slash.
///
/// An absent or empty relative path returns `base` unchanged.
pub fn combine(base: &str, relative: Option<&str>) -> String {
    match relative {
        Some(relative) if !relative.is_empty() => {
            let base = base.strip_suffix('/').unwrap_or(base);
            let relative = relative.strip_prefix('/').unwrap_or(relative);
            format!("{base}/{relative}")
        }
        _ => base.to_string(),
    }
}

/// True if `url` starts with `scheme://` or is protocol relative (`//`)
pub fn is_absolute(url: &str) -> bool {
    ABSOLUTE_URL.is_match(url)
}

/// Resolve `requested` against `base` unless it is already absolute
pub fn build_full_path(base: Option<&str>, requested: &str) -> String {
    match base {
        Some(base) if !is_absolute(requested) => combine(base, Some(requested)),
        _ => requested.to_string(),
    }
}

/// Percent-encode a query key or value, keeping a few characters readable
pub fn encode(value: &str) -> String {
    let mut encoded = utf8_percent_encode(value, COMPONENT).to_string();
    for (escape, literal) in RESTORED {
        encoded = encoded.replace(escape, literal);
    }
    encoded
}

/// Append `params` to `url` as a query string.
///
/// Any `#fragment` is removed. The caller's serializer is used when given,
/// otherwise [`serialize_params`]. Nothing is appended when the serialized
/// query is empty.
pub fn build_url(url: &str, params: &Value, serializer: Option<&ParamsSerializer>) -> String {
    let url = match url.find('#') {
        Some(hash) => &url[..hash],
        None => url,
    };

    if params.is_nullish() {
        return url.to_string();
    }

    let query = match serializer {
        Some(serializer) => serializer.serialize(params),
        None => serialize_params(params),
    };

    if query.is_empty() {
        return url.to_string();
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Default query serializer.
///
/// Search params are rendered as-is. For other values every entry becomes
/// `key=value`: null and undefined entries are skipped, array entries repeat
/// the key with a `[]` suffix, dates become ISO-8601 and nested objects JSON.
pub fn serialize_params(params: &Value) -> String {
    if let Value::SearchParams(search) = params {
        return search.to_string();
    }

    let mut parts = Vec::new();
    for_each(params, |value, key, _| {
        if value.is_nullish() {
            return;
        }

        let mut key = match key {
            Key::Name(name) => name.to_string(),
            Key::Index(i) => i.to_string(),
        };
        if value.is_array() {
            key.push_str("[]");
        }

        let mut push = |item: &Value| {
            let item = match item {
                Value::Date(date) => iso_string(date),
                item if item.is_object() => serde_json::to_string(item).unwrap_or_default(),
                item => item.to_js_string(),
            };
            parts.push(format!("{}={}", encode(&key), encode(&item)));
        };

        match value {
            Value::Array(_) => for_each(value, |item, _, _| push(item)),
            _ => push(value),
        }
    });

    parts.join("&")
}

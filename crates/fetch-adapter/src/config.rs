//! Request configuration handed to the adapter by the host client

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

use crate::value::Value;

/// How the response body is extracted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseType {
    /// Raw bytes
    ArrayBuffer,
    /// Bytes tagged with the response content type
    Blob,
    /// Parsed JSON document
    Json,
    /// Unread byte stream
    Stream,
    /// Decoded text
    #[default]
    Text,
}

impl ResponseType {
    /// Parse a response type name; unknown names fall back to [`ResponseType::Text`]
    pub fn parse(name: &str) -> Self {
        Self::from_str(name).unwrap_or_default()
    }
}

/// Credentials for HTTP basic authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BasicAuth {
    /// User name, empty when absent
    pub username: Option<String>,
    /// Password, empty when absent
    pub password: Option<String>,
}

impl BasicAuth {
    /// Credentials with both parts present
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

/// Caller-supplied query string serializer
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Value) -> String + Send + Sync>);

impl ParamsSerializer {
    /// Wrap a serializer function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Serialize `params` into a query string without the leading `?`
    pub fn serialize(&self, params: &Value) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamsSerializer(..)")
    }
}

/// Status-validation predicate: `true` accepts the status code
#[derive(Clone)]
pub struct ValidateStatus(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl ValidateStatus {
    /// Wrap a predicate
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Accept `200..300`, the host client's default
    pub fn success() -> Self {
        Self::new(|status| (200..300).contains(&status))
    }

    /// Run the predicate
    pub fn accepts(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl fmt::Debug for ValidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidateStatus(..)")
    }
}

/// Generic request configuration.
///
/// Owned by the caller and never modified by the adapter; responses and
/// errors hand it back unchanged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// HTTP method, any case; GET when absent
    pub method: Option<String>,
    /// Request URL, absolute or relative to `base_url`
    pub url: Option<String>,
    /// Prefix for relative URLs
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    /// Request headers; values are coerced to strings
    pub headers: BTreeMap<String, Value>,
    /// Request body payload
    pub data: Value,
    /// Query parameters
    pub params: Value,
    /// Custom query serializer
    #[serde(skip)]
    pub params_serializer: Option<ParamsSerializer>,
    /// Timeout in milliseconds; absent or zero disables it
    pub timeout: Option<u64>,
    /// Message of the timeout error instead of the default template
    pub timeout_error_message: Option<String>,
    /// Send cookies cross-origin (`true`) or never (`false`)
    pub with_credentials: Option<bool>,
    /// How the body is extracted
    pub response_type: ResponseType,
    /// Basic authentication credentials
    pub auth: Option<BasicAuth>,
    /// Status-validation predicate; every status is accepted when absent
    #[serde(skip)]
    pub validate_status: Option<ValidateStatus>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: None,
            url: None,
            base_url: None,
            headers: BTreeMap::new(),
            data: Value::Undefined,
            params: Value::Undefined,
            params_serializer: None,
            timeout: None,
            timeout_error_message: None,
            with_credentials: None,
            response_type: ResponseType::default(),
            auth: None,
            validate_status: Some(ValidateStatus::success()),
        }
    }
}

impl RequestConfig {
    /// Configuration for `method` on `url`
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// GET configuration for `url`
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("get", url)
    }

    /// POST configuration for `url` carrying `data`
    pub fn post(url: impl Into<String>, data: impl Into<Value>) -> Self {
        Self::new("post", url).data(data)
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body payload
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the query parameters
    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.params = params.into();
        self
    }

    /// Use a custom query serializer
    pub fn params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = Some(serializer);
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout(mut self, millis: u64) -> Self {
        self.timeout = Some(millis);
        self
    }

    /// Replace the default timeout message
    pub fn timeout_error_message(mut self, message: impl Into<String>) -> Self {
        self.timeout_error_message = Some(message.into());
        self
    }

    /// Set the credentials flag
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Set how the body is extracted
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Set basic authentication credentials
    pub fn auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replace or remove the status-validation predicate
    pub fn validate_status(mut self, validate_status: Option<ValidateStatus>) -> Self {
        self.validate_status = validate_status;
        self
    }

    /// Timer duration, when a positive timeout is configured
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    /// Message used when the timer wins the race
    pub fn timeout_message(&self) -> String {
        match &self.timeout_error_message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => format!("timeout of {}ms exceeded", self.timeout.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_type_parse() {
        assert_eq!(ResponseType::parse("arraybuffer"), ResponseType::ArrayBuffer);
        assert_eq!(ResponseType::parse("blob"), ResponseType::Blob);
        assert_eq!(ResponseType::parse("json"), ResponseType::Json);
        assert_eq!(ResponseType::parse("stream"), ResponseType::Stream);
        assert_eq!(ResponseType::parse("text"), ResponseType::Text);
        assert_eq!(ResponseType::parse("document"), ResponseType::Text);
        assert_eq!(ResponseType::ArrayBuffer.as_ref(), "arraybuffer");
    }

    #[test]
    fn test_default_validate_status() {
        let config = RequestConfig::default();
        let validate = config.validate_status.expect("Default predicate");
        assert!(validate.accepts(200));
        assert!(validate.accepts(299));
        assert!(!validate.accepts(300));
        assert!(!validate.accepts(404));
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(RequestConfig::default().timeout_duration(), None);
        assert_eq!(RequestConfig::default().timeout(0).timeout_duration(), None);
        assert_eq!(
            RequestConfig::default().timeout(10).timeout_duration(),
            Some(Duration::from_millis(10))
        );
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            RequestConfig::default().timeout(10).timeout_message(),
            "timeout of 10ms exceeded"
        );
        assert_eq!(
            RequestConfig::default()
                .timeout(10)
                .timeout_error_message("too slow")
                .timeout_message(),
            "too slow"
        );
    }

    #[test]
    fn test_serialize_skips_functions() {
        let config = RequestConfig::get("/users")
            .base_url("https://api.example.com")
            .timeout(5);
        let json = serde_json::to_value(&config).expect("Serializable config");
        assert_eq!(json["method"], "get");
        assert_eq!(json["baseURL"], "https://api.example.com");
        assert_eq!(json["responseType"], "text");
        assert_eq!(json["timeout"], 5);
        assert!(json.get("validateStatus").is_none());
    }
}

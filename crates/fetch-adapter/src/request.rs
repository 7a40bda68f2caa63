//! Translation of a request configuration into a native request

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use url::Url;

use crate::config::RequestConfig;
use crate::env::Environment;
use crate::error::{AdapterError, ErrorCode};
use crate::url_builder::{build_full_path, build_url};
use crate::value::{FormData, Value};

const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded;charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";

/// Credentials mode of a native request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Never send cookies
    Omit,
    /// Send cookies to the same origin only
    #[default]
    SameOrigin,
    /// Always send cookies
    Include,
}

/// Body of a native request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Multipart form; the transport picks the boundary
    Form(FormData),
}

/// Request handed to the transport.
///
/// Built once per adapter invocation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<RequestBody>,
    credentials: Credentials,
}

impl NativeRequest {
    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fully resolved URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body, never present for GET and HEAD
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Credentials mode
    pub fn credentials(&self) -> Credentials {
        self.credentials
    }
}

/// Build a native request from `config`.
///
/// Fails when a header, the method or the URL would be rejected by the
/// platform; the error carries the configuration but no request.
pub fn create_request(
    config: &Arc<RequestConfig>,
    env: &Environment,
) -> Result<NativeRequest, AdapterError> {
    let bad_option = |message: String| {
        AdapterError::new(message, config.clone(), Some(ErrorCode::BadOptionValue), None, None)
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| bad_option(format!("Invalid header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(&value.to_js_string())
            .map_err(|e| bad_option(format!("Invalid value for header {name:?}: {e}")))?;
        headers.insert(header_name, header_value);
    }

    if let Some(auth) = &config.auth {
        let username = auth.username.as_deref().unwrap_or_default();
        let password = auth.password.as_deref().unwrap_or_default();
        let token = STANDARD.encode(format!("{username}:{password}"));
        let value = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| bad_option(format!("Invalid basic auth credentials: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    let method = config
        .method
        .as_deref()
        .unwrap_or("get")
        .to_uppercase();
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|e| bad_option(format!("Invalid method {method:?}: {e}")))?;

    let mut body = None;
    if method != Method::GET && method != Method::HEAD {
        body = request_body(&config.data, &mut headers);

        if matches!(body, Some(RequestBody::Form(_))) && env.is_standard_browser_env() {
            headers.remove(CONTENT_TYPE);
        }
    }

    let credentials = match config.with_credentials {
        Some(true) => Credentials::Include,
        Some(false) => Credentials::Omit,
        None => Credentials::SameOrigin,
    };

    let full_path = build_full_path(config.base_url.as_deref(), config.url.as_deref().unwrap_or_default());
    let url = build_url(&full_path, &config.params, config.params_serializer.as_ref());
    let url = Url::options()
        .base_url(env.location())
        .parse(&url)
        .map_err(|e| {
            AdapterError::new(
                format!("Invalid URL {url:?}: {e}"),
                config.clone(),
                Some(ErrorCode::InvalidUrl),
                None,
                None,
            )
        })?;

    Ok(NativeRequest {
        method,
        url,
        headers,
        body,
        credentials,
    })
}

/// Convert a payload into a body, adding the content type the platform
/// would infer when the caller did not set one.
fn request_body(data: &Value, headers: &mut HeaderMap) -> Option<RequestBody> {
    let (body, implied_type) = match data {
        Value::Undefined | Value::Null => return None,
        Value::String(text) => (RequestBody::Text(text.clone()), Some(TEXT_PLAIN)),
        Value::Bytes(bytes) => (RequestBody::Bytes(bytes.clone()), None),
        Value::FormData(form) => (RequestBody::Form(form.clone()), None),
        Value::SearchParams(params) => (RequestBody::Text(params.to_string()), Some(FORM_URLENCODED)),
        Value::Array(_) | Value::Object(_) => (
            RequestBody::Text(serde_json::to_string(data).unwrap_or_default()),
            Some(APPLICATION_JSON),
        ),
        other => (RequestBody::Text(other.to_js_string()), Some(TEXT_PLAIN)),
    };

    if let Some(content_type) = implied_type {
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    Some(body)
}

//! Error types

use std::sync::Arc;

use serde_json::json;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::config::RequestConfig;
use crate::request::NativeRequest;
use crate::response::ResponseEnvelope;

/// Errors raised by a transport backend
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Failure while reading the response body
    #[error("Body error: {0}")]
    Body(String),
    /// Request could not be built by the platform
    #[error("Request build error: {0}")]
    Build(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpError::Body(err.to_string())
        } else if err.is_connect() || err.is_request() {
            HttpError::Connection(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for HttpError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        use wasm_bindgen::JsCast;

        let message = value
            .dyn_ref::<js_sys::Error>()
            .map(|e| String::from(e.message()))
            .or_else(|| value.as_string())
            .unwrap_or_else(|| format!("{value:?}"));
        HttpError::Other(message)
    }
}

/// Symbolic error codes understood by the host client
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
pub enum ErrorCode {
    /// The timeout elapsed before a response arrived
    #[strum(serialize = "ECONNABORTED")]
    ConnectionAborted,
    /// The transport failed to deliver a response
    #[strum(serialize = "ERR_NETWORK")]
    Network,
    /// A 4xx status was rejected by the status predicate
    #[strum(serialize = "ERR_BAD_REQUEST")]
    BadRequest,
    /// A 5xx status was rejected by the status predicate
    #[strum(serialize = "ERR_BAD_RESPONSE")]
    BadResponse,
    /// A configuration value could not be turned into a request
    #[strum(serialize = "ERR_BAD_OPTION_VALUE")]
    BadOptionValue,
    /// The request URL could not be parsed
    #[strum(serialize = "ERR_INVALID_URL")]
    InvalidUrl,
}

impl ErrorCode {
    /// Code for a status rejected by the status predicate, if any
    pub fn from_status(status: u16) -> Option<Self> {
        match status / 100 {
            4 => Some(ErrorCode::BadRequest),
            5 => Some(ErrorCode::BadResponse),
            _ => None,
        }
    }
}

/// Error returned by the adapter.
///
/// Carries the configuration, and when they exist the native request and the
/// response, so callers can inspect a failure without re-deriving context.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    code: Option<ErrorCode>,
    config: Arc<RequestConfig>,
    request: Option<Arc<NativeRequest>>,
    response: Option<Box<ResponseEnvelope>>,
    #[source]
    source: Option<HttpError>,
}

impl AdapterError {
    /// Create an error with the specified message, config, code, request and response
    pub fn new(
        message: impl Into<String>,
        config: Arc<RequestConfig>,
        code: Option<ErrorCode>,
        request: Option<Arc<NativeRequest>>,
        response: Option<ResponseEnvelope>,
    ) -> Self {
        Self {
            message: message.into(),
            code,
            config,
            request,
            response: response.map(Box::new),
            source: None,
        }
    }

    /// Attach the transport error that caused this one
    pub fn with_source(mut self, source: HttpError) -> Self {
        self.source = Some(source);
        self
    }

    /// Human readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Symbolic code, if the failure has one
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Configuration of the failed request
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Native request, absent when the request could not be built
    pub fn request(&self) -> Option<&NativeRequest> {
        self.request.as_deref()
    }

    /// Response, present for status-validation failures
    pub fn response(&self) -> Option<&ResponseEnvelope> {
        self.response.as_deref()
    }

    /// Take ownership of the response
    pub fn into_response(self) -> Option<ResponseEnvelope> {
        self.response.map(|response| *response)
    }

    /// Status of the attached response
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|response| response.status)
    }

    /// Marker the host client uses to recognise its own errors
    pub fn is_axios_error(&self) -> bool {
        true
    }

    /// Serializable summary of the error
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "message": self.message,
            "name": "AxiosError",
            "code": self.code.map(|code| code.to_string()),
            "status": self.status(),
            "config": serde_json::to_value(self.config.as_ref()).unwrap_or_default(),
        })
    }
}

//! Native responses and the response envelope returned to callers

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::{stream, Stream, StreamExt, TryStreamExt};
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use crate::backends::Transport;
use crate::config::{RequestConfig, ResponseType};
use crate::error::{AdapterError, ErrorCode, HttpError};
use crate::request::NativeRequest;

#[cfg(not(target_arch = "wasm32"))]
type InnerStream = stream::BoxStream<'static, Result<Vec<u8>, HttpError>>;

#[cfg(target_arch = "wasm32")]
type InnerStream = stream::LocalBoxStream<'static, Result<Vec<u8>, HttpError>>;

/// Unread response body, yielded chunk by chunk.
///
/// Polled only through `&mut self`, so the mutex is never contended. It
/// makes the body `Sync` on native targets.
pub struct BodyStream {
    inner: Mutex<InnerStream>,
}

impl BodyStream {
    /// Wrap a chunk stream
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>, HttpError>> + Send + 'static,
    {
        Self {
            inner: Mutex::new(stream.boxed()),
        }
    }

    /// Wrap a chunk stream
    #[cfg(target_arch = "wasm32")]
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>, HttpError>> + 'static,
    {
        Self {
            inner: Mutex::new(stream.boxed_local()),
        }
    }
}

impl Stream for BodyStream {
    type Item = Result<Vec<u8>, HttpError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let inner = match self.get_mut().inner.get_mut() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyStream(..)")
    }
}

/// Response produced by a transport; its body can be consumed once
pub struct NativeResponse {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: BodyStream,
}

impl fmt::Debug for NativeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl NativeResponse {
    /// Create a response around a body stream
    pub fn new(
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
        body: BodyStream,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body,
        }
    }

    /// Create a response whose body is already in memory
    pub fn from_bytes(
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        let body = body.into();
        let body = BodyStream::new(stream::once(async move { Ok::<_, HttpError>(body) }));
        Self::new(status, status_text, headers, body)
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Take the unread body
    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Read the whole body
    pub async fn bytes(self) -> Result<Vec<u8>, HttpError> {
        self.body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
    }

    /// Read the whole body as UTF-8 text, replacing invalid sequences
    pub async fn text(self) -> Result<String, HttpError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read and parse the whole body as JSON
    pub async fn json(self) -> Result<serde_json::Value, HttpError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(HttpError::from)
    }
}

/// Body bytes tagged with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Contents
    pub bytes: Vec<u8>,
    /// `content-type` of the response, empty when absent
    pub content_type: String,
}

/// Extracted response body
pub enum ResponseData {
    /// No body was read (status below 200, or 204)
    Empty,
    /// Raw bytes
    ArrayBuffer(Vec<u8>),
    /// Bytes with their MIME type
    Blob(Blob),
    /// Parsed JSON
    Json(serde_json::Value),
    /// Unread body stream
    Stream(BodyStream),
    /// Decoded text
    Text(String),
}

impl fmt::Debug for ResponseData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseData::Empty => f.write_str("Empty"),
            ResponseData::ArrayBuffer(bytes) => f.debug_tuple("ArrayBuffer").field(bytes).finish(),
            ResponseData::Blob(blob) => f.debug_tuple("Blob").field(blob).finish(),
            ResponseData::Json(json) => f.debug_tuple("Json").field(json).finish(),
            ResponseData::Stream(_) => f.write_str("Stream(..)"),
            ResponseData::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

impl ResponseData {
    /// Text content, if the body was read as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON content, if the body was parsed as JSON
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(json) => Some(json),
            _ => None,
        }
    }

    /// True if no body was read
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseData::Empty)
    }
}

/// Normalized response handed back to the caller
#[derive(Debug)]
pub struct ResponseEnvelope {
    /// Extracted body
    pub data: ResponseData,
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Headers keyed by lowercase name
    pub headers: BTreeMap<String, String>,
    /// Configuration the request was made with
    pub config: Arc<RequestConfig>,
    /// Native request that produced this response
    pub request: Arc<NativeRequest>,
}

/// Flatten a header map; repeated headers are joined with `", "`
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let value = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), value)
        })
        .collect()
}

/// Issue `request` through `transport` and translate the outcome.
///
/// A transport failure becomes a `Network Error`, except a request the
/// platform refused to build, which keeps its message and is coded
/// `ERR_BAD_OPTION_VALUE`. The body is read according
/// to the configured response type whenever the status is at least 200 and
/// not 204; whether the status is acceptable is decided later by
/// [`settle`](crate::settle::settle).
pub async fn get_response(
    transport: &dyn Transport,
    request: Arc<NativeRequest>,
    config: Arc<RequestConfig>,
) -> Result<ResponseEnvelope, AdapterError> {
    let native = match transport.fetch(&request).await {
        Ok(native) => native,
        Err(err @ HttpError::Build(_)) => {
            tracing::warn!(url = %request.url(), "Platform rejected request: {}", err);
            return Err(AdapterError::new(
                err.to_string(),
                config,
                Some(ErrorCode::BadOptionValue),
                Some(request),
                None,
            )
            .with_source(err));
        }
        Err(err) => {
            tracing::warn!(url = %request.url(), "Fetch failed: {}", err);
            return Err(AdapterError::new(
                "Network Error",
                config,
                Some(ErrorCode::Network),
                Some(request),
                None,
            )
            .with_source(err));
        }
    };

    let status = native.status();
    let status_text = native.status_text().to_string();
    let headers = flatten_headers(native.headers());
    tracing::debug!(url = %request.url(), status, "Received response");

    let data = if status >= 200 && status != 204 {
        match read_body(native, config.response_type, &headers).await {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(url = %request.url(), "Failed to read response body: {}", err);
                return Err(AdapterError::new(err.to_string(), config, None, Some(request), None)
                    .with_source(err));
            }
        }
    } else {
        ResponseData::Empty
    };

    Ok(ResponseEnvelope {
        data,
        status,
        status_text,
        headers,
        config,
        request,
    })
}

async fn read_body(
    native: NativeResponse,
    response_type: ResponseType,
    headers: &BTreeMap<String, String>,
) -> Result<ResponseData, HttpError> {
    Ok(match response_type {
        ResponseType::ArrayBuffer => ResponseData::ArrayBuffer(native.bytes().await?),
        ResponseType::Blob => ResponseData::Blob(Blob {
            bytes: native.bytes().await?,
            content_type: headers
                .get(CONTENT_TYPE.as_str())
                .cloned()
                .unwrap_or_default(),
        }),
        ResponseType::Json => ResponseData::Json(native.json().await?),
        ResponseType::Stream => ResponseData::Stream(native.into_body()),
        ResponseType::Text => ResponseData::Text(native.text().await?),
    })
}

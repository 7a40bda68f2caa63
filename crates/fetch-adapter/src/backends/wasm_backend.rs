//! WASM transport using the browser's native `fetch()` API

use async_trait::async_trait;
use futures::stream;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use js_sys::{Array, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::Transport;
use crate::error::HttpError;
use crate::request::{Credentials, NativeRequest, RequestBody};
use crate::response::{BodyStream, NativeResponse};
use crate::value::{FormData, FormDataValue};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "fetch")]
    fn js_fetch(input: &web_sys::Request) -> js_sys::Promise;
}

/// Transport issuing requests through the global `fetch`
#[derive(Debug, Clone, Default)]
pub struct WasmBackend;

impl WasmBackend {
    /// Create a new backend
    pub fn new() -> Self {
        Self
    }
}

/// Aborts the in-flight fetch when dropped before being disarmed
struct AbortOnDrop(Option<web_sys::AbortController>);

impl AbortOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(controller) = self.0.take() {
            tracing::debug!("Aborting fetch");
            controller.abort();
        }
    }
}

fn form_data(form: &FormData) -> Result<web_sys::FormData, HttpError> {
    let data = web_sys::FormData::new()?;
    for (name, value) in form.iter() {
        match value {
            FormDataValue::Text(text) => data.append_with_str(name, text)?,
            FormDataValue::File(file) => {
                let parts = Array::of1(&Uint8Array::from(file.bytes.as_slice()));
                let options = web_sys::BlobPropertyBag::new();
                if let Some(content_type) = &file.content_type {
                    options.set_type(content_type);
                }
                let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
                data.append_with_blob_and_filename(name, &blob, &file.file_name)?;
            }
        }
    }
    Ok(data)
}

/// Every failure here means the platform refused the request; callers report
/// it as [`HttpError::Build`].
fn build_request(
    request: &NativeRequest,
    signal: &web_sys::AbortSignal,
) -> Result<web_sys::Request, HttpError> {
    let init = web_sys::RequestInit::new();
    init.set_method(request.method().as_str());

    let headers = web_sys::Headers::new()?;
    for (name, value) in request.headers() {
        let value = value
            .to_str()
            .map_err(|e| HttpError::Build(format!("Header {name} is not valid text: {e}")))?;
        headers.append(name.as_str(), value)?;
    }
    init.set_headers(&headers);

    match request.body() {
        None => {}
        Some(RequestBody::Text(text)) => init.set_body(&JsValue::from_str(text)),
        Some(RequestBody::Bytes(bytes)) => {
            init.set_body(&Uint8Array::from(bytes.as_slice()).into())
        }
        Some(RequestBody::Form(form)) => init.set_body(&form_data(form)?.into()),
    }

    init.set_credentials(match request.credentials() {
        Credentials::Omit => web_sys::RequestCredentials::Omit,
        Credentials::SameOrigin => web_sys::RequestCredentials::SameOrigin,
        Credentials::Include => web_sys::RequestCredentials::Include,
    });
    init.set_signal(Some(signal));

    web_sys::Request::new_with_str_and_init(request.url().as_str(), &init)
        .map_err(|e| HttpError::Build(HttpError::from(e).to_string()))
}

fn read_headers(headers: &web_sys::Headers) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::new();
    let Some(entries) = js_sys::try_iter(headers)? else {
        return Ok(map);
    };

    for entry in entries {
        let entry: Array = entry?.unchecked_into();
        let name = entry.get(0).as_string().unwrap_or_default();
        let value = entry.get(1).as_string().unwrap_or_default();
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping unrepresentable response header"),
        }
    }
    Ok(map)
}

/// Pull chunks from the response's readable stream. The abort guard lives as
/// long as the stream, so dropping an unfinished stream aborts the fetch.
fn body_stream(response: &web_sys::Response, mut guard: AbortOnDrop) -> BodyStream {
    let Some(body) = response.body() else {
        guard.disarm();
        return BodyStream::new(stream::empty::<Result<Vec<u8>, HttpError>>());
    };
    let reader: web_sys::ReadableStreamDefaultReader = body.get_reader().unchecked_into();

    BodyStream::new(stream::unfold(Some((reader, guard)), |state| async move {
        let (reader, mut guard) = state?;

        let chunk = match JsFuture::from(reader.read()).await {
            Ok(chunk) => chunk,
            Err(err) => {
                return Some((Err(HttpError::Body(HttpError::from(err).to_string())), None));
            }
        };

        let done = Reflect::get(&chunk, &JsValue::from_str("done"))
            .map(|done| done.is_truthy())
            .unwrap_or(true);
        if done {
            guard.disarm();
            return None;
        }

        match Reflect::get(&chunk, &JsValue::from_str("value")) {
            Ok(value) => Some((
                Ok(Uint8Array::new(&value).to_vec()),
                Some((reader, guard)),
            )),
            Err(err) => Some((Err(HttpError::Body(HttpError::from(err).to_string())), None)),
        }
    }))
}

#[async_trait(?Send)]
impl Transport for WasmBackend {
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, HttpError> {
        let controller = web_sys::AbortController::new()?;
        let js_request = build_request(request, &controller.signal()).map_err(|e| match e {
            HttpError::Build(_) => e,
            other => HttpError::Build(other.to_string()),
        })?;
        let guard = AbortOnDrop(Some(controller));

        let value = JsFuture::from(js_fetch(&js_request))
            .await
            .map_err(|e| HttpError::Connection(HttpError::from(e).to_string()))?;

        let response: web_sys::Response = value
            .dyn_into()
            .map_err(|_| HttpError::Other("Response is not a web_sys::Response".to_string()))?;

        let headers = read_headers(&response.headers())?;
        let body = body_stream(&response, guard);

        Ok(NativeResponse::new(
            response.status(),
            response.status_text(),
            headers,
            body,
        ))
    }
}

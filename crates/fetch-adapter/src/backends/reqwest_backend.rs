//! reqwest-based transport

use async_trait::async_trait;
use futures::StreamExt;
use http::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use super::Transport;
use crate::error::HttpError;
use crate::request::{Credentials, NativeRequest, RequestBody};
use crate::response::{BodyStream, NativeResponse};
use crate::value::{FormData, FormDataValue};

/// Transport issuing requests through a [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    inner: reqwest::Client,
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestBackend {
    /// Create a backend with default client settings
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Create a backend from a configured reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

fn multipart_form(form: &FormData) -> Result<Form, HttpError> {
    let mut multipart = Form::new();
    for (name, value) in form.iter() {
        multipart = match value {
            FormDataValue::Text(text) => multipart.text(name.to_string(), text.clone()),
            FormDataValue::File(file) => {
                let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
                if let Some(content_type) = &file.content_type {
                    part = part
                        .mime_str(content_type)
                        .map_err(|e| HttpError::Build(format!("Invalid part type: {e}")))?;
                }
                multipart.part(name.to_string(), part)
            }
        };
    }
    Ok(multipart)
}

#[async_trait]
impl Transport for ReqwestBackend {
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, HttpError> {
        if request.credentials() != Credentials::SameOrigin {
            tracing::trace!(
                credentials = ?request.credentials(),
                "Credentials mode has no effect outside a browser"
            );
        }

        let mut headers = request.headers().clone();
        let mut builder = self
            .inner
            .request(request.method().clone(), request.url().clone());

        builder = match request.body() {
            None => builder,
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Form(form)) => {
                // The boundary is chosen by reqwest
                headers.remove(CONTENT_TYPE);
                builder.multipart(multipart_form(form)?)
            }
        };

        let response = builder.headers(headers).send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = BodyStream::new(
            response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(HttpError::from)),
        );

        Ok(NativeResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            body,
        ))
    }
}

//! Fetch transport adapter
//!
//! This crate turns a generic request configuration into a native request,
//! issues it through the platform fetch primitive (reqwest on native targets,
//! the browser's `fetch()` on wasm32), races it against an optional timeout,
//! and hands back a normalized response envelope or a structured error.
//!
//! # Example
//!
//! ```no_run
//! use fetch_adapter::{FetchAdapter, RequestConfig, ResponseType, Value};
//!
//! async fn example() -> Result<(), fetch_adapter::AdapterError> {
//!     let adapter = FetchAdapter::new();
//!     let response = adapter
//!         .request(
//!             RequestConfig::get("/users")
//!                 .base_url("https://api.example.com")
//!                 .params(Value::object([("page", 2)]))
//!                 .response_type(ResponseType::Json)
//!                 .timeout(5_000),
//!         )
//!         .await?;
//!
//!     println!("{} {:?}", response.status, response.data.as_json());
//!     Ok(())
//! }
//! ```

mod adapter;
pub mod backends;
mod config;
mod env;
mod error;
mod request;
mod response;
mod settle;
mod timer;
pub mod url_builder;
pub mod value;

pub use adapter::{fetch_adapter, FetchAdapter, FetchAdapterBuilder};
pub use backends::{DefaultBackend, Transport};
pub use config::{BasicAuth, ParamsSerializer, RequestConfig, ResponseType, ValidateStatus};
pub use env::{Environment, GlobalDescriptor};
pub use error::{AdapterError, ErrorCode, HttpError};
pub use request::{create_request, Credentials, NativeRequest, RequestBody};
pub use response::{
    flatten_headers, get_response, Blob, BodyStream, NativeResponse, ResponseData,
    ResponseEnvelope,
};
pub use settle::{settle, settle_with};
pub use value::{
    for_each, is_array, is_date, is_form_data, is_object, is_undefined, is_url_search_params,
    FormData, FormDataFile, FormDataValue, Key, UrlSearchParams, Value,
};

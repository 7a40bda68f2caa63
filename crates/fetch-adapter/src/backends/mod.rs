//! Platform fetch primitives

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::HttpError;
use crate::request::NativeRequest;
use crate::response::NativeResponse;

#[cfg(not(target_arch = "wasm32"))]
pub mod reqwest_backend;

#[cfg(target_arch = "wasm32")]
pub mod wasm_backend;

#[cfg(test)]
pub(crate) mod mock;

#[cfg(not(target_arch = "wasm32"))]
pub use reqwest_backend::ReqwestBackend as DefaultBackend;
#[cfg(target_arch = "wasm32")]
pub use wasm_backend::WasmBackend as DefaultBackend;

pub use conditional_types::ConditionalSend;

#[cfg(not(target_arch = "wasm32"))]
mod conditional_types {
    /// `Send + Sync` on native targets
    pub trait ConditionalSend: Send + Sync {}

    impl<T> ConditionalSend for T where T: Send + Sync {}
}

#[cfg(target_arch = "wasm32")]
mod conditional_types {
    /// No bound on wasm, where JS handles are neither `Send` nor `Sync`
    pub trait ConditionalSend {}

    impl<T> ConditionalSend for T {}
}

/// The platform fetch primitive.
///
/// Issues one native request and resolves once the status line and headers
/// are available. The body is left unread in the returned response.
/// Dropping the returned future cancels the request.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Transport: Debug + ConditionalSend {
    /// Send `request`
    async fn fetch(&self, request: &NativeRequest) -> Result<NativeResponse, HttpError>;
}

//! Transport adapter: translate, fetch, race the timeout, settle

use std::sync::Arc;

use futures::future::{self, Either};

use crate::backends::{DefaultBackend, Transport};
use crate::config::RequestConfig;
use crate::env::Environment;
use crate::error::{AdapterError, ErrorCode};
use crate::request::create_request;
use crate::response::{get_response, ResponseEnvelope};
use crate::settle::settle;
use crate::timer;

/// Adapter that issues requests through a [`Transport`]
#[derive(Debug, Clone)]
pub struct FetchAdapter {
    transport: Arc<dyn Transport>,
    environment: Environment,
}

impl Default for FetchAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchAdapter {
    /// Create an adapter using the platform transport and environment
    pub fn new() -> Self {
        Self {
            transport: Arc::new(DefaultBackend::default()),
            environment: Environment::current(),
        }
    }

    /// Create a new adapter builder
    pub fn builder() -> FetchAdapterBuilder {
        FetchAdapterBuilder::default()
    }

    /// Environment the adapter was built for
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Perform the request described by `config`.
    ///
    /// Resolves with the response envelope when the status is accepted.
    /// Rejects when the request cannot be built, on network failure, when
    /// the timeout elapses first (`ECONNABORTED`), when the body cannot be
    /// read, or when the status is rejected.
    pub async fn request(&self, config: RequestConfig) -> Result<ResponseEnvelope, AdapterError> {
        let config = Arc::new(config);
        let request = Arc::new(create_request(&config, &self.environment)?);
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending request");

        let fetch = get_response(self.transport.as_ref(), request.clone(), config.clone());

        let outcome = match config.timeout_duration() {
            None => fetch.await,
            Some(duration) => {
                let timer = timer::sleep(duration);
                futures::pin_mut!(fetch);
                futures::pin_mut!(timer);

                match future::select(fetch, timer).await {
                    Either::Left((outcome, _)) => outcome,
                    // The pending fetch is dropped on return, cancelling it
                    Either::Right(((), _)) => {
                        tracing::warn!(url = %request.url(), ?duration, "Request timed out");
                        return Err(AdapterError::new(
                            config.timeout_message(),
                            config.clone(),
                            Some(ErrorCode::ConnectionAborted),
                            Some(request),
                            None,
                        ));
                    }
                }
            }
        };

        settle(outcome?)
    }
}

/// Builder for [`FetchAdapter`]
#[derive(Debug, Default)]
pub struct FetchAdapterBuilder {
    transport: Option<Arc<dyn Transport>>,
    environment: Option<Environment>,
}

impl FetchAdapterBuilder {
    /// Use `transport` instead of the platform default
    pub fn transport<T: Transport + 'static>(self, transport: T) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Use a transport shared with other owners
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `environment` instead of detecting it
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Build the adapter
    pub fn build(self) -> FetchAdapter {
        FetchAdapter {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(DefaultBackend::default())),
            environment: self.environment.unwrap_or_else(Environment::current),
        }
    }
}

/// Perform `config` with a default adapter
pub async fn fetch_adapter(config: RequestConfig) -> Result<ResponseEnvelope, AdapterError> {
    FetchAdapter::new().request(config).await
}

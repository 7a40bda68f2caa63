//! Scripted transport for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};

use super::Transport;
use crate::error::HttpError;
use crate::request::NativeRequest;
use crate::response::NativeResponse;

#[derive(Debug)]
enum Behavior {
    Respond {
        status: u16,
        headers: HeaderMap,
        body: Vec<u8>,
    },
    Fail(Mutex<Option<HttpError>>),
    Delayed {
        delay: Duration,
        status: u16,
        body: Vec<u8>,
    },
    Pending,
}

/// Sets the flag when dropped before being disarmed
struct CancelGuard(Option<Arc<AtomicBool>>);

impl CancelGuard {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(flag) = self.0.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockTransport {
    behavior: Behavior,
    calls: AtomicUsize,
    cancelled: Arc<AtomicBool>,
}

impl MockTransport {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn respond(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self::with(Behavior::Respond {
            status,
            headers,
            body: body.into(),
        })
    }

    pub(crate) fn fail(error: HttpError) -> Self {
        Self::with(Behavior::Fail(Mutex::new(Some(error))))
    }

    pub(crate) fn delayed(delay: Duration, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::with(Behavior::Delayed {
            delay,
            status,
            body: body.into(),
        })
    }

    pub(crate) fn pending() -> Self {
        Self::with(Behavior::Pending)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cancelled(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }
}

fn reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, _request: &NativeRequest) -> Result<NativeResponse, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Respond {
                status,
                headers,
                body,
            } => Ok(NativeResponse::from_bytes(
                *status,
                reason(*status),
                headers.clone(),
                body.clone(),
            )),
            Behavior::Fail(error) => Err(error
                .lock()
                .expect("Mock lock")
                .take()
                .unwrap_or_else(|| HttpError::Other("mock exhausted".into()))),
            Behavior::Delayed {
                delay,
                status,
                body,
            } => {
                let guard = CancelGuard(Some(self.cancelled.clone()));
                tokio::time::sleep(*delay).await;
                guard.disarm();
                Ok(NativeResponse::from_bytes(
                    *status,
                    reason(*status),
                    HeaderMap::new(),
                    body.clone(),
                ))
            }
            Behavior::Pending => {
                let _guard = CancelGuard(Some(self.cancelled.clone()));
                futures::future::pending::<()>().await;
                Err(HttpError::Other("unreachable".into()))
            }
        }
    }
}

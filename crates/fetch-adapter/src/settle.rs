//! Resolution of a response against the status predicate

use crate::error::{AdapterError, ErrorCode};
use crate::response::ResponseEnvelope;

/// Accept or reject `response` according to its configuration.
///
/// A response is accepted when no status predicate is configured or when the
/// predicate accepts its status. A rejection carries the response, the
/// request and a code derived from the status class.
pub fn settle(response: ResponseEnvelope) -> Result<ResponseEnvelope, AdapterError> {
    let accepted = match &response.config.validate_status {
        None => true,
        Some(validate) => validate.accepts(response.status),
    };

    if accepted {
        return Ok(response);
    }

    tracing::debug!(status = response.status, "Status rejected by validator");
    let config = response.config.clone();
    let request = response.request.clone();
    Err(AdapterError::new(
        format!("Request failed with status code {}", response.status),
        config,
        ErrorCode::from_status(response.status),
        Some(request),
        Some(response),
    ))
}

/// Callback form of [`settle`]: exactly one of `resolve` or `reject` runs
pub fn settle_with<R, J>(resolve: R, reject: J, response: ResponseEnvelope)
where
    R: FnOnce(ResponseEnvelope),
    J: FnOnce(AdapterError),
{
    match settle(response) {
        Ok(response) => resolve(response),
        Err(err) => reject(err),
    }
}

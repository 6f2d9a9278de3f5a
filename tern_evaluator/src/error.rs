use thiserror::Error;

use crate::any_request::AnyRequest;

/// Returned when a request was asked for while it was already being
/// evaluated.
///
/// The cycle has been diagnosed by the time this is returned; callers only
/// need to pick a fallback.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cyclical request: {request}")]
pub struct CyclicalRequestError {
    pub request: AnyRequest,
}

impl CyclicalRequestError {
    pub fn new(request: AnyRequest) -> Self {
        Self { request }
    }
}

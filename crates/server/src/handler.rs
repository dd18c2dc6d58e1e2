//! `GET /index.yaml` request path

use crate::counter::RequestCounter;
use crate::latency::LatencyInjector;
use crate::limiter::{AdmissionLimiter, AdmissionPermit};
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{future, stream, StreamExt};
use slowrepo_errors::ServeError;
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Content type sent with the index document
pub const INDEX_CONTENT_TYPE: &str = "application/x-yaml";

/// Serves the frozen index bytes behind admission control and latency
///
/// Each request moves through admission, the simulated delay, and the
/// write. A request cancelled in either of the first two steps gets a 500
/// with the error text and never sees the index body. The admission permit
/// travels with the response body, so it is held until hyper has finished
/// with the body or dropped it.
#[derive(Debug, Clone)]
pub struct IndexHandler {
    index: Bytes,
    limiter: AdmissionLimiter,
    latency: LatencyInjector,
    counter: RequestCounter,
}

impl IndexHandler {
    #[must_use]
    pub fn new(
        index: impl Into<Bytes>,
        limiter: AdmissionLimiter,
        latency: LatencyInjector,
        counter: RequestCounter,
    ) -> Self {
        Self {
            index: index.into(),
            limiter,
            latency,
            counter,
        }
    }

    /// The bytes every successful request receives
    #[must_use]
    pub fn index_bytes(&self) -> &Bytes {
        &self.index
    }

    #[must_use]
    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn counter(&self) -> &RequestCounter {
        &self.counter
    }

    /// Handle one index request under `cancel`
    pub async fn respond(&self, cancel: &CancellationToken) -> Response {
        let permit = match self.limiter.acquire(cancel).await {
            Ok(permit) => permit,
            Err(err @ ServeError::Cancelled) => {
                debug!(error = %err, "index.yaml request cancelled while queued");
                return error_response(&err);
            }
            Err(err) => {
                warn!(error = %err, "index.yaml request not admitted");
                return error_response(&err);
            }
        };

        let ordinal = self.counter.increment();
        info!(ordinal, "serving index.yaml for {ordinal}th time...");

        if let Err(err) = self.latency.delay(cancel).await {
            debug!(ordinal, error = %err, "index.yaml request cancelled during simulated delay");
            return error_response(&err);
        }

        match self.write_index(permit) {
            Ok(response) => response,
            Err(err) => {
                error!(ordinal, error = %err, "failed encoding index.yaml");
                error_response(&err)
            }
        }
    }

    fn write_index(&self, permit: AdmissionPermit) -> Result<Response, ServeError> {
        let chunk = self.index.clone();
        let len = chunk.len();
        let body = stream::once(future::ready(Ok::<_, Infallible>(chunk))).map(move |chunk| {
            // Released when hyper drops the body: after the last byte, or on disconnect.
            let _held = &permit;
            chunk
        });

        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, INDEX_CONTENT_TYPE)
            .header(CONTENT_LENGTH, len)
            .body(Body::from_stream(body))
            .map_err(|e| ServeError::WriteFailed {
                message: e.to_string(),
            })
    }
}

fn error_response(err: &ServeError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

//! Request tracing middleware (§6 Control API), grounded on
//! `nvisy_server::middleware::observability::RouterObservabilityExt`'s
//! extension-trait shape. Only the tracing layer is carried over —
//! auth, CORS, and rate limiting are deliberately out of scope (§1).

use axum::Router;
use axum::http::header;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

pub trait RouterObservabilityExt<S> {
    /// Adds request-id propagation and a `tracing` span per request.
    fn with_observability(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(PropagateRequestIdLayer::new(header::HeaderName::from_static("x-request-id")))
            .layer(SetSensitiveRequestHeadersLayer::new([header::AUTHORIZATION]))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(header::HeaderName::from_static("x-request-id"), MakeRequestUuid))
    }
}

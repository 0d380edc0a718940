//! Per-request tracing.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wraps each request in an `http_request` span with a fresh request id and
/// echoes the id back in [`REQUEST_ID_HEADER`].
pub async fn trace_request(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    async move {
        let started = Instant::now();
        tracing::info!("request started");
        let mut response = next.run(req).await;
        tracing::info!(
            status = %response.status(),
            elapsed = ?started.elapsed(),
            "request finished"
        );
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            let _ = response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

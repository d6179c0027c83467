use axum::{extract::Request, middleware::Next, response::Response};

/// Logs request and response headers at trace level.
pub async fn trace_headers(req: Request, next: Next) -> Response {
    tracing::trace!(incoming_headers = ?req.headers(), "Headers");

    let response = next.run(req).await;

    tracing::trace!(outgoing_headers = ?response.headers(), "Headers");

    response
}

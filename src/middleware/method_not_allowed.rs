use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, ErrorVerbosityProvider, MethodNotAllowedError};

/// Replaces axum's empty `405 Method Not Allowed` response with an [`ApiError`].
pub async fn method_not_allowed<S: ErrorVerbosityProvider>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = req.method().clone();
    let resp = next.run(req).await;

    if resp.status() != StatusCode::METHOD_NOT_ALLOWED {
        return Ok(resp);
    }

    tracing::debug!(%method, "Method not allowed");

    Err(MethodNotAllowedError::new(state.error_verbosity()).into())
}

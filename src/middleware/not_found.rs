use axum::extract::State;

use crate::{
    error::{ApiError, ErrorVerbosityProvider, NotFoundError},
    state::ApiState,
};

/// Fallback for every path that matches no route.
pub async fn not_found(State(state): State<ApiState>) -> ApiError {
    tracing::debug!("No route matched");

    NotFoundError::new(state.error_verbosity()).into()
}

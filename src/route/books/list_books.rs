use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    book::Book,
    error::{ApiError, ApiErrorResponse, ErrorVerbosityProvider},
    state::ApiState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
}

impl IntoResponse for ListBooksResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// List all books, ordered by title.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = ListBooksResponse),
        (status = 500, description = "Database failure", body = ApiErrorResponse),
    )
)]
pub async fn list_books(State(state): State<ApiState>) -> Result<ListBooksResponse, ApiError> {
    let books = state
        .books()
        .list_all()
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(ListBooksResponse { books })
}

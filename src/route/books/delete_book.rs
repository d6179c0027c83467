use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiErrorResponse, ErrorVerbosityProvider},
    extractor::path::ApiPath,
    state::ApiState,
};

use super::BookPath;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteBookResponse {
    pub message: String,
}

impl IntoResponse for DeleteBookResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Delete a book by its isbn.
#[utoipa::path(
    delete,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "Isbn of the book")),
    responses(
        (status = 200, description = "The book was deleted", body = DeleteBookResponse),
        (status = 404, description = "No book with this isbn", body = ApiErrorResponse),
    )
)]
pub async fn delete_book(
    State(state): State<ApiState>,
    ApiPath(BookPath { isbn }): ApiPath<BookPath>,
) -> Result<DeleteBookResponse, ApiError> {
    state
        .books()
        .remove(&isbn)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    tracing::info!(%isbn, "Book deleted");

    Ok(DeleteBookResponse {
        message: "Book deleted".to_string(),
    })
}

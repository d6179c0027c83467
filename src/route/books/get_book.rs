use axum::extract::State;

use crate::{
    error::{ApiError, ApiErrorResponse, ErrorVerbosityProvider},
    extractor::path::ApiPath,
    state::ApiState,
};

use super::{BookPath, BookResponse};

/// Get a single book by its isbn.
#[utoipa::path(
    get,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "Isbn of the book")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No book with this isbn", body = ApiErrorResponse),
    )
)]
pub async fn get_book(
    State(state): State<ApiState>,
    ApiPath(BookPath { isbn }): ApiPath<BookPath>,
) -> Result<BookResponse, ApiError> {
    let book = state
        .books()
        .get_by_isbn(&isbn)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    Ok(BookResponse { book })
}

use axum::extract::State;

use crate::{
    book::BookUpdate,
    error::{ApiError, ApiErrorResponse, ErrorVerbosityProvider},
    extractor::{path::ApiPath, validated::Validated},
    state::ApiState,
};

use super::{BookPath, BookResponse};

/// Replace every mutable field of a book. The isbn itself can not be changed.
#[utoipa::path(
    put,
    path = "/books/{isbn}",
    tag = "books",
    params(("isbn" = String, Path, description = "Isbn of the book")),
    request_body = BookUpdate,
    responses(
        (status = 200, description = "The updated book", body = BookResponse),
        (status = 400, description = "Body does not match the book schema", body = ApiErrorResponse),
        (status = 404, description = "No book with this isbn", body = ApiErrorResponse),
    )
)]
pub async fn update_book(
    State(state): State<ApiState>,
    ApiPath(BookPath { isbn }): ApiPath<BookPath>,
    Validated(update): Validated<BookUpdate>,
) -> Result<BookResponse, ApiError> {
    let book = state
        .books()
        .update(&isbn, &update)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    tracing::info!(%isbn, "Book updated");

    Ok(BookResponse { book })
}

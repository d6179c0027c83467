use axum::{extract::State, http::StatusCode};

use crate::{
    book::Book,
    error::{ApiError, ApiErrorResponse, ErrorVerbosityProvider},
    extractor::validated::Validated,
    state::ApiState,
};

use super::BookResponse;

/// Create a book. Every field, including the isbn, is required.
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = Book,
    responses(
        (status = 201, description = "The created book", body = BookResponse),
        (status = 400, description = "Body does not match the book schema", body = ApiErrorResponse),
        (status = 409, description = "A book with this isbn already exists", body = ApiErrorResponse),
    )
)]
pub async fn create_book(
    State(state): State<ApiState>,
    Validated(book): Validated<Book>,
) -> Result<(StatusCode, BookResponse), ApiError> {
    let book = state
        .books()
        .create(&book)
        .await
        .map_err(|err| ApiError::from_repository_error(state.error_verbosity(), err))?;

    tracing::info!(isbn = %book.isbn, "Book created");

    Ok((StatusCode::CREATED, BookResponse { book }))
}

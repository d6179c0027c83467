use utoipa::OpenApi;

use crate::{
    book::{Book, BookUpdate},
    error::{ApiErrorBody, ApiErrorResponse},
};

use super::books::{
    create_book, delete_book, delete_book::DeleteBookResponse, get_book, list_books,
    list_books::ListBooksResponse, update_book, BookResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_books::list_books,
        get_book::get_book,
        create_book::create_book,
        update_book::update_book,
        delete_book::delete_book,
    ),
    components(schemas(
        Book,
        BookUpdate,
        BookResponse,
        ListBooksResponse,
        DeleteBookResponse,
        ApiErrorResponse,
        ApiErrorBody,
    )),
    tags((name = "books", description = "Book records keyed by isbn"))
)]
pub struct ApiDoc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::schema::{BookPayload, SchemaMode};

/// A book record, keyed by its `isbn`.
///
/// Used as the row type, the create payload and the response body.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, ToSchema, Validate, sqlx::FromRow,
)]
#[serde(deny_unknown_fields)]
pub struct Book {
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub isbn: String,
    #[validate(url(message = "Must be a valid URL"))]
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be at least 1"))]
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// The mutable fields of a [`Book`]. The `isbn` can not be changed after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct BookUpdate {
    #[validate(url(message = "Must be a valid URL"))]
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    #[validate(range(min = 1, message = "Must be at least 1"))]
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

impl BookPayload for Book {
    const MODE: SchemaMode = SchemaMode::Create;
}

impl BookPayload for BookUpdate {
    const MODE: SchemaMode = SchemaMode::Update;
}

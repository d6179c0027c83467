use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{repository::RepositoryError, schema::Violation};

/// How much detail an error response carries.
///
/// Every level returns the real status code and the `{"error": {"message", "status"}}` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ErrorVerbosity {
    /// Server returns the message and the status inside the error envelope.
    Message,
    /// Server additionally returns the error type.
    Type,
    /// Server additionally returns the error reason.
    Full,
}

impl ErrorVerbosity {
    pub fn should_generate_error_type(&self) -> bool {
        matches!(self, ErrorVerbosity::Type | ErrorVerbosity::Full)
    }

    pub fn should_generate_error_reason(&self) -> bool {
        matches!(self, ErrorVerbosity::Full)
    }
}

pub trait ErrorVerbosityProvider {
    fn error_verbosity(&self) -> ErrorVerbosity;
}

/// Error envelope shared by every route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    reason: Option<serde_json::Value>,
}

#[derive(Debug, From)]
/// API error
pub enum ApiError {
    /// Internal server error
    ///
    /// This error is returned when the database is unreachable or fails in an unexpected way.
    InternalServerError(InternalServerError),
    /// Body error
    ///
    /// This error is returned when the body is not valid JSON.
    Body(BodyError),
    /// Path error
    ///
    /// This error is returned when the path is not as expected.
    Path(PathError),
    /// Validation error
    ///
    /// This error is returned when the body does not match the book schema.
    Validation(ValidationError),
    /// Method not allowed
    MethodNotAllowed(MethodNotAllowedError),
    /// Not found error
    ///
    /// This error is returned when the requested route or book does not exist.
    NotFound(NotFoundError),
    /// Conflict error
    ///
    /// This error is returned when a book with the same isbn already exists.
    Conflict(ConflictError),
}

impl ApiError {
    /// Maps a repository failure, keeping not-found and duplicate apart from database errors.
    pub fn from_repository_error(verbosity: ErrorVerbosity, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { isbn } => NotFoundError::book(verbosity, isbn).into(),
            RepositoryError::Duplicate { isbn } => ConflictError::book(verbosity, isbn).into(),
            RepositoryError::Database(err) => {
                InternalServerError::from_generic_error(verbosity, err).into()
            }
        }
    }

    fn verbosity(&self) -> ErrorVerbosity {
        match self {
            ApiError::InternalServerError(err) => err.verbosity,
            ApiError::Body(err) => err.verbosity,
            ApiError::Path(err) => err.verbosity,
            ApiError::Validation(err) => err.verbosity,
            ApiError::MethodNotAllowed(err) => err.verbosity,
            ApiError::NotFound(err) => err.verbosity,
            ApiError::Conflict(err) => err.verbosity,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InternalServerError(_) => "InternalServerError",
            ApiError::Body(_) => "Body",
            ApiError::Path(_) => "Path",
            ApiError::Validation(_) => "Validation",
            ApiError::MethodNotAllowed(_) => "MethodNotAllowed",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Conflict(_) => "Conflict",
        }
    }

    fn message(&self) -> Cow<'static, str> {
        match self {
            ApiError::InternalServerError(_) => {
                Cow::Borrowed("An internal server error has occurred")
            }
            ApiError::Body(_) => Cow::Borrowed("Failed to parse request body"),
            ApiError::Path(_) => Cow::Borrowed("Failed to parse path parameters"),
            ApiError::Validation(_) => {
                Cow::Borrowed("Request body does not match the book schema")
            }
            ApiError::MethodNotAllowed(_) => Cow::Borrowed("Method not allowed"),
            ApiError::NotFound(err) => match &err.isbn {
                Some(isbn) => Cow::Owned(format!("There is no book with isbn '{isbn}'")),
                None => Cow::Borrowed("The requested resource was not found"),
            },
            ApiError::Conflict(err) => {
                Cow::Owned(format!("A book with isbn '{}' already exists", err.isbn))
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(_) | ApiError::Path(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// The error specific content, dropped when empty.
    fn reason(&self) -> Option<serde_json::Value> {
        let reason = match self {
            ApiError::InternalServerError(err) => serde_json::to_value(err),
            ApiError::Body(err) => serde_json::to_value(err),
            ApiError::Path(err) => serde_json::to_value(err),
            ApiError::Validation(err) => serde_json::to_value(err),
            ApiError::MethodNotAllowed(err) => serde_json::to_value(err),
            ApiError::NotFound(err) => serde_json::to_value(err),
            ApiError::Conflict(err) => serde_json::to_value(err),
        };

        match reason {
            Ok(serde_json::Value::Object(map)) if map.is_empty() => None,
            Ok(reason) => Some(reason),
            Err(err) => {
                tracing::error!(%err, "Failed to serialize error reason");

                None
            }
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        let verbosity = error.verbosity();

        let error_type = verbosity
            .should_generate_error_type()
            .then(|| error.error_type().to_string());

        let reason = match verbosity.should_generate_error_reason() {
            true => error.reason(),
            false => None,
        };

        ApiErrorResponse {
            error: ApiErrorBody {
                message: error.message().into_owned(),
                status: error.status_code().as_u16(),
                error_type,
                reason,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        (status_code, Json(ApiErrorResponse::from(self))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct InternalServerError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    internal_server_error: Option<String>,
}

impl InternalServerError {
    pub fn from_generic_error<E: Into<anyhow::Error>>(verbosity: ErrorVerbosity, err: E) -> Self {
        let err: anyhow::Error = err.into();
        let err = format!("{err:#}");
        tracing::error!(%err, "Internal server error");

        let internal_server_error = verbosity.should_generate_error_reason().then_some(err);

        InternalServerError {
            verbosity,
            internal_server_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BodyError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_expected_schema: Option<String>,
}

impl BodyError {
    pub fn new(
        verbosity: ErrorVerbosity,
        body_error_reason: String,
        body_expected_schema: Option<String>,
    ) -> Self {
        let (body_error_reason, body_expected_schema) =
            match verbosity.should_generate_error_reason() {
                true => (Some(body_error_reason), body_expected_schema),
                false => (None, None),
            };

        BodyError {
            verbosity,
            body_error_reason,
            body_expected_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PathError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_error_reason: Option<String>,
}

impl PathError {
    pub fn new(verbosity: ErrorVerbosity, path_error_reason: String) -> Self {
        let path_error_reason = verbosity
            .should_generate_error_reason()
            .then_some(path_error_reason);

        PathError {
            verbosity,
            path_error_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<Violation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_schema: Option<String>,
}

impl ValidationError {
    pub fn new(
        verbosity: ErrorVerbosity,
        violations: Vec<Violation>,
        expected_schema: Option<String>,
    ) -> Self {
        let (violations, expected_schema) = match verbosity.should_generate_error_reason() {
            true => (Some(violations), expected_schema),
            false => (None, None),
        };

        ValidationError {
            verbosity,
            violations,
            expected_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MethodNotAllowedError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
}

impl MethodNotAllowedError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        MethodNotAllowedError { verbosity }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    #[serde(skip_serializing_if = "Option::is_none")]
    isbn: Option<String>,
}

impl NotFoundError {
    pub fn new(verbosity: ErrorVerbosity) -> Self {
        NotFoundError {
            verbosity,
            isbn: None,
        }
    }

    pub fn book(verbosity: ErrorVerbosity, isbn: String) -> Self {
        NotFoundError {
            verbosity,
            isbn: Some(isbn),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConflictError {
    #[serde(skip)]
    verbosity: ErrorVerbosity,
    isbn: String,
}

impl ConflictError {
    pub fn book(verbosity: ErrorVerbosity, isbn: String) -> Self {
        ConflictError { verbosity, isbn }
    }
}

#[cfg(test)]
mod test {
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    use super::*;
    use crate::schema::ViolationKind;

    async fn render(error: ApiError) -> (StatusCode, Option<Value>) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Body is readable")
            .to_bytes();

        let body = (!bytes.is_empty())
            .then(|| serde_json::from_slice(&bytes).expect("Body is JSON"));

        (status, body)
    }

    fn missing_title(verbosity: ErrorVerbosity) -> ApiError {
        ValidationError::new(
            verbosity,
            vec![Violation::new("title", ViolationKind::Missing)],
            Some("type: object".to_string()),
        )
        .into()
    }

    #[tokio::test]
    async fn every_verbosity_keeps_status_and_envelope() {
        for verbosity in [ErrorVerbosity::Message, ErrorVerbosity::Type, ErrorVerbosity::Full] {
            let error = NotFoundError::book(verbosity, "5555555555".to_string()).into();

            let (status, body) = render(error).await;

            assert_eq!(status, StatusCode::NOT_FOUND, "{verbosity:?}");
            let body = body.expect("Body is present");
            assert_eq!(body["error"]["status"], 404, "{verbosity:?}");
            assert_eq!(
                body["error"]["message"],
                "There is no book with isbn '5555555555'",
                "{verbosity:?}"
            );
        }
    }

    #[test]
    fn verbosity_without_envelope_is_not_configurable() {
        for level in ["None", "StatusCode"] {
            assert!(serde_yaml::from_str::<ErrorVerbosity>(level).is_err(), "{level}");
        }
    }

    #[tokio::test]
    async fn message_verbosity_returns_message_and_status() {
        let (status, body) = render(missing_title(ErrorVerbosity::Message)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            Some(json!({
                "error": {
                    "message": "Request body does not match the book schema",
                    "status": 400
                }
            }))
        );
    }

    #[tokio::test]
    async fn type_verbosity_adds_error_type() {
        let (_, body) = render(missing_title(ErrorVerbosity::Type)).await;

        let body = body.expect("Body is present");
        assert_eq!(body["error"]["error_type"], "Validation");
        assert!(body["error"].get("reason").is_none());
    }

    #[tokio::test]
    async fn full_verbosity_adds_violations() {
        let (_, body) = render(missing_title(ErrorVerbosity::Full)).await;

        let body = body.expect("Body is present");
        assert_eq!(
            body["error"]["reason"],
            json!({
                "violations": [{ "field": "title", "violation": "missing" }],
                "expected_schema": "type: object"
            })
        );
    }

    #[tokio::test]
    async fn repository_not_found_maps_to_404() {
        let error = ApiError::from_repository_error(
            ErrorVerbosity::Full,
            RepositoryError::NotFound {
                isbn: "5555555555".to_string(),
            },
        );

        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = body.expect("Body is present");
        assert_eq!(body["error"]["message"], "There is no book with isbn '5555555555'");
        assert_eq!(body["error"]["status"], 404);
    }

    #[tokio::test]
    async fn repository_duplicate_maps_to_409() {
        let error = ApiError::from_repository_error(
            ErrorVerbosity::Message,
            RepositoryError::Duplicate {
                isbn: "1234567890".to_string(),
            },
        );

        let (status, _) = render(error).await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn database_errors_map_to_500() {
        let error = ApiError::from_repository_error(
            ErrorVerbosity::Full,
            RepositoryError::Database(sqlx::Error::PoolClosed),
        );

        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body = body.expect("Body is present");
        assert!(body["error"]["reason"]["internal_server_error"].is_string());
    }

    #[tokio::test]
    async fn route_not_found_has_no_reason() {
        let (status, body) = render(NotFoundError::new(ErrorVerbosity::Full).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = body.expect("Body is present");
        assert_eq!(body["error"]["message"], "The requested resource was not found");
        assert!(body["error"].get("reason").is_none());
    }
}

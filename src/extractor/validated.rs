use axum::{
    async_trait,
    extract::{FromRequest, Request},
};
use schemars::JsonSchema;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::{ApiError, ErrorVerbosityProvider, ValidationError},
    schema::BookPayload,
};

use super::{expected_schema, json::ApiJson};

/// Extracts a JSON body and checks it against the book schema before handing out the typed payload.
///
/// Every violation found is reported in a single [`ValidationError`].
pub struct Validated<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Validated<T>
where
    T: BookPayload + JsonSchema + Debug + Send,
    S: Send + Sync + ErrorVerbosityProvider,
{
    type Rejection = ApiError;

    #[tracing::instrument(name = "validated_extractor", skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<Value>::from_request(req, state).await?;

        match T::parse(value) {
            Ok(payload) => {
                tracing::trace!(?payload, "Validated");

                Ok(Validated(payload))
            }
            Err(violations) => {
                tracing::warn!(?violations, "Schema violations");

                let verbosity = state.error_verbosity();

                Err(ValidationError::new(verbosity, violations, expected_schema::<T>(verbosity)?).into())
            }
        }
    }
}

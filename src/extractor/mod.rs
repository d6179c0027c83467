use schemars::{schema_for, JsonSchema};

use crate::error::{ApiError, ErrorVerbosity, InternalServerError};

pub mod json;
pub mod path;
pub mod validated;

/// Renders the JSON schema of `T` as YAML, only when the verbosity asks for error reasons.
fn expected_schema<T: JsonSchema>(verbosity: ErrorVerbosity) -> Result<Option<String>, ApiError> {
    if !verbosity.should_generate_error_reason() {
        return Ok(None);
    }

    serde_yaml::to_string(&schema_for!(T))
        .map(Some)
        .map_err(|err| InternalServerError::from_generic_error(verbosity, err).into())
}

use std::{ops::Deref, sync::Arc};

use crate::{
    error::{ErrorVerbosity, ErrorVerbosityProvider},
    repository::BookRepository,
};

#[derive(Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    pub fn new(
        error_verbosity: ErrorVerbosity,
        trace_response_body: bool,
        books: BookRepository,
    ) -> Self {
        Self {
            inner: Arc::new(ApiStateInner {
                error_verbosity,
                trace_response_body,
                books,
            }),
        }
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct ApiStateInner {
    error_verbosity: ErrorVerbosity,
    trace_response_body: bool,
    books: BookRepository,
}

impl ApiStateInner {
    pub fn books(&self) -> &BookRepository {
        &self.books
    }

    /// Whether every response body should be logged at trace level.
    pub fn trace_response_body(&self) -> bool {
        self.trace_response_body
    }
}

impl ErrorVerbosityProvider for ApiState {
    fn error_verbosity(&self) -> ErrorVerbosity {
        self.error_verbosity
    }
}

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    middleware::{
        method_not_allowed::method_not_allowed, not_found::not_found, trace_headers::trace_headers,
        trace_response_body::trace_response_body,
    },
    state::ApiState,
};

pub mod books;
pub mod docs;

/// Builds the complete application: book routes, OpenAPI docs and the middleware stack.
pub fn app(state: ApiState) -> Router {
    let router = Router::<ApiState>::new()
        .merge(books::app::app())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            method_not_allowed::<ApiState>,
        ))
        .layer(middleware::from_fn(trace_headers));

    let router = match state.trace_response_body() {
        true => router.layer(middleware::from_fn_with_state(
            state.clone(),
            trace_response_body,
        )),
        false => router,
    };

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            )
            .layer(RequestDecompressionLayer::new())
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive()),
    )
}

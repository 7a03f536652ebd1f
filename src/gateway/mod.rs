use std::sync::Arc;

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue,
    },
    routing::get,
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::lifecycle::Driver;

mod handlers;

pub use handlers::RequestError;

/// Build the HTTP surface around a running driver.
///
/// `GET /status` reports state, `POST` on any path carries a command,
/// `OPTIONS` answers with CORS headers only, other `GET`s are 404. Every
/// response carries the same permissive CORS headers.
pub fn router(driver: Arc<Driver>) -> Router {
    Router::new()
        .route(
            "/status",
            get(handlers::status).fallback(handlers::dispatch),
        )
        .fallback(handlers::dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(driver)
}

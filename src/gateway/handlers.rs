use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::{Ack, ErrorReport, LedRequest, ProtocolError, StatusReport};
use displaydoc::Display;
use log::{debug, info, warn};

use crate::{command::Command, lifecycle::Driver, queue::QueueError};

/// A rejected `POST`, answered with HTTP 400.
#[derive(Debug, Display)]
pub enum RequestError {
    /// {0}
    Protocol(ProtocolError),
    /// {0}
    Queue(QueueError),
}

impl std::error::Error for RequestError {}

impl From<ProtocolError> for RequestError {
    fn from(error: ProtocolError) -> Self {
        RequestError::Protocol(error)
    }
}

impl From<QueueError> for RequestError {
    fn from(error: QueueError) -> Self {
        RequestError::Queue(error)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        warn!("Rejected request: {}", self);
        (StatusCode::BAD_REQUEST, Json(ErrorReport::new(self.to_string()))).into_response()
    }
}

/// `GET /status`
pub async fn status(State(driver): State<Arc<Driver>>) -> Json<StatusReport> {
    Json(driver.status_report().await)
}

/// Everything that is not `GET /status`, routed on the method alone.
pub async fn dispatch(State(driver): State<Arc<Driver>>, method: Method, body: Bytes) -> Response {
    match method {
        Method::POST => match post_command(&driver, &body).await {
            Ok(response) => response,
            Err(error) => error.into_response(),
        },
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::GET | Method::HEAD => StatusCode::NOT_FOUND.into_response(),
        _ => StatusCode::NOT_IMPLEMENTED.into_response(),
    }
}

async fn post_command(driver: &Driver, body: &[u8]) -> Result<Response, RequestError> {
    let request = LedRequest::from_slice(body)?;

    if matches!(request, LedRequest::GetConfig) {
        debug!("Serving configuration");
        return Ok(Json(driver.config_report().await).into_response());
    }

    let message = request.queued_message();
    driver.submit(Command::try_from(request)?)?;
    info!("📥 {}", message);

    Ok(Json(Ack::new(message)).into_response())
}

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::services::ServiceError;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_NOT_FOUND: &str = "not_found";
pub const STATUS_ERROR: &str = "error";

/// Success envelope; `payload` must serialize as a map so its fields sit beside `status`.
#[derive(Serialize)]
struct Envelope<'a, T> {
    status: &'a str,
    message: &'a str,
    #[serde(flatten)]
    payload: T,
}

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub kind: String,
    pub message: String,
}

pub(crate) fn success<T: Serialize>(code: StatusCode, message: &str, payload: T) -> Response {
    envelope(code, STATUS_SUCCESS, message, payload)
}

/// A lookup that matched nothing: still a 200, flagged with `status: "not_found"`.
pub(crate) fn nothing_found<T: Serialize>(message: &str, payload: T) -> Response {
    envelope(StatusCode::OK, STATUS_NOT_FOUND, message, payload)
}

fn envelope<T: Serialize>(code: StatusCode, status: &str, message: &str, payload: T) -> Response {
    (
        code,
        Json(Envelope {
            status,
            message,
            payload,
        }),
    )
        .into_response()
}

pub(crate) fn failure(code: StatusCode, kind: &str, message: String) -> Response {
    let body = ErrorBody {
        status: STATUS_ERROR.to_string(),
        kind: kind.to_string(),
        message,
    };
    (code, Json(body)).into_response()
}

/// Unwrap a JSON body, reporting malformed payloads as validation errors.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServiceError::validation(rejection.body_text()))
}

/// Unwrap path parameters; an id that does not parse is a validation error.
pub(crate) fn path_params<T>(params: Result<Path<T>, PathRejection>) -> Result<T, ServiceError> {
    params
        .map(|Path(value)| value)
        .map_err(|rejection| ServiceError::validation(rejection.body_text()))
}

pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ServiceError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ServiceError::validation(rejection.body_text()))
}

/// Run a synchronous service call on tokio's blocking pool.
///
/// Services hold SQLite connections that may wait out a busy timeout; the async worker that
/// accepted the request stays free meanwhile.
pub(crate) async fn blocking<S, T, F>(service: Arc<S>, call: F) -> Result<T, ServiceError>
where
    S: Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| ServiceError::Internal(format!("service call aborted: {err}")))?
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let code = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::NotEligible(_) => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Configuration(_)
            | ServiceError::Internal(_)
            | ServiceError::Transaction(_)
            | ServiceError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if code.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        }

        failure(code, self.kind(), self.to_string())
    }
}

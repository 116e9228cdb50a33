//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use siren_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or wrong credentials.
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Core(e) => match e {
        CoreError::EmptyMessage => StatusCode::BAD_REQUEST,
        CoreError::InvalidCoordinate { .. } | CoreError::UnknownEmergencyType(_) => {
          StatusCode::UNPROCESSABLE_ENTITY
        }
        CoreError::Unauthorized(_) => StatusCode::FORBIDDEN,
        CoreError::AlertNotFound(_)
        | CoreError::AccountNotFound(_)
        | CoreError::ResponderProfileMissing(_) => StatusCode::NOT_FOUND,
        CoreError::DuplicateAccount(_)
        | CoreError::InvalidTransition { .. }
        | CoreError::NotPending(_)
        | CoreError::AlertClosed(_)
        | CoreError::AssignmentConflict(_) => StatusCode::CONFLICT,
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"siren\""),
      );
    }
    res
  }
}

//! Handlers for the per-alert message thread.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts/{id}/messages` | Oldest first |
//! | `POST` | `/alerts/{id}/messages` | Body: `{"body":"..."}`; returns 201 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use siren_core::{
  store::DispatchStore,
  thread::{self, Message},
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentAccount, error::ApiError};

/// `GET /alerts/{id}/messages`
pub async fn list<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
  Ok(Json(thread::list(state.store.as_ref(), caller.actor(), id).await?))
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
  pub body: String,
}

/// `POST /alerts/{id}/messages`
pub async fn append<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Path(id): Path<Uuid>,
  Json(MessageBody { body }): Json<MessageBody>,
) -> Result<impl IntoResponse, ApiError> {
  let message = thread::append(state.store.as_ref(), caller.actor(), id, body).await?;
  Ok((StatusCode::CREATED, Json(message)))
}

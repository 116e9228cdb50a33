//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts` | The caller's own alerts, newest first (victims) |
//! | `POST` | `/alerts` | Body: [`AlertRequest`]; returns 201 + [`Raised`](dispatch::Raised) |
//! | `GET`  | `/alerts/{id}` | Requester or assigned responder only |
//! | `POST` | `/alerts/{id}/dispatch` | Retry dispatch of a pending alert |
//! | `POST` | `/alerts/{id}/status` | Body: `{"status":"in_progress"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use siren_core::{
  alert::{self, Alert, AlertStatus, Party},
  dispatch::{self, AlertRequest, Assignment},
  lifecycle,
  store::DispatchStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentAccount, error::ApiError};

/// `GET /alerts`
pub async fn list_mine<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
) -> Result<Json<Vec<Alert>>, ApiError> {
  Ok(Json(alert::requested_by(state.store.as_ref(), caller.actor()).await?))
}

/// `POST /alerts`
pub async fn raise<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Json(request): Json<AlertRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let raised = dispatch::raise_alert(state.store.as_ref(), caller.actor(), request).await?;
  Ok((StatusCode::CREATED, Json(raised)))
}

#[derive(Debug, Serialize)]
pub struct AlertView {
  #[serde(flatten)]
  pub alert:        Alert,
  /// `"requester"` or `"assigned_responder"`.
  pub viewer_is:    &'static str,
  pub status_label: &'static str,
}

/// `GET /alerts/{id}`
pub async fn get_one<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Path(id): Path<Uuid>,
) -> Result<Json<AlertView>, ApiError> {
  let (alert, party) = alert::view(state.store.as_ref(), caller.actor(), id).await?;
  let viewer_is = match party {
    Party::Requester => "requester",
    Party::AssignedResponder => "assigned_responder",
  };
  Ok(Json(AlertView { status_label: alert.status.label(), alert, viewer_is }))
}

#[derive(Debug, Serialize)]
pub struct DispatchOutcome {
  /// `null` while nobody is available.
  pub assignment: Option<Assignment>,
}

/// `POST /alerts/{id}/dispatch`
pub async fn redispatch<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Path(id): Path<Uuid>,
) -> Result<Json<DispatchOutcome>, ApiError> {
  let assignment = dispatch::redispatch(state.store.as_ref(), caller.actor(), id).await?;
  Ok(Json(DispatchOutcome { assignment }))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: AlertStatus,
}

/// `POST /alerts/{id}/status`
pub async fn set_status<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Alert>, ApiError> {
  let alert = lifecycle::advance(state.store.as_ref(), caller.actor(), id, body.status).await?;
  Ok(Json(alert))
}

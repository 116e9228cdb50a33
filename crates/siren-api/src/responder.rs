//! Handlers for the responder's own profile, dashboard and report.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/responder` | [`Dashboard`] |
//! | `PUT`  | `/responder/location` | Body: `{"latitude":..,"longitude":..}` |
//! | `PUT`  | `/responder/availability` | Body: `{"available":true}` |
//! | `PUT`  | `/responder/profile` | Body: [`ProfileUpdate`] |
//! | `GET`  | `/responder/report` | JSON, or `?format=text` for plain text |

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use siren_core::{
  geo::Coordinate,
  report,
  responder::{self, Dashboard, ProfileUpdate, Responder},
  store::DispatchStore,
};

use crate::{AppState, auth::CurrentAccount, error::ApiError};

/// `GET /responder`
pub async fn dashboard<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
) -> Result<Json<Dashboard>, ApiError> {
  Ok(Json(responder::dashboard(state.store.as_ref(), caller.actor()).await?))
}

/// `PUT /responder/location`
pub async fn update_location<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Json(location): Json<Coordinate>,
) -> Result<Json<Responder>, ApiError> {
  let updated = responder::update_location(state.store.as_ref(), caller.actor(), location).await?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
  pub available: bool,
}

/// `PUT /responder/availability`
pub async fn set_availability<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Json(body): Json<AvailabilityBody>,
) -> Result<Json<Responder>, ApiError> {
  let updated =
    responder::set_availability(state.store.as_ref(), caller.actor(), body.available).await?;
  Ok(Json(updated))
}

/// `PUT /responder/profile`
pub async fn update_profile<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<Responder>, ApiError> {
  if update.organization.trim().is_empty() || !update.email.contains('@') {
    return Err(ApiError::BadRequest("organization and a valid email are required".into()));
  }
  let updated = responder::update_profile(state.store.as_ref(), caller.actor(), update).await?;
  Ok(Json(updated))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
  #[default]
  Json,
  Text,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
  #[serde(default)]
  pub format: ReportFormat,
}

/// `GET /responder/report[?format=text]`
pub async fn report<S: DispatchStore>(
  State(state): State<AppState<S>>,
  caller: CurrentAccount,
  Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
  let built = report::responder_report(state.store.as_ref(), caller.actor()).await?;
  Ok(match params.format {
    ReportFormat::Json => Json(built).into_response(),
    ReportFormat::Text => (
      [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"emergency_report.txt\""),
      ],
      built.render_text(),
    )
      .into_response(),
  })
}

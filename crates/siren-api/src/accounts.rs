//! Handlers for account and reference-data endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Public victim sign-up; body: [`RegisterBody`]; returns 201 |
//! | `GET`  | `/me` | The authenticated account |
//! | `GET`  | `/emergency-types` | Reference list, sorted by name |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use siren_core::{
  account::{self, Account, NewAccount, Role},
  emergency::EmergencyType,
  store::DispatchStore,
};

use crate::{
  AppState,
  auth::{CurrentAccount, hash_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:     String,
  pub email:        String,
  pub password:     String,
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  pub phone_number: Option<String>,
}

/// `POST /accounts`: always creates a victim account.
pub async fn register<S: DispatchStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let username = body.username.trim();
  let email = body.email.trim();
  if username.is_empty() || username.contains(':') {
    return Err(ApiError::BadRequest("username must be non-empty and may not contain ':'".into()));
  }
  if !email.contains('@') {
    return Err(ApiError::BadRequest("email address is not valid".into()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let account = account::register(state.store.as_ref(), NewAccount {
    username:      username.to_owned(),
    email:         email.to_owned(),
    first_name:    body.first_name,
    last_name:     body.last_name,
    phone_number:  body.phone_number,
    role:          Role::Victim,
    password_hash: hash_password(&body.password)?,
  })
  .await?;
  Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /me`
pub async fn me(CurrentAccount(account): CurrentAccount) -> Json<Account> { Json(account) }

/// `GET /emergency-types`
pub async fn emergency_types<S: DispatchStore>(
  State(state): State<AppState<S>>,
  _caller: CurrentAccount,
) -> Result<Json<Vec<EmergencyType>>, ApiError> {
  let types = state
    .store
    .list_emergency_types()
    .await
    .map_err(|e| ApiError::Core(siren_core::Error::store(e)))?;
  Ok(Json(types))
}

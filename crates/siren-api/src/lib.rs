//! JSON HTTP API for Siren.
//!
//! Exposes an axum [`Router`] backed by any [`DispatchStore`]. Every route
//! except `POST /accounts` requires HTTP Basic credentials; the authenticated
//! account becomes the [`Actor`](siren_core::account::Actor) for the core
//! operation behind the route.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = siren_api::router(AppState::new(store));
//! axum::serve(listener, app).await?;
//! ```

pub mod accounts;
pub mod alerts;
pub mod auth;
pub mod error;
pub mod messages;
pub mod responder;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use siren_core::store::DispatchStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store: Arc<S>,
}

impl<S> AppState<S> {
  pub fn new(store: S) -> Self { Self { store: Arc::new(store) } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DispatchStore + 'static,
{
  Router::new()
    // Accounts
    .route("/accounts", post(accounts::register::<S>))
    .route("/me", get(accounts::me))
    .route("/emergency-types", get(accounts::emergency_types::<S>))
    // Alerts
    .route("/alerts", get(alerts::list_mine::<S>).post(alerts::raise::<S>))
    .route("/alerts/{id}", get(alerts::get_one::<S>))
    .route("/alerts/{id}/dispatch", post(alerts::redispatch::<S>))
    .route("/alerts/{id}/status", post(alerts::set_status::<S>))
    // Thread
    .route(
      "/alerts/{id}/messages",
      get(messages::list::<S>).post(messages::append::<S>),
    )
    // Responder self-service
    .route("/responder", get(responder::dashboard::<S>))
    .route("/responder/location", put(responder::update_location::<S>))
    .route("/responder/availability", put(responder::set_availability::<S>))
    .route("/responder/profile", put(responder::update_profile::<S>))
    .route("/responder/report", get(responder::report::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

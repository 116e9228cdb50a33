//! Error types for `siren-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::alert::AlertStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("coordinate out of range: ({latitude}, {longitude})")]
  InvalidCoordinate { latitude: f64, longitude: f64 },

  #[error("unknown emergency type: {0}")]
  UnknownEmergencyType(Uuid),

  #[error("alert not found: {0}")]
  AlertNotFound(Uuid),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("no responder profile for account {0}")]
  ResponderProfileMissing(Uuid),

  #[error("an account with this {0} already exists")]
  DuplicateAccount(&'static str),

  #[error("not allowed: {0}")]
  Unauthorized(&'static str),

  #[error("cannot move alert from {from} to {to}")]
  InvalidTransition { from: AlertStatus, to: AlertStatus },

  #[error("alert {0} is not pending")]
  NotPending(Uuid),

  #[error("alert {0} is resolved")]
  AlertClosed(Uuid),

  #[error("message body is empty")]
  EmptyMessage,

  #[error("alert {0} changed while it was being assigned")]
  AssignmentConflict(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Convert a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E: StoreError>(e: E) -> Self { e.into_core() }
}

/// The error type of a [`DispatchStore`](crate::store::DispatchStore) backend.
///
/// Backends that detect a condition the core has a variant for (a unique
/// username or email already taken, say) override `into_core` to surface it
/// as that variant. Anything else becomes [`Error::Store`].
pub trait StoreError: std::error::Error + Send + Sync + Sized + 'static {
  fn into_core(self) -> Error { Error::Store(Box::new(self)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! The `DispatchStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `siren-store-sqlite`).
//! The operations in this crate and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  StoreError,
  account::{Account, NewAccount},
  alert::{Alert, AlertStatus, NewAlert},
  emergency::{EmergencyType, NewEmergencyType},
  geo::Coordinate,
  responder::{Enlistment, NewResponder, ProfileUpdate, Responder},
  thread::{Message, NewMessage},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DispatchStore::list_alerts`]. Results are always ordered
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
  pub requester_id: Option<Uuid>,
  pub responder_id: Option<Uuid>,
  /// Empty means any status.
  pub statuses:     Vec<AlertStatus>,
  pub limit:        Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Siren persistence backend.
///
/// Every write is a single atomic commit. The two alert mutations,
/// [`commit_assignment`](Self::commit_assignment) and
/// [`transition_status`](Self::transition_status), are compare-and-set: they
/// return `None` and write nothing when the alert is no longer in the
/// expected state.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DispatchStore: Send + Sync {
  type Error: StoreError;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn find_account_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  // ── Emergency types ───────────────────────────────────────────────────

  fn add_emergency_type(
    &self,
    input: NewEmergencyType,
  ) -> impl Future<Output = Result<EmergencyType, Self::Error>> + Send + '_;

  fn get_emergency_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<EmergencyType>, Self::Error>> + Send + '_;

  fn list_emergency_types(
    &self,
  ) -> impl Future<Output = Result<Vec<EmergencyType>, Self::Error>> + Send + '_;

  // ── Responders ────────────────────────────────────────────────────────

  fn add_responder(
    &self,
    input: NewResponder,
  ) -> impl Future<Output = Result<Responder, Self::Error>> + Send + '_;

  /// Create a responder account and its available profile in one commit.
  /// Neither row is written if either insert fails.
  fn enlist_responder(
    &self,
    account: NewAccount,
    enlistment: Enlistment,
  ) -> impl Future<Output = Result<(Account, Responder), Self::Error>> + Send + '_;

  fn get_responder(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Responder>, Self::Error>> + Send + '_;

  fn responder_for_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Responder>, Self::Error>> + Send + '_;

  /// Responders that support `emergency_type_id` and whose availability flag
  /// equals `available`. No ordering guarantee.
  fn find_responders(
    &self,
    emergency_type_id: Uuid,
    available: bool,
  ) -> impl Future<Output = Result<Vec<Responder>, Self::Error>> + Send + '_;

  fn update_responder_location(
    &self,
    responder_id: Uuid,
    location: Coordinate,
  ) -> impl Future<Output = Result<Responder, Self::Error>> + Send + '_;

  fn set_responder_availability(
    &self,
    responder_id: Uuid,
    available: bool,
  ) -> impl Future<Output = Result<Responder, Self::Error>> + Send + '_;

  /// Replace the responder's organization, contact number and capability set
  /// and the owning account's name and email, in one transaction.
  fn update_responder_profile(
    &self,
    responder_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Responder, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  /// Persist a new `pending`, unassigned alert. `created_at` is set by the
  /// store.
  fn create_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  fn get_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  fn list_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + 'a;

  /// Set `assigned_responder_id` and move the alert to `dispatched` in one
  /// commit, provided the alert is still `pending` and unassigned and the
  /// responder supports the alert's emergency type.
  fn commit_assignment(
    &self,
    alert_id: Uuid,
    responder_id: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  /// Move the alert from `from` to `to`, provided its status is still `from`.
  fn transition_status(
    &self,
    alert_id: Uuid,
    from: AlertStatus,
    to: AlertStatus,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  // ── Messages (append-only) ────────────────────────────────────────────

  /// Record a message. The timestamp is set by the store.
  ///
  /// The alert's status is checked in the same commit as the insert:
  /// returns `None` and writes nothing when the alert is resolved or gone.
  fn append_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  /// All messages of an alert, oldest first.
  fn list_messages(
    &self,
    alert_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;
}

//! Responders and the operations a responder performs on their own profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{self, Account, Actor, NewAccount, Role},
  alert::{Alert, AlertStatus},
  geo::Coordinate,
  store::{AlertQuery, DispatchStore},
};

/// How many resolved alerts the dashboard shows.
pub const RECENTLY_RESOLVED_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responder {
  pub responder_id:    Uuid,
  pub account_id:      Uuid,
  pub organization:    String,
  pub contact_number:  String,
  pub emergency_types: Vec<Uuid>,
  pub available:       bool,
  pub location:        Coordinate,
  pub last_updated:    DateTime<Utc>,
}

impl Responder {
  pub fn supports(&self, emergency_type_id: Uuid) -> bool {
    self.emergency_types.contains(&emergency_type_id)
  }
}

/// Input for [`DispatchStore::add_responder`].
#[derive(Debug, Clone)]
pub struct NewResponder {
  pub account_id:      Uuid,
  pub organization:    String,
  pub contact_number:  String,
  pub emergency_types: Vec<Uuid>,
  pub available:       bool,
  pub location:        Coordinate,
}

/// Editable profile fields; applied to the responder row and its account in
/// one write.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
  pub organization:    String,
  pub contact_number:  String,
  pub emergency_types: Vec<Uuid>,
  pub first_name:      String,
  pub last_name:       String,
  pub email:           String,
}

/// Operator-supplied details for a new responder.
#[derive(Debug, Clone)]
pub struct Enlistment {
  pub organization:    String,
  pub contact_number:  String,
  pub emergency_types: Vec<Uuid>,
  pub location:        Coordinate,
}

/// What a responder sees when they open the app.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
  pub responder:         Responder,
  /// `dispatched` and `in_progress`, newest first.
  pub active_alerts:     Vec<Alert>,
  /// The most recent [`RECENTLY_RESOLVED_LIMIT`] resolved alerts.
  pub recently_resolved: Vec<Alert>,
}

/// Resolve the responder profile owned by `actor`.
pub async fn profile_of<S: DispatchStore>(store: &S, actor: Actor) -> Result<Responder> {
  match actor.role {
    Role::Responder => {}
    Role::Victim => return Err(Error::Unauthorized("only responders have a profile")),
  }
  store
    .responder_for_account(actor.account_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ResponderProfileMissing(actor.account_id))
}

/// The responder profile behind `actor`, if the actor is a responder.
/// Victims resolve to `None` rather than an error.
pub async fn acting_responder<S: DispatchStore>(
  store: &S,
  actor: Actor,
) -> Result<Option<Responder>> {
  match actor.role {
    Role::Victim => Ok(None),
    Role::Responder => store
      .responder_for_account(actor.account_id)
      .await
      .map_err(Error::store),
  }
}

pub async fn update_location<S: DispatchStore>(
  store: &S,
  actor: Actor,
  location: Coordinate,
) -> Result<Responder> {
  let responder = profile_of(store, actor).await?;
  let updated = store
    .update_responder_location(responder.responder_id, location)
    .await
    .map_err(Error::store)?;
  tracing::debug!(responder_id = %updated.responder_id, "responder location updated");
  Ok(updated)
}

pub async fn set_availability<S: DispatchStore>(
  store: &S,
  actor: Actor,
  available: bool,
) -> Result<Responder> {
  let responder = profile_of(store, actor).await?;
  let updated = store
    .set_responder_availability(responder.responder_id, available)
    .await
    .map_err(Error::store)?;
  tracing::info!(responder_id = %updated.responder_id, available, "responder availability changed");
  Ok(updated)
}

pub async fn update_profile<S: DispatchStore>(
  store: &S,
  actor: Actor,
  mut update: ProfileUpdate,
) -> Result<Responder> {
  let responder = profile_of(store, actor).await?;

  update.emergency_types.sort();
  update.emergency_types.dedup();
  for id in &update.emergency_types {
    if store.get_emergency_type(*id).await.map_err(Error::store)?.is_none() {
      return Err(Error::UnknownEmergencyType(*id));
    }
  }
  if let Some(other) = store
    .find_account_by_email(&update.email)
    .await
    .map_err(Error::store)?
    && other.account_id != actor.account_id
  {
    return Err(Error::DuplicateAccount("email"));
  }

  store
    .update_responder_profile(responder.responder_id, update)
    .await
    .map_err(Error::store)
}

pub async fn dashboard<S: DispatchStore>(store: &S, actor: Actor) -> Result<Dashboard> {
  let responder = profile_of(store, actor).await?;

  let active_alerts = store
    .list_alerts(&AlertQuery {
      responder_id: Some(responder.responder_id),
      statuses: vec![AlertStatus::Dispatched, AlertStatus::InProgress],
      ..AlertQuery::default()
    })
    .await
    .map_err(Error::store)?;

  let recently_resolved = store
    .list_alerts(&AlertQuery {
      responder_id: Some(responder.responder_id),
      statuses: vec![AlertStatus::Resolved],
      limit: Some(RECENTLY_RESOLVED_LIMIT),
      ..AlertQuery::default()
    })
    .await
    .map_err(Error::store)?;

  Ok(Dashboard { responder, active_alerts, recently_resolved })
}

/// Provision a responder: a `Role::Responder` account plus its profile.
///
/// Emergency types are checked before anything is written. Both rows are
/// created in one store commit, and new responders start out available.
pub async fn enlist<S: DispatchStore>(
  store: &S,
  mut input: NewAccount,
  mut enlistment: Enlistment,
) -> Result<(Account, Responder)> {
  enlistment.emergency_types.sort();
  enlistment.emergency_types.dedup();
  for id in &enlistment.emergency_types {
    if store.get_emergency_type(*id).await.map_err(Error::store)?.is_none() {
      return Err(Error::UnknownEmergencyType(*id));
    }
  }

  input.role = Role::Responder;
  account::ensure_unclaimed(store, &input.username, &input.email).await?;
  let (account, responder) = store
    .enlist_responder(input, enlistment)
    .await
    .map_err(Error::store)?;

  tracing::info!(
    account_id = %account.account_id,
    responder_id = %responder.responder_id,
    "responder enlisted"
  );
  Ok((account, responder))
}

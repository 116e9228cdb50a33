//! Alerts: victim-submitted emergency requests.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Actor, Role},
  geo::Coordinate,
  responder::{Responder, acting_responder},
  store::{AlertQuery, DispatchStore},
};

/// Where an alert is in its lifecycle. Variants are declared in lifecycle
/// order, so the derived `Ord` matches forward progress.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
  Pending,
  Dispatched,
  InProgress,
  Resolved,
}

impl AlertStatus {
  pub const ALL: [AlertStatus; 4] = [
    AlertStatus::Pending,
    AlertStatus::Dispatched,
    AlertStatus::InProgress,
    AlertStatus::Resolved,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Dispatched => "dispatched",
      Self::InProgress => "in_progress",
      Self::Resolved => "resolved",
    }
  }

  /// Human-readable label used in reports.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Pending => "Pending",
      Self::Dispatched => "Responder Dispatched",
      Self::InProgress => "In Progress",
      Self::Resolved => "Resolved",
    }
  }

  pub fn is_terminal(&self) -> bool { matches!(self, Self::Resolved) }
}

impl fmt::Display for AlertStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A persisted alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:              Uuid,
  pub requester_id:          Uuid,
  /// Nullable for alerts whose type was removed from the reference data.
  pub emergency_type_id:     Option<Uuid>,
  pub location:              Coordinate,
  pub created_at:            DateTime<Utc>,
  pub status:                AlertStatus,
  pub description:           String,
  pub assigned_responder_id: Option<Uuid>,
}

impl Alert {
  pub fn is_assigned_to(&self, responder_id: Uuid) -> bool {
    self.assigned_responder_id == Some(responder_id)
  }
}

/// Input for [`DispatchStore::create_alert`](crate::store::DispatchStore::create_alert).
/// New alerts always start `pending` and unassigned.
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub requester_id:      Uuid,
  pub emergency_type_id: Uuid,
  pub location:          Coordinate,
  pub description:       String,
}

// ─── Parties ─────────────────────────────────────────────────────────────────

/// The two accounts with a stake in an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
  Requester,
  AssignedResponder,
}

/// Which party `actor` is for `alert`, if any. `responder` is the actor's own
/// responder profile (see [`acting_responder`]).
pub fn party(alert: &Alert, actor: Actor, responder: Option<&Responder>) -> Option<Party> {
  match actor.role {
    Role::Victim => (alert.requester_id == actor.account_id).then_some(Party::Requester),
    Role::Responder => responder
      .filter(|r| r.account_id == actor.account_id && alert.is_assigned_to(r.responder_id))
      .map(|_| Party::AssignedResponder),
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Load an alert on behalf of `actor`. Alerts the actor has no stake in are
/// reported as not found.
pub async fn view<S: DispatchStore>(
  store: &S,
  actor: Actor,
  alert_id: Uuid,
) -> Result<(Alert, Party)> {
  let alert = store
    .get_alert(alert_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertNotFound(alert_id))?;
  let responder = acting_responder(store, actor).await?;
  let party = party(&alert, actor, responder.as_ref()).ok_or(Error::AlertNotFound(alert_id))?;
  Ok((alert, party))
}

/// The victim's own alerts, newest first.
pub async fn requested_by<S: DispatchStore>(store: &S, actor: Actor) -> Result<Vec<Alert>> {
  match actor.role {
    Role::Victim => {}
    Role::Responder => return Err(Error::Unauthorized("only victims raise alerts")),
  }
  store
    .list_alerts(&AlertQuery {
      requester_id: Some(actor.account_id),
      ..AlertQuery::default()
    })
    .await
    .map_err(Error::store)
}

//! The alert status state machine.
//!
//! ```text
//! pending ──▶ dispatched ──▶ in_progress ──▶ resolved
//!                  └──────────────────────────▲
//! ```
//!
//! `pending → dispatched` belongs to the dispatcher alone and is only ever
//! written by [`DispatchStore::commit_assignment`]. Every later step is taken
//! by the assigned responder through [`advance`].

use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Actor, Role},
  alert::{Alert, AlertStatus},
  responder::{Responder, acting_responder},
  store::DispatchStore,
};

/// The statuses reachable in one step from `from`.
pub fn next_states(from: AlertStatus) -> &'static [AlertStatus] {
  match from {
    AlertStatus::Pending => &[AlertStatus::Dispatched],
    AlertStatus::Dispatched => &[AlertStatus::InProgress, AlertStatus::Resolved],
    AlertStatus::InProgress => &[AlertStatus::Resolved],
    AlertStatus::Resolved => &[],
  }
}

pub fn can_transition(from: AlertStatus, to: AlertStatus) -> bool {
  next_states(from).contains(&to)
}

/// Decide whether `actor` may move `alert` to `to`.
///
/// Authorization is checked before the transition itself, so an outsider gets
/// [`Error::Unauthorized`] even for a nonsensical target.
pub fn check_transition(
  alert: &Alert,
  actor: Actor,
  responder: Option<&Responder>,
  to: AlertStatus,
) -> Result<()> {
  if to == AlertStatus::Dispatched {
    return Err(Error::Unauthorized("dispatch is performed by the system"));
  }

  match actor.role {
    Role::Responder => {
      let assigned = responder
        .is_some_and(|r| r.account_id == actor.account_id && alert.is_assigned_to(r.responder_id));
      if !assigned {
        return Err(Error::Unauthorized("only the assigned responder may update this alert"));
      }
    }
    Role::Victim => {
      return Err(Error::Unauthorized("only the assigned responder may update this alert"));
    }
  }

  if !can_transition(alert.status, to) {
    return Err(Error::InvalidTransition { from: alert.status, to });
  }
  Ok(())
}

/// Move an alert one step forward on behalf of its assigned responder.
///
/// The write is a compare-and-set on the status that was checked; if another
/// request moved the alert first, this fails with
/// [`Error::InvalidTransition`] and nothing changes.
pub async fn advance<S: DispatchStore>(
  store: &S,
  actor: Actor,
  alert_id: Uuid,
  to: AlertStatus,
) -> Result<Alert> {
  let alert = store
    .get_alert(alert_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertNotFound(alert_id))?;
  let responder = acting_responder(store, actor).await?;

  check_transition(&alert, actor, responder.as_ref(), to)?;

  let from = alert.status;
  let updated = store
    .transition_status(alert_id, from, to)
    .await
    .map_err(Error::store)?
    .ok_or(Error::InvalidTransition { from, to })?;

  tracing::info!(%alert_id, %from, %to, "alert status changed");
  Ok(updated)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::geo::Coordinate;

  struct Fixture {
    alert:     Alert,
    crew:      Actor,
    profile:   Responder,
    requester: Actor,
  }

  fn fixture(status: AlertStatus) -> Fixture {
    let requester = Actor { account_id: Uuid::new_v4(), role: Role::Victim };
    let crew = Actor { account_id: Uuid::new_v4(), role: Role::Responder };
    let here = Coordinate::new(40.0, -74.0).unwrap();
    let profile = Responder {
      responder_id:    Uuid::new_v4(),
      account_id:      crew.account_id,
      organization:    "Engine 4".into(),
      contact_number:  "555-0104".into(),
      emergency_types: vec![],
      available:       true,
      location:        here,
      last_updated:    Utc::now(),
    };
    let alert = Alert {
      alert_id:              Uuid::new_v4(),
      requester_id:          requester.account_id,
      emergency_type_id:     None,
      location:              here,
      created_at:            Utc::now(),
      status,
      description:           String::new(),
      assigned_responder_id: (status != AlertStatus::Pending).then_some(profile.responder_id),
    };
    Fixture { alert, crew, profile, requester }
  }

  #[test]
  fn forward_moves_are_allowed() {
    for (from, to) in [
      (AlertStatus::Dispatched, AlertStatus::InProgress),
      (AlertStatus::Dispatched, AlertStatus::Resolved),
      (AlertStatus::InProgress, AlertStatus::Resolved),
    ] {
      let f = fixture(from);
      check_transition(&f.alert, f.crew, Some(&f.profile), to)
        .unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
    }
  }

  #[test]
  fn backward_and_self_moves_are_rejected() {
    for from in AlertStatus::ALL {
      for to in AlertStatus::ALL {
        // A pending alert has no assigned responder to ask.
        if from == AlertStatus::Pending || to > from || to == AlertStatus::Dispatched {
          continue;
        }
        let f = fixture(from);
        let result = check_transition(&f.alert, f.crew, Some(&f.profile), to);
        assert!(
          matches!(result, Err(Error::InvalidTransition { .. })),
          "{from} -> {to}: {result:?}"
        );
      }
    }
  }

  #[test]
  fn resolved_is_terminal() {
    assert!(next_states(AlertStatus::Resolved).is_empty());
    assert!(!can_transition(AlertStatus::InProgress, AlertStatus::Pending));
    assert!(!can_transition(AlertStatus::Pending, AlertStatus::InProgress));
  }

  #[test]
  fn nobody_may_request_dispatched() {
    let f = fixture(AlertStatus::Pending);
    assert!(matches!(
      check_transition(&f.alert, f.requester, None, AlertStatus::Dispatched),
      Err(Error::Unauthorized(_))
    ));
    assert!(matches!(
      check_transition(&f.alert, f.crew, Some(&f.profile), AlertStatus::Dispatched),
      Err(Error::Unauthorized(_))
    ));
  }

  #[test]
  fn requester_cannot_change_status() {
    let f = fixture(AlertStatus::Dispatched);
    assert!(matches!(
      check_transition(&f.alert, f.requester, None, AlertStatus::Resolved),
      Err(Error::Unauthorized(_))
    ));
  }

  #[test]
  fn other_responder_cannot_change_status() {
    let f = fixture(AlertStatus::InProgress);
    let other = Actor { account_id: Uuid::new_v4(), role: Role::Responder };
    let other_profile = Responder {
      responder_id: Uuid::new_v4(),
      account_id: other.account_id,
      ..f.profile.clone()
    };
    assert!(matches!(
      check_transition(&f.alert, other, Some(&other_profile), AlertStatus::Resolved),
      Err(Error::Unauthorized(_))
    ));
  }
}

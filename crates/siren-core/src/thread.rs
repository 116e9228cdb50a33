//! The per-alert message thread.
//!
//! Messages are append-only: once recorded they are never edited or deleted,
//! so the full conversation can always be replayed in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::Actor,
  alert::{Alert, Party, party},
  responder::{Responder, acting_responder},
  store::DispatchStore,
};

/// A persisted message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:     Uuid,
  pub alert_id:       Uuid,
  pub sender_id:      Uuid,
  pub body:           String,
  pub sent_at:        DateTime<Utc>,
  pub from_responder: bool,
}

/// Input for [`DispatchStore::append_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub alert_id:       Uuid,
  pub sender_id:      Uuid,
  pub body:           String,
  pub from_responder: bool,
}

/// Decide whether `actor` may post to `alert`, returning the
/// `from_responder` flag for the message.
///
/// Parties are checked first, so only they learn that an alert is resolved.
/// Resolved alerts are closed to everyone.
pub fn check_sender(alert: &Alert, actor: Actor, responder: Option<&Responder>) -> Result<bool> {
  let from_responder = match party(alert, actor, responder) {
    Some(Party::Requester) => false,
    Some(Party::AssignedResponder) => true,
    None => {
      return Err(Error::Unauthorized(
        "only the requester or the assigned responder may post to this alert",
      ));
    }
  };
  if alert.status.is_terminal() {
    return Err(Error::AlertClosed(alert.alert_id));
  }
  Ok(from_responder)
}

pub async fn append<S: DispatchStore>(
  store: &S,
  actor: Actor,
  alert_id: Uuid,
  body: String,
) -> Result<Message> {
  let alert = store
    .get_alert(alert_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertNotFound(alert_id))?;
  let responder = acting_responder(store, actor).await?;

  let from_responder = check_sender(&alert, actor, responder.as_ref())?;

  let body = body.trim();
  if body.is_empty() {
    return Err(Error::EmptyMessage);
  }

  let message = store
    .append_message(NewMessage {
      alert_id,
      sender_id: actor.account_id,
      body: body.to_owned(),
      from_responder,
    })
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertClosed(alert_id))?;

  tracing::debug!(%alert_id, message_id = %message.message_id, from_responder, "message appended");
  Ok(message)
}

/// The thread for `alert_id`, oldest first. Visible to the requester and the
/// assigned responder only.
pub async fn list<S: DispatchStore>(store: &S, actor: Actor, alert_id: Uuid) -> Result<Vec<Message>> {
  let (alert, _party) = crate::alert::view(store, actor, alert_id).await?;
  store.list_messages(alert.alert_id).await.map_err(Error::store)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{account::Role, alert::AlertStatus, geo::Coordinate};

  fn setup(status: AlertStatus) -> (Alert, Actor, Actor, Responder) {
    let victim = Actor { account_id: Uuid::new_v4(), role: Role::Victim };
    let crew = Actor { account_id: Uuid::new_v4(), role: Role::Responder };
    let here = Coordinate::new(40.0, -74.0).unwrap();
    let profile = Responder {
      responder_id:    Uuid::new_v4(),
      account_id:      crew.account_id,
      organization:    "Rescue 1".into(),
      contact_number:  "555-0111".into(),
      emergency_types: vec![],
      available:       true,
      location:        here,
      last_updated:    Utc::now(),
    };
    let alert = Alert {
      alert_id:              Uuid::new_v4(),
      requester_id:          victim.account_id,
      emergency_type_id:     None,
      location:              here,
      created_at:            Utc::now(),
      status,
      description:           "smoke in stairwell".into(),
      assigned_responder_id: Some(profile.responder_id),
    };
    (alert, victim, crew, profile)
  }

  #[test]
  fn flag_follows_the_sender() {
    let (alert, victim, crew, profile) = setup(AlertStatus::Dispatched);
    assert!(!check_sender(&alert, victim, None).unwrap());
    assert!(check_sender(&alert, crew, Some(&profile)).unwrap());
  }

  #[test]
  fn strangers_are_rejected() {
    let (alert, _, _, profile) = setup(AlertStatus::InProgress);
    let stranger = Actor { account_id: Uuid::new_v4(), role: Role::Victim };
    let other_crew = Actor { account_id: Uuid::new_v4(), role: Role::Responder };
    let other_profile = Responder {
      responder_id: Uuid::new_v4(),
      account_id: other_crew.account_id,
      ..profile
    };

    assert!(matches!(check_sender(&alert, stranger, None), Err(Error::Unauthorized(_))));
    assert!(matches!(
      check_sender(&alert, other_crew, Some(&other_profile)),
      Err(Error::Unauthorized(_))
    ));
  }

  #[test]
  fn resolved_alert_rejects_everyone() {
    let (alert, victim, crew, profile) = setup(AlertStatus::Resolved);
    assert!(matches!(check_sender(&alert, victim, None), Err(Error::AlertClosed(_))));
    assert!(matches!(check_sender(&alert, crew, Some(&profile)), Err(Error::AlertClosed(_))));
  }

  #[test]
  fn strangers_do_not_learn_an_alert_is_resolved() {
    let (alert, ..) = setup(AlertStatus::Resolved);
    let stranger = Actor { account_id: Uuid::new_v4(), role: Role::Victim };
    assert!(matches!(check_sender(&alert, stranger, None), Err(Error::Unauthorized(_))));
  }
}

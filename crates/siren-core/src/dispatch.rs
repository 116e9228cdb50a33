//! Nearest-responder dispatch.
//!
//! [`assign`] ranks the available responders for an alert's emergency type by
//! great-circle distance and commits the closest one. An empty candidate set
//! is a valid outcome (`Ok(None)`): the alert stays `pending` until someone
//! calls [`redispatch`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Actor, Role},
  alert::{Alert, AlertStatus, NewAlert},
  directory::find_eligible,
  geo::{Coordinate, distance},
  responder::Responder,
  store::DispatchStore,
};

/// A committed dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
  pub alert:       Alert,
  pub responder:   Responder,
  pub distance_km: f64,
}

/// The closest candidate to `origin` and its distance in km.
///
/// Exact ties go to the lowest `responder_id`, so the result does not depend
/// on the order the store returned the candidates in.
pub fn nearest(origin: Coordinate, candidates: &[Responder]) -> Option<(&Responder, f64)> {
  candidates
    .iter()
    .map(|r| (r, distance(origin, r.location)))
    .min_by(|(a, da), (b, db)| {
      da.total_cmp(db).then_with(|| a.responder_id.cmp(&b.responder_id))
    })
}

/// Assign the nearest available responder to a `pending` alert.
///
/// Returns `Ok(None)` when nobody is eligible; the alert is left untouched.
/// The write is a guarded commit: if the alert stopped being `pending` (or the
/// responder dropped the capability) after candidates were read, nothing is
/// written and [`Error::AssignmentConflict`] is returned.
pub async fn assign<S: DispatchStore>(store: &S, alert_id: Uuid) -> Result<Option<Assignment>> {
  let alert = store
    .get_alert(alert_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertNotFound(alert_id))?;

  if alert.status != AlertStatus::Pending || alert.assigned_responder_id.is_some() {
    return Err(Error::NotPending(alert_id));
  }

  let Some(emergency_type_id) = alert.emergency_type_id else {
    tracing::warn!(%alert_id, "alert has no emergency type; leaving it pending");
    return Ok(None);
  };

  let candidates = find_eligible(store, emergency_type_id, true).await?;
  let Some((chosen, distance_km)) = nearest(alert.location, &candidates) else {
    tracing::info!(%alert_id, %emergency_type_id, "no available responder; alert awaits dispatch");
    return Ok(None);
  };
  let responder = chosen.clone();

  let alert = store
    .commit_assignment(alert_id, responder.responder_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AssignmentConflict(alert_id))?;

  tracing::info!(
    %alert_id,
    responder_id = %responder.responder_id,
    distance_km,
    candidates = candidates.len(),
    "responder dispatched"
  );

  Ok(Some(Assignment { alert, responder, distance_km }))
}

// ─── Intake ──────────────────────────────────────────────────────────────────

/// What a victim submits.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRequest {
  pub emergency_type_id: Uuid,
  pub location:          Coordinate,
  #[serde(default)]
  pub description:       String,
}

/// The outcome of raising an alert. `assignment` is `None` when the alert is
/// awaiting dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct Raised {
  pub alert:      Alert,
  pub assignment: Option<Assignment>,
}

/// Persist a victim's alert and immediately try to dispatch it.
///
/// An unknown emergency type is rejected before anything is written. If the
/// dispatch step fails the alert still exists as `pending` and the error is
/// returned.
pub async fn raise_alert<S: DispatchStore>(
  store: &S,
  actor: Actor,
  request: AlertRequest,
) -> Result<Raised> {
  match actor.role {
    Role::Victim => {}
    Role::Responder => return Err(Error::Unauthorized("only victims raise alerts")),
  }

  if store
    .get_emergency_type(request.emergency_type_id)
    .await
    .map_err(Error::store)?
    .is_none()
  {
    return Err(Error::UnknownEmergencyType(request.emergency_type_id));
  }

  let alert = store
    .create_alert(NewAlert {
      requester_id:      actor.account_id,
      emergency_type_id: request.emergency_type_id,
      location:          request.location,
      description:       request.description,
    })
    .await
    .map_err(Error::store)?;
  tracing::info!(alert_id = %alert.alert_id, requester_id = %actor.account_id, "alert raised");

  match assign(store, alert.alert_id).await? {
    Some(assignment) => Ok(Raised { alert: assignment.alert.clone(), assignment: Some(assignment) }),
    None => Ok(Raised { alert, assignment: None }),
  }
}

/// Retry dispatch for an alert that is still `pending`. Only the requester may
/// ask.
pub async fn redispatch<S: DispatchStore>(
  store: &S,
  actor: Actor,
  alert_id: Uuid,
) -> Result<Option<Assignment>> {
  let alert = store
    .get_alert(alert_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlertNotFound(alert_id))?;

  match actor.role {
    Role::Victim if alert.requester_id == actor.account_id => {}
    Role::Victim | Role::Responder => {
      return Err(Error::Unauthorized("only the requester may re-dispatch an alert"));
    }
  }

  assign(store, alert_id).await
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn at(lat: f64, lon: f64) -> Coordinate { Coordinate::new(lat, lon).unwrap() }

  fn responder_at(lat: f64, lon: f64) -> Responder {
    Responder {
      responder_id:    Uuid::new_v4(),
      account_id:      Uuid::new_v4(),
      organization:    "Station 9".into(),
      contact_number:  "555-0199".into(),
      emergency_types: vec![],
      available:       true,
      location:        at(lat, lon),
      last_updated:    Utc::now(),
    }
  }

  #[test]
  fn nearest_of_none_is_none() {
    assert!(nearest(at(40.0, -74.0), &[]).is_none());
  }

  #[test]
  fn nearest_picks_the_closer_responder() {
    let close = responder_at(40.01, -74.0);
    let far = responder_at(41.0, -74.0);
    let candidates = vec![far.clone(), close.clone()];

    let (chosen, d) = nearest(at(40.0, -74.0), &candidates).unwrap();
    assert_eq!(chosen.responder_id, close.responder_id);
    assert!((d - 1.11).abs() < 0.01, "d = {d}");
  }

  #[test]
  fn nearest_minimises_over_many() {
    let origin = at(34.05, -118.25);
    let candidates: Vec<_> = [
      (34.10, -118.30),
      (33.90, -118.40),
      (34.051, -118.249),
      (35.00, -117.00),
      (34.20, -118.10),
    ]
    .into_iter()
    .map(|(lat, lon)| responder_at(lat, lon))
    .collect();

    let (chosen, d) = nearest(origin, &candidates).unwrap();
    let min = candidates
      .iter()
      .map(|r| distance(origin, r.location))
      .fold(f64::INFINITY, f64::min);
    assert_eq!(d, min);
    assert_eq!(chosen.location, at(34.051, -118.249));
  }

  #[test]
  fn exact_tie_goes_to_lowest_id() {
    let mut a = responder_at(40.5, -74.0);
    let mut b = responder_at(40.5, -74.0);
    a.responder_id = Uuid::from_u128(2);
    b.responder_id = Uuid::from_u128(1);

    let origin = at(40.0, -74.0);
    let forward = vec![a.clone(), b.clone()];
    let backward = vec![b.clone(), a.clone()];
    assert_eq!(nearest(origin, &forward).unwrap().0.responder_id, b.responder_id);
    assert_eq!(nearest(origin, &backward).unwrap().0.responder_id, b.responder_id);
  }
}

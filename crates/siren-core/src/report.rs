//! Responder activity report: the responder's alerts grouped by status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  account::{Account, Actor},
  alert::{Alert, AlertStatus},
  responder::{Responder, profile_of},
  store::{AlertQuery, DispatchStore},
};

#[derive(Debug, Clone, Serialize)]
pub struct StatusBucket {
  pub status: AlertStatus,
  /// Newest first.
  pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponderReport {
  pub account:      Account,
  pub responder:    Responder,
  pub generated_on: DateTime<Utc>,
  /// One bucket per status, in lifecycle order, including empty ones.
  pub buckets:      Vec<StatusBucket>,
}

impl ResponderReport {
  pub fn total(&self) -> usize { self.buckets.iter().map(|b| b.alerts.len()).sum() }

  /// Plain-text rendering for printing or download. Same as `to_string()`.
  pub fn render_text(&self) -> String { self.to_string() }
}

impl fmt::Display for ResponderReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Emergency Response Report")?;
    writeln!(
      f,
      "Responder: {} ({})",
      self.account.display_name(),
      self.responder.organization
    )?;
    writeln!(f, "Contact: {}", self.responder.contact_number)?;
    writeln!(f, "Generated: {}", self.generated_on.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(f, "Total alerts: {}", self.total())?;

    for bucket in &self.buckets {
      writeln!(f)?;
      writeln!(f, "{} ({})", bucket.status.label(), bucket.alerts.len())?;
      if bucket.alerts.is_empty() {
        writeln!(f, "  none")?;
      }
      for alert in &bucket.alerts {
        write!(
          f,
          "  {}  {}  ({:.6}, {:.6})",
          alert.created_at.format("%Y-%m-%d %H:%M"),
          alert.alert_id,
          alert.location.latitude(),
          alert.location.longitude(),
        )?;
        if !alert.description.is_empty() {
          write!(f, "  {}", alert.description)?;
        }
        writeln!(f)?;
      }
    }
    Ok(())
  }
}

/// Build the report for the responder behind `actor`. Read-only.
pub async fn responder_report<S: DispatchStore>(
  store: &S,
  actor: Actor,
) -> Result<ResponderReport> {
  let responder = profile_of(store, actor).await?;
  let account = store
    .get_account(actor.account_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AccountNotFound(actor.account_id))?;

  let alerts = store
    .list_alerts(&AlertQuery {
      responder_id: Some(responder.responder_id),
      ..AlertQuery::default()
    })
    .await
    .map_err(Error::store)?;

  Ok(ResponderReport {
    account,
    responder,
    generated_on: Utc::now(),
    buckets: bucket_by_status(alerts),
  })
}

/// Group alerts into one bucket per status, preserving input order within
/// each bucket.
pub fn bucket_by_status(alerts: Vec<Alert>) -> Vec<StatusBucket> {
  let mut buckets: Vec<StatusBucket> = AlertStatus::ALL
    .into_iter()
    .map(|status| StatusBucket { status, alerts: Vec::new() })
    .collect();
  for alert in alerts {
    if let Some(bucket) = buckets.iter_mut().find(|b| b.status == alert.status) {
      bucket.alerts.push(alert);
    }
  }
  buckets
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{account::Role, geo::Coordinate};

  fn alert(status: AlertStatus, description: &str) -> Alert {
    Alert {
      alert_id: Uuid::new_v4(),
      requester_id: Uuid::new_v4(),
      emergency_type_id: None,
      location: Coordinate::new(12.5, -7.25).unwrap(),
      created_at: Utc::now(),
      status,
      description: description.into(),
      assigned_responder_id: None,
    }
  }

  #[test]
  fn every_status_gets_a_bucket() {
    let buckets = bucket_by_status(vec![
      alert(AlertStatus::Resolved, "a"),
      alert(AlertStatus::Dispatched, "b"),
      alert(AlertStatus::Resolved, "c"),
    ]);
    let shape: Vec<_> = buckets.iter().map(|b| (b.status, b.alerts.len())).collect();
    assert_eq!(
      shape,
      vec![
        (AlertStatus::Pending, 0),
        (AlertStatus::Dispatched, 1),
        (AlertStatus::InProgress, 0),
        (AlertStatus::Resolved, 2),
      ]
    );
    let resolved: Vec<_> = buckets[3].alerts.iter().map(|a| a.description.as_str()).collect();
    assert_eq!(resolved, ["a", "c"]);
  }

  #[test]
  fn text_rendering_lists_every_bucket() {
    let here = Coordinate::new(12.5, -7.25).unwrap();
    let account = Account {
      account_id:    Uuid::new_v4(),
      username:      "engine7".into(),
      email:         "e7@example.org".into(),
      first_name:    Some("Dana".into()),
      last_name:     Some("Reyes".into()),
      phone_number:  None,
      role:          Role::Responder,
      password_hash: String::new(),
      created_at:    Utc::now(),
    };
    let responder = Responder {
      responder_id:    Uuid::new_v4(),
      account_id:      account.account_id,
      organization:    "Engine 7".into(),
      contact_number:  "555-0107".into(),
      emergency_types: vec![],
      available:       true,
      location:        here,
      last_updated:    Utc::now(),
    };
    let report = ResponderReport {
      account,
      responder,
      generated_on: Utc::now(),
      buckets: bucket_by_status(vec![
        alert(AlertStatus::InProgress, "gas leak"),
        alert(AlertStatus::Resolved, ""),
      ]),
    };

    let text = report.render_text();
    assert!(text.starts_with("Emergency Response Report\n"));
    assert!(text.contains("Responder: Dana Reyes (Engine 7)\n"));
    assert!(text.contains("Total alerts: 2\n"));
    assert!(text.contains("\nPending (0)\n  none\n"));
    assert!(text.contains("\nResponder Dispatched (0)\n  none\n"));
    assert!(text.contains("\nIn Progress (1)\n"));
    assert!(text.contains("(12.500000, -7.250000)  gas leak\n"));
    assert!(text.contains("\nResolved (1)\n"));
    assert_eq!(text, report.to_string());
  }
}

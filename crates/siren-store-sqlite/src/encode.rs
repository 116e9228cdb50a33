//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision) so they sort lexically. UUIDs are stored as hyphenated lowercase
//! strings. Coordinates are stored as two REAL columns.

use chrono::{DateTime, SecondsFormat, Utc};
use siren_core::{
  account::{Account, Role},
  alert::{Alert, AlertStatus},
  emergency::EmergencyType,
  geo::Coordinate,
  responder::Responder,
  thread::Message,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Victim => "victim",
    Role::Responder => "responder",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "victim" => Ok(Role::Victim),
    "responder" => Ok(Role::Responder),
    other => Err(Error::Decode { column: "role", value: other.to_owned() }),
  }
}

// ─── AlertStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(s: AlertStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<AlertStatus> {
  AlertStatus::ALL
    .into_iter()
    .find(|status| status.as_str() == s)
    .ok_or_else(|| Error::Decode { column: "status", value: s.to_owned() })
}

// ─── Coordinate ───────────────────────────────────────────────────────────────

pub fn decode_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate> {
  Ok(Coordinate::new(latitude, longitude)?)
}

// ─── Emergency type lists ─────────────────────────────────────────────────────

/// Decode the `group_concat` of a responder's emergency type ids.
pub fn decode_type_list(s: Option<&str>) -> Result<Vec<Uuid>> {
  let mut ids = s
    .unwrap_or_default()
    .split(',')
    .filter(|part| !part.is_empty())
    .map(decode_uuid)
    .collect::<Result<Vec<_>>>()?;
  ids.sort();
  Ok(ids)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawAccount::from_row`].
pub const ACCOUNT_COLUMNS: &str = "account_id, username, email, first_name, last_name,
  phone_number, role, password_hash, created_at";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub username:      String,
  pub email:         String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub phone_number:  Option<String>,
  pub role:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      first_name:    row.get(3)?,
      last_name:     row.get(4)?,
      phone_number:  row.get(5)?,
      role:          row.get(6)?,
      password_hash: row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      username:      self.username,
      email:         self.email,
      first_name:    self.first_name,
      last_name:     self.last_name,
      phone_number:  self.phone_number,
      role:          decode_role(&self.role)?,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawEmergencyType {
  pub emergency_type_id: String,
  pub name:              String,
  pub description:       String,
}

impl RawEmergencyType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      emergency_type_id: row.get(0)?,
      name:              row.get(1)?,
      description:       row.get(2)?,
    })
  }

  pub fn into_emergency_type(self) -> Result<EmergencyType> {
    Ok(EmergencyType {
      emergency_type_id: decode_uuid(&self.emergency_type_id)?,
      name:              self.name,
      description:       self.description,
    })
  }
}

/// Column list matching [`RawResponder::from_row`]; expects the table alias
/// `r`.
pub const RESPONDER_COLUMNS: &str = "r.responder_id, r.account_id, r.organization,
  r.contact_number, r.available, r.latitude, r.longitude, r.last_updated,
  (SELECT group_concat(t.emergency_type_id, ',')
     FROM responder_emergency_types t
    WHERE t.responder_id = r.responder_id) AS emergency_types";

pub struct RawResponder {
  pub responder_id:    String,
  pub account_id:      String,
  pub organization:    String,
  pub contact_number:  String,
  pub available:       bool,
  pub latitude:        f64,
  pub longitude:       f64,
  pub last_updated:    String,
  pub emergency_types: Option<String>,
}

impl RawResponder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      responder_id:    row.get(0)?,
      account_id:      row.get(1)?,
      organization:    row.get(2)?,
      contact_number:  row.get(3)?,
      available:       row.get(4)?,
      latitude:        row.get(5)?,
      longitude:       row.get(6)?,
      last_updated:    row.get(7)?,
      emergency_types: row.get(8)?,
    })
  }

  pub fn into_responder(self) -> Result<Responder> {
    Ok(Responder {
      responder_id:    decode_uuid(&self.responder_id)?,
      account_id:      decode_uuid(&self.account_id)?,
      organization:    self.organization,
      contact_number:  self.contact_number,
      emergency_types: decode_type_list(self.emergency_types.as_deref())?,
      available:       self.available,
      location:        decode_coordinate(self.latitude, self.longitude)?,
      last_updated:    decode_dt(&self.last_updated)?,
    })
  }
}

/// Column list matching [`RawAlert::from_row`].
pub const ALERT_COLUMNS: &str = "alert_id, requester_id, emergency_type_id, latitude,
  longitude, created_at, status, description, assigned_responder_id";

pub struct RawAlert {
  pub alert_id:              String,
  pub requester_id:          String,
  pub emergency_type_id:     Option<String>,
  pub latitude:              f64,
  pub longitude:             f64,
  pub created_at:            String,
  pub status:                String,
  pub description:           String,
  pub assigned_responder_id: Option<String>,
}

impl RawAlert {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alert_id:              row.get(0)?,
      requester_id:          row.get(1)?,
      emergency_type_id:     row.get(2)?,
      latitude:              row.get(3)?,
      longitude:             row.get(4)?,
      created_at:            row.get(5)?,
      status:                row.get(6)?,
      description:           row.get(7)?,
      assigned_responder_id: row.get(8)?,
    })
  }

  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      alert_id:              decode_uuid(&self.alert_id)?,
      requester_id:          decode_uuid(&self.requester_id)?,
      emergency_type_id:     self.emergency_type_id.as_deref().map(decode_uuid).transpose()?,
      location:              decode_coordinate(self.latitude, self.longitude)?,
      created_at:            decode_dt(&self.created_at)?,
      status:                decode_status(&self.status)?,
      description:           self.description,
      assigned_responder_id: self
        .assigned_responder_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
    })
  }
}

pub struct RawMessage {
  pub message_id:     String,
  pub alert_id:       String,
  pub sender_id:      String,
  pub body:           String,
  pub sent_at:        String,
  pub from_responder: bool,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:     row.get(0)?,
      alert_id:       row.get(1)?,
      sender_id:      row.get(2)?,
      body:           row.get(3)?,
      sent_at:        row.get(4)?,
      from_responder: row.get(5)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:     decode_uuid(&self.message_id)?,
      alert_id:       decode_uuid(&self.alert_id)?,
      sender_id:      decode_uuid(&self.sender_id)?,
      body:           self.body,
      sent_at:        decode_dt(&self.sent_at)?,
      from_responder: self.from_responder,
    })
  }
}

//! [`SqliteStore`]: the SQLite implementation of [`DispatchStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use siren_core::{
  account::{Account, NewAccount},
  alert::{Alert, AlertStatus, NewAlert},
  emergency::{EmergencyType, NewEmergencyType},
  geo::Coordinate,
  responder::{Enlistment, NewResponder, ProfileUpdate, Responder},
  store::{AlertQuery, DispatchStore},
  thread::{Message, NewMessage},
};

use crate::{
  encode::{
    ACCOUNT_COLUMNS, ALERT_COLUMNS, RESPONDER_COLUMNS, RawAccount, RawAlert,
    RawEmergencyType, RawMessage, RawResponder, encode_dt, encode_role,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Siren store backed by a single SQLite file.
///
/// Clones share the same background connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn account_where(&self, column: &'static str, value: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = ?1"),
            rusqlite::params![value],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}

fn select_responder(
  conn: &rusqlite::Connection,
  responder_id: &str,
) -> rusqlite::Result<Option<RawResponder>> {
  conn
    .query_row(
      &format!("SELECT {RESPONDER_COLUMNS} FROM responders r WHERE r.responder_id = ?1"),
      rusqlite::params![responder_id],
      RawResponder::from_row,
    )
    .optional()
}

fn select_alert(conn: &rusqlite::Connection, alert_id: &str) -> rusqlite::Result<Option<RawAlert>> {
  conn
    .query_row(
      &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE alert_id = ?1"),
      rusqlite::params![alert_id],
      RawAlert::from_row,
    )
    .optional()
}

fn new_account(input: NewAccount) -> Account {
  Account {
    account_id:    Uuid::new_v4(),
    username:      input.username,
    email:         input.email,
    first_name:    input.first_name,
    last_name:     input.last_name,
    phone_number:  input.phone_number,
    role:          input.role,
    password_hash: input.password_hash,
    created_at:    Utc::now(),
  }
}

fn insert_account(conn: &rusqlite::Connection, account: &Account) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO accounts (
       account_id, username, email, first_name, last_name,
       phone_number, role, password_hash, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      encode_uuid(account.account_id),
      account.username,
      account.email,
      account.first_name,
      account.last_name,
      account.phone_number,
      encode_role(account.role),
      account.password_hash,
      encode_dt(account.created_at),
    ],
  )?;
  Ok(())
}

fn insert_responder(
  conn: &rusqlite::Connection,
  responder_id: &str,
  input: &NewResponder,
  at: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO responders (
       responder_id, account_id, organization, contact_number,
       available, latitude, longitude, last_updated
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      responder_id,
      encode_uuid(input.account_id),
      input.organization,
      input.contact_number,
      input.available,
      input.location.latitude(),
      input.location.longitude(),
      at,
    ],
  )?;
  for type_id in &input.emergency_types {
    conn.execute(
      "INSERT OR IGNORE INTO responder_emergency_types (responder_id, emergency_type_id)
       VALUES (?1, ?2)",
      rusqlite::params![responder_id, encode_uuid(*type_id)],
    )?;
  }
  Ok(())
}

/// The account column a failed write collided on, if the failure was a
/// unique-key violation on `accounts`.
fn taken_account_field(err: &rusqlite::Error) -> Option<&'static str> {
  let rusqlite::Error::SqliteFailure(e, Some(msg)) = err else {
    return None;
  };
  if e.code != rusqlite::ErrorCode::ConstraintViolation {
    return None;
  }
  if msg.contains("accounts.username") {
    Some("username")
  } else if msg.contains("accounts.email") {
    Some("email")
  } else {
    None
  }
}

/// Split a write failure into a taken account field or a hard error.
fn claim_account<T>(result: rusqlite::Result<T>) -> tokio_rusqlite::Result<Result<T, &'static str>> {
  match result {
    Ok(value) => Ok(Ok(value)),
    Err(e) => match taken_account_field(&e) {
      Some(field) => Ok(Err(field)),
      None => Err(e.into()),
    },
  }
}

fn duplicate(field: &'static str) -> Error { siren_core::Error::DuplicateAccount(field).into() }

// ─── DispatchStore impl ──────────────────────────────────────────────────────

impl DispatchStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let account = new_account(input);
    let row     = account.clone();

    self
      .conn
      .call(move |conn| claim_account(insert_account(conn, &row)))
      .await?
      .map_err(duplicate)?;

    Ok(account)
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    self.account_where("account_id", encode_uuid(id)).await
  }

  async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
    self.account_where("username", username.to_owned()).await
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    self.account_where("email", email.to_owned()).await
  }

  // ── Emergency types ───────────────────────────────────────────────────────

  async fn add_emergency_type(&self, input: NewEmergencyType) -> Result<EmergencyType> {
    let kind = EmergencyType {
      emergency_type_id: Uuid::new_v4(),
      name:              input.name,
      description:       input.description,
    };

    let id_str      = encode_uuid(kind.emergency_type_id);
    let name        = kind.name.clone();
    let description = kind.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO emergency_types (emergency_type_id, name, description)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, description],
        )?;
        Ok(())
      })
      .await?;

    Ok(kind)
  }

  async fn get_emergency_type(&self, id: Uuid) -> Result<Option<EmergencyType>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmergencyType> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT emergency_type_id, name, description
               FROM emergency_types WHERE emergency_type_id = ?1",
            rusqlite::params![id_str],
            RawEmergencyType::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEmergencyType::into_emergency_type).transpose()
  }

  async fn list_emergency_types(&self) -> Result<Vec<EmergencyType>> {
    let raws: Vec<RawEmergencyType> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT emergency_type_id, name, description
             FROM emergency_types ORDER BY name, emergency_type_id",
        )?;
        let rows = stmt
          .query_map([], RawEmergencyType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmergencyType::into_emergency_type).collect()
  }

  // ── Responders ────────────────────────────────────────────────────────────

  async fn add_responder(&self, input: NewResponder) -> Result<Responder> {
    let responder_id = Uuid::new_v4();
    let id_str       = encode_uuid(responder_id);
    let at_str       = encode_dt(Utc::now());

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        insert_responder(&tx, &id_str, &input, &at_str)?;
        let raw = select_responder(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(Error::ResponderNotFound(responder_id))?
      .into_responder()
  }

  async fn enlist_responder(
    &self,
    account:    NewAccount,
    enlistment: Enlistment,
  ) -> Result<(Account, Responder)> {
    let account      = new_account(account);
    let row          = account.clone();
    let responder_id = Uuid::new_v4();
    let id_str       = encode_uuid(responder_id);
    let at_str       = encode_dt(Utc::now());
    let profile      = NewResponder {
      account_id:      account.account_id,
      organization:    enlistment.organization,
      contact_number:  enlistment.contact_number,
      emergency_types: enlistment.emergency_types,
      available:       true,
      location:        enlistment.location,
    };

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Dropping `tx` on an early return rolls back the account row.
        if let Err(field) = claim_account(insert_account(&tx, &row))? {
          return Ok(Err(field));
        }
        insert_responder(&tx, &id_str, &profile, &at_str)?;
        let raw = select_responder(&tx, &id_str)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?
      .map_err(duplicate)?;

    let responder = raw
      .ok_or(Error::ResponderNotFound(responder_id))?
      .into_responder()?;
    Ok((account, responder))
  }

  async fn get_responder(&self, id: Uuid) -> Result<Option<Responder>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| Ok(select_responder(conn, &id_str)?))
      .await?;

    raw.map(RawResponder::into_responder).transpose()
  }

  async fn responder_for_account(&self, account_id: Uuid) -> Result<Option<Responder>> {
    let account_str = encode_uuid(account_id);

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {RESPONDER_COLUMNS} FROM responders r WHERE r.account_id = ?1"),
            rusqlite::params![account_str],
            RawResponder::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawResponder::into_responder).transpose()
  }

  async fn find_responders(
    &self,
    emergency_type_id: Uuid,
    available:         bool,
  ) -> Result<Vec<Responder>> {
    let type_str = encode_uuid(emergency_type_id);

    let raws: Vec<RawResponder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESPONDER_COLUMNS}
             FROM responders r
             JOIN responder_emergency_types rt ON rt.responder_id = r.responder_id
            WHERE rt.emergency_type_id = ?1
              AND r.available = ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![type_str, available], RawResponder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResponder::into_responder).collect()
  }

  async fn update_responder_location(
    &self,
    responder_id: Uuid,
    location:     Coordinate,
  ) -> Result<Responder> {
    let id_str = encode_uuid(responder_id);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE responders SET latitude = ?2, longitude = ?3, last_updated = ?4
            WHERE responder_id = ?1",
          rusqlite::params![id_str, location.latitude(), location.longitude(), at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_responder(conn, &id_str)?)
      })
      .await?;

    raw
      .ok_or(Error::ResponderNotFound(responder_id))?
      .into_responder()
  }

  async fn set_responder_availability(
    &self,
    responder_id: Uuid,
    available:    bool,
  ) -> Result<Responder> {
    let id_str = encode_uuid(responder_id);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE responders SET available = ?2, last_updated = ?3 WHERE responder_id = ?1",
          rusqlite::params![id_str, available, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_responder(conn, &id_str)?)
      })
      .await?;

    raw
      .ok_or(Error::ResponderNotFound(responder_id))?
      .into_responder()
  }

  async fn update_responder_profile(
    &self,
    responder_id: Uuid,
    update:       ProfileUpdate,
  ) -> Result<Responder> {
    let id_str = encode_uuid(responder_id);
    let at_str = encode_dt(Utc::now());
    let type_strs: Vec<String> = update.emergency_types.iter().copied().map(encode_uuid).collect();

    let raw: Option<RawResponder> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE responders SET organization = ?2, contact_number = ?3, last_updated = ?4
            WHERE responder_id = ?1",
          rusqlite::params![id_str, update.organization, update.contact_number, at_str],
        )?;
        if changed == 0 {
          return Ok(Ok(None));
        }
        let account_write = tx.execute(
          "UPDATE accounts SET first_name = ?2, last_name = ?3, email = ?4
            WHERE account_id = (SELECT account_id FROM responders WHERE responder_id = ?1)",
          rusqlite::params![id_str, update.first_name, update.last_name, update.email],
        );
        if let Err(field) = claim_account(account_write)? {
          return Ok(Err(field));
        }
        tx.execute(
          "DELETE FROM responder_emergency_types WHERE responder_id = ?1",
          rusqlite::params![id_str],
        )?;
        for type_str in &type_strs {
          tx.execute(
            "INSERT OR IGNORE INTO responder_emergency_types (responder_id, emergency_type_id)
             VALUES (?1, ?2)",
            rusqlite::params![id_str, type_str],
          )?;
        }
        let raw = select_responder(&tx, &id_str)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?
      .map_err(duplicate)?;

    raw
      .ok_or(Error::ResponderNotFound(responder_id))?
      .into_responder()
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn create_alert(&self, input: NewAlert) -> Result<Alert> {
    let alert = Alert {
      alert_id:              Uuid::new_v4(),
      requester_id:          input.requester_id,
      emergency_type_id:     Some(input.emergency_type_id),
      location:              input.location,
      created_at:            Utc::now(),
      status:                AlertStatus::Pending,
      description:           input.description,
      assigned_responder_id: None,
    };

    let id_str        = encode_uuid(alert.alert_id);
    let requester_str = encode_uuid(alert.requester_id);
    let type_str      = encode_uuid(input.emergency_type_id);
    let at_str        = encode_dt(alert.created_at);
    let status_str    = encode_status(alert.status);
    let description   = alert.description.clone();
    let location      = alert.location;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alerts (
             alert_id, requester_id, emergency_type_id, latitude, longitude,
             created_at, status, description
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            requester_str,
            type_str,
            location.latitude(),
            location.longitude(),
            at_str,
            status_str,
            description,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(alert)
  }

  async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| Ok(select_alert(conn, &id_str)?))
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
    let requester_str = query.requester_id.map(encode_uuid);
    let responder_str = query.responder_id.map(encode_uuid);
    let statuses: Vec<&'static str> = query.statuses.iter().copied().map(encode_status).collect();
    let limit_val = query.limit.map(|l| l as i64).unwrap_or(-1);

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; parameters are positional.
        let mut conds: Vec<String> = vec![];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];
        if let Some(r) = requester_str {
          params.push(Box::new(r));
          conds.push(format!("requester_id = ?{}", params.len()));
        }
        if let Some(r) = responder_str {
          params.push(Box::new(r));
          conds.push(format!("assigned_responder_id = ?{}", params.len()));
        }
        if !statuses.is_empty() {
          let mut marks = vec![];
          for s in statuses {
            params.push(Box::new(s));
            marks.push(format!("?{}", params.len()));
          }
          conds.push(format!("status IN ({})", marks.join(", ")));
        }
        params.push(Box::new(limit_val));
        let limit_mark = params.len();

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {ALERT_COLUMNS} FROM alerts
           {where_clause}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?{limit_mark}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn commit_assignment(
    &self,
    alert_id:     Uuid,
    responder_id: Uuid,
  ) -> Result<Option<Alert>> {
    let alert_str     = encode_uuid(alert_id);
    let responder_str = encode_uuid(responder_id);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Both columns move together, and only from an unassigned pending
        // alert to a responder that covers its emergency type.
        let changed = tx.execute(
          "UPDATE alerts
              SET assigned_responder_id = ?2, status = 'dispatched'
            WHERE alert_id = ?1
              AND status = 'pending'
              AND assigned_responder_id IS NULL
              AND EXISTS (
                SELECT 1 FROM responder_emergency_types rt
                 WHERE rt.responder_id = ?2
                   AND rt.emergency_type_id = alerts.emergency_type_id
              )",
          rusqlite::params![alert_str, responder_str],
        )?;
        let raw = if changed == 1 { select_alert(&tx, &alert_str)? } else { None };
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    if raw.is_none() {
      tracing::debug!(%alert_id, %responder_id, "assignment guard rejected the write");
    }
    raw.map(RawAlert::into_alert).transpose()
  }

  async fn transition_status(
    &self,
    alert_id: Uuid,
    from:     AlertStatus,
    to:       AlertStatus,
  ) -> Result<Option<Alert>> {
    let alert_str = encode_uuid(alert_id);
    let from_str  = encode_status(from);
    let to_str    = encode_status(to);

    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE alerts SET status = ?3 WHERE alert_id = ?1 AND status = ?2",
          rusqlite::params![alert_str, from_str, to_str],
        )?;
        let raw = if changed == 1 { select_alert(&tx, &alert_str)? } else { None };
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawAlert::into_alert).transpose()
  }

  // ── Messages (append-only) ────────────────────────────────────────────────

  async fn append_message(&self, input: NewMessage) -> Result<Option<Message>> {
    let message = Message {
      message_id:     Uuid::new_v4(),
      alert_id:       input.alert_id,
      sender_id:      input.sender_id,
      body:           input.body,
      sent_at:        Utc::now(),
      from_responder: input.from_responder,
    };

    let id_str     = encode_uuid(message.message_id);
    let alert_str  = encode_uuid(message.alert_id);
    let sender_str = encode_uuid(message.sender_id);
    let at_str     = encode_dt(message.sent_at);
    let body       = message.body.clone();
    let flag       = message.from_responder;

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Resolution and the insert serialise on the write lock, so nothing
        // lands on an alert once it is resolved.
        let changed = tx.execute(
          "INSERT INTO messages (message_id, alert_id, sender_id, body, sent_at, from_responder)
           SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE EXISTS (
              SELECT 1 FROM alerts WHERE alert_id = ?2 AND status <> 'resolved'
            )",
          rusqlite::params![id_str, alert_str, sender_str, body, at_str, flag],
        )?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      tracing::debug!(alert_id = %message.alert_id, "alert closed before the message was written");
      return Ok(None);
    }
    Ok(Some(message))
  }

  async fn list_messages(&self, alert_id: Uuid) -> Result<Vec<Message>> {
    let alert_str = encode_uuid(alert_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT message_id, alert_id, sender_id, body, sent_at, from_responder
             FROM messages
            WHERE alert_id = ?1
            ORDER BY sent_at ASC, rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![alert_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}

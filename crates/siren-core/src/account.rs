//! Accounts, roles, and the acting identity threaded into every operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::DispatchStore};

/// The closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Victim,
  Responder,
}

/// A registered user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub username:      String,
  pub email:         String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub phone_number:  Option<String>,
  pub role:          Role,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  pub fn actor(&self) -> Actor {
    Actor { account_id: self.account_id, role: self.role }
  }

  /// "First Last", falling back to the username.
  pub fn display_name(&self) -> String {
    let full = [self.first_name.as_deref(), self.last_name.as_deref()]
      .into_iter()
      .flatten()
      .collect::<Vec<_>>()
      .join(" ");
    if full.is_empty() { self.username.clone() } else { full }
  }
}

/// Input for [`DispatchStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:      String,
  pub email:         String,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub phone_number:  Option<String>,
  pub role:          Role,
  /// argon2 PHC string.
  pub password_hash: String,
}

/// An authenticated caller. Produced by the auth layer, trusted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub account_id: Uuid,
  pub role:       Role,
}

/// Register a new account, rejecting duplicate usernames and emails.
///
/// Public sign-up always goes through here with `Role::Victim`; responder
/// accounts are provisioned by an operator.
pub async fn register<S: DispatchStore>(
  store: &S,
  input: NewAccount,
) -> Result<Account> {
  ensure_unclaimed(store, &input.username, &input.email).await?;

  // The lookups above are advisory; a concurrent sign-up is caught by the
  // store's unique keys and comes back as `DuplicateAccount`.
  let account = store.create_account(input).await.map_err(Error::store)?;
  tracing::info!(account_id = %account.account_id, role = ?account.role, "account registered");
  Ok(account)
}

/// Fail with [`Error::DuplicateAccount`] if `username` or `email` is taken.
pub(crate) async fn ensure_unclaimed<S: DispatchStore>(
  store: &S,
  username: &str,
  email: &str,
) -> Result<()> {
  if store
    .find_account_by_username(username)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::DuplicateAccount("username"));
  }
  if store
    .find_account_by_email(email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Err(Error::DuplicateAccount("email"));
  }
  Ok(())
}

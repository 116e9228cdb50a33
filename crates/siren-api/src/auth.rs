//! HTTP Basic authentication against stored account credentials.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use siren_core::{
  account::{Account, Actor},
  store::DispatchStore,
};

use crate::{AppState, error::ApiError};

/// The authenticated caller's account. Taking this as an extractor makes a
/// route require credentials.
pub struct CurrentAccount(pub Account);

impl CurrentAccount {
  pub fn actor(&self) -> Actor { self.0.actor() }
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Pull `(username, password)` out of an `Authorization: Basic` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Resolve Basic credentials to an account.
pub async fn authenticate<S: DispatchStore>(
  store: &S,
  headers: &HeaderMap,
) -> Result<Account, ApiError> {
  let (username, password) = basic_credentials(headers)?;

  let account = store
    .find_account_by_username(&username)
    .await
    .map_err(|e| ApiError::Core(siren_core::Error::store(e)))?
    .ok_or(ApiError::Unauthorized)?;

  let phc = account.password_hash.clone();
  let valid = tokio::task::spawn_blocking(move || verify_password(&password, &phc))
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

  if !valid {
    tracing::debug!(%username, "rejected credentials");
    return Err(ApiError::Unauthorized);
  }
  Ok(account)
}

impl<S> FromRequestParts<AppState<S>> for CurrentAccount
where
  S: DispatchStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(state.store.as_ref(), &parts.headers)
      .await
      .map(CurrentAccount)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  #[test]
  fn hash_then_verify() {
    let phc = hash_password("secret").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("secret", &phc));
    assert!(!verify_password("wrong", &phc));
    assert!(!verify_password("secret", "not a phc string"));
  }

  #[test]
  fn parses_basic_header() {
    let value = format!("Basic {}", B64.encode("alice:pa:ss"));
    let (user, pass) = basic_credentials(&headers(&value)).unwrap();
    assert_eq!(user, "alice");
    assert_eq!(pass, "pa:ss");
  }

  #[test]
  fn malformed_headers_are_unauthorized() {
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(ApiError::Unauthorized)));
    assert!(matches!(
      basic_credentials(&headers("Bearer abc")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers("Basic !!!not-base64!!!")),
      Err(ApiError::Unauthorized)
    ));
    let no_colon = format!("Basic {}", B64.encode("alice"));
    assert!(matches!(basic_credentials(&headers(&no_colon)), Err(ApiError::Unauthorized)));
  }
}

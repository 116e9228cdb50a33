//! Responder lookup by capability and availability.

use uuid::Uuid;

use crate::{Error, Result, responder::Responder, store::DispatchStore};

/// Every responder that supports `emergency_type_id` and whose availability
/// flag equals `only_available`. Ordering is left to the caller.
pub async fn find_eligible<S: DispatchStore>(
  store: &S,
  emergency_type_id: Uuid,
  only_available: bool,
) -> Result<Vec<Responder>> {
  store
    .find_responders(emergency_type_id, only_available)
    .await
    .map_err(Error::store)
}

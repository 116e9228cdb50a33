//! Emergency types: immutable reference data that alerts and responder
//! capabilities point at.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyType {
  pub emergency_type_id: Uuid,
  pub name:              String,
  pub description:       String,
}

#[derive(Debug, Clone)]
pub struct NewEmergencyType {
  pub name:        String,
  pub description: String,
}

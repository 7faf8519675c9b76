//! API client credential records.
//!
//! The `client_id` is the public lookup handle used during request
//! authentication; `secret_key` is stored as an opaque blob the auth layer
//! owns the meaning of.

use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Canonical stored record for an API client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClient {
    pub id: EntityId,
    pub external_id: String,
    pub name: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub secret_key: Vec<u8>,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
    pub belongs_to_user: EntityId,
}

impl ApiClient {
    pub fn is_active(&self) -> bool {
        self.archived_on.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("client_id", &self.client_id)?;
        require_non_empty("belongs_to_user", &self.belongs_to_user)
    }
}

/// Input for provisioning an API client.
///
/// Both credentials arrive from the auth layer; this crate only persists
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientCreationInput {
    pub name: String,
    pub client_id: String,
    pub secret_key: Vec<u8>,
    pub belongs_to_user: EntityId,
}

impl ApiClientCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("client_id", &self.client_id)?;
        if self.secret_key.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "secret_key",
            });
        }
        require_non_empty("belongs_to_user", &self.belongs_to_user)
    }
}

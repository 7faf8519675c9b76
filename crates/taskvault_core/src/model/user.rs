//! User domain model.
//!
//! # Invariants
//! - `username` is unique among non-archived users (enforced by schema).
//! - Reputation values come from the closed set in [`UserReputation`].

use crate::model::permissions::ServiceAdminPermissions;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Standing of a user with the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserReputation {
    /// Freshly created, two-factor secret not yet verified.
    #[default]
    Unverified,
    GoodStanding,
    Banned,
}

impl UserReputation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::GoodStanding => "good",
            Self::Banned => "banned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unverified" => Some(Self::Unverified),
            "good" => Some(Self::GoodStanding),
            "banned" => Some(Self::Banned),
            _ => None,
        }
    }
}

/// Canonical stored record for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub external_id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub requires_password_change: bool,
    #[serde(skip_serializing)]
    pub two_factor_secret: String,
    pub two_factor_secret_verified_on: Option<u64>,
    pub service_admin_permissions: i64,
    pub reputation: UserReputation,
    pub reputation_explanation: String,
    pub avatar_src: Option<String>,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
}

impl User {
    /// Returns the typed view of the stored admin permission mask.
    pub fn admin_permissions(&self) -> ServiceAdminPermissions {
        ServiceAdminPermissions::from_stored(self.service_admin_permissions)
    }

    /// Returns whether this user holds any service-admin capability.
    pub fn is_service_admin(&self) -> bool {
        !self.admin_permissions().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("username", &self.username)?;
        require_non_empty("hashed_password", &self.hashed_password)
    }
}

/// Input for registering a user.
///
/// The password arrives already hashed; this crate never sees cleartext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreationInput {
    pub username: String,
    pub hashed_password: String,
    pub two_factor_secret: String,
}

impl UserCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("hashed_password", &self.hashed_password)?;
        require_non_empty("two_factor_secret", &self.two_factor_secret)
    }
}

/// Input for changing a user's reputation, with an operator-supplied reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReputationUpdateInput {
    pub target_user_id: EntityId,
    pub new_reputation: UserReputation,
    pub reason: String,
}

impl UserReputationUpdateInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("target_user_id", &self.target_user_id)?;
        require_non_empty("reason", &self.reason)
    }
}

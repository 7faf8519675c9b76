//! Account/user membership link records.
//!
//! # Invariants
//! - One non-archived row per (user, account) pair (enforced by schema).
//! - Exactly one non-archived membership per user carries `default_account`.

use crate::model::permissions::AccountPermissions;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Canonical stored record linking a user to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUserMembership {
    pub id: EntityId,
    pub external_id: String,
    pub belongs_to_user: EntityId,
    pub belongs_to_account: EntityId,
    pub user_account_permissions: i64,
    pub default_account: bool,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
}

impl AccountUserMembership {
    /// Returns the typed view of the stored permission mask.
    pub fn permissions(&self) -> AccountPermissions {
        AccountPermissions::from_stored(self.user_account_permissions)
    }
}

/// Input for granting a user membership in an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUserToAccountInput {
    pub user_id: EntityId,
    pub account_id: EntityId,
    pub user_account_permissions: i64,
    pub default_account: bool,
    /// Free-form operator note carried into the audit entry.
    pub reason: String,
}

impl AddUserToAccountInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("account_id", &self.account_id)
    }
}

//! Account (tenant) domain model.
//!
//! # Invariants
//! - Every user owns exactly one personal account, created alongside them.
//! - `belongs_to_user` names the account owner; membership rows grant
//!   everyone else access.

use crate::model::audit::FieldChangeSummary;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Canonical stored record for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: EntityId,
    pub external_id: String,
    pub name: String,
    /// Subscription plan reference; personal accounts may have none.
    pub plan_id: Option<EntityId>,
    pub is_personal_account: bool,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
    pub belongs_to_user: EntityId,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.archived_on.is_none()
    }

    /// Applies an update input and reports which fields changed.
    pub fn apply_update(&mut self, input: &AccountUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if input.name != self.name {
            changes.push(FieldChangeSummary::new("name", &self.name, &input.name));
            self.name = input.name.clone();
        }

        changes
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("belongs_to_user", &self.belongs_to_user)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreationInput {
    pub name: String,
    pub plan_id: Option<EntityId>,
    pub is_personal_account: bool,
    pub belongs_to_user: EntityId,
}

impl AccountCreationInput {
    /// Returns the input for the personal account provisioned with a new user.
    pub fn personal_for(username: &str, user_id: &str) -> Self {
        Self {
            name: username.to_string(),
            plan_id: None,
            is_personal_account: true,
            belongs_to_user: user_id.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("belongs_to_user", &self.belongs_to_user)
    }
}

/// Input for updating an account's mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateInput {
    pub name: String,
}

//! Account subscription plan catalog records.
//!
//! Plans are a global catalog: no ownership column, visible to every
//! tenant, mutated only through admin surfaces.

use crate::model::audit::FieldChangeSummary;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Canonical stored record for a subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSubscriptionPlan {
    pub id: EntityId,
    pub external_id: String,
    pub name: String,
    pub description: String,
    /// Price in the smallest currency unit.
    pub price: u32,
    /// Billing period, e.g. `"720h0m0s"`.
    pub period: String,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
}

impl AccountSubscriptionPlan {
    pub fn is_active(&self) -> bool {
        self.archived_on.is_none()
    }

    /// Applies an update input and reports which fields changed.
    pub fn apply_update(&mut self, input: &PlanUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if input.name != self.name {
            changes.push(FieldChangeSummary::new("name", &self.name, &input.name));
            self.name = input.name.clone();
        }

        if input.price != self.price {
            changes.push(FieldChangeSummary::new(
                "price",
                &self.price.to_string(),
                &input.price.to_string(),
            ));
            self.price = input.price;
        }

        changes
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)
    }
}

/// Input for creating a subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCreationInput {
    pub name: String,
    pub description: String,
    pub price: u32,
    pub period: String,
}

impl PlanCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("period", &self.period)
    }
}

/// Input for updating a plan's mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanUpdateInput {
    pub name: String,
    pub description: String,
    pub price: u32,
    pub period: String,
}

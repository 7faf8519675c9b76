//! Item domain model.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `belongs_to_account` scopes every non-admin read and write.

use crate::model::audit::FieldChangeSummary;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Canonical stored record for a todo item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub external_id: String,
    pub name: String,
    pub details: String,
    /// Unix seconds, set by the database on insert.
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    /// Non-null means soft-deleted.
    pub archived_on: Option<u64>,
    pub belongs_to_account: EntityId,
}

impl Item {
    /// Returns whether this item is visible to default (non-admin) reads.
    pub fn is_active(&self) -> bool {
        self.archived_on.is_none()
    }

    /// Applies an update input and reports which fields changed.
    ///
    /// The change summaries feed the update audit entry; unchanged fields
    /// produce no summary.
    pub fn apply_update(&mut self, input: &ItemUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if input.name != self.name {
            changes.push(FieldChangeSummary::new("name", &self.name, &input.name));
            self.name = input.name.clone();
        }

        if input.details != self.details {
            changes.push(FieldChangeSummary::new(
                "details",
                &self.details,
                &input.details,
            ));
            self.details = input.details.clone();
        }

        changes
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("belongs_to_account", &self.belongs_to_account)
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCreationInput {
    pub name: String,
    pub details: String,
    pub belongs_to_account: EntityId,
}

impl ItemCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("belongs_to_account", &self.belongs_to_account)
    }
}

/// Input for updating an item's mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdateInput {
    pub name: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemUpdateInput};

    #[test]
    fn apply_update_reports_only_changed_fields() {
        let mut item = Item {
            id: "i1".into(),
            name: "old name".into(),
            details: "same details".into(),
            belongs_to_account: "a1".into(),
            ..Item::default()
        };

        let changes = item.apply_update(&ItemUpdateInput {
            name: "new name".into(),
            details: "same details".into(),
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "name");
        assert_eq!(item.name, "new name");
    }
}

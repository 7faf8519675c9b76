//! Webhook domain model.
//!
//! Event, data-type and topic subscriptions are stored comma-joined in
//! single TEXT columns; the record type exposes them as vectors and the
//! repository joins/splits at the SQL boundary.

use crate::model::audit::FieldChangeSummary;
use crate::model::{require_non_empty, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

/// Separator used for the stored list columns.
pub const LIST_SEPARATOR: &str = ",";

/// Canonical stored record for a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: EntityId,
    pub external_id: String,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
    pub belongs_to_account: EntityId,
}

impl Webhook {
    pub fn is_active(&self) -> bool {
        self.archived_on.is_none()
    }

    /// Applies an update input and reports which fields changed.
    pub fn apply_update(&mut self, input: &WebhookUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        if input.name != self.name {
            changes.push(FieldChangeSummary::new("name", &self.name, &input.name));
            self.name = input.name.clone();
        }

        if input.url != self.url {
            changes.push(FieldChangeSummary::new("url", &self.url, &input.url));
            self.url = input.url.clone();
        }

        if input.method != self.method {
            changes.push(FieldChangeSummary::new("method", &self.method, &input.method));
            self.method = input.method.clone();
        }

        if input.events != self.events {
            changes.push(FieldChangeSummary::new(
                "events",
                &self.events.join(LIST_SEPARATOR),
                &input.events.join(LIST_SEPARATOR),
            ));
            self.events = input.events.clone();
        }

        changes
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("id", &self.id)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("url", &self.url)?;
        require_non_empty("belongs_to_account", &self.belongs_to_account)
    }
}

/// Input for creating a webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookCreationInput {
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    pub belongs_to_account: EntityId,
}

impl WebhookCreationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("url", &self.url)?;
        require_non_empty("method", &self.method)?;
        require_non_empty("belongs_to_account", &self.belongs_to_account)
    }
}

/// Input for updating a webhook's mutable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookUpdateInput {
    pub name: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
}

/// Joins a list column for storage.
pub(crate) fn join_list(values: &[String]) -> String {
    values.join(LIST_SEPARATOR)
}

/// Splits a stored list column, dropping empty segments.
pub(crate) fn split_list(stored: &str) -> Vec<String> {
    stored
        .split(LIST_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{join_list, split_list};

    #[test]
    fn list_columns_roundtrip() {
        let events = vec!["create".to_string(), "update".to_string()];
        assert_eq!(split_list(&join_list(&events)), events);
    }

    #[test]
    fn empty_list_roundtrips_to_empty() {
        assert_eq!(split_list(&join_list(&[])), Vec::<String>::new());
    }
}

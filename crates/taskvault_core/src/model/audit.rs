//! Audit log records and the typed events that produce them.
//!
//! # Responsibility
//! - Define the immutable audit row and its creation input.
//! - Build every audit context through the closed [`AuditEvent`] set so the
//!   reserved keys stay consistent across call sites.
//!
//! # Invariants
//! - Audit rows are append-only: never updated, never deleted.
//! - The stored context is a flat JSON object keyed by the constants in
//!   [`keys`]; correlation queries depend on those exact names.

use crate::model::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Reserved context keys. Correlation queries pluck these by name, so they
/// are part of the storage contract.
pub mod keys {
    /// The user who performed the recorded action.
    pub const ACTOR_ID: &str = "actor_id";
    pub const ITEM_ID: &str = "item_id";
    pub const USER_ID: &str = "user_id";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const WEBHOOK_ID: &str = "webhook_id";
    pub const API_CLIENT_ID: &str = "api_client_id";
    pub const ACCOUNT_SUBSCRIPTION_PLAN_ID: &str = "account_subscription_plan_id";
    /// Field-level change summaries attached to update events.
    pub const CHANGES: &str = "changes";
    /// Operator-supplied justification attached to sensitive events.
    pub const REASON: &str = "reason";
}

/// One audit log row.
///
/// `id` is the table's own monotone integer key, not a generator-supplied
/// entity ID: the log is append-only and exported in bucketed `id` ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub event_type: String,
    pub context: Map<String, Value>,
    pub created_on: u64,
}

/// Input for persisting one audit log row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntryCreationInput {
    pub event_type: String,
    pub context: Map<String, Value>,
}

/// A single field-level change recorded on update events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChangeSummary {
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
}

impl FieldChangeSummary {
    pub fn new(field_name: &str, old_value: &str, new_value: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            old_value: old_value.to_string(),
            new_value: new_value.to_string(),
        }
    }
}

/// The closed set of recordable events.
///
/// Each variant carries strongly-typed fields and serializes to the flat
/// JSON context bag at the storage boundary, one variant per
/// `<entity>_<verb>` event type.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    ItemCreated {
        actor_id: EntityId,
        item_id: EntityId,
        account_id: EntityId,
    },
    ItemUpdated {
        actor_id: EntityId,
        item_id: EntityId,
        account_id: EntityId,
        changes: Vec<FieldChangeSummary>,
    },
    ItemArchived {
        actor_id: EntityId,
        item_id: EntityId,
        account_id: EntityId,
    },
    UserCreated {
        user_id: EntityId,
    },
    UserReputationUpdated {
        actor_id: EntityId,
        user_id: EntityId,
        reputation: String,
        reason: String,
    },
    UserArchived {
        actor_id: EntityId,
        user_id: EntityId,
    },
    AccountCreated {
        actor_id: EntityId,
        account_id: EntityId,
    },
    AccountUpdated {
        actor_id: EntityId,
        account_id: EntityId,
        changes: Vec<FieldChangeSummary>,
    },
    AccountArchived {
        actor_id: EntityId,
        account_id: EntityId,
    },
    UserAddedToAccount {
        actor_id: EntityId,
        user_id: EntityId,
        account_id: EntityId,
        reason: String,
    },
    UserRemovedFromAccount {
        actor_id: EntityId,
        user_id: EntityId,
        account_id: EntityId,
        reason: String,
    },
    AccountMarkedAsDefault {
        actor_id: EntityId,
        user_id: EntityId,
        account_id: EntityId,
    },
    WebhookCreated {
        actor_id: EntityId,
        webhook_id: EntityId,
        account_id: EntityId,
    },
    WebhookUpdated {
        actor_id: EntityId,
        webhook_id: EntityId,
        account_id: EntityId,
        changes: Vec<FieldChangeSummary>,
    },
    WebhookArchived {
        actor_id: EntityId,
        webhook_id: EntityId,
        account_id: EntityId,
    },
    ApiClientCreated {
        actor_id: EntityId,
        api_client_id: EntityId,
    },
    ApiClientArchived {
        actor_id: EntityId,
        api_client_id: EntityId,
    },
    PlanCreated {
        actor_id: EntityId,
        plan_id: EntityId,
    },
    PlanUpdated {
        actor_id: EntityId,
        plan_id: EntityId,
        changes: Vec<FieldChangeSummary>,
    },
    PlanArchived {
        actor_id: EntityId,
        plan_id: EntityId,
    },
}

impl AuditEvent {
    /// Returns the stored event-type string for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "item_created",
            Self::ItemUpdated { .. } => "item_updated",
            Self::ItemArchived { .. } => "item_archived",
            Self::UserCreated { .. } => "user_created",
            Self::UserReputationUpdated { .. } => "user_reputation_updated",
            Self::UserArchived { .. } => "user_archived",
            Self::AccountCreated { .. } => "account_created",
            Self::AccountUpdated { .. } => "account_updated",
            Self::AccountArchived { .. } => "account_archived",
            Self::UserAddedToAccount { .. } => "user_added_to_account",
            Self::UserRemovedFromAccount { .. } => "user_removed_from_account",
            Self::AccountMarkedAsDefault { .. } => "account_marked_as_default",
            Self::WebhookCreated { .. } => "webhook_created",
            Self::WebhookUpdated { .. } => "webhook_updated",
            Self::WebhookArchived { .. } => "webhook_archived",
            Self::ApiClientCreated { .. } => "api_client_created",
            Self::ApiClientArchived { .. } => "api_client_archived",
            Self::PlanCreated { .. } => "account_subscription_plan_created",
            Self::PlanUpdated { .. } => "account_subscription_plan_updated",
            Self::PlanArchived { .. } => "account_subscription_plan_archived",
        }
    }

    /// Serializes this event into the flat context bag.
    pub fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();

        match self {
            Self::ItemCreated {
                actor_id,
                item_id,
                account_id,
            }
            | Self::ItemArchived {
                actor_id,
                item_id,
                account_id,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::ITEM_ID.into(), json!(item_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
            }
            Self::ItemUpdated {
                actor_id,
                item_id,
                account_id,
                changes,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::ITEM_ID.into(), json!(item_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
                context.insert(keys::CHANGES.into(), json!(changes));
            }
            Self::UserCreated { user_id } => {
                context.insert(keys::ACTOR_ID.into(), json!(user_id));
                context.insert(keys::USER_ID.into(), json!(user_id));
            }
            Self::UserReputationUpdated {
                actor_id,
                user_id,
                reputation,
                reason,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::USER_ID.into(), json!(user_id));
                context.insert("reputation".into(), json!(reputation));
                context.insert(keys::REASON.into(), json!(reason));
            }
            Self::UserArchived { actor_id, user_id } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::USER_ID.into(), json!(user_id));
            }
            Self::AccountCreated {
                actor_id,
                account_id,
            }
            | Self::AccountArchived {
                actor_id,
                account_id,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
            }
            Self::AccountUpdated {
                actor_id,
                account_id,
                changes,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
                context.insert(keys::CHANGES.into(), json!(changes));
            }
            Self::UserAddedToAccount {
                actor_id,
                user_id,
                account_id,
                reason,
            }
            | Self::UserRemovedFromAccount {
                actor_id,
                user_id,
                account_id,
                reason,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::USER_ID.into(), json!(user_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
                if !reason.is_empty() {
                    context.insert(keys::REASON.into(), json!(reason));
                }
            }
            Self::AccountMarkedAsDefault {
                actor_id,
                user_id,
                account_id,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::USER_ID.into(), json!(user_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
            }
            Self::WebhookCreated {
                actor_id,
                webhook_id,
                account_id,
            }
            | Self::WebhookArchived {
                actor_id,
                webhook_id,
                account_id,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::WEBHOOK_ID.into(), json!(webhook_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
            }
            Self::WebhookUpdated {
                actor_id,
                webhook_id,
                account_id,
                changes,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::WEBHOOK_ID.into(), json!(webhook_id));
                context.insert(keys::ACCOUNT_ID.into(), json!(account_id));
                context.insert(keys::CHANGES.into(), json!(changes));
            }
            Self::ApiClientCreated {
                actor_id,
                api_client_id,
            }
            | Self::ApiClientArchived {
                actor_id,
                api_client_id,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(keys::API_CLIENT_ID.into(), json!(api_client_id));
            }
            Self::PlanCreated { actor_id, plan_id } | Self::PlanArchived { actor_id, plan_id } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(
                    keys::ACCOUNT_SUBSCRIPTION_PLAN_ID.into(),
                    json!(plan_id),
                );
            }
            Self::PlanUpdated {
                actor_id,
                plan_id,
                changes,
            } => {
                context.insert(keys::ACTOR_ID.into(), json!(actor_id));
                context.insert(
                    keys::ACCOUNT_SUBSCRIPTION_PLAN_ID.into(),
                    json!(plan_id),
                );
                context.insert(keys::CHANGES.into(), json!(changes));
            }
        }

        context
    }

    /// Converts this event into a persistable creation input.
    pub fn into_creation_input(self) -> AuditLogEntryCreationInput {
        AuditLogEntryCreationInput {
            event_type: self.event_type().to_string(),
            context: self.context(),
        }
    }
}

//! Webhook query builders.

use crate::model::filter::QueryFilter;
use crate::model::webhook::{join_list, Webhook, WebhookCreationInput};
use crate::query::registry::{self, WEBHOOKS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};
use rusqlite::types::Value;

pub fn build_webhook_exists_query(webhook_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(WEBHOOKS.name)
            .column(WEBHOOKS.id_column())
            .exists()
            .where_eq(WEBHOOKS.id_column(), text(webhook_id))
            .where_eq(
                WEBHOOKS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN),
                text(account_id),
            )
            .where_null(WEBHOOKS.archived_on_column())
            .build(),
    )
}

pub fn build_get_webhook_query(webhook_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(WEBHOOKS.name)
            .columns(WEBHOOKS.columns.iter().copied())
            .where_eq(WEBHOOKS.id_column(), text(webhook_id))
            .where_eq(
                WEBHOOKS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN),
                text(account_id),
            )
            .where_null(WEBHOOKS.archived_on_column())
            .build(),
    )
}

pub fn build_get_all_webhooks_count_query() -> QueryPlan {
    generic::build_all_count_query(&WEBHOOKS)
}

pub fn build_get_batch_of_webhooks_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&WEBHOOKS, begin_id, end_id)
}

pub fn build_get_webhooks_query(
    account_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> QueryPlan {
    generic::build_list_query(&WEBHOOKS, account_id, for_admin, filter)
}

/// Builds the webhook creation statement; subscription lists are stored
/// comma-joined.
pub fn build_create_webhook_query(
    id: &str,
    external_id: &str,
    input: &WebhookCreationInput,
) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(WEBHOOKS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("name", text(&input.name))
            .value("content_type", text(&input.content_type))
            .value("url", text(&input.url))
            .value("method", text(&input.method))
            .value("events", Value::Text(join_list(&input.events)))
            .value("data_types", Value::Text(join_list(&input.data_types)))
            .value("topics", Value::Text(join_list(&input.topics)))
            .value(
                registry::ACCOUNT_OWNERSHIP_COLUMN,
                text(&input.belongs_to_account),
            )
            .build(),
    )
}

pub fn build_update_webhook_query(webhook: &Webhook) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(WEBHOOKS.name)
            .set("name", text(&webhook.name))
            .set("content_type", text(&webhook.content_type))
            .set("url", text(&webhook.url))
            .set("method", text(&webhook.method))
            .set("events", Value::Text(join_list(&webhook.events)))
            .set("data_types", Value::Text(join_list(&webhook.data_types)))
            .set("topics", Value::Text(join_list(&webhook.topics)))
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(&webhook.id))
            .where_eq(
                registry::ACCOUNT_OWNERSHIP_COLUMN,
                text(&webhook.belongs_to_account),
            )
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

pub fn build_archive_webhook_query(webhook_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(WEBHOOKS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(webhook_id))
            .where_eq(registry::ACCOUNT_OWNERSHIP_COLUMN, text(account_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_joins_subscription_lists() {
        let input = WebhookCreationInput {
            name: "hook".into(),
            content_type: "application/json".into(),
            url: "https://example.com/hook".into(),
            method: "POST".into(),
            events: vec!["create".into(), "update".into()],
            data_types: vec!["item".into()],
            topics: vec![],
            belongs_to_account: "a1".into(),
        };
        let plan = build_create_webhook_query("w1", "x1", &input);

        assert_eq!(plan.args[6], Value::Text("create,update".into()));
        assert_eq!(plan.args[8], Value::Text(String::new()));
        assert_eq!(plan.placeholder_count(), plan.args.len());
    }
}

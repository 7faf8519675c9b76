//! API client query builders.

use crate::model::api_client::ApiClientCreationInput;
use crate::model::filter::QueryFilter;
use crate::query::registry::{self, API_CLIENTS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};
use rusqlite::types::Value;

pub fn build_get_api_client_query(client_db_id: &str, user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(API_CLIENTS.name)
            .columns(API_CLIENTS.columns.iter().copied())
            .where_eq(API_CLIENTS.id_column(), text(client_db_id))
            .where_eq(
                API_CLIENTS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_null(API_CLIENTS.archived_on_column())
            .build(),
    )
}

/// Builds the authentication-path lookup by public client identifier.
/// Unscoped by owner: the caller is being identified, not authorized.
pub fn build_get_api_client_by_client_id_query(client_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(API_CLIENTS.name)
            .columns(API_CLIENTS.columns.iter().copied())
            .where_eq(API_CLIENTS.qualified("client_id"), text(client_id))
            .where_null(API_CLIENTS.archived_on_column())
            .build(),
    )
}

pub fn build_get_all_api_clients_count_query() -> QueryPlan {
    generic::build_all_count_query(&API_CLIENTS)
}

pub fn build_get_batch_of_api_clients_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&API_CLIENTS, begin_id, end_id)
}

pub fn build_get_api_clients_query(
    user_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> QueryPlan {
    generic::build_list_query(&API_CLIENTS, user_id, for_admin, filter)
}

pub fn build_create_api_client_query(
    id: &str,
    external_id: &str,
    input: &ApiClientCreationInput,
) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(API_CLIENTS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("name", text(&input.name))
            .value("client_id", text(&input.client_id))
            .value("secret_key", Value::Blob(input.secret_key.clone()))
            .value(
                registry::USER_OWNERSHIP_COLUMN,
                text(&input.belongs_to_user),
            )
            .build(),
    )
}

pub fn build_archive_api_client_query(client_db_id: &str, user_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(API_CLIENTS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(client_db_id))
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_lookup_is_not_tenant_scoped() {
        let plan = build_get_api_client_by_client_id_query("cid-123");
        assert!(plan.query.contains("api_clients.client_id = ?"));
        assert!(!plan.query.contains("belongs_to_user"));
    }

    #[test]
    fn secret_key_binds_as_a_blob() {
        let input = ApiClientCreationInput {
            name: "cli".into(),
            client_id: "cid".into(),
            secret_key: vec![1, 2, 3],
            belongs_to_user: "u1".into(),
        };
        let plan = build_create_api_client_query("c1", "x1", &input);
        assert_eq!(plan.args[4], Value::Blob(vec![1, 2, 3]));
    }
}

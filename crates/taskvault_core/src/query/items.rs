//! Item query builders.
//!
//! # Responsibility
//! - Produce every query shape the item repository executes.
//!
//! # Invariants
//! - Non-admin reads and writes are scoped by `belongs_to_account` and
//!   exclude archived rows.

use crate::model::filter::QueryFilter;
use crate::model::item::{Item, ItemCreationInput};
use crate::query::registry::{self, ITEMS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};

/// Builds an existence check for an item owned by an account.
pub fn build_item_exists_query(item_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(ITEMS.name)
            .column(ITEMS.id_column())
            .exists()
            .where_eq(ITEMS.id_column(), text(item_id))
            .where_eq(
                ITEMS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN),
                text(account_id),
            )
            .where_null(ITEMS.archived_on_column())
            .build(),
    )
}

/// Builds the point read for an item owned by an account.
pub fn build_get_item_query(item_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(ITEMS.name)
            .columns(ITEMS.columns.iter().copied())
            .where_eq(ITEMS.id_column(), text(item_id))
            .where_eq(
                ITEMS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN),
                text(account_id),
            )
            .where_null(ITEMS.archived_on_column())
            .build(),
    )
}

/// Builds the service-wide non-archived item count.
pub fn build_get_all_items_count_query() -> QueryPlan {
    generic::build_all_count_query(&ITEMS)
}

/// Builds a bucketed scan for streaming every item.
pub fn build_get_batch_of_items_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&ITEMS, begin_id, end_id)
}

/// Builds the paginated item list with embedded counts.
pub fn build_get_items_query(
    account_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> QueryPlan {
    generic::build_list_query(&ITEMS, account_id, for_admin, filter)
}

/// Builds the item creation statement.
///
/// Both identifiers are generator-supplied; `created_on` comes from the
/// schema default.
pub fn build_create_item_query(
    id: &str,
    external_id: &str,
    input: &ItemCreationInput,
) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(ITEMS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("name", text(&input.name))
            .value("details", text(&input.details))
            .value(
                registry::ACCOUNT_OWNERSHIP_COLUMN,
                text(&input.belongs_to_account),
            )
            .build(),
    )
}

/// Builds the item update statement; the item must carry a valid ID.
pub fn build_update_item_query(item: &Item) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(ITEMS.name)
            .set("name", text(&item.name))
            .set("details", text(&item.details))
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(&item.id))
            .where_eq(
                registry::ACCOUNT_OWNERSHIP_COLUMN,
                text(&item.belongs_to_account),
            )
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

/// Builds the soft-delete statement for an item.
pub fn build_archive_item_query(item_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(ITEMS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(item_id))
            .where_eq(registry::ACCOUNT_OWNERSHIP_COLUMN, text(account_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    #[test]
    fn get_item_query_scopes_by_owner_and_liveness() {
        let plan = build_get_item_query("abc", "u1");

        assert!(plan.query.contains(
            "items.id = ? AND items.belongs_to_account = ? AND items.archived_on IS NULL"
        ));
        assert_eq!(
            plan.args,
            vec![Value::Text("abc".into()), Value::Text("u1".into())]
        );
    }

    #[test]
    fn exists_query_wraps_a_scoped_select() {
        let plan = build_item_exists_query("abc", "u1");

        assert_eq!(
            plan.query,
            "SELECT EXISTS ( SELECT items.id FROM items WHERE items.id = ? \
             AND items.belongs_to_account = ? AND items.archived_on IS NULL )"
        );
        assert_eq!(plan.args.len(), 2);
    }

    #[test]
    fn archive_stamps_both_timestamps_from_the_database_clock() {
        let plan = build_archive_item_query("abc", "u1");

        assert_eq!(
            plan.query,
            "UPDATE items SET last_updated_on = (strftime('%s', 'now')), \
             archived_on = (strftime('%s', 'now')) \
             WHERE id = ? AND belongs_to_account = ? AND archived_on IS NULL"
        );
        assert_eq!(plan.placeholder_count(), plan.args.len());
    }

    #[test]
    fn create_consumes_caller_supplied_identifiers() {
        let input = ItemCreationInput {
            name: "greens".into(),
            details: "".into(),
            belongs_to_account: "a1".into(),
        };
        let plan = build_create_item_query("i1", "x1", &input);

        assert_eq!(
            plan.query,
            "INSERT INTO items (id,external_id,name,details,belongs_to_account) \
             VALUES (?,?,?,?,?)"
        );
        assert_eq!(plan.args[0], Value::Text("i1".into()));
        assert_eq!(plan.args[1], Value::Text("x1".into()));
    }
}

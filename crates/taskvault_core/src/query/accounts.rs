//! Account query builders.

use crate::model::account::{Account, AccountCreationInput};
use crate::model::filter::QueryFilter;
use crate::query::registry::{self, ACCOUNTS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};
use rusqlite::types::Value;

pub fn build_account_exists_query(account_id: &str, user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(ACCOUNTS.name)
            .column(ACCOUNTS.id_column())
            .exists()
            .where_eq(ACCOUNTS.id_column(), text(account_id))
            .where_eq(
                ACCOUNTS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_null(ACCOUNTS.archived_on_column())
            .build(),
    )
}

pub fn build_get_account_query(account_id: &str, user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(ACCOUNTS.name)
            .columns(ACCOUNTS.columns.iter().copied())
            .where_eq(ACCOUNTS.id_column(), text(account_id))
            .where_eq(
                ACCOUNTS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_null(ACCOUNTS.archived_on_column())
            .build(),
    )
}

pub fn build_get_all_accounts_count_query() -> QueryPlan {
    generic::build_all_count_query(&ACCOUNTS)
}

pub fn build_get_batch_of_accounts_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&ACCOUNTS, begin_id, end_id)
}

pub fn build_get_accounts_query(
    user_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> QueryPlan {
    generic::build_list_query(&ACCOUNTS, user_id, for_admin, filter)
}

pub fn build_create_account_query(
    id: &str,
    external_id: &str,
    input: &AccountCreationInput,
) -> QueryPlan {
    let plan_id = input
        .plan_id
        .as_ref()
        .map_or(Value::Null, |plan| text(plan));

    log_build_result(
        InsertBuilder::new(ACCOUNTS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("name", text(&input.name))
            .value("plan_id", plan_id)
            .value("is_personal_account", input.is_personal_account)
            .value(
                registry::USER_OWNERSHIP_COLUMN,
                text(&input.belongs_to_user),
            )
            .build(),
    )
}

pub fn build_update_account_query(account: &Account) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(ACCOUNTS.name)
            .set("name", text(&account.name))
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(&account.id))
            .where_eq(
                registry::USER_OWNERSHIP_COLUMN,
                text(&account.belongs_to_user),
            )
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

pub fn build_archive_account_query(account_id: &str, user_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(ACCOUNTS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(account_id))
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_accounts_may_carry_no_plan() {
        let input = AccountCreationInput::personal_for("alice", "u1");
        let plan = build_create_account_query("a1", "x1", &input);
        assert_eq!(plan.placeholder_count(), 6);
        assert_eq!(plan.args[3], Value::Null);
    }
}

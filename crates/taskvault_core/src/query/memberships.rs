//! Account/user membership query builders.
//!
//! # Invariants
//! - Default-account changes are a clear-then-set pair executed inside one
//!   transaction by the repository.

use crate::model::membership::AddUserToAccountInput;
use crate::query::registry::{self, ACCOUNT_USER_MEMBERSHIPS as MEMBERSHIPS};
use crate::query::{
    log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};

pub fn build_user_is_member_of_account_query(user_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(MEMBERSHIPS.name)
            .column(MEMBERSHIPS.id_column())
            .exists()
            .where_eq(
                MEMBERSHIPS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_eq(
                MEMBERSHIPS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN),
                text(account_id),
            )
            .where_null(MEMBERSHIPS.archived_on_column())
            .build(),
    )
}

/// Builds the lookup for the account a user's session lands in.
pub fn build_get_default_account_id_for_user_query(user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(MEMBERSHIPS.name)
            .column(MEMBERSHIPS.qualified(registry::ACCOUNT_OWNERSHIP_COLUMN))
            .where_eq(
                MEMBERSHIPS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_eq(MEMBERSHIPS.qualified("default_account"), true)
            .where_null(MEMBERSHIPS.archived_on_column())
            .build(),
    )
}

pub fn build_get_memberships_for_user_query(user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(MEMBERSHIPS.name)
            .columns(MEMBERSHIPS.columns.iter().copied())
            .where_eq(
                MEMBERSHIPS.qualified(registry::USER_OWNERSHIP_COLUMN),
                text(user_id),
            )
            .where_null(MEMBERSHIPS.archived_on_column())
            .build(),
    )
}

pub fn build_create_membership_query(
    id: &str,
    external_id: &str,
    input: &AddUserToAccountInput,
) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(MEMBERSHIPS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value(registry::USER_OWNERSHIP_COLUMN, text(&input.user_id))
            .value(registry::ACCOUNT_OWNERSHIP_COLUMN, text(&input.account_id))
            .value(
                "user_account_permissions",
                input.user_account_permissions,
            )
            .value("default_account", input.default_account)
            .build(),
    )
}

/// Clears the default-account flag on every live membership of a user.
/// Paired with [`build_set_default_account_query`] in one transaction.
pub fn build_clear_default_account_query(user_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(MEMBERSHIPS.name)
            .set("default_account", false)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

/// Marks one membership as the user's default.
pub fn build_set_default_account_query(user_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(MEMBERSHIPS.name)
            .set("default_account", true)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_eq(registry::ACCOUNT_OWNERSHIP_COLUMN, text(account_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

/// Archives one user/account membership link.
pub fn build_remove_user_from_account_query(user_id: &str, account_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(MEMBERSHIPS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_eq(registry::ACCOUNT_OWNERSHIP_COLUMN, text(account_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

/// Archives every membership of a user; used when the user is archived.
pub fn build_archive_memberships_for_user_query(user_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(MEMBERSHIPS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::USER_OWNERSHIP_COLUMN, text(user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

/// Archives every membership in an account; used when the account is
/// archived.
pub fn build_archive_memberships_for_account_query(account_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(MEMBERSHIPS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ACCOUNT_OWNERSHIP_COLUMN, text(account_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_lookup_filters_on_the_flag() {
        let plan = build_get_default_account_id_for_user_query("u1");
        assert!(plan
            .query
            .contains("account_user_memberships.default_account = ?"));
        assert_eq!(plan.args.len(), 2);
    }

    #[test]
    fn membership_removal_is_a_soft_delete() {
        let plan = build_remove_user_from_account_query("u1", "a1");
        assert!(plan.query.contains("archived_on = (strftime"));
        assert!(plan.query.ends_with("archived_on IS NULL"));
    }
}

//! User query builders.
//!
//! Users have no tenant ownership column; listing them is an admin surface
//! and point reads scope only on liveness.

use crate::model::filter::QueryFilter;
use crate::model::user::{UserCreationInput, UserReputationUpdateInput};
use crate::query::registry::{self, USERS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};

pub fn build_user_exists_query(user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(USERS.name)
            .column(USERS.id_column())
            .exists()
            .where_eq(USERS.id_column(), text(user_id))
            .where_null(USERS.archived_on_column())
            .build(),
    )
}

pub fn build_get_user_query(user_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(USERS.name)
            .columns(USERS.columns.iter().copied())
            .where_eq(USERS.id_column(), text(user_id))
            .where_null(USERS.archived_on_column())
            .build(),
    )
}

/// Builds the login-path lookup by username.
pub fn build_get_user_by_username_query(username: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(USERS.name)
            .columns(USERS.columns.iter().copied())
            .where_eq(USERS.qualified("username"), text(username))
            .where_null(USERS.archived_on_column())
            .build(),
    )
}

/// Builds the prefix search over usernames used by admin tooling.
pub fn build_search_users_by_username_query(username_query: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(USERS.name)
            .columns(USERS.columns.iter().copied())
            .where_like(USERS.qualified("username"), text(&format!("{username_query}%")))
            .where_null(USERS.archived_on_column())
            .build(),
    )
}

pub fn build_get_all_users_count_query() -> QueryPlan {
    generic::build_all_count_query(&USERS)
}

pub fn build_get_batch_of_users_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&USERS, begin_id, end_id)
}

pub fn build_get_users_query(for_admin: bool, filter: Option<&QueryFilter>) -> QueryPlan {
    generic::build_list_query(&USERS, None, for_admin, filter)
}

/// Builds the user creation statement.
///
/// New users start unverified with no admin permissions; the schema
/// defaults cover the remaining columns.
pub fn build_create_user_query(id: &str, external_id: &str, input: &UserCreationInput) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(USERS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("username", text(&input.username))
            .value("hashed_password", text(&input.hashed_password))
            .value("two_factor_secret", text(&input.two_factor_secret))
            .value("reputation", text("unverified"))
            .value("service_admin_permissions", 0i64)
            .build(),
    )
}

/// Builds the reputation change statement used by admin moderation.
pub fn build_update_user_reputation_query(input: &UserReputationUpdateInput) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(USERS.name)
            .set("reputation", text(input.new_reputation.as_str()))
            .set("reputation_explanation", text(&input.reason))
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(&input.target_user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

pub fn build_archive_user_query(user_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(USERS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(user_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_lookup_excludes_archived_users() {
        let plan = build_get_user_by_username_query("alice");
        assert!(plan
            .query
            .contains("users.username = ? AND users.archived_on IS NULL"));
        assert_eq!(plan.args.len(), 1);
    }

    #[test]
    fn username_search_is_a_prefix_match() {
        let plan = build_search_users_by_username_query("ali");
        assert!(plan.query.contains("users.username LIKE ?"));
        assert_eq!(
            plan.args,
            vec![rusqlite::types::Value::Text("ali%".into())]
        );
    }

    #[test]
    fn new_users_start_unverified() {
        let input = UserCreationInput {
            username: "alice".into(),
            hashed_password: "h".into(),
            two_factor_secret: "s".into(),
        };
        let plan = build_create_user_query("u1", "x1", &input);
        assert!(plan.query.contains("reputation"));
        assert_eq!(plan.placeholder_count(), plan.args.len());
    }
}

//! Subscription plan query builders.
//!
//! Plans are a global catalog: no ownership predicate anywhere, so every
//! tenant sees the same rows.

use crate::model::filter::QueryFilter;
use crate::model::plan::{AccountSubscriptionPlan, PlanCreationInput};
use crate::query::registry::{self, ACCOUNT_SUBSCRIPTION_PLANS as PLANS};
use crate::query::{
    generic, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder, UpdateBuilder,
    CURRENT_UNIX_TIME,
};

pub fn build_get_plan_query(plan_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(PLANS.name)
            .columns(PLANS.columns.iter().copied())
            .where_eq(PLANS.id_column(), text(plan_id))
            .where_null(PLANS.archived_on_column())
            .build(),
    )
}

pub fn build_get_all_plans_count_query() -> QueryPlan {
    generic::build_all_count_query(&PLANS)
}

pub fn build_get_batch_of_plans_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&PLANS, begin_id, end_id)
}

pub fn build_get_plans_query(filter: Option<&QueryFilter>) -> QueryPlan {
    generic::build_list_query(&PLANS, None, false, filter)
}

pub fn build_create_plan_query(id: &str, external_id: &str, input: &PlanCreationInput) -> QueryPlan {
    log_build_result(
        InsertBuilder::new(PLANS.name)
            .value(registry::ID_COLUMN, text(id))
            .value(registry::EXTERNAL_ID_COLUMN, text(external_id))
            .value("name", text(&input.name))
            .value("description", text(&input.description))
            .value("price", i64::from(input.price))
            .value("period", text(&input.period))
            .build(),
    )
}

pub fn build_update_plan_query(plan: &AccountSubscriptionPlan) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(PLANS.name)
            .set("name", text(&plan.name))
            .set("description", text(&plan.description))
            .set("price", i64::from(plan.price))
            .set("period", text(&plan.period))
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(&plan.id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

pub fn build_archive_plan_query(plan_id: &str) -> QueryPlan {
    log_build_result(
        UpdateBuilder::new(PLANS.name)
            .set_raw(registry::LAST_UPDATED_ON_COLUMN, CURRENT_UNIX_TIME)
            .set_raw(registry::ARCHIVED_ON_COLUMN, CURRENT_UNIX_TIME)
            .where_eq(registry::ID_COLUMN, text(plan_id))
            .where_null(registry::ARCHIVED_ON_COLUMN)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::QueryFilter;

    #[test]
    fn plan_list_has_no_ownership_predicate() {
        let plan = build_get_plans_query(Some(&QueryFilter::default()));
        assert!(!plan.query.contains("belongs_to"));
        assert!(plan.query.contains("archived_on IS NULL"));
    }
}

//! Subscription plan repository contract and SQLite implementation.
//!
//! Plans are mutated only through admin surfaces; reads are unscoped
//! because the catalog is global.

use crate::model::audit::{keys, AuditEvent, AuditLogEntry, FieldChangeSummary};
use crate::model::filter::QueryFilter;
use crate::model::plan::{AccountSubscriptionPlan, PlanCreationInput};
use crate::model::require_non_empty;
use crate::query::audit::build_audit_entries_for_key_query;
use crate::query::plans as queries;
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for AccountSubscriptionPlan {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(AccountSubscriptionPlan {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            price: row.get("price")?,
            period: row.get("period")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
        })
    }
}

/// Repository interface for the plan catalog.
pub trait PlanStore {
    fn get_plan(&self, plan_id: &str) -> RepoResult<Option<AccountSubscriptionPlan>>;
    fn get_all_plans_count(&self) -> RepoResult<u64>;
    fn get_batch_of_plans(
        &self,
        begin_id: u64,
        end_id: u64,
    ) -> RepoResult<Vec<AccountSubscriptionPlan>>;
    fn get_plans(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<AccountSubscriptionPlan>>;
    fn create_plan(
        &self,
        input: &PlanCreationInput,
        created_by: &str,
    ) -> RepoResult<AccountSubscriptionPlan>;
    fn update_plan(
        &self,
        plan: &AccountSubscriptionPlan,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()>;
    fn archive_plan(&self, plan_id: &str, archived_by: &str) -> RepoResult<()>;
    fn get_audit_log_entries_for_plan(&self, plan_id: &str) -> RepoResult<Vec<AuditLogEntry>>;
}

impl PlanStore for SqliteQuerier {
    fn get_plan(&self, plan_id: &str) -> RepoResult<Option<AccountSubscriptionPlan>> {
        require_non_empty("plan_id", plan_id)?;

        let plan = queries::build_get_plan_query(plan_id);
        self.get_one("plan fetch", &plan)
    }

    fn get_all_plans_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_plans_count_query();
        self.perform_count_query("plan count", &plan)
    }

    fn get_batch_of_plans(
        &self,
        begin_id: u64,
        end_id: u64,
    ) -> RepoResult<Vec<AccountSubscriptionPlan>> {
        let plan = queries::build_get_batch_of_plans_query(begin_id, end_id);
        self.perform_read("plan batch fetch", &plan)
    }

    fn get_plans(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<AccountSubscriptionPlan>> {
        let plan = queries::build_get_plans_query(filter);
        self.perform_read_with_counts("plan list retrieval", &plan, filter)
    }

    fn create_plan(
        &self,
        input: &PlanCreationInput,
        created_by: &str,
    ) -> RepoResult<AccountSubscriptionPlan> {
        input.validate()?;
        require_non_empty("created_by", created_by)?;

        let id = self.generate_id();
        let external_id = self.generate_id();
        let plan = queries::build_create_plan_query(&id, &external_id, input);

        self.write_with_audit(
            "plan creation",
            &plan,
            AuditEvent::PlanCreated {
                actor_id: created_by.to_string(),
                plan_id: id.clone(),
            },
        )?;

        Ok(AccountSubscriptionPlan {
            id,
            external_id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            period: input.period.clone(),
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
        })
    }

    fn update_plan(
        &self,
        plan: &AccountSubscriptionPlan,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()> {
        plan.validate()?;
        require_non_empty("changed_by", changed_by)?;

        let statement = queries::build_update_plan_query(plan);
        let outcome = self.write_with_audit(
            "plan update",
            &statement,
            AuditEvent::PlanUpdated {
                actor_id: changed_by.to_string(),
                plan_id: plan.id.clone(),
                changes,
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "account subscription plan",
                id: plan.id.clone(),
            }),
        }
    }

    /// Archiving an already-archived plan is a no-op.
    fn archive_plan(&self, plan_id: &str, archived_by: &str) -> RepoResult<()> {
        require_non_empty("plan_id", plan_id)?;
        require_non_empty("archived_by", archived_by)?;

        let statement = queries::build_archive_plan_query(plan_id);
        self.write_with_audit(
            "plan archive",
            &statement,
            AuditEvent::PlanArchived {
                actor_id: archived_by.to_string(),
                plan_id: plan_id.to_string(),
            },
        )?;

        Ok(())
    }

    fn get_audit_log_entries_for_plan(&self, plan_id: &str) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("plan_id", plan_id)?;

        let plan = build_audit_entries_for_key_query(keys::ACCOUNT_SUBSCRIPTION_PLAN_ID, plan_id);
        self.perform_read("audit log entries for plan", &plan)
    }
}

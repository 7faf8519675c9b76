//! Audit log query builders and context correlation.
//!
//! # Responsibility
//! - Produce the append/read/export queries for the audit log.
//! - Correlate audit rows to entities through their JSON context.
//!
//! # Invariants
//! - Correlation plucks reserved context keys by exact name.
//! - Entity audit trails are returned in full, ordered by creation time
//!   ascending; no pagination is applied.

use crate::model::audit::AuditLogEntryCreationInput;
use crate::model::filter::{QueryFilter, SortOrder};
use crate::query::builder::QueryBuildError;
use crate::query::registry::{AUDIT_CONTEXT_COLUMN, AUDIT_LOG};
use crate::query::{
    generic, json_pluck, log_build_result, text, InsertBuilder, QueryPlan, SelectBuilder,
};
use rusqlite::types::Value;

/// Builds the point read for one audit entry by its log key.
pub fn build_get_audit_log_entry_query(entry_id: u64) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(AUDIT_LOG.name)
            .columns(AUDIT_LOG.columns.iter().copied())
            .where_eq(AUDIT_LOG.id_column(), Value::Integer(entry_id as i64))
            .build(),
    )
}

/// Builds the total audit row count.
pub fn build_get_all_audit_log_entries_count_query() -> QueryPlan {
    generic::build_all_count_query(&AUDIT_LOG)
}

/// Builds a bucketed scan for exporting the log.
pub fn build_get_batch_of_audit_log_entries_query(begin_id: u64, end_id: u64) -> QueryPlan {
    generic::build_batch_range_query(&AUDIT_LOG, begin_id, end_id)
}

/// Builds the paginated audit list with embedded counts.
pub fn build_get_audit_log_entries_query(filter: Option<&QueryFilter>) -> QueryPlan {
    generic::build_list_query(&AUDIT_LOG, None, true, filter)
}

fn build_create_audit_log_entry_query_inner(
    input: &AuditLogEntryCreationInput,
) -> Result<QueryPlan, QueryBuildError> {
    let context = serde_json::to_string(&input.context).map_err(|err| {
        QueryBuildError::InvalidAuditContext {
            detail: err.to_string(),
        }
    })?;

    InsertBuilder::new(AUDIT_LOG.name)
        .value("event_type", text(&input.event_type))
        .value(AUDIT_CONTEXT_COLUMN, Value::Text(context))
        .build()
}

/// Builds the audit append statement; `id` and `created_on` come from the
/// schema.
pub fn build_create_audit_log_entry_query(input: &AuditLogEntryCreationInput) -> QueryPlan {
    log_build_result(build_create_audit_log_entry_query_inner(input))
}

/// Builds the audit trail for one entity: every row whose context carries
/// `entity_id` under `context_key`.
pub fn build_audit_entries_for_key_query(context_key: &str, entity_id: &str) -> QueryPlan {
    log_build_result(
        SelectBuilder::new(AUDIT_LOG.name)
            .columns(AUDIT_LOG.columns.iter().copied())
            .where_eq(
                json_pluck(AUDIT_LOG.name, AUDIT_CONTEXT_COLUMN, context_key),
                text(entity_id),
            )
            .order_by(AUDIT_LOG.created_on_column(), SortOrder::Ascending)
            .build(),
    )
}

/// Builds the audit trail for a user, matching them as either the subject
/// or the actor of an entry.
pub fn build_audit_entries_for_user_query(user_id: &str) -> QueryPlan {
    use crate::model::audit::keys;

    log_build_result(
        SelectBuilder::new(AUDIT_LOG.name)
            .columns(AUDIT_LOG.columns.iter().copied())
            .where_any_eq(vec![
                (
                    json_pluck(AUDIT_LOG.name, AUDIT_CONTEXT_COLUMN, keys::USER_ID),
                    text(user_id),
                ),
                (
                    json_pluck(AUDIT_LOG.name, AUDIT_CONTEXT_COLUMN, keys::ACTOR_ID),
                    text(user_id),
                ),
            ])
            .order_by(AUDIT_LOG.created_on_column(), SortOrder::Ascending)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::audit::{keys, AuditEvent};

    #[test]
    fn correlation_plucks_the_context_key() {
        let plan = build_audit_entries_for_key_query(keys::ITEM_ID, "i1");

        assert_eq!(
            plan.query,
            "SELECT audit_log.id, audit_log.event_type, audit_log.context, audit_log.created_on \
             FROM audit_log WHERE json_extract(audit_log.context, '$.item_id') = ? \
             ORDER BY audit_log.created_on ASC"
        );
        assert_eq!(plan.args.len(), 1);
    }

    #[test]
    fn user_history_matches_subject_or_actor() {
        let plan = build_audit_entries_for_user_query("u1");

        assert!(plan.query.contains(
            "(json_extract(audit_log.context, '$.user_id') = ? \
             OR json_extract(audit_log.context, '$.actor_id') = ?)"
        ));
        assert_eq!(plan.args.len(), 2);
    }

    #[test]
    fn create_serializes_the_context_to_json() {
        let input = AuditEvent::ItemCreated {
            actor_id: "u1".into(),
            item_id: "i1".into(),
            account_id: "a1".into(),
        }
        .into_creation_input();

        let plan = build_create_audit_log_entry_query(&input);
        assert_eq!(
            plan.query,
            "INSERT INTO audit_log (event_type,context) VALUES (?,?)"
        );
        assert_eq!(plan.args.len(), 2);
    }

    #[test]
    fn batch_export_ranges_over_the_integer_log_key() {
        let plan = build_get_batch_of_audit_log_entries_query(1, 1001);
        assert!(plan
            .query
            .contains("WHERE audit_log.id > ? AND audit_log.id < ?"));
        assert!(!plan.query.contains("archived_on"));
    }
}

//! Generic list/count query construction.
//!
//! # Responsibility
//! - Build the paginated list query with embedded total/filtered count
//!   subqueries for any registered table.
//! - Build the standalone all-rows count and batch-range scan queries.
//!
//! # Invariants
//! - Tenant-scoped queries always exclude archived rows; `include_archived`
//!   only widens admin queries.
//! - List-query arguments concatenate filtered-count args, total-count
//!   args, then main args, and bind correctly in that order.

use crate::model::filter::{QueryFilter, SortOrder};
use crate::query::builder::QueryBuildError;
use crate::query::registry::TableMetadata;
use crate::query::{log_build_result, text, unix, QueryPlan, SelectBuilder};
use rusqlite::types::Value;

fn count_column(table: &TableMetadata) -> String {
    format!("COUNT({})", table.id_column())
}

/// Whether the archived-exclusion predicate applies to this query.
fn excludes_archived(table: &TableMetadata, for_admin: bool, include_archived: bool) -> bool {
    table.soft_deletes && (!for_admin || !include_archived)
}

/// Adds the shared base predicates: archived exclusion, then ownership.
fn apply_base_predicates(
    mut builder: SelectBuilder,
    table: &TableMetadata,
    owner_id: Option<&str>,
    for_admin: bool,
    include_archived: bool,
) -> SelectBuilder {
    if excludes_archived(table, for_admin, include_archived) {
        builder = builder.where_null(table.archived_on_column());
    }

    if !for_admin {
        if let (Some(column), Some(owner)) = (table.ownership_column, owner_id) {
            builder = builder.where_eq(table.qualified(column), text(owner));
        }
    }

    builder
}

/// Adds the filter's time-range predicates, returning how many were added.
fn apply_time_bounds(
    mut builder: SelectBuilder,
    table: &TableMetadata,
    filter: Option<&QueryFilter>,
) -> (SelectBuilder, usize) {
    let mut added = 0;

    if let Some(filter) = filter {
        if let Some(ts) = filter.created_after {
            builder = builder.where_gt(table.created_on_column(), unix(ts));
            added += 1;
        }
        if let Some(ts) = filter.created_before {
            builder = builder.where_lt(table.created_on_column(), unix(ts));
            added += 1;
        }
        if let Some(ts) = filter.updated_after {
            builder = builder.where_gt(table.last_updated_on_column(), unix(ts));
            added += 1;
        }
        if let Some(ts) = filter.updated_before {
            builder = builder.where_lt(table.last_updated_on_column(), unix(ts));
            added += 1;
        }
    }

    (builder, added)
}

/// Builds the total-count subquery: base predicates only.
fn build_total_count_subquery(
    table: &TableMetadata,
    owner_id: Option<&str>,
    for_admin: bool,
    include_archived: bool,
) -> Result<QueryPlan, QueryBuildError> {
    let builder = SelectBuilder::new(table.name).column(count_column(table));
    apply_base_predicates(builder, table, owner_id, for_admin, include_archived).build()
}

/// Builds the filtered-count subquery: base predicates plus time bounds.
///
/// Rendering order is deliberate. The assembled list statement binds one
/// positional argument vector across both embedded subqueries and the main
/// WHERE clause, consuming the total subquery's placeholders first. This
/// subquery therefore renders its time predicates ahead of the base
/// predicates while its argument vector stays base-first; concatenating
/// filtered, total, then main args lines every placeholder up with its
/// intended value.
fn build_filtered_count_subquery(
    table: &TableMetadata,
    owner_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> Result<QueryPlan, QueryBuildError> {
    let include_archived = filter.is_some_and(|f| f.include_archived);

    let builder = SelectBuilder::new(table.name).column(count_column(table));
    let (builder, time_args) = apply_time_bounds(builder, table, filter);
    let builder = apply_base_predicates(builder, table, owner_id, for_admin, include_archived);

    let mut plan = builder.build()?;
    plan.args.rotate_left(time_args);

    Ok(plan)
}

fn build_list_query_inner(
    table: &TableMetadata,
    owner_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> Result<QueryPlan, QueryBuildError> {
    let include_archived = filter.is_some_and(|f| f.include_archived);

    let filtered = build_filtered_count_subquery(table, owner_id, for_admin, filter)?;
    let total = build_total_count_subquery(table, owner_id, for_admin, include_archived)?;

    let builder = SelectBuilder::new(table.name)
        .columns(table.columns.iter().copied())
        .column(format!("({}) as total_count", total.query))
        .column(format!("({}) as filtered_count", filtered.query));

    let builder = apply_base_predicates(builder, table, owner_id, for_admin, include_archived);
    let (builder, _) = apply_time_bounds(builder, table, filter);

    let mut builder = builder.group_by(table.id_column()).order_by(
        table.created_on_column(),
        filter.map_or(SortOrder::Ascending, |f| f.sort),
    );

    if let Some(filter) = filter {
        let limit = filter.clamped_limit();
        if limit > 0 {
            builder = builder.limit(u64::from(limit));
            let offset = filter.offset();
            if offset > 0 {
                builder = builder.offset(offset);
            }
        }
    }

    let main = builder.build()?;

    let mut args = filtered.args;
    args.extend(total.args);
    args.extend(main.args);

    Ok(QueryPlan {
        query: main.query,
        args,
    })
}

/// Builds the paginated list query for a registered table.
///
/// The result set carries every table column plus uniform `total_count` and
/// `filtered_count` columns; scanners read the counts from the first row.
/// `owner_id` is ignored when `for_admin` is set, and tables without an
/// ownership column are never tenant-scoped.
pub fn build_list_query(
    table: &TableMetadata,
    owner_id: Option<&str>,
    for_admin: bool,
    filter: Option<&QueryFilter>,
) -> QueryPlan {
    log_build_result(build_list_query_inner(table, owner_id, for_admin, filter))
}

/// Builds the unconditional non-archived row count for a table.
pub fn build_all_count_query(table: &TableMetadata) -> QueryPlan {
    let mut builder = SelectBuilder::new(table.name).column(count_column(table));
    if table.soft_deletes {
        builder = builder.where_null(table.archived_on_column());
    }
    log_build_result(builder.build())
}

/// Builds a bucketed batch scan over `begin < key < end`.
///
/// Callers advance the range by a fixed bucket width until a batch comes
/// back empty; archived rows are excluded on soft-deleting tables.
pub fn build_batch_range_query(table: &TableMetadata, begin_id: u64, end_id: u64) -> QueryPlan {
    let key = table.qualified(table.batch_key_column);
    let mut builder = SelectBuilder::new(table.name)
        .columns(table.columns.iter().copied())
        .where_gt(key.clone(), Value::Integer(begin_id as i64))
        .where_lt(key, Value::Integer(end_id as i64));
    if table.soft_deletes {
        builder = builder.where_null(table.archived_on_column());
    }
    log_build_result(builder.build())
}

#[cfg(test)]
mod tests {
    use super::{build_all_count_query, build_batch_range_query, build_list_query};
    use crate::model::filter::QueryFilter;
    use crate::query::registry::ITEMS;
    use rusqlite::types::Value;

    fn filled_filter() -> QueryFilter {
        QueryFilter {
            page: 10,
            limit: 20,
            created_after: Some(1),
            created_before: Some(2),
            updated_after: Some(3),
            updated_before: Some(4),
            ..QueryFilter::default()
        }
    }

    #[test]
    fn tenant_list_query_embeds_both_count_subqueries() {
        let plan = build_list_query(&ITEMS, Some("u1"), false, Some(&filled_filter()));

        let expected = "SELECT items.id, items.external_id, items.name, items.details, \
             items.created_on, items.last_updated_on, items.archived_on, items.belongs_to_account, \
             (SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL \
             AND items.belongs_to_account = ?) as total_count, \
             (SELECT COUNT(items.id) FROM items WHERE items.created_on > ? AND items.created_on < ? \
             AND items.last_updated_on > ? AND items.last_updated_on < ? \
             AND items.archived_on IS NULL AND items.belongs_to_account = ?) as filtered_count \
             FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = ? \
             AND items.created_on > ? AND items.created_on < ? \
             AND items.last_updated_on > ? AND items.last_updated_on < ? \
             GROUP BY items.id ORDER BY items.created_on ASC LIMIT 20 OFFSET 180";
        assert_eq!(plan.query, expected);
        assert_eq!(plan.placeholder_count(), plan.args.len());
    }

    /// Positional binding check: walking the statement's placeholders in
    /// text order must meet each argument's intended value.
    #[test]
    fn list_query_arguments_bind_in_text_order() {
        let plan = build_list_query(&ITEMS, Some("u1"), false, Some(&filled_filter()));

        let owner = Value::Text("u1".into());
        let expected = vec![
            // filtered-count args: base first, time bounds after
            owner.clone(),
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
            // total-count args
            owner.clone(),
            // main args
            owner.clone(),
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
        ];
        assert_eq!(plan.args, expected);

        // Text order consumes: total(owner), filtered(1,2,3,4,owner),
        // main(owner,1,2,3,4) — identical to the vector above.
        let consumed = vec![
            owner.clone(),
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
            owner.clone(),
            owner,
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
        ];
        assert_eq!(plan.args, consumed);
    }

    #[test]
    fn absent_filter_emits_no_limit_or_offset() {
        let plan = build_list_query(&ITEMS, Some("u1"), false, None);
        assert!(!plan.query.contains("LIMIT"));
        assert!(!plan.query.contains("OFFSET"));
        assert!(plan.query.contains("ORDER BY items.created_on ASC"));
    }

    #[test]
    fn tenant_queries_exclude_archived_even_when_asked_not_to() {
        let filter = QueryFilter {
            include_archived: true,
            ..QueryFilter::default()
        };
        let plan = build_list_query(&ITEMS, Some("u1"), false, Some(&filter));
        assert!(plan.query.contains("items.archived_on IS NULL"));
    }

    #[test]
    fn admin_queries_can_include_archived_rows() {
        let filter = QueryFilter {
            include_archived: true,
            ..QueryFilter::default()
        };
        let plan = build_list_query(&ITEMS, None, true, Some(&filter));
        assert!(!plan.query.contains("archived_on IS NULL"));
        assert!(!plan.query.contains("belongs_to_account = ?"));
    }

    #[test]
    fn all_count_query_counts_non_archived_rows() {
        let plan = build_all_count_query(&ITEMS);
        assert_eq!(
            plan.query,
            "SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL"
        );
        assert!(plan.args.is_empty());
    }

    #[test]
    fn batch_range_query_bounds_the_scan_key() {
        let plan = build_batch_range_query(&ITEMS, 1, 1000);
        assert_eq!(
            plan.query,
            "SELECT items.id, items.external_id, items.name, items.details, items.created_on, \
             items.last_updated_on, items.archived_on, items.belongs_to_account FROM items \
             WHERE items.rowid > ? AND items.rowid < ? AND items.archived_on IS NULL"
        );
        assert_eq!(plan.args.len(), 2);
    }
}

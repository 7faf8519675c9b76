//! Statement-builder primitives.
//!
//! # Responsibility
//! - Render SELECT/INSERT/UPDATE statements with positional placeholders.
//! - Append bind arguments in lockstep with placeholder rendering so
//!   placeholder/argument parity holds by construction.
//!
//! # Invariants
//! - Predicates render in insertion order.
//! - LIMIT/OFFSET render as literals, never as placeholders.

use crate::model::filter::SortOrder;
use crate::query::{QueryPlan, EXISTENCE_PREFIX, EXISTENCE_SUFFIX};
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A statement construction defect. Treated as a programmer error by the
/// per-entity builders (logged, not propagated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    /// A SELECT with no projected columns.
    EmptyColumnList { table: String },
    /// An INSERT with no values.
    EmptyInsert { table: String },
    /// An UPDATE with no SET clause.
    EmptySetClause { table: String },
    /// An OR group with no alternatives.
    EmptyOrGroup { table: String },
    /// An audit context bag that could not be serialized for storage.
    InvalidAuditContext { detail: String },
}

impl Display for QueryBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyColumnList { table } => {
                write!(f, "select on `{table}` projects no columns")
            }
            Self::EmptyInsert { table } => write!(f, "insert into `{table}` carries no values"),
            Self::EmptySetClause { table } => write!(f, "update on `{table}` sets no columns"),
            Self::EmptyOrGroup { table } => {
                write!(f, "predicate group on `{table}` has no alternatives")
            }
            Self::InvalidAuditContext { detail } => {
                write!(f, "audit context is not serializable: {detail}")
            }
        }
    }
}

impl Error for QueryBuildError {}

/// One WHERE predicate. Bound values travel with their predicate so text
/// and argument order can never drift apart.
#[derive(Debug, Clone)]
enum Predicate {
    Eq(String, Value),
    IsNull(String),
    Gt(String, Value),
    Lt(String, Value),
    Like(String, Value),
    /// `(a = ? OR b = ?)` over the carried column/value pairs.
    AnyEq(Vec<(String, Value)>),
}

impl Predicate {
    fn render(&self, sql: &mut String, args: &mut Vec<Value>) {
        match self {
            Self::Eq(column, value) => {
                sql.push_str(column);
                sql.push_str(" = ?");
                args.push(value.clone());
            }
            Self::IsNull(column) => {
                sql.push_str(column);
                sql.push_str(" IS NULL");
            }
            Self::Gt(column, value) => {
                sql.push_str(column);
                sql.push_str(" > ?");
                args.push(value.clone());
            }
            Self::Lt(column, value) => {
                sql.push_str(column);
                sql.push_str(" < ?");
                args.push(value.clone());
            }
            Self::Like(column, value) => {
                sql.push_str(column);
                sql.push_str(" LIKE ?");
                args.push(value.clone());
            }
            Self::AnyEq(alternatives) => {
                sql.push('(');
                for (i, (column, value)) in alternatives.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    sql.push_str(column);
                    sql.push_str(" = ?");
                    args.push(value.clone());
                }
                sql.push(')');
            }
        }
    }
}

fn render_where(predicates: &[Predicate], sql: &mut String, args: &mut Vec<Value>) {
    for (i, predicate) in predicates.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        predicate.render(sql, args);
    }
}

/// Builder for SELECT statements.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    wrap_exists: bool,
    predicates: Vec<Predicate>,
    group_by: Option<String>,
    order_by: Option<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            wrap_exists: false,
            predicates: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Wraps the statement in `SELECT EXISTS ( ... )`.
    pub fn exists(mut self) -> Self {
        self.wrap_exists = true;
        self
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Eq(column.into(), value.into()));
        self
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.predicates.push(Predicate::IsNull(column.into()));
        self
    }

    pub fn where_gt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Gt(column.into(), value.into()));
        self
    }

    pub fn where_lt(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Lt(column.into(), value.into()));
        self
    }

    /// Adds `column LIKE ?`; the caller supplies the wildcard pattern.
    pub fn where_like(mut self, column: impl Into<String>, pattern: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Like(column.into(), pattern.into()));
        self
    }

    /// Adds `(a = ? OR b = ?)` over the given column/value pairs.
    pub fn where_any_eq(mut self, alternatives: Vec<(String, Value)>) -> Self {
        self.predicates.push(Predicate::AnyEq(alternatives));
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortOrder) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(self) -> Result<QueryPlan, QueryBuildError> {
        if self.columns.is_empty() {
            return Err(QueryBuildError::EmptyColumnList { table: self.table });
        }
        if self
            .predicates
            .iter()
            .any(|p| matches!(p, Predicate::AnyEq(a) if a.is_empty()))
        {
            return Err(QueryBuildError::EmptyOrGroup { table: self.table });
        }

        let mut sql = String::new();
        let mut args = Vec::new();

        if self.wrap_exists {
            sql.push_str(EXISTENCE_PREFIX);
            sql.push(' ');
        }

        sql.push_str("SELECT ");
        sql.push_str(&self.columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        render_where(&self.predicates, &mut sql, &mut args);

        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }

        if let Some((column, direction)) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(column);
            sql.push(' ');
            sql.push_str(direction.as_sql());
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        if self.wrap_exists {
            sql.push(' ');
            sql.push_str(EXISTENCE_SUFFIX);
        }

        Ok(QueryPlan { query: sql, args })
    }
}

/// Builder for INSERT statements.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    pub fn build(self) -> Result<QueryPlan, QueryBuildError> {
        if self.columns.is_empty() {
            return Err(QueryBuildError::EmptyInsert { table: self.table });
        }

        let placeholders = vec!["?"; self.columns.len()].join(",");
        let query = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table,
            self.columns.join(","),
        );

        Ok(QueryPlan {
            query,
            args: self.values,
        })
    }
}

/// One SET assignment: a bound value or a raw SQL expression (DB clock).
#[derive(Debug, Clone)]
enum SetValue {
    Bound(Value),
    Raw(&'static str),
}

/// Builder for UPDATE statements.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    sets: Vec<(String, SetValue)>,
    predicates: Vec<Predicate>,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sets: Vec::new(),
            predicates: Vec::new(),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets
            .push((column.into(), SetValue::Bound(value.into())));
        self
    }

    /// Assigns a raw SQL expression, e.g. [`crate::query::CURRENT_UNIX_TIME`].
    pub fn set_raw(mut self, column: impl Into<String>, expression: &'static str) -> Self {
        self.sets.push((column.into(), SetValue::Raw(expression)));
        self
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::Eq(column.into(), value.into()));
        self
    }

    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.predicates.push(Predicate::IsNull(column.into()));
        self
    }

    pub fn build(self) -> Result<QueryPlan, QueryBuildError> {
        if self.sets.is_empty() {
            return Err(QueryBuildError::EmptySetClause { table: self.table });
        }

        let mut sql = format!("UPDATE {} SET ", self.table);
        let mut args = Vec::new();

        for (i, (column, value)) in self.sets.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column);
            sql.push_str(" = ");
            match value {
                SetValue::Bound(value) => {
                    sql.push('?');
                    args.push(value.clone());
                }
                SetValue::Raw(expression) => sql.push_str(expression),
            }
        }

        render_where(&self.predicates, &mut sql, &mut args);

        Ok(QueryPlan { query: sql, args })
    }
}

#[cfg(test)]
mod tests {
    use super::{InsertBuilder, QueryBuildError, SelectBuilder, UpdateBuilder};
    use crate::model::filter::SortOrder;
    use crate::query::CURRENT_UNIX_TIME;
    use rusqlite::types::Value;

    #[test]
    fn select_renders_predicates_in_insertion_order() {
        let plan = SelectBuilder::new("items")
            .column("items.id")
            .where_eq("items.id", Value::from("abc".to_string()))
            .where_eq("items.belongs_to_account", Value::from("u1".to_string()))
            .where_null("items.archived_on")
            .build()
            .unwrap();

        assert_eq!(
            plan.query,
            "SELECT items.id FROM items WHERE items.id = ? \
             AND items.belongs_to_account = ? AND items.archived_on IS NULL"
        );
        assert_eq!(plan.args.len(), 2);
        assert_eq!(plan.placeholder_count(), 2);
    }

    #[test]
    fn select_exists_wraps_the_statement() {
        let plan = SelectBuilder::new("items")
            .column("items.id")
            .where_eq("items.id", Value::from("x".to_string()))
            .exists()
            .build()
            .unwrap();

        assert!(plan.query.starts_with("SELECT EXISTS ( SELECT"));
        assert!(plan.query.ends_with(")"));
    }

    #[test]
    fn select_without_columns_is_a_build_error() {
        let err = SelectBuilder::new("items").build().unwrap_err();
        assert!(matches!(err, QueryBuildError::EmptyColumnList { .. }));
    }

    #[test]
    fn limit_and_offset_render_as_literals() {
        let plan = SelectBuilder::new("items")
            .column("items.id")
            .order_by("items.created_on", SortOrder::Descending)
            .limit(20)
            .offset(180)
            .build()
            .unwrap();

        assert!(plan
            .query
            .ends_with("ORDER BY items.created_on DESC LIMIT 20 OFFSET 180"));
        assert_eq!(plan.placeholder_count(), 0);
    }

    #[test]
    fn insert_pairs_columns_with_placeholders() {
        let plan = InsertBuilder::new("items")
            .value("id", Value::from("i1".to_string()))
            .value("name", Value::from("n".to_string()))
            .build()
            .unwrap();

        assert_eq!(plan.query, "INSERT INTO items (id,name) VALUES (?,?)");
        assert_eq!(plan.args.len(), 2);
    }

    #[test]
    fn update_mixes_bound_and_raw_assignments() {
        let plan = UpdateBuilder::new("items")
            .set("name", Value::from("n".to_string()))
            .set_raw("last_updated_on", CURRENT_UNIX_TIME)
            .where_eq("id", Value::from("i1".to_string()))
            .where_null("archived_on")
            .build()
            .unwrap();

        assert_eq!(
            plan.query,
            "UPDATE items SET name = ?, last_updated_on = (strftime('%s', 'now')) \
             WHERE id = ? AND archived_on IS NULL"
        );
        assert_eq!(plan.args.len(), 2);
        assert_eq!(plan.placeholder_count(), 2);
    }

    #[test]
    fn update_without_sets_is_a_build_error() {
        let err = UpdateBuilder::new("items")
            .where_eq("id", Value::from("i1".to_string()))
            .build()
            .unwrap_err();
        assert!(matches!(err, QueryBuildError::EmptySetClause { .. }));
    }
}

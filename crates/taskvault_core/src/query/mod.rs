//! SQL construction for the SQLite dialect.
//!
//! # Responsibility
//! - Provide the statement-builder primitives and per-entity query builders.
//! - Keep every dialect-specific expression in one place.
//!
//! # Invariants
//! - Every produced [`QueryPlan`] has exactly as many `?` placeholders as
//!   bound arguments.
//! - Builders only consume identifiers; they never generate them.

use log::error;
use rusqlite::types::Value;

pub mod accounts;
pub mod api_clients;
pub mod audit;
pub mod builder;
pub mod generic;
pub mod items;
pub mod memberships;
pub mod plans;
pub mod registry;
pub mod users;
pub mod webhooks;

pub use builder::{InsertBuilder, QueryBuildError, SelectBuilder, UpdateBuilder};

/// Database-clock expression for "now" in unix seconds.
///
/// Timestamps written by UPDATE/archive statements always come from the
/// database server's clock, not the caller's, so ordering stays consistent
/// across concurrent writers.
pub const CURRENT_UNIX_TIME: &str = "(strftime('%s', 'now'))";

/// Wrapper applied to existence checks.
pub const EXISTENCE_PREFIX: &str = "SELECT EXISTS (";
pub const EXISTENCE_SUFFIX: &str = ")";

/// Renders the JSON-pluck expression used for audit-context correlation.
///
/// A port to another engine must supply its own containment predicate here
/// (e.g. `JSON_CONTAINS` on MySQL).
pub fn json_pluck(table: &str, column: &str, key: &str) -> String {
    format!("json_extract({table}.{column}, '$.{key}')")
}

/// A parameterized statement ready for execution: positional `?`
/// placeholders plus the bind values in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub query: String,
    pub args: Vec<Value>,
}

impl QueryPlan {
    /// The zero-value plan handed back after a logged construction defect.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Counts `?` placeholders in the statement text.
    ///
    /// None of the generated SQL embeds `?` inside literals, so a byte scan
    /// is exact.
    pub fn placeholder_count(&self) -> usize {
        self.query.bytes().filter(|b| *b == b'?').count()
    }
}

/// Shorthand for binding borrowed text.
pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Shorthand for binding unix-seconds timestamps.
pub(crate) fn unix(value: u64) -> Value {
    Value::Integer(value as i64)
}

/// Unwraps a builder result, logging construction defects instead of
/// returning them.
///
/// Build failures reflect programming errors, not runtime conditions; they
/// are logged under `query_error=true` for alerting and the empty plan is
/// returned so the defect surfaces as an execution failure downstream.
pub(crate) fn log_build_result(result: Result<QueryPlan, QueryBuildError>) -> QueryPlan {
    match result {
        Ok(plan) => plan,
        Err(err) => {
            error!("event=query_build module=query status=error query_error=true error={err}");
            QueryPlan::empty()
        }
    }
}

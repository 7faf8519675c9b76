//! Audit log repository contract and SQLite implementation.
//!
//! # Invariants
//! - Entries are append-only; no update or delete path exists.
//! - Export walks fixed-width `id` buckets until one comes back empty,
//!   which is sound because the log key is contiguous and never archived.

use crate::model::audit::{AuditLogEntry, AuditLogEntryCreationInput};
use crate::model::filter::QueryFilter;
use crate::model::require_non_empty;
use crate::query::audit as queries;
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier};
use rusqlite::Row;

impl FromSqlRow for AuditLogEntry {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let raw_context: String = row.get("context")?;
        let context = serde_json::from_str(&raw_context).map_err(|err| {
            RepoError::InvalidData(format!("audit context does not parse as JSON: {err}"))
        })?;

        Ok(AuditLogEntry {
            id: row.get("id")?,
            event_type: row.get("event_type")?,
            context,
            created_on: row.get("created_on")?,
        })
    }
}

/// Repository interface for the audit log.
pub trait AuditLogStore {
    fn get_audit_log_entry(&self, entry_id: u64) -> RepoResult<Option<AuditLogEntry>>;
    fn get_all_audit_log_entries_count(&self) -> RepoResult<u64>;
    fn get_batch_of_audit_log_entries(
        &self,
        begin_id: u64,
        end_id: u64,
    ) -> RepoResult<Vec<AuditLogEntry>>;
    fn get_audit_log_entries(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<AuditLogEntry>>;
    /// Appends one entry outside any entity mutation, e.g. login events
    /// recorded by the excluded auth layer.
    fn create_audit_log_entry(&self, input: &AuditLogEntryCreationInput) -> RepoResult<()>;
    /// Streams the whole log in fixed-width buckets without materializing
    /// it, invoking `handle` once per non-empty batch.
    fn stream_all_audit_log_entries(
        &self,
        batch_size: u64,
        handle: &mut dyn FnMut(Vec<AuditLogEntry>),
    ) -> RepoResult<()>;
}

impl AuditLogStore for SqliteQuerier {
    fn get_audit_log_entry(&self, entry_id: u64) -> RepoResult<Option<AuditLogEntry>> {
        let plan = queries::build_get_audit_log_entry_query(entry_id);
        self.get_one("audit log entry fetch", &plan)
    }

    fn get_all_audit_log_entries_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_audit_log_entries_count_query();
        self.perform_count_query("audit log entry count", &plan)
    }

    fn get_batch_of_audit_log_entries(
        &self,
        begin_id: u64,
        end_id: u64,
    ) -> RepoResult<Vec<AuditLogEntry>> {
        let plan = queries::build_get_batch_of_audit_log_entries_query(begin_id, end_id);
        self.perform_read("audit log entry batch fetch", &plan)
    }

    fn get_audit_log_entries(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<AuditLogEntry>> {
        let plan = queries::build_get_audit_log_entries_query(filter);
        self.perform_read_with_counts("audit log entry list retrieval", &plan, filter)
    }

    fn create_audit_log_entry(&self, input: &AuditLogEntryCreationInput) -> RepoResult<()> {
        require_non_empty("event_type", &input.event_type)?;

        let plan = queries::build_create_audit_log_entry_query(input);
        self.perform_write(self.connection(), "audit log entry creation", &plan)
            .map(|_| ())
    }

    fn stream_all_audit_log_entries(
        &self,
        batch_size: u64,
        handle: &mut dyn FnMut(Vec<AuditLogEntry>),
    ) -> RepoResult<()> {
        let batch_size = batch_size.max(1);
        let mut begin_id = 0u64;

        loop {
            // Exclusive bounds: rows strictly between begin and end.
            let batch =
                self.get_batch_of_audit_log_entries(begin_id, begin_id + batch_size + 1)?;
            if batch.is_empty() {
                return Ok(());
            }

            handle(batch);
            begin_id += batch_size;
        }
    }
}

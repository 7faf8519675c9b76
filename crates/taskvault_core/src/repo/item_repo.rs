//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `items` table.
//! - Keep SQL details inside the query-builder boundary.
//!
//! # Invariants
//! - Write paths validate inputs before any SQL runs.
//! - Every mutation carries its audit entry in the same transaction.

use crate::model::audit::{keys, AuditEvent, AuditLogEntry, FieldChangeSummary};
use crate::model::filter::QueryFilter;
use crate::model::item::{Item, ItemCreationInput};
use crate::model::require_non_empty;
use crate::query::items as queries;
use crate::query::audit::build_audit_entries_for_key_query;
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for Item {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Item {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            details: row.get("details")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
            belongs_to_account: row.get("belongs_to_account")?,
        })
    }
}

/// Repository interface for item CRUD operations.
pub trait ItemStore {
    fn item_exists(&self, item_id: &str, account_id: &str) -> RepoResult<bool>;
    fn get_item(&self, item_id: &str, account_id: &str) -> RepoResult<Option<Item>>;
    fn get_all_items_count(&self) -> RepoResult<u64>;
    fn get_batch_of_items(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Item>>;
    fn get_items(
        &self,
        account_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Item>>;
    fn get_items_for_admin(&self, filter: Option<&QueryFilter>) -> RepoResult<ListResult<Item>>;
    fn create_item(&self, input: &ItemCreationInput, created_by: &str) -> RepoResult<Item>;
    fn update_item(
        &self,
        item: &Item,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()>;
    fn archive_item(&self, item_id: &str, account_id: &str, archived_by: &str) -> RepoResult<()>;
    fn get_audit_log_entries_for_item(&self, item_id: &str) -> RepoResult<Vec<AuditLogEntry>>;
}

impl ItemStore for SqliteQuerier {
    fn item_exists(&self, item_id: &str, account_id: &str) -> RepoResult<bool> {
        require_non_empty("item_id", item_id)?;
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_item_exists_query(item_id, account_id);
        self.perform_boolean_query(&plan)
    }

    fn get_item(&self, item_id: &str, account_id: &str) -> RepoResult<Option<Item>> {
        require_non_empty("item_id", item_id)?;
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_get_item_query(item_id, account_id);
        self.get_one("item fetch", &plan)
    }

    fn get_all_items_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_items_count_query();
        self.perform_count_query("item count", &plan)
    }

    fn get_batch_of_items(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Item>> {
        let plan = queries::build_get_batch_of_items_query(begin_id, end_id);
        self.perform_read("item batch fetch", &plan)
    }

    fn get_items(
        &self,
        account_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Item>> {
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_get_items_query(Some(account_id), false, filter);
        self.perform_read_with_counts("item list retrieval", &plan, filter)
    }

    fn get_items_for_admin(&self, filter: Option<&QueryFilter>) -> RepoResult<ListResult<Item>> {
        let plan = queries::build_get_items_query(None, true, filter);
        self.perform_read_with_counts("item list retrieval for admin", &plan, filter)
    }

    /// Creates an item and its creation audit entry atomically.
    fn create_item(&self, input: &ItemCreationInput, created_by: &str) -> RepoResult<Item> {
        input.validate()?;
        require_non_empty("created_by", created_by)?;

        let id = self.generate_id();
        let external_id = self.generate_id();
        let plan = queries::build_create_item_query(&id, &external_id, input);

        self.write_with_audit(
            "item creation",
            &plan,
            AuditEvent::ItemCreated {
                actor_id: created_by.to_string(),
                item_id: id.clone(),
                account_id: input.belongs_to_account.clone(),
            },
        )?;

        Ok(Item {
            id,
            external_id,
            name: input.name.clone(),
            details: input.details.clone(),
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
            belongs_to_account: input.belongs_to_account.clone(),
        })
    }

    /// Updates an item; the provided record must carry a valid ID.
    fn update_item(
        &self,
        item: &Item,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()> {
        item.validate()?;
        require_non_empty("changed_by", changed_by)?;

        let plan = queries::build_update_item_query(item);
        let outcome = self.write_with_audit(
            "item update",
            &plan,
            AuditEvent::ItemUpdated {
                actor_id: changed_by.to_string(),
                item_id: item.id.clone(),
                account_id: item.belongs_to_account.clone(),
                changes,
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "item",
                id: item.id.clone(),
            }),
        }
    }

    /// Archives an item. Archiving an already-archived item is a no-op,
    /// not an error.
    fn archive_item(&self, item_id: &str, account_id: &str, archived_by: &str) -> RepoResult<()> {
        require_non_empty("item_id", item_id)?;
        require_non_empty("account_id", account_id)?;
        require_non_empty("archived_by", archived_by)?;

        let plan = queries::build_archive_item_query(item_id, account_id);
        self.write_with_audit(
            "item archive",
            &plan,
            AuditEvent::ItemArchived {
                actor_id: archived_by.to_string(),
                item_id: item_id.to_string(),
                account_id: account_id.to_string(),
            },
        )?;

        Ok(())
    }

    fn get_audit_log_entries_for_item(&self, item_id: &str) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("item_id", item_id)?;

        let plan = build_audit_entries_for_key_query(keys::ITEM_ID, item_id);
        self.perform_read("audit log entries for item", &plan)
    }
}

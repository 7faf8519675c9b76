//! Webhook repository contract and SQLite implementation.

use crate::model::audit::{keys, AuditEvent, AuditLogEntry, FieldChangeSummary};
use crate::model::filter::QueryFilter;
use crate::model::require_non_empty;
use crate::model::webhook::{split_list, Webhook, WebhookCreationInput};
use crate::query::audit::build_audit_entries_for_key_query;
use crate::query::webhooks as queries;
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for Webhook {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let events: String = row.get("events")?;
        let data_types: String = row.get("data_types")?;
        let topics: String = row.get("topics")?;

        Ok(Webhook {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            content_type: row.get("content_type")?,
            url: row.get("url")?,
            method: row.get("method")?,
            events: split_list(&events),
            data_types: split_list(&data_types),
            topics: split_list(&topics),
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
            belongs_to_account: row.get("belongs_to_account")?,
        })
    }
}

/// Repository interface for webhook CRUD operations.
pub trait WebhookStore {
    fn webhook_exists(&self, webhook_id: &str, account_id: &str) -> RepoResult<bool>;
    fn get_webhook(&self, webhook_id: &str, account_id: &str) -> RepoResult<Option<Webhook>>;
    fn get_all_webhooks_count(&self) -> RepoResult<u64>;
    fn get_batch_of_webhooks(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Webhook>>;
    fn get_webhooks(
        &self,
        account_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Webhook>>;
    fn get_webhooks_for_admin(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Webhook>>;
    fn create_webhook(
        &self,
        input: &WebhookCreationInput,
        created_by: &str,
    ) -> RepoResult<Webhook>;
    fn update_webhook(
        &self,
        webhook: &Webhook,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()>;
    fn archive_webhook(
        &self,
        webhook_id: &str,
        account_id: &str,
        archived_by: &str,
    ) -> RepoResult<()>;
    fn get_audit_log_entries_for_webhook(
        &self,
        webhook_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>>;
}

impl WebhookStore for SqliteQuerier {
    fn webhook_exists(&self, webhook_id: &str, account_id: &str) -> RepoResult<bool> {
        require_non_empty("webhook_id", webhook_id)?;
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_webhook_exists_query(webhook_id, account_id);
        self.perform_boolean_query(&plan)
    }

    fn get_webhook(&self, webhook_id: &str, account_id: &str) -> RepoResult<Option<Webhook>> {
        require_non_empty("webhook_id", webhook_id)?;
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_get_webhook_query(webhook_id, account_id);
        self.get_one("webhook fetch", &plan)
    }

    fn get_all_webhooks_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_webhooks_count_query();
        self.perform_count_query("webhook count", &plan)
    }

    fn get_batch_of_webhooks(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Webhook>> {
        let plan = queries::build_get_batch_of_webhooks_query(begin_id, end_id);
        self.perform_read("webhook batch fetch", &plan)
    }

    fn get_webhooks(
        &self,
        account_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Webhook>> {
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_get_webhooks_query(Some(account_id), false, filter);
        self.perform_read_with_counts("webhook list retrieval", &plan, filter)
    }

    fn get_webhooks_for_admin(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Webhook>> {
        let plan = queries::build_get_webhooks_query(None, true, filter);
        self.perform_read_with_counts("webhook list retrieval for admin", &plan, filter)
    }

    fn create_webhook(
        &self,
        input: &WebhookCreationInput,
        created_by: &str,
    ) -> RepoResult<Webhook> {
        input.validate()?;
        require_non_empty("created_by", created_by)?;

        let id = self.generate_id();
        let external_id = self.generate_id();
        let plan = queries::build_create_webhook_query(&id, &external_id, input);

        self.write_with_audit(
            "webhook creation",
            &plan,
            AuditEvent::WebhookCreated {
                actor_id: created_by.to_string(),
                webhook_id: id.clone(),
                account_id: input.belongs_to_account.clone(),
            },
        )?;

        Ok(Webhook {
            id,
            external_id,
            name: input.name.clone(),
            content_type: input.content_type.clone(),
            url: input.url.clone(),
            method: input.method.clone(),
            events: input.events.clone(),
            data_types: input.data_types.clone(),
            topics: input.topics.clone(),
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
            belongs_to_account: input.belongs_to_account.clone(),
        })
    }

    fn update_webhook(
        &self,
        webhook: &Webhook,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()> {
        webhook.validate()?;
        require_non_empty("changed_by", changed_by)?;

        let plan = queries::build_update_webhook_query(webhook);
        let outcome = self.write_with_audit(
            "webhook update",
            &plan,
            AuditEvent::WebhookUpdated {
                actor_id: changed_by.to_string(),
                webhook_id: webhook.id.clone(),
                account_id: webhook.belongs_to_account.clone(),
                changes,
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "webhook",
                id: webhook.id.clone(),
            }),
        }
    }

    /// Archiving an already-archived webhook is a no-op.
    fn archive_webhook(
        &self,
        webhook_id: &str,
        account_id: &str,
        archived_by: &str,
    ) -> RepoResult<()> {
        require_non_empty("webhook_id", webhook_id)?;
        require_non_empty("account_id", account_id)?;
        require_non_empty("archived_by", archived_by)?;

        let plan = queries::build_archive_webhook_query(webhook_id, account_id);
        self.write_with_audit(
            "webhook archive",
            &plan,
            AuditEvent::WebhookArchived {
                actor_id: archived_by.to_string(),
                webhook_id: webhook_id.to_string(),
                account_id: account_id.to_string(),
            },
        )?;

        Ok(())
    }

    fn get_audit_log_entries_for_webhook(
        &self,
        webhook_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("webhook_id", webhook_id)?;

        let plan = build_audit_entries_for_key_query(keys::WEBHOOK_ID, webhook_id);
        self.perform_read("audit log entries for webhook", &plan)
    }
}

//! API client repository contract and SQLite implementation.

use crate::model::api_client::{ApiClient, ApiClientCreationInput};
use crate::model::audit::{keys, AuditEvent, AuditLogEntry};
use crate::model::filter::QueryFilter;
use crate::model::require_non_empty;
use crate::query::api_clients as queries;
use crate::query::audit::build_audit_entries_for_key_query;
use crate::repo::{FromSqlRow, ListResult, RepoResult, SqliteQuerier};
use rusqlite::Row;

impl FromSqlRow for ApiClient {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(ApiClient {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            client_id: row.get("client_id")?,
            secret_key: row.get("secret_key")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
            belongs_to_user: row.get("belongs_to_user")?,
        })
    }
}

/// Repository interface for API client credentials.
pub trait ApiClientStore {
    fn get_api_client(&self, client_db_id: &str, user_id: &str) -> RepoResult<Option<ApiClient>>;
    /// Authentication-path lookup by the public client identifier.
    fn get_api_client_by_client_id(&self, client_id: &str) -> RepoResult<Option<ApiClient>>;
    fn get_all_api_clients_count(&self) -> RepoResult<u64>;
    fn get_batch_of_api_clients(&self, begin_id: u64, end_id: u64)
        -> RepoResult<Vec<ApiClient>>;
    fn get_api_clients(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<ApiClient>>;
    fn create_api_client(
        &self,
        input: &ApiClientCreationInput,
        created_by: &str,
    ) -> RepoResult<ApiClient>;
    fn archive_api_client(
        &self,
        client_db_id: &str,
        user_id: &str,
        archived_by: &str,
    ) -> RepoResult<()>;
    fn get_audit_log_entries_for_api_client(
        &self,
        client_db_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>>;
}

impl ApiClientStore for SqliteQuerier {
    fn get_api_client(&self, client_db_id: &str, user_id: &str) -> RepoResult<Option<ApiClient>> {
        require_non_empty("client_db_id", client_db_id)?;
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_api_client_query(client_db_id, user_id);
        self.get_one("api client fetch", &plan)
    }

    fn get_api_client_by_client_id(&self, client_id: &str) -> RepoResult<Option<ApiClient>> {
        require_non_empty("client_id", client_id)?;

        let plan = queries::build_get_api_client_by_client_id_query(client_id);
        self.get_one("api client fetch by client id", &plan)
    }

    fn get_all_api_clients_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_api_clients_count_query();
        self.perform_count_query("api client count", &plan)
    }

    fn get_batch_of_api_clients(
        &self,
        begin_id: u64,
        end_id: u64,
    ) -> RepoResult<Vec<ApiClient>> {
        let plan = queries::build_get_batch_of_api_clients_query(begin_id, end_id);
        self.perform_read("api client batch fetch", &plan)
    }

    fn get_api_clients(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<ApiClient>> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_api_clients_query(Some(user_id), false, filter);
        self.perform_read_with_counts("api client list retrieval", &plan, filter)
    }

    fn create_api_client(
        &self,
        input: &ApiClientCreationInput,
        created_by: &str,
    ) -> RepoResult<ApiClient> {
        input.validate()?;
        require_non_empty("created_by", created_by)?;

        let id = self.generate_id();
        let external_id = self.generate_id();
        let plan = queries::build_create_api_client_query(&id, &external_id, input);

        self.write_with_audit(
            "api client creation",
            &plan,
            AuditEvent::ApiClientCreated {
                actor_id: created_by.to_string(),
                api_client_id: id.clone(),
            },
        )?;

        Ok(ApiClient {
            id,
            external_id,
            name: input.name.clone(),
            client_id: input.client_id.clone(),
            secret_key: input.secret_key.clone(),
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
            belongs_to_user: input.belongs_to_user.clone(),
        })
    }

    /// Archiving an already-archived client is a no-op.
    fn archive_api_client(
        &self,
        client_db_id: &str,
        user_id: &str,
        archived_by: &str,
    ) -> RepoResult<()> {
        require_non_empty("client_db_id", client_db_id)?;
        require_non_empty("user_id", user_id)?;
        require_non_empty("archived_by", archived_by)?;

        let plan = queries::build_archive_api_client_query(client_db_id, user_id);
        self.write_with_audit(
            "api client archive",
            &plan,
            AuditEvent::ApiClientArchived {
                actor_id: archived_by.to_string(),
                api_client_id: client_db_id.to_string(),
            },
        )?;

        Ok(())
    }

    fn get_audit_log_entries_for_api_client(
        &self,
        client_db_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("client_db_id", client_db_id)?;

        let plan = build_audit_entries_for_key_query(keys::API_CLIENT_ID, client_db_id);
        self.perform_read("audit log entries for api client", &plan)
    }
}

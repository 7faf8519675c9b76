//! Account repository contract and SQLite implementation.
//!
//! # Invariants
//! - Creating an account grants the creator a full-permission membership
//!   in the same transaction.
//! - Archiving an account archives its memberships likewise.

use crate::model::account::{Account, AccountCreationInput};
use crate::model::audit::{keys, AuditEvent, AuditLogEntry, FieldChangeSummary};
use crate::model::filter::QueryFilter;
use crate::model::membership::AddUserToAccountInput;
use crate::model::permissions::AccountPermissions;
use crate::model::require_non_empty;
use crate::query::accounts as queries;
use crate::query::audit::build_audit_entries_for_key_query;
use crate::query::memberships;
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for Account {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Account {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            name: row.get("name")?,
            plan_id: row.get("plan_id")?,
            is_personal_account: row.get("is_personal_account")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
            belongs_to_user: row.get("belongs_to_user")?,
        })
    }
}

/// Repository interface for account CRUD operations.
pub trait AccountStore {
    fn account_exists(&self, account_id: &str, user_id: &str) -> RepoResult<bool>;
    fn get_account(&self, account_id: &str, user_id: &str) -> RepoResult<Option<Account>>;
    fn get_all_accounts_count(&self) -> RepoResult<u64>;
    fn get_batch_of_accounts(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Account>>;
    fn get_accounts(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Account>>;
    fn get_accounts_for_admin(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Account>>;
    fn create_account(&self, input: &AccountCreationInput, created_by: &str)
        -> RepoResult<Account>;
    fn update_account(
        &self,
        account: &Account,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()>;
    fn archive_account(
        &self,
        account_id: &str,
        user_id: &str,
        archived_by: &str,
    ) -> RepoResult<()>;
    fn get_audit_log_entries_for_account(
        &self,
        account_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>>;
}

impl AccountStore for SqliteQuerier {
    fn account_exists(&self, account_id: &str, user_id: &str) -> RepoResult<bool> {
        require_non_empty("account_id", account_id)?;
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_account_exists_query(account_id, user_id);
        self.perform_boolean_query(&plan)
    }

    fn get_account(&self, account_id: &str, user_id: &str) -> RepoResult<Option<Account>> {
        require_non_empty("account_id", account_id)?;
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_account_query(account_id, user_id);
        self.get_one("account fetch", &plan)
    }

    fn get_all_accounts_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_accounts_count_query();
        self.perform_count_query("account count", &plan)
    }

    fn get_batch_of_accounts(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<Account>> {
        let plan = queries::build_get_batch_of_accounts_query(begin_id, end_id);
        self.perform_read("account batch fetch", &plan)
    }

    fn get_accounts(
        &self,
        user_id: &str,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Account>> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_accounts_query(Some(user_id), false, filter);
        self.perform_read_with_counts("account list retrieval", &plan, filter)
    }

    fn get_accounts_for_admin(
        &self,
        filter: Option<&QueryFilter>,
    ) -> RepoResult<ListResult<Account>> {
        let plan = queries::build_get_accounts_query(None, true, filter);
        self.perform_read_with_counts("account list retrieval for admin", &plan, filter)
    }

    fn create_account(
        &self,
        input: &AccountCreationInput,
        created_by: &str,
    ) -> RepoResult<Account> {
        input.validate()?;
        require_non_empty("created_by", created_by)?;

        const OP: &str = "account creation";

        let account_id = self.generate_id();
        let account_external_id = self.generate_id();
        let membership_id = self.generate_id();
        let membership_external_id = self.generate_id();

        let membership_input = AddUserToAccountInput {
            user_id: input.belongs_to_user.clone(),
            account_id: account_id.clone(),
            user_account_permissions: AccountPermissions::account_owner().bits(),
            default_account: false,
            reason: String::new(),
        };

        let statements = [
            queries::build_create_account_query(&account_id, &account_external_id, input),
            memberships::build_create_membership_query(
                &membership_id,
                &membership_external_id,
                &membership_input,
            ),
        ];

        let tx = self.begin(OP)?;

        for plan in &statements {
            if let Err(err) = self.perform_write(&tx, OP, plan) {
                self.rollback(tx, OP);
                return Err(err);
            }
        }

        let event = AuditEvent::AccountCreated {
            actor_id: created_by.to_string(),
            account_id: account_id.clone(),
        };
        if let Err(err) = self.append_audit(&tx, event) {
            self.rollback(tx, OP);
            return Err(err);
        }

        self.commit(tx, OP)?;

        Ok(Account {
            id: account_id,
            external_id: account_external_id,
            name: input.name.clone(),
            plan_id: input.plan_id.clone(),
            is_personal_account: input.is_personal_account,
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
            belongs_to_user: input.belongs_to_user.clone(),
        })
    }

    fn update_account(
        &self,
        account: &Account,
        changed_by: &str,
        changes: Vec<FieldChangeSummary>,
    ) -> RepoResult<()> {
        account.validate()?;
        require_non_empty("changed_by", changed_by)?;

        let plan = queries::build_update_account_query(account);
        let outcome = self.write_with_audit(
            "account update",
            &plan,
            AuditEvent::AccountUpdated {
                actor_id: changed_by.to_string(),
                account_id: account.id.clone(),
                changes,
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "account",
                id: account.id.clone(),
            }),
        }
    }

    /// Archives an account and its memberships. A second archive of the
    /// same account is a no-op.
    fn archive_account(
        &self,
        account_id: &str,
        user_id: &str,
        archived_by: &str,
    ) -> RepoResult<()> {
        require_non_empty("account_id", account_id)?;
        require_non_empty("user_id", user_id)?;
        require_non_empty("archived_by", archived_by)?;

        const OP: &str = "account archive";

        let archive_account_plan = queries::build_archive_account_query(account_id, user_id);
        let archive_memberships_plan =
            memberships::build_archive_memberships_for_account_query(account_id);

        let tx = self.begin(OP)?;

        let affected = match self.perform_write(&tx, OP, &archive_account_plan) {
            Ok(affected) => affected,
            Err(err) => {
                self.rollback(tx, OP);
                return Err(err);
            }
        };

        if affected == 0 {
            self.rollback(tx, OP);
            return Ok(());
        }

        if let Err(err) = self.perform_write(&tx, OP, &archive_memberships_plan) {
            self.rollback(tx, OP);
            return Err(err);
        }

        let event = AuditEvent::AccountArchived {
            actor_id: archived_by.to_string(),
            account_id: account_id.to_string(),
        };
        if let Err(err) = self.append_audit(&tx, event) {
            self.rollback(tx, OP);
            return Err(err);
        }

        self.commit(tx, OP)
    }

    fn get_audit_log_entries_for_account(
        &self,
        account_id: &str,
    ) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("account_id", account_id)?;

        let plan = build_audit_entries_for_key_query(keys::ACCOUNT_ID, account_id);
        self.perform_read("audit log entries for account", &plan)
    }
}

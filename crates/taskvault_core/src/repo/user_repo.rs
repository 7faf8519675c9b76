//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide user lifecycle operations, including the personal account and
//!   default membership provisioned at registration.
//!
//! # Invariants
//! - User creation is one transaction: user row, personal account,
//!   default membership and both audit entries commit together or not at
//!   all.
//! - Archiving a user archives their memberships in the same transaction.

use crate::model::account::AccountCreationInput;
use crate::model::audit::{AuditEvent, AuditLogEntry};
use crate::model::filter::QueryFilter;
use crate::model::membership::AddUserToAccountInput;
use crate::model::permissions::AccountPermissions;
use crate::model::require_non_empty;
use crate::model::user::{User, UserCreationInput, UserReputation, UserReputationUpdateInput};
use crate::query::audit::build_audit_entries_for_user_query;
use crate::query::{accounts, memberships, users as queries};
use crate::repo::{FromSqlRow, ListResult, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for User {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let reputation_text: String = row.get("reputation")?;
        let reputation = UserReputation::parse(&reputation_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid reputation `{reputation_text}` in users.reputation"
            ))
        })?;

        Ok(User {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            username: row.get("username")?,
            hashed_password: row.get("hashed_password")?,
            requires_password_change: row.get("requires_password_change")?,
            two_factor_secret: row.get("two_factor_secret")?,
            two_factor_secret_verified_on: row.get("two_factor_secret_verified_on")?,
            service_admin_permissions: row.get("service_admin_permissions")?,
            reputation,
            reputation_explanation: row.get("reputation_explanation")?,
            avatar_src: row.get("avatar_src")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
        })
    }
}

/// Repository interface for user lifecycle operations.
pub trait UserStore {
    fn user_exists(&self, user_id: &str) -> RepoResult<bool>;
    fn get_user(&self, user_id: &str) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Prefix search over usernames, excluding archived users.
    fn search_users_by_username(&self, username_query: &str) -> RepoResult<Vec<User>>;
    fn get_all_users_count(&self) -> RepoResult<u64>;
    fn get_batch_of_users(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<User>>;
    fn get_users(&self, filter: Option<&QueryFilter>) -> RepoResult<ListResult<User>>;
    /// Registers a user along with their personal account and default
    /// membership.
    fn create_user(&self, input: &UserCreationInput) -> RepoResult<User>;
    fn update_user_reputation(
        &self,
        input: &UserReputationUpdateInput,
        changed_by: &str,
    ) -> RepoResult<()>;
    fn archive_user(&self, user_id: &str, archived_by: &str) -> RepoResult<()>;
    /// Returns entries naming the user as subject or actor.
    fn get_audit_log_entries_for_user(&self, user_id: &str) -> RepoResult<Vec<AuditLogEntry>>;
}

impl UserStore for SqliteQuerier {
    fn user_exists(&self, user_id: &str) -> RepoResult<bool> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_user_exists_query(user_id);
        self.perform_boolean_query(&plan)
    }

    fn get_user(&self, user_id: &str) -> RepoResult<Option<User>> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_user_query(user_id);
        self.get_one("user fetch", &plan)
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        require_non_empty("username", username)?;

        let plan = queries::build_get_user_by_username_query(username);
        self.get_one("user fetch by username", &plan)
    }

    fn search_users_by_username(&self, username_query: &str) -> RepoResult<Vec<User>> {
        require_non_empty("username_query", username_query)?;

        let plan = queries::build_search_users_by_username_query(username_query);
        self.perform_read("user search by username", &plan)
    }

    fn get_all_users_count(&self) -> RepoResult<u64> {
        let plan = queries::build_get_all_users_count_query();
        self.perform_count_query("user count", &plan)
    }

    fn get_batch_of_users(&self, begin_id: u64, end_id: u64) -> RepoResult<Vec<User>> {
        let plan = queries::build_get_batch_of_users_query(begin_id, end_id);
        self.perform_read("user batch fetch", &plan)
    }

    fn get_users(&self, filter: Option<&QueryFilter>) -> RepoResult<ListResult<User>> {
        let plan = queries::build_get_users_query(false, filter);
        self.perform_read_with_counts("user list retrieval", &plan, filter)
    }

    fn create_user(&self, input: &UserCreationInput) -> RepoResult<User> {
        input.validate()?;

        const OP: &str = "user creation";

        let user_id = self.generate_id();
        let user_external_id = self.generate_id();
        let account_id = self.generate_id();
        let account_external_id = self.generate_id();
        let membership_id = self.generate_id();
        let membership_external_id = self.generate_id();

        let account_input = AccountCreationInput::personal_for(&input.username, &user_id);
        let membership_input = AddUserToAccountInput {
            user_id: user_id.clone(),
            account_id: account_id.clone(),
            user_account_permissions: AccountPermissions::account_owner().bits(),
            default_account: true,
            reason: String::new(),
        };

        let statements = [
            queries::build_create_user_query(&user_id, &user_external_id, input),
            accounts::build_create_account_query(&account_id, &account_external_id, &account_input),
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

        let audits = [
            AuditEvent::UserCreated {
                user_id: user_id.clone(),
            },
            AuditEvent::AccountCreated {
                actor_id: user_id.clone(),
                account_id: account_id.clone(),
            },
        ];

        for event in audits {
            if let Err(err) = self.append_audit(&tx, event) {
                self.rollback(tx, OP);
                return Err(err);
            }
        }

        self.commit(tx, OP)?;

        Ok(User {
            id: user_id,
            external_id: user_external_id,
            username: input.username.clone(),
            hashed_password: input.hashed_password.clone(),
            requires_password_change: false,
            two_factor_secret: input.two_factor_secret.clone(),
            two_factor_secret_verified_on: None,
            service_admin_permissions: 0,
            reputation: UserReputation::Unverified,
            reputation_explanation: String::new(),
            avatar_src: None,
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
        })
    }

    fn update_user_reputation(
        &self,
        input: &UserReputationUpdateInput,
        changed_by: &str,
    ) -> RepoResult<()> {
        input.validate()?;
        require_non_empty("changed_by", changed_by)?;

        let plan = queries::build_update_user_reputation_query(input);
        let outcome = self.write_with_audit(
            "user reputation update",
            &plan,
            AuditEvent::UserReputationUpdated {
                actor_id: changed_by.to_string(),
                user_id: input.target_user_id.clone(),
                reputation: input.new_reputation.as_str().to_string(),
                reason: input.reason.clone(),
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "user",
                id: input.target_user_id.clone(),
            }),
        }
    }

    /// Archives a user and their memberships. Archiving an already-archived
    /// user is a no-op.
    fn archive_user(&self, user_id: &str, archived_by: &str) -> RepoResult<()> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("archived_by", archived_by)?;

        const OP: &str = "user archive";

        let archive_user_plan = queries::build_archive_user_query(user_id);
        let archive_memberships_plan =
            memberships::build_archive_memberships_for_user_query(user_id);

        let tx = self.begin(OP)?;

        let affected = match self.perform_write(&tx, OP, &archive_user_plan) {
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

        let event = AuditEvent::UserArchived {
            actor_id: archived_by.to_string(),
            user_id: user_id.to_string(),
        };
        if let Err(err) = self.append_audit(&tx, event) {
            self.rollback(tx, OP);
            return Err(err);
        }

        self.commit(tx, OP)
    }

    fn get_audit_log_entries_for_user(&self, user_id: &str) -> RepoResult<Vec<AuditLogEntry>> {
        require_non_empty("user_id", user_id)?;

        let plan = build_audit_entries_for_user_query(user_id);
        self.perform_read("audit log entries for user", &plan)
    }
}

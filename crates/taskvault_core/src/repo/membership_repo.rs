//! Account/user membership repository contract and SQLite implementation.

use crate::model::audit::AuditEvent;
use crate::model::membership::{AccountUserMembership, AddUserToAccountInput};
use crate::model::require_non_empty;
use crate::model::EntityId;
use crate::query::memberships as queries;
use crate::repo::{FromSqlRow, RepoError, RepoResult, SqliteQuerier, WriteOutcome};
use rusqlite::Row;

impl FromSqlRow for AccountUserMembership {
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(AccountUserMembership {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            belongs_to_user: row.get("belongs_to_user")?,
            belongs_to_account: row.get("belongs_to_account")?,
            user_account_permissions: row.get("user_account_permissions")?,
            default_account: row.get("default_account")?,
            created_on: row.get("created_on")?,
            last_updated_on: row.get("last_updated_on")?,
            archived_on: row.get("archived_on")?,
        })
    }
}

/// Repository interface for membership management.
pub trait MembershipStore {
    fn user_is_member_of_account(&self, user_id: &str, account_id: &str) -> RepoResult<bool>;
    fn get_default_account_id_for_user(&self, user_id: &str) -> RepoResult<Option<EntityId>>;
    fn get_memberships_for_user(
        &self,
        user_id: &str,
    ) -> RepoResult<Vec<AccountUserMembership>>;
    fn add_user_to_account(
        &self,
        input: &AddUserToAccountInput,
        added_by: &str,
    ) -> RepoResult<AccountUserMembership>;
    fn remove_user_from_account(
        &self,
        user_id: &str,
        account_id: &str,
        removed_by: &str,
        reason: &str,
    ) -> RepoResult<()>;
    /// Moves the user's default-account flag to the given account.
    fn mark_account_as_user_default(
        &self,
        user_id: &str,
        account_id: &str,
        changed_by: &str,
    ) -> RepoResult<()>;
}

impl MembershipStore for SqliteQuerier {
    fn user_is_member_of_account(&self, user_id: &str, account_id: &str) -> RepoResult<bool> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("account_id", account_id)?;

        let plan = queries::build_user_is_member_of_account_query(user_id, account_id);
        self.perform_boolean_query(&plan)
    }

    fn get_default_account_id_for_user(&self, user_id: &str) -> RepoResult<Option<EntityId>> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_default_account_id_for_user_query(user_id);
        self.get_one_text("default account fetch", &plan)
    }

    fn get_memberships_for_user(
        &self,
        user_id: &str,
    ) -> RepoResult<Vec<AccountUserMembership>> {
        require_non_empty("user_id", user_id)?;

        let plan = queries::build_get_memberships_for_user_query(user_id);
        self.perform_read("membership list retrieval", &plan)
    }

    fn add_user_to_account(
        &self,
        input: &AddUserToAccountInput,
        added_by: &str,
    ) -> RepoResult<AccountUserMembership> {
        input.validate()?;
        require_non_empty("added_by", added_by)?;

        let id = self.generate_id();
        let external_id = self.generate_id();
        let plan = queries::build_create_membership_query(&id, &external_id, input);

        self.write_with_audit(
            "membership creation",
            &plan,
            AuditEvent::UserAddedToAccount {
                actor_id: added_by.to_string(),
                user_id: input.user_id.clone(),
                account_id: input.account_id.clone(),
                reason: input.reason.clone(),
            },
        )?;

        Ok(AccountUserMembership {
            id,
            external_id,
            belongs_to_user: input.user_id.clone(),
            belongs_to_account: input.account_id.clone(),
            user_account_permissions: input.user_account_permissions,
            default_account: input.default_account,
            created_on: self.now(),
            last_updated_on: None,
            archived_on: None,
        })
    }

    /// Removing a user who is not a member is reported as not-found.
    fn remove_user_from_account(
        &self,
        user_id: &str,
        account_id: &str,
        removed_by: &str,
        reason: &str,
    ) -> RepoResult<()> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("account_id", account_id)?;
        require_non_empty("removed_by", removed_by)?;

        let plan = queries::build_remove_user_from_account_query(user_id, account_id);
        let outcome = self.write_with_audit(
            "membership removal",
            &plan,
            AuditEvent::UserRemovedFromAccount {
                actor_id: removed_by.to_string(),
                user_id: user_id.to_string(),
                account_id: account_id.to_string(),
                reason: reason.to_string(),
            },
        )?;

        match outcome {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::NoRows => Err(RepoError::NotFound {
                entity: "membership",
                id: format!("{user_id}/{account_id}"),
            }),
        }
    }

    fn mark_account_as_user_default(
        &self,
        user_id: &str,
        account_id: &str,
        changed_by: &str,
    ) -> RepoResult<()> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("account_id", account_id)?;
        require_non_empty("changed_by", changed_by)?;

        const OP: &str = "default account change";

        let clear_plan = queries::build_clear_default_account_query(user_id);
        let set_plan = queries::build_set_default_account_query(user_id, account_id);

        let tx = self.begin(OP)?;

        if let Err(err) = self.perform_write(&tx, OP, &clear_plan) {
            self.rollback(tx, OP);
            return Err(err);
        }

        let affected = match self.perform_write(&tx, OP, &set_plan) {
            Ok(affected) => affected,
            Err(err) => {
                self.rollback(tx, OP);
                return Err(err);
            }
        };

        // No live membership for the pair: undo the cleared flags too.
        if affected == 0 {
            self.rollback(tx, OP);
            return Err(RepoError::NotFound {
                entity: "membership",
                id: format!("{user_id}/{account_id}"),
            });
        }

        let event = AuditEvent::AccountMarkedAsDefault {
            actor_id: changed_by.to_string(),
            user_id: user_id.to_string(),
            account_id: account_id.to_string(),
        };
        if let Err(err) = self.append_audit(&tx, event) {
            self.rollback(tx, OP);
            return Err(err);
        }

        self.commit(tx, OP)
    }
}

//! Static per-entity table metadata.
//!
//! # Responsibility
//! - Name every table, its qualified column list, and its ownership column
//!   in exactly one place.
//!
//! # Invariants
//! - Column lists are ordered and unique; scan functions read fields in
//!   this exact order.
//! - `ownership_column` is the tenant-scoping foreign key; tables without
//!   one (users, plans, audit log) are admin- or catalog-scoped.

/// Common column names shared by every entity table.
pub const ID_COLUMN: &str = "id";
pub const EXTERNAL_ID_COLUMN: &str = "external_id";
pub const CREATED_ON_COLUMN: &str = "created_on";
pub const LAST_UPDATED_ON_COLUMN: &str = "last_updated_on";
pub const ARCHIVED_ON_COLUMN: &str = "archived_on";

/// Ownership column names.
pub const USER_OWNERSHIP_COLUMN: &str = "belongs_to_user";
pub const ACCOUNT_OWNERSHIP_COLUMN: &str = "belongs_to_account";

/// Static description of one entity table.
#[derive(Debug, Clone, Copy)]
pub struct TableMetadata {
    pub name: &'static str,
    /// Qualified column names in scan order.
    pub columns: &'static [&'static str],
    /// Tenant-scoping column, if the table has one.
    pub ownership_column: Option<&'static str>,
    /// Whether the table carries `archived_on` soft-delete state.
    pub soft_deletes: bool,
    /// Key column for bucketed batch scans. Text-keyed tables range over
    /// SQLite's implicit `rowid`; the integer-keyed audit log uses `id`.
    pub batch_key_column: &'static str,
}

impl TableMetadata {
    /// Returns `table.column` for a column of this table.
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{column}", self.name)
    }

    pub fn id_column(&self) -> String {
        self.qualified(ID_COLUMN)
    }

    pub fn created_on_column(&self) -> String {
        self.qualified(CREATED_ON_COLUMN)
    }

    pub fn last_updated_on_column(&self) -> String {
        self.qualified(LAST_UPDATED_ON_COLUMN)
    }

    pub fn archived_on_column(&self) -> String {
        self.qualified(ARCHIVED_ON_COLUMN)
    }
}

pub const ITEMS: TableMetadata = TableMetadata {
    name: "items",
    columns: &[
        "items.id",
        "items.external_id",
        "items.name",
        "items.details",
        "items.created_on",
        "items.last_updated_on",
        "items.archived_on",
        "items.belongs_to_account",
    ],
    ownership_column: Some(ACCOUNT_OWNERSHIP_COLUMN),
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const USERS: TableMetadata = TableMetadata {
    name: "users",
    columns: &[
        "users.id",
        "users.external_id",
        "users.username",
        "users.hashed_password",
        "users.requires_password_change",
        "users.two_factor_secret",
        "users.two_factor_secret_verified_on",
        "users.service_admin_permissions",
        "users.reputation",
        "users.reputation_explanation",
        "users.avatar_src",
        "users.created_on",
        "users.last_updated_on",
        "users.archived_on",
    ],
    ownership_column: None,
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const ACCOUNTS: TableMetadata = TableMetadata {
    name: "accounts",
    columns: &[
        "accounts.id",
        "accounts.external_id",
        "accounts.name",
        "accounts.plan_id",
        "accounts.is_personal_account",
        "accounts.created_on",
        "accounts.last_updated_on",
        "accounts.archived_on",
        "accounts.belongs_to_user",
    ],
    ownership_column: Some(USER_OWNERSHIP_COLUMN),
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const ACCOUNT_USER_MEMBERSHIPS: TableMetadata = TableMetadata {
    name: "account_user_memberships",
    columns: &[
        "account_user_memberships.id",
        "account_user_memberships.external_id",
        "account_user_memberships.belongs_to_user",
        "account_user_memberships.belongs_to_account",
        "account_user_memberships.user_account_permissions",
        "account_user_memberships.default_account",
        "account_user_memberships.created_on",
        "account_user_memberships.last_updated_on",
        "account_user_memberships.archived_on",
    ],
    ownership_column: Some(ACCOUNT_OWNERSHIP_COLUMN),
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const WEBHOOKS: TableMetadata = TableMetadata {
    name: "webhooks",
    columns: &[
        "webhooks.id",
        "webhooks.external_id",
        "webhooks.name",
        "webhooks.content_type",
        "webhooks.url",
        "webhooks.method",
        "webhooks.events",
        "webhooks.data_types",
        "webhooks.topics",
        "webhooks.created_on",
        "webhooks.last_updated_on",
        "webhooks.archived_on",
        "webhooks.belongs_to_account",
    ],
    ownership_column: Some(ACCOUNT_OWNERSHIP_COLUMN),
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const API_CLIENTS: TableMetadata = TableMetadata {
    name: "api_clients",
    columns: &[
        "api_clients.id",
        "api_clients.external_id",
        "api_clients.name",
        "api_clients.client_id",
        "api_clients.secret_key",
        "api_clients.created_on",
        "api_clients.last_updated_on",
        "api_clients.archived_on",
        "api_clients.belongs_to_user",
    ],
    ownership_column: Some(USER_OWNERSHIP_COLUMN),
    soft_deletes: true,
    batch_key_column: "rowid",
};

pub const ACCOUNT_SUBSCRIPTION_PLANS: TableMetadata = TableMetadata {
    name: "account_subscription_plans",
    columns: &[
        "account_subscription_plans.id",
        "account_subscription_plans.external_id",
        "account_subscription_plans.name",
        "account_subscription_plans.description",
        "account_subscription_plans.price",
        "account_subscription_plans.period",
        "account_subscription_plans.created_on",
        "account_subscription_plans.last_updated_on",
        "account_subscription_plans.archived_on",
    ],
    ownership_column: None,
    soft_deletes: true,
    batch_key_column: "rowid",
};

/// The audit log is append-only: no external id, no soft deletes, and a
/// monotone integer key used directly for batch export ranges.
pub const AUDIT_LOG: TableMetadata = TableMetadata {
    name: "audit_log",
    columns: &[
        "audit_log.id",
        "audit_log.event_type",
        "audit_log.context",
        "audit_log.created_on",
    ],
    ownership_column: None,
    soft_deletes: false,
    batch_key_column: "id",
};

/// Audit-log columns referenced outside the column list.
pub const AUDIT_CONTEXT_COLUMN: &str = "context";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: &[&TableMetadata] = &[
        &ITEMS,
        &USERS,
        &ACCOUNTS,
        &ACCOUNT_USER_MEMBERSHIPS,
        &WEBHOOKS,
        &API_CLIENTS,
        &ACCOUNT_SUBSCRIPTION_PLANS,
        &AUDIT_LOG,
    ];

    #[test]
    fn every_column_is_qualified_with_its_table_name() {
        for table in ALL {
            for column in table.columns {
                assert!(
                    column.starts_with(&format!("{}.", table.name)),
                    "{column} is not qualified with {}",
                    table.name
                );
            }
        }
    }

    #[test]
    fn column_lists_are_unique() {
        for table in ALL {
            let unique: HashSet<_> = table.columns.iter().collect();
            assert_eq!(unique.len(), table.columns.len(), "{}", table.name);
        }
    }

    #[test]
    fn soft_deleting_tables_carry_the_archived_column() {
        for table in ALL {
            let has_archived = table
                .columns
                .contains(&table.archived_on_column().as_str());
            assert_eq!(has_archived, table.soft_deletes, "{}", table.name);
        }
    }
}

//! Permission bitmasks for service administration and account membership.
//!
//! Stored as integer columns; the named flags below are the only bits the
//! application ever sets.

use bitflags::bitflags;

bitflags! {
    /// Site-wide administrative capabilities attached to a user.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ServiceAdminPermissions: i64 {
        const CYCLE_COOKIE_SECRET = 1 << 0;
        const BAN_USERS = 1 << 1;
        const TERMINATE_ACCOUNTS = 1 << 2;
        const IMPERSONATE_USERS = 1 << 3;
        const MANAGE_SUBSCRIPTION_PLANS = 1 << 4;
        const READ_AUDIT_LOG = 1 << 5;
    }
}

bitflags! {
    /// Capabilities a user holds within a single account.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct AccountPermissions: i64 {
        const MANAGE_ITEMS = 1 << 0;
        const MANAGE_WEBHOOKS = 1 << 1;
        const MANAGE_API_CLIENTS = 1 << 2;
        const MANAGE_MEMBERS = 1 << 3;
        const READ_ACCOUNT_AUDIT_LOG = 1 << 4;
    }
}

impl ServiceAdminPermissions {
    /// Reconstructs a mask from its stored integer form, dropping unknown bits.
    pub fn from_stored(bits: i64) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl AccountPermissions {
    /// Full capability set granted to the creator of an account.
    pub fn account_owner() -> Self {
        Self::all()
    }

    /// Reconstructs a mask from its stored integer form, dropping unknown bits.
    pub fn from_stored(bits: i64) -> Self {
        Self::from_bits_truncate(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountPermissions, ServiceAdminPermissions};

    #[test]
    fn stored_roundtrip_preserves_known_bits() {
        let mask = AccountPermissions::MANAGE_ITEMS | AccountPermissions::MANAGE_MEMBERS;
        assert_eq!(AccountPermissions::from_stored(mask.bits()), mask);
    }

    #[test]
    fn unknown_bits_are_dropped_on_load() {
        let loaded = ServiceAdminPermissions::from_stored(i64::MAX);
        assert_eq!(loaded, ServiceAdminPermissions::all());
    }
}

use proptest::option;
use proptest::prelude::*;
use rusqlite::params_from_iter;
use taskvault_core::model::filter::{QueryFilter, SortOrder};
use taskvault_core::query::generic::{
    build_all_count_query, build_batch_range_query, build_list_query,
};
use taskvault_core::query::registry::{
    TableMetadata, ACCOUNTS, ACCOUNT_SUBSCRIPTION_PLANS, ACCOUNT_USER_MEMBERSHIPS, API_CLIENTS,
    AUDIT_LOG, ITEMS, USERS, WEBHOOKS,
};
use taskvault_core::query::{items, users, webhooks};
use taskvault_core::{
    ItemCreationInput, ItemStore, MembershipStore, SqliteQuerier, UserCreationInput, UserStore,
};

const TABLES: &[&TableMetadata] = &[
    &ITEMS,
    &USERS,
    &ACCOUNTS,
    &ACCOUNT_USER_MEMBERSHIPS,
    &WEBHOOKS,
    &API_CLIENTS,
    &ACCOUNT_SUBSCRIPTION_PLANS,
    &AUDIT_LOG,
];

fn filter_strategy() -> impl Strategy<Value = QueryFilter> {
    (
        0u64..500,
        any::<u8>(),
        prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)],
        option::of(0u64..4_000_000_000),
        option::of(0u64..4_000_000_000),
        option::of(0u64..4_000_000_000),
        option::of(0u64..4_000_000_000),
        any::<bool>(),
    )
        .prop_map(
            |(page, limit, sort, created_after, created_before, updated_after, updated_before, include_archived)| {
                QueryFilter {
                    page,
                    limit,
                    sort,
                    created_after,
                    created_before,
                    updated_after,
                    updated_before,
                    include_archived,
                }
            },
        )
}

proptest! {
    #[test]
    fn list_queries_keep_placeholder_argument_parity(
        table_index in 0..TABLES.len(),
        owner in option::of("[a-z0-9]{1,12}"),
        for_admin in any::<bool>(),
        filter in option::of(filter_strategy()),
    ) {
        let table = TABLES[table_index];
        let plan = build_list_query(table, owner.as_deref(), for_admin, filter.as_ref());

        prop_assert!(!plan.query.is_empty());
        prop_assert_eq!(plan.placeholder_count(), plan.args.len());
    }

    #[test]
    fn count_and_batch_queries_keep_parity(
        table_index in 0..TABLES.len(),
        begin in 0u64..1_000_000,
        width in 1u64..10_000,
    ) {
        let table = TABLES[table_index];

        let count = build_all_count_query(table);
        prop_assert_eq!(count.placeholder_count(), count.args.len());

        let batch = build_batch_range_query(table, begin, begin + width);
        prop_assert_eq!(batch.placeholder_count(), batch.args.len());
        prop_assert_eq!(batch.args.len(), 2);
    }

    #[test]
    fn point_query_builders_keep_parity(
        entity_id in "[a-z0-9-]{1,24}",
        scope_id in "[a-z0-9-]{1,24}",
    ) {
        let plans = [
            items::build_item_exists_query(&entity_id, &scope_id),
            items::build_get_item_query(&entity_id, &scope_id),
            items::build_archive_item_query(&entity_id, &scope_id),
            users::build_user_exists_query(&entity_id),
            users::build_get_user_query(&entity_id),
            users::build_archive_user_query(&entity_id),
            webhooks::build_get_webhook_query(&entity_id, &scope_id),
            webhooks::build_archive_webhook_query(&entity_id, &scope_id),
        ];

        for plan in plans {
            prop_assert!(!plan.query.is_empty());
            prop_assert_eq!(plan.placeholder_count(), plan.args.len());
        }
    }
}

fn seeded_querier() -> (SqliteQuerier, String, String) {
    let q = SqliteQuerier::open_in_memory().unwrap();
    let user = q
        .create_user(&UserCreationInput {
            username: "prop-owner".to_string(),
            hashed_password: "hashed".to_string(),
            two_factor_secret: "secret".to_string(),
        })
        .unwrap();
    let account_id = q
        .get_default_account_id_for_user(&user.id)
        .unwrap()
        .unwrap();

    for i in 0..5 {
        let input = ItemCreationInput {
            name: format!("item {i}"),
            details: String::new(),
            belongs_to_account: account_id.clone(),
        };
        q.create_item(&input, &user.id).unwrap();
    }

    (q, user.id, account_id)
}

proptest! {
    // Each case opens and seeds its own database; keep the case count low.
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// The scanner trusts the first row's counts; this pins the other half
    /// of that contract, uniformity across every returned row, for
    /// arbitrary filters.
    #[test]
    fn list_rows_carry_uniform_counts_for_any_filter(filter in filter_strategy()) {
        let (q, _user_id, account_id) = seeded_querier();

        let plan = items::build_get_items_query(Some(&account_id), false, Some(&filter));
        let conn = q.connection();
        let mut stmt = conn.prepare(&plan.query).unwrap();
        let mut rows = stmt.query(params_from_iter(plan.args.iter())).unwrap();

        let mut seen: Vec<(u64, u64)> = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            let total: u64 = row.get("total_count").unwrap();
            let filtered: u64 = row.get("filtered_count").unwrap();
            seen.push((total, filtered));
        }

        if let Some(first) = seen.first() {
            prop_assert!(seen.iter().all(|counts| counts == first));
            prop_assert!(first.1 <= first.0);
        }

        let result = q.get_items(&account_id, Some(&filter)).unwrap();
        prop_assert!(result.filtered_count <= result.total_count);
        prop_assert!(result.rows.len() as u64 <= result.filtered_count);
    }
}

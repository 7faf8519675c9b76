use rusqlite::params_from_iter;
use taskvault_core::query::items::build_get_items_query;
use taskvault_core::{
    ItemCreationInput, ItemStore, MembershipStore, QueryFilter, SortOrder, SqliteQuerier,
    UserCreationInput, UserStore,
};

fn querier() -> SqliteQuerier {
    SqliteQuerier::open_in_memory().unwrap()
}

fn seed_user_and_account(q: &SqliteQuerier, username: &str) -> (String, String) {
    let user = q
        .create_user(&UserCreationInput {
            username: username.to_string(),
            hashed_password: "hashed".to_string(),
            two_factor_secret: "secret".to_string(),
        })
        .unwrap();
    let account_id = q
        .get_default_account_id_for_user(&user.id)
        .unwrap()
        .unwrap();
    (user.id, account_id)
}

fn seed_items(q: &SqliteQuerier, user_id: &str, account_id: &str, count: usize) {
    for i in 0..count {
        let input = ItemCreationInput {
            name: format!("item {i}"),
            details: String::new(),
            belongs_to_account: account_id.to_string(),
        };
        q.create_item(&input, user_id).unwrap();
    }
}

#[test]
fn nil_filter_returns_everything_with_true_counts() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 7);

    let result = q.get_items(&account_id, None).unwrap();

    assert_eq!(result.rows.len(), 7);
    assert_eq!(result.total_count, 7);
    assert_eq!(result.filtered_count, 7);
}

#[test]
fn pagination_bounds_the_page_and_keeps_counts() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 9);

    let filter = QueryFilter {
        page: 2,
        limit: 4,
        ..QueryFilter::default()
    };
    let result = q.get_items(&account_id, Some(&filter)).unwrap();

    assert_eq!(result.page, 2);
    assert_eq!(result.limit, 4);
    assert_eq!(result.rows.len(), 4);
    assert_eq!(result.total_count, 9);
    assert_eq!(result.filtered_count, 9);

    let last_page = QueryFilter {
        page: 3,
        limit: 4,
        ..QueryFilter::default()
    };
    let result = q.get_items(&account_id, Some(&last_page)).unwrap();
    assert_eq!(result.rows.len(), 1);
    assert!(result.rows.len() as u64 <= result.filtered_count);
}

#[test]
fn time_bounds_narrow_the_filtered_count_only() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 3);

    let far_future = QueryFilter {
        created_after: Some(4_000_000_000),
        ..QueryFilter::default()
    };
    let result = q.get_items(&account_id, Some(&far_future)).unwrap();
    assert!(result.rows.is_empty());

    let wide_open = QueryFilter {
        created_after: Some(0),
        created_before: Some(4_000_000_000),
        ..QueryFilter::default()
    };
    let result = q.get_items(&account_id, Some(&wide_open)).unwrap();
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.total_count, 3);
    assert_eq!(result.filtered_count, 3);
    assert!(result.filtered_count <= result.total_count);
}

#[test]
fn archived_rows_vanish_from_tenant_lists_but_stay_counted_for_admin() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 4);

    let victim = q.get_items(&account_id, None).unwrap().rows[0].clone();
    q.archive_item(&victim.id, &account_id, &user_id).unwrap();

    let tenant_view = q.get_items(&account_id, None).unwrap();
    assert_eq!(tenant_view.rows.len(), 3);
    assert!(tenant_view.rows.iter().all(|item| item.id != victim.id));

    let include_archived = QueryFilter {
        include_archived: true,
        ..QueryFilter::default()
    };
    let admin_view = q.get_items_for_admin(Some(&include_archived)).unwrap();
    assert_eq!(admin_view.rows.len(), 4);
    assert!(admin_view.rows.iter().any(|item| item.id == victim.id));

    // The flag does nothing for tenant-scoped reads.
    let tenant_with_flag = q.get_items(&account_id, Some(&include_archived)).unwrap();
    assert_eq!(tenant_with_flag.rows.len(), 3);
}

#[test]
fn sort_order_follows_the_filter() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 3);

    let ascending = q.get_items(&account_id, None).unwrap().rows;
    let descending = q
        .get_items(
            &account_id,
            Some(&QueryFilter {
                sort: SortOrder::Descending,
                limit: 0,
                ..QueryFilter::default()
            }),
        )
        .unwrap()
        .rows;

    // Identifiers are time-sortable, so creation order is id order.
    let mut reversed = descending.clone();
    reversed.reverse();
    let ascending_ids: Vec<_> = ascending.iter().map(|i| i.id.clone()).collect();
    let reversed_ids: Vec<_> = reversed.iter().map(|i| i.id.clone()).collect();
    assert_eq!(ascending_ids, reversed_ids);
}

#[test]
fn every_row_carries_identical_count_columns() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");
    seed_items(&q, &user_id, &account_id, 6);

    let plan = build_get_items_query(Some(&account_id), false, Some(&QueryFilter::default()));

    let conn = q.connection();
    let mut stmt = conn.prepare(&plan.query).unwrap();
    let mut rows = stmt.query(params_from_iter(plan.args.iter())).unwrap();

    let mut seen = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let total: u64 = row.get("total_count").unwrap();
        let filtered: u64 = row.get("filtered_count").unwrap();
        seen.push((total, filtered));
    }

    assert_eq!(seen.len(), 6);
    assert!(seen.iter().all(|counts| *counts == seen[0]));
    assert_eq!(seen[0], (6, 6));
}

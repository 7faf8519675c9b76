use taskvault_core::{
    Item, ItemCreationInput, ItemStore, MembershipStore, RepoError, SqliteQuerier,
    UserCreationInput, UserStore, ValidationError,
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

fn item_input(account_id: &str) -> ItemCreationInput {
    ItemCreationInput {
        name: "buy groceries".to_string(),
        details: "milk and eggs".to_string(),
        belongs_to_account: account_id.to_string(),
    }
}

#[test]
fn create_and_get_roundtrip() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let created = q.create_item(&item_input(&account_id), &user_id).unwrap();

    let loaded = q.get_item(&created.id, &account_id).unwrap().unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.external_id, created.external_id);
    assert_eq!(loaded.name, "buy groceries");
    assert_eq!(loaded.details, "milk and eggs");
    assert_eq!(loaded.belongs_to_account, account_id);
    assert!(loaded.created_on > 0);
    assert!(loaded.is_active());
}

#[test]
fn item_exists_reflects_visibility() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    assert!(!q.item_exists("missing", &account_id).unwrap());

    let created = q.create_item(&item_input(&account_id), &user_id).unwrap();
    assert!(q.item_exists(&created.id, &account_id).unwrap());
}

#[test]
fn items_are_scoped_to_their_account() {
    let q = querier();
    let (alice_id, alice_account) = seed_user_and_account(&q, "alice");
    let (_bob_id, bob_account) = seed_user_and_account(&q, "bob");

    let created = q.create_item(&item_input(&alice_account), &alice_id).unwrap();

    assert!(q.get_item(&created.id, &bob_account).unwrap().is_none());
    assert!(!q.item_exists(&created.id, &bob_account).unwrap());
}

#[test]
fn update_existing_item() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let mut item = q.create_item(&item_input(&account_id), &user_id).unwrap();
    item.name = "buy more groceries".to_string();

    q.update_item(&item, &user_id, Vec::new()).unwrap();

    let loaded = q.get_item(&item.id, &account_id).unwrap().unwrap();
    assert_eq!(loaded.name, "buy more groceries");
    assert!(loaded.last_updated_on.is_some());
}

#[test]
fn update_missing_item_returns_not_found() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let ghost = Item {
        id: "nope".to_string(),
        name: "ghost".to_string(),
        belongs_to_account: account_id,
        ..Item::default()
    };

    let err = q.update_item(&ghost, &user_id, Vec::new()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "item", .. }));
}

#[test]
fn archived_item_disappears_from_reads() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let created = q.create_item(&item_input(&account_id), &user_id).unwrap();
    q.archive_item(&created.id, &account_id, &user_id).unwrap();

    assert!(q.get_item(&created.id, &account_id).unwrap().is_none());
    assert!(!q.item_exists(&created.id, &account_id).unwrap());
}

#[test]
fn archive_is_idempotent() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let created = q.create_item(&item_input(&account_id), &user_id).unwrap();
    q.archive_item(&created.id, &account_id, &user_id).unwrap();
    q.archive_item(&created.id, &account_id, &user_id).unwrap();

    assert!(q.get_item(&created.id, &account_id).unwrap().is_none());
}

#[test]
fn validation_failures_block_before_the_database() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let blank_name = ItemCreationInput {
        name: "  ".to_string(),
        details: String::new(),
        belongs_to_account: account_id.clone(),
    };
    let err = q.create_item(&blank_name, &user_id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField { field: "name" })
    ));

    let err = q.get_item("", &account_id).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = q.archive_item("some-item", "", &user_id).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn batch_scan_walks_every_live_item() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    for i in 0..5 {
        let input = ItemCreationInput {
            name: format!("item {i}"),
            details: String::new(),
            belongs_to_account: account_id.clone(),
        };
        q.create_item(&input, &user_id).unwrap();
    }

    let batch = q.get_batch_of_items(0, 100).unwrap();
    assert_eq!(batch.len(), 5);

    assert_eq!(q.get_all_items_count().unwrap(), 5);
}

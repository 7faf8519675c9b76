use serde_json::json;
use taskvault_core::model::audit::keys;
use taskvault_core::{
    ApiClientCreationInput, ApiClientStore, MembershipStore, PlanCreationInput, PlanStore,
    QueryFilter, SqliteQuerier, UserCreationInput, UserStore, WebhookCreationInput, WebhookStore,
    WebhookUpdateInput,
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

fn webhook_input(account_id: &str) -> WebhookCreationInput {
    WebhookCreationInput {
        name: "item feed".to_string(),
        content_type: "application/json".to_string(),
        url: "https://example.com/hook".to_string(),
        method: "POST".to_string(),
        events: vec!["create".to_string(), "update".to_string()],
        data_types: vec!["item".to_string()],
        topics: Vec::new(),
        belongs_to_account: account_id.to_string(),
    }
}

#[test]
fn webhook_roundtrip_preserves_subscription_lists() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let created = q.create_webhook(&webhook_input(&account_id), &user_id).unwrap();

    let loaded = q.get_webhook(&created.id, &account_id).unwrap().unwrap();
    assert_eq!(loaded.events, vec!["create", "update"]);
    assert_eq!(loaded.data_types, vec!["item"]);
    assert!(loaded.topics.is_empty());
    assert!(q.webhook_exists(&created.id, &account_id).unwrap());

    let listed = q.get_webhooks(&account_id, Some(&QueryFilter::default())).unwrap();
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.total_count, 1);
    assert_eq!(listed.filtered_count, 1);
}

#[test]
fn webhook_updates_feed_field_changes_into_the_trail() {
    let q = querier();
    let (user_id, account_id) = seed_user_and_account(&q, "alice");

    let mut webhook = q.create_webhook(&webhook_input(&account_id), &user_id).unwrap();

    let changes = webhook.apply_update(&WebhookUpdateInput {
        name: webhook.name.clone(),
        url: "https://example.com/v2/hook".to_string(),
        method: webhook.method.clone(),
        events: webhook.events.clone(),
    });
    assert_eq!(changes.len(), 1);

    q.update_webhook(&webhook, &user_id, changes).unwrap();
    q.archive_webhook(&webhook.id, &account_id, &user_id).unwrap();

    let trail = q.get_audit_log_entries_for_webhook(&webhook.id).unwrap();
    let event_types: Vec<_> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        event_types,
        vec!["webhook_created", "webhook_updated", "webhook_archived"]
    );

    let update_entry = &trail[1];
    let recorded = update_entry.context[keys::CHANGES].as_array().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["field_name"], "url");

    assert!(q.get_webhook(&webhook.id, &account_id).unwrap().is_none());
}

#[test]
fn api_clients_authenticate_by_public_client_id() {
    let q = querier();
    let (user_id, _account_id) = seed_user_and_account(&q, "alice");

    let created = q
        .create_api_client(
            &ApiClientCreationInput {
                name: "automation".to_string(),
                client_id: "cid-abc123".to_string(),
                secret_key: b"super-secret".to_vec(),
                belongs_to_user: user_id.clone(),
            },
            &user_id,
        )
        .unwrap();

    let by_client_id = q
        .get_api_client_by_client_id("cid-abc123")
        .unwrap()
        .unwrap();
    assert_eq!(by_client_id.id, created.id);
    assert_eq!(by_client_id.secret_key, b"super-secret".to_vec());

    q.archive_api_client(&created.id, &user_id, &user_id).unwrap();
    assert!(q.get_api_client_by_client_id("cid-abc123").unwrap().is_none());

    let trail = q.get_audit_log_entries_for_api_client(&created.id).unwrap();
    let event_types: Vec<_> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(event_types, vec!["api_client_created", "api_client_archived"]);
}

#[test]
fn plans_form_a_global_catalog_with_an_audited_lifecycle() {
    let q = querier();
    let (admin_id, _account_id) = seed_user_and_account(&q, "root");

    let mut plan = q
        .create_plan(
            &PlanCreationInput {
                name: "starter".to_string(),
                description: "one account".to_string(),
                price: 900,
                period: "720h0m0s".to_string(),
            },
            &admin_id,
        )
        .unwrap();

    let listed = q.get_plans(Some(&QueryFilter::default())).unwrap();
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.total_count, 1);

    plan.price = 1200;
    q.update_plan(&plan, &admin_id, Vec::new()).unwrap();
    let loaded = q.get_plan(&plan.id).unwrap().unwrap();
    assert_eq!(loaded.price, 1200);

    q.archive_plan(&plan.id, &admin_id).unwrap();
    assert!(q.get_plan(&plan.id).unwrap().is_none());
    assert_eq!(q.get_all_plans_count().unwrap(), 0);

    let trail = q.get_audit_log_entries_for_plan(&plan.id).unwrap();
    let event_types: Vec<_> = trail.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        event_types,
        vec![
            "account_subscription_plan_created",
            "account_subscription_plan_updated",
            "account_subscription_plan_archived"
        ]
    );
    assert!(trail
        .iter()
        .all(|e| e.context[keys::ACTOR_ID] == json!(admin_id)));
}

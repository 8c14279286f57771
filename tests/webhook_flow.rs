//! Integration tests for the webhook endpoint.
//!
//! These tests drive the full router with in-memory adapters:
//! 1. Signed deliveries reconcile records and identity groups
//! 2. Forged or unsigned deliveries are rejected without writes
//! 3. Unhandled event types are acknowledged

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_reconciler::adapters::http::{app_router, WebhookAppState};
use billing_reconciler::adapters::identity::InMemoryIdentityGroups;
use billing_reconciler::adapters::memory::{InMemoryUserRecordStore, StaticPlanCatalog};
use billing_reconciler::adapters::notify::{RecordingAlertPublisher, RecordingEmailSender};
use billing_reconciler::adapters::stripe::MockBillingProvider;
use billing_reconciler::application::handlers::billing::{
    NotificationSettings, Notifier, UserLocks,
};
use billing_reconciler::domain::billing::{
    sign_payload, PlanGroup, PlanRecord, ReconcilePolicy, StripeWebhookVerifier,
    SubscriptionStatus, UserSubscriptionRecord,
};
use billing_reconciler::domain::foundation::UserId;
use billing_reconciler::ports::ProviderSubscription;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "whsec_integration";

struct TestApp {
    router: Router,
    users: Arc<InMemoryUserRecordStore>,
    identity: InMemoryIdentityGroups,
    alerts: RecordingAlertPublisher,
    email: RecordingEmailSender,
}

async fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRecordStore::new());
    let mut record = UserSubscriptionRecord::onboarded(
        UserId::new("user-1").unwrap(),
        Some("ada@example.com".to_string()),
    );
    record.identity_username = Some("ada".to_string());
    record.billing_customer_id = Some("cus_1".to_string());
    users.insert(record).await;

    let billing = MockBillingProvider::new();
    billing.add_subscription(ProviderSubscription {
        id: "sub_1".into(),
        customer_id: Some("cus_1".into()),
        status: Some("active".into()),
        price_id: Some("price_pro".into()),
        current_period_end: Some(1_706_745_600),
        ..Default::default()
    });

    let catalog = StaticPlanCatalog::new(vec![PlanRecord {
        plan_id: "plan_pro".into(),
        stripe_price_id: "price_pro".into(),
        plan_group: PlanGroup::Pro,
        plan_name: Some("Pro".into()),
        active: true,
    }]);

    let identity = InMemoryIdentityGroups::new().with_user("ada", &[PlanGroup::Unsubscribed]);
    let alerts = RecordingAlertPublisher::new();
    let email = RecordingEmailSender::new();
    let notifier = Notifier::new(
        Arc::new(alerts.clone()),
        Arc::new(email.clone()),
        NotificationSettings::new("https://app.example.com/dashboard"),
    );

    let state = WebhookAppState {
        user_store: users.clone(),
        plan_catalog: Arc::new(catalog),
        billing_provider: Arc::new(billing),
        identity_groups: Arc::new(identity.clone()),
        notifier: Arc::new(notifier),
        verifier: Arc::new(StripeWebhookVerifier::new(SecretString::new(
            SECRET.to_string(),
        ))),
        policy: ReconcilePolicy::default(),
        user_locks: Arc::new(UserLocks::new()),
        processing_timeout: Duration::from_secs(5),
    };

    TestApp {
        router: app_router(state),
        users,
        identity,
        alerts,
        email,
    }
}

fn webhook_request(body: &Value, signature: Option<String>) -> Request<Body> {
    let payload = serde_json::to_vec(body).unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/payment/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

fn signed_request(body: &Value) -> Request<Body> {
    let payload = serde_json::to_vec(body).unwrap();
    let signature = sign_payload(SECRET, chrono::Utc::now().timestamp(), &payload);
    webhook_request(body, Some(signature))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn checkout_event() -> Value {
    json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "livemode": false,
        "data": {"object": {
            "id": "cs_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "customer_details": {"email": "ada@example.com"},
            "amount_total": 999,
            "currency": "usd",
            "payment_status": "paid"
        }}
    })
}

fn deleted_event() -> Value {
    json!({
        "id": "evt_deleted",
        "type": "customer.subscription.deleted",
        "data": {"object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "canceled",
            "canceled_at": 1704067200
        }}
    })
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn signed_checkout_activates_subscription() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&checkout_event()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Webhook received");
    assert_eq!(body["outcome"], "reconciled");
    assert_eq!(body["event_id"], "evt_checkout");

    let record = app.users.get("user-1").await.unwrap();
    assert_eq!(record.subscription_status, Some(SubscriptionStatus::Active));
    assert_eq!(record.plan_opted, PlanGroup::Pro);
    assert_eq!(record.groups, vec![PlanGroup::Pro]);
    assert_eq!(app.identity.groups_of("ada"), vec![PlanGroup::Pro]);
    assert_eq!(app.alerts.subjects(), vec!["Stripe Webhook Success"]);
    assert_eq!(app.email.sent().len(), 1);
}

#[tokio::test]
async fn checkout_then_deletion_revokes_access() {
    let app = test_app().await;

    let first = app
        .router
        .clone()
        .oneshot(signed_request(&checkout_event()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .clone()
        .oneshot(signed_request(&deleted_event()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let record = app.users.get("user-1").await.unwrap();
    assert_eq!(record.subscription_status, Some(SubscriptionStatus::Canceled));
    assert_eq!(record.plan_opted, PlanGroup::Unsubscribed);
    assert_eq!(app.identity.groups_of("ada"), vec![PlanGroup::Unsubscribed]);
    assert_eq!(
        app.alerts.subjects(),
        vec!["Stripe Webhook Success", "Stripe Subscription Deleted"]
    );
}

#[tokio::test]
async fn forged_signature_is_rejected_without_write() {
    let app = test_app().await;
    let before = app.users.get("user-1").await.unwrap();
    let signature = sign_payload("whsec_someone_else", chrono::Utc::now().timestamp(), b"{}");

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&checkout_event(), Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_code"], "INVALID_WEBHOOK_SIGNATURE");

    assert_eq!(app.users.get("user-1").await.unwrap(), before);
    assert_eq!(app.identity.mutation_count(), 0);
    assert_eq!(app.alerts.subjects(), vec!["Stripe Webhook Signature Error"]);
    assert!(app.email.sent().is_empty());
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&checkout_event(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.identity.mutation_count(), 0);
}

#[tokio::test]
async fn unhandled_event_type_is_acknowledged() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&json!({
            "id": "evt_other",
            "type": "customer.created",
            "data": {"object": {"id": "cus_1"}}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "ignored");
    assert!(app.alerts.alerts().is_empty());
}

#[tokio::test]
async fn unknown_customer_returns_bad_request() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&json!({
            "id": "evt_failed",
            "type": "invoice.payment_failed",
            "data": {"object": {"id": "in_1", "customer": "cus_nobody"}}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_code"], "RECORD_NOT_FOUND");
    assert_eq!(app.alerts.subjects(), vec!["Stripe Webhook Exception"]);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

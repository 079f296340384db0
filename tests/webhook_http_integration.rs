//! Integration tests for the subscription webhook endpoint.
//!
//! These tests drive the public router end to end:
//! 1. Signature verification and secret configuration
//! 2. Dispatch of recognised and unknown events
//! 3. Store effects and idempotent redelivery
//! 4. Customer notifications across retries
//! 5. Operator alerts on handler failure

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderName, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower::ServiceExt;

use subscription_webhooks::adapters::memory::InMemorySubscriptionStore;
use subscription_webhooks::adapters::{webhook_router, WebhookAppState};
use subscription_webhooks::domain::foundation::DomainError;
use subscription_webhooks::domain::subscription::{compute_signature, WebhookVerifier};
use subscription_webhooks::ports::{
    Notification, NotificationDeliveryError, NotificationTemplate, Notifier, RecordFields,
    RecordKind, StoredRecord, SubscriptionStore, UpsertOutcome,
};

const SECRET: &str = "whsec_integration";
const PATH: &str = "/api/webhooks/subscription";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Notifier that records every message and optionally fails or stalls.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    fn count(&self, template: NotificationTemplate) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.template == template)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationDeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(notification);
        if self.fail {
            Err(NotificationDeliveryError::Transport("relay unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Store whose writes always fail.
struct BrokenStore;

#[async_trait]
impl SubscriptionStore for BrokenStore {
    async fn upsert(
        &self,
        _kind: RecordKind,
        _id: &str,
        _fields: RecordFields,
    ) -> Result<UpsertOutcome, DomainError> {
        Err(DomainError::database("connection reset"))
    }

    async fn get(&self, _kind: RecordKind, _id: &str) -> Result<Option<StoredRecord>, DomainError> {
        Ok(None)
    }
}

/// In-memory store whose n-th upsert (1-based) fails once.
struct FlakyStore {
    inner: InMemorySubscriptionStore,
    fail_upsert: usize,
    upserts: AtomicUsize,
}

impl FlakyStore {
    fn failing_upsert_once(n: usize) -> Self {
        Self {
            inner: InMemorySubscriptionStore::new(),
            fail_upsert: n,
            upserts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SubscriptionStore for FlakyStore {
    async fn upsert(
        &self,
        kind: RecordKind,
        id: &str,
        fields: RecordFields,
    ) -> Result<UpsertOutcome, DomainError> {
        if self.upserts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_upsert {
            return Err(DomainError::database("write timed out"));
        }
        self.inner.upsert(kind, id, fields).await
    }

    async fn get(&self, kind: RecordKind, id: &str) -> Result<Option<StoredRecord>, DomainError> {
        self.inner.get(kind, id).await
    }
}

/// Let customer sends spawned by the handlers run.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

fn app(
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<RecordingNotifier>,
    verifier: WebhookVerifier,
) -> Router {
    let state = WebhookAppState {
        store,
        notifier,
        verifier,
        signature_header: HeaderName::from_static("x-razorpay-signature"),
        dispatch_timeout: Duration::from_secs(5),
        app_url: "http://localhost:3000".to_string(),
    };
    webhook_router(1024 * 1024).with_state(state)
}

fn default_app(store: Arc<dyn SubscriptionStore>, notifier: Arc<RecordingNotifier>) -> Router {
    app(store, notifier, WebhookVerifier::with_secret(SECRET))
}

fn post(body: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PATH)
        .header("content-type", "application/json")
        .header("user-agent", "Razorpay-Webhook/v1")
        .header("x-forwarded-for", "203.0.113.9");
    if let Some(signature) = signature {
        builder = builder.header("x-razorpay-signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn signed_post(body: &str) -> Request<Body> {
    post(body, Some(compute_signature(SECRET, body.as_bytes())))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn event(name: &str) -> String {
    json!({
        "event": name,
        "payload": {
            "subscription": {"entity": {
                "id": "sub_1",
                "customer_id": "cus_1",
                "plan_id": "plan_monthly",
                "charge_at": 1_702_592_000,
                "current_start": 1_700_000_000,
                "current_end": 1_702_592_000,
                "end_at": 1_702_592_000,
                "paid_count": 3,
                "remaining_count": 2
            }},
            "payment": {"entity": {
                "id": "pay_1",
                "amount": 4900,
                "currency": "INR",
                "method": "upi",
                "status": "captured",
                "created_at": 1_700_000_100
            }}
        },
        "created_at": 1_700_000_000
    })
    .to_string()
}

const EVENTS: [&str; 10] = [
    "subscription.authenticated",
    "subscription.activated",
    "subscription.charged",
    "subscription.paused",
    "subscription.resumed",
    "subscription.pending",
    "subscription.halted",
    "subscription.cancelled",
    "subscription.completed",
    "subscription.updated",
];

// =============================================================================
// Method and Signature
// =============================================================================

#[tokio::test]
async fn get_is_method_not_allowed() {
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());

    let (status, body) = send(app, Request::builder().uri(PATH).body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), notifier.clone());

    let (status, body) = send(app, post(&event("subscription.activated"), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid webhook signature"}));
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn signature_over_different_body_is_rejected() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let app = default_app(store.clone(), Arc::default());
    let signature = compute_signature(SECRET, event("subscription.paused").as_bytes());

    let (status, _) = send(app, post(&event("subscription.activated"), Some(signature))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count(RecordKind::Subscription).await, 0);
}

#[tokio::test]
async fn unconfigured_secret_is_server_error() {
    let app = app(
        Arc::new(InMemorySubscriptionStore::new()),
        Arc::default(),
        WebhookVerifier::new(None),
    );

    let (status, body) = send(app, post(&event("subscription.activated"), None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Webhook secret not configured");
}

#[tokio::test]
async fn verified_but_malformed_body_is_bad_request() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), notifier.clone());

    let (status, body) = send(app, signed_post(r#"{"payload":{}}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid webhook payload");
    assert_eq!(notifier.count(NotificationTemplate::WebhookError), 1);
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn every_recognised_event_is_processed() {
    for name in EVENTS {
        let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());

        let (status, body) = send(app, signed_post(&event(name))).await;

        assert_eq!(status, StatusCode::OK, "{}", name);
        assert_eq!(body["received"], true);
        assert_eq!(body["event"], name);
        assert_eq!(body["status"], "processed");
        assert_eq!(body["result"]["status"], "success", "{}", name);
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn unknown_event_is_ignored() {
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());

    let (status, body) = send(app, signed_post(&event("subscription.unknown_future_event"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"], "subscription.unknown_future_event");
    assert_eq!(body["result"]["status"], "ignored");
    assert_eq!(body["result"]["event_type"], "subscription.unknown_future_event");
    assert_eq!(
        body["result"]["message"],
        "Event subscription.unknown_future_event received but not handled"
    );
}

#[tokio::test]
async fn unknown_event_with_unmodelled_payload_is_ignored() {
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());
    let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","amount":"4900"}}}}"#;

    let (status, body) = send(app, signed_post(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "ignored");
}

#[tokio::test]
async fn unknown_subscription_event_with_fractional_quantity_is_ignored() {
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());
    let body = r#"{"event":"subscription.unknown_future_event","payload":{"subscription":{"entity":{"id":"sub_1","quantity":1.5}}}}"#;

    let (status, body) = send(app, signed_post(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["event_type"], "subscription.unknown_future_event");
}

#[tokio::test]
async fn known_event_with_malformed_entity_is_server_error() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), notifier.clone());
    let body = r#"{"event":"subscription.charged","payload":{"subscription":{"entity":{"id":"sub_1"}},"payment":{"entity":{"id":"pay_1","amount":"4900"}}}}"#;

    let (status, body) = send(app, signed_post(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(notifier.count(NotificationTemplate::WebhookError), 1);
}

#[tokio::test]
async fn halted_starts_grace_period() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let app = default_app(store.clone(), Arc::default());

    let (status, body) = send(app, signed_post(&event("subscription.halted"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["grace_period_days"], 7);
    assert_eq!(body["result"]["subscription_id"], "sub_1");
    let customer = store.get(RecordKind::Customer, "cus_1").await.unwrap().unwrap();
    assert_eq!(customer.str_field("subscription_status"), Some("halted"));
}

#[tokio::test]
async fn charged_reports_major_units() {
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), Arc::default());

    let (_, body) = send(app, signed_post(&event("subscription.charged"))).await;

    assert_eq!(body["result"]["amount"], json!(49));
    assert_eq!(body["result"]["amount"].as_i64(), Some(49));
    assert_eq!(body["result"]["payment_id"], "pay_1");
    assert_eq!(body["result"]["currency"], "INR");
}

#[tokio::test]
async fn redelivered_charge_is_recorded_once() {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let body = event("subscription.charged");

    let (_, first) = send(default_app(store.clone(), notifier.clone()), signed_post(&body)).await;
    let (_, second) = send(default_app(store.clone(), notifier.clone()), signed_post(&body)).await;
    settle().await;

    assert_eq!(first["result"]["already_recorded"], false);
    assert_eq!(second["result"]["already_recorded"], true);
    assert_eq!(store.count(RecordKind::Payment).await, 1);
    assert_eq!(notifier.count(NotificationTemplate::PaymentSuccess), 1);
}

#[tokio::test]
async fn failing_notifier_does_not_change_response() {
    let app = default_app(
        Arc::new(InMemorySubscriptionStore::new()),
        Arc::new(RecordingNotifier::failing()),
    );

    let (status, body) = send(app, signed_post(&event("subscription.activated"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "success");
}

#[tokio::test]
async fn charge_retried_after_partial_write_sends_receipt() {
    // upsert #1 payment, #2 subscription
    let store = Arc::new(FlakyStore::failing_upsert_once(2));
    let notifier = Arc::new(RecordingNotifier::default());
    let body = event("subscription.charged");

    let (first, _) = send(default_app(store.clone(), notifier.clone()), signed_post(&body)).await;
    let (retry, retry_body) =
        send(default_app(store.clone(), notifier.clone()), signed_post(&body)).await;
    settle().await;

    assert_eq!(first, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(retry, StatusCode::OK);
    assert_eq!(retry_body["result"]["already_recorded"], true);
    assert_eq!(notifier.count(NotificationTemplate::PaymentSuccess), 1);
}

#[tokio::test]
async fn slow_notifier_does_not_delay_acknowledgement() {
    let notifier = Arc::new(RecordingNotifier::slow(Duration::from_secs(3)));
    let app = default_app(Arc::new(InMemorySubscriptionStore::new()), notifier.clone());
    let started = Instant::now();

    let (status, _) = send(app, signed_post(&event("subscription.halted"))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(notifier.count(NotificationTemplate::SubscriptionHalted), 0);
}

// =============================================================================
// Failure Reporting
// =============================================================================

#[tokio::test]
async fn handler_failure_returns_generic_error_and_alerts_once() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = default_app(Arc::new(BrokenStore), notifier.clone());

    let (status, body) = send(app, signed_post(&event("subscription.paused"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["message"], "Webhook processing failed");
    assert!(body["timestamp"].is_string());
    assert!(!body.to_string().contains("connection reset"));

    assert_eq!(notifier.count(NotificationTemplate::WebhookError), 1);
    let sent = notifier.sent.lock().unwrap();
    let report = &sent[0].data;
    assert_eq!(report["webhook_event"], "subscription.paused");
    assert_eq!(report["subscription_id"], "sub_1");
    assert_eq!(report["user_agent"], "Razorpay-Webhook/v1");
    assert_eq!(report["ip_address"], "203.0.113.9");
}

#[tokio::test]
async fn failing_operator_channel_keeps_generic_error() {
    let notifier = Arc::new(RecordingNotifier::failing());
    let app = default_app(Arc::new(BrokenStore), notifier.clone());

    let (status, body) = send(app, signed_post(&event("subscription.paused"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(notifier.count(NotificationTemplate::WebhookError), 1);
}

use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use order_payment_engine::{
    db_types::{OrderItem, OrderStatus, PaymentStatus},
    notifications::PushEvent,
    traits::OrderManagement,
    ConnectionRegistry,
    PaymentWebhookApi,
    SqliteDatabase,
};
use serde_json::json as json_body;
use stripe_tools::{
    webhook::{sign_payload, SIGNATURE_HEADER},
    StripeApi,
    StripeConfig,
};

use super::helpers::{insert_order, json, send_request, test_db};
use crate::{integrations::stripe::StripeGateway, routes::StripeWebhookRoute};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

type Registry = Arc<ConnectionRegistry>;

fn gateway() -> StripeGateway {
    let config = StripeConfig { webhook_secret: WEBHOOK_SECRET.to_string().into(), ..Default::default() };
    StripeGateway::new(StripeApi::new(config).unwrap())
}

fn configure(db: SqliteDatabase, registry: Registry) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PaymentWebhookApi::new(db, gateway(), registry);
        cfg.app_data(web::Data::new(api)).service(StripeWebhookRoute::<SqliteDatabase, StripeGateway, Registry>::new());
    }
}

fn event(event_type: &str, intent_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json_body!({
        "id": format!("evt_{}", rand::random::<u32>()),
        "type": event_type,
        "created": Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": { "id": intent_id, "object": "payment_intent", "amount": 1000 } }
    }))
    .unwrap()
}

fn webhook_request(payload: Vec<u8>, signature: Option<String>) -> TestRequest {
    let mut req = TestRequest::post()
        .uri("/api/payment/webhook/stripe")
        .insert_header(("content-type", "application/json"))
        .set_payload(payload);
    if let Some(signature) = signature {
        req = req.insert_header((SIGNATURE_HEADER, signature));
    }
    req
}

fn signed(payload: &[u8]) -> Option<String> {
    Some(sign_payload(payload, WEBHOOK_SECRET, Utc::now().timestamp()).unwrap())
}

#[actix_web::test]
async fn successful_payment() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    db.attach_payment_intent(&order.id, "pi_webhook_1").await.unwrap();
    let registry = Arc::new(ConnectionRegistry::new());
    let (_channel, mut events) = registry.register("user-alice");

    let payload = event("payment_intent.succeeded", "pi_webhook_1");
    let sig = signed(&payload);
    let (status, body) = send_request(webhook_request(payload, sig), configure(db.clone(), registry.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body), json_body!({"received": true}));

    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.order_status, OrderStatus::Processing);
    match events.try_recv().expect("Alice should have been notified") {
        PushEvent::OrderUpdate(update) => {
            assert_eq!(update.payment_status, PaymentStatus::Paid);
            assert!(update.message.starts_with("💰"));
        },
        ev => panic!("Unexpected event {ev:?}"),
    }

    // Stripe re-delivers events. The second delivery changes nothing but is still acknowledged.
    let payload = event("payment_intent.succeeded", "pi_webhook_1");
    let sig = signed(&payload);
    let (status, _) = send_request(webhook_request(payload, sig), configure(db.clone(), registry)).await;
    assert_eq!(status, StatusCode::OK);
    let again = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(again.payment_status, PaymentStatus::Paid);
    assert_eq!(again.order_status, OrderStatus::Processing);
}

#[actix_web::test]
async fn failed_payment() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-bob", vec![OrderItem::new("Cap", 15.0, 1)]).await;
    db.attach_payment_intent(&order.id, "pi_webhook_2").await.unwrap();

    let payload = event("payment_intent.payment_failed", "pi_webhook_2");
    let sig = signed(&payload);
    let (status, _) =
        send_request(webhook_request(payload, sig), configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::OK);
    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Failed);
    assert_eq!(stored.order_status, OrderStatus::Pending);
}

#[actix_web::test]
async fn missing_signature() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let payload = event("payment_intent.succeeded", "pi_webhook_3");
    let (status, body) =
        send_request(webhook_request(payload, None), configure(db, Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let res = json(&body);
    assert_eq!(res["success"], false);
    assert_eq!(res["message"], "Missing stripe signature");
}

#[actix_web::test]
async fn invalid_signature() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    db.attach_payment_intent(&order.id, "pi_webhook_4").await.unwrap();

    let payload = event("payment_intent.succeeded", "pi_webhook_4");
    let forged = Some(sign_payload(&payload, "whsec_not_ours", Utc::now().timestamp()).unwrap());
    let (status, body) =
        send_request(webhook_request(payload, forged), configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["success"], false);

    // Signed by us an hour ago. Too old to be accepted.
    let payload = event("payment_intent.succeeded", "pi_webhook_4");
    let stale = Some(sign_payload(&payload, WEBHOOK_SECRET, Utc::now().timestamp() - 3600).unwrap());
    let (status, _) =
        send_request(webhook_request(payload, stale), configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn events_we_do_not_act_on_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    let order = db.attach_payment_intent(&order.id, "pi_webhook_5").await.unwrap();
    let registry = Arc::new(ConnectionRegistry::new());
    let (_channel, mut events) = registry.register("user-alice");

    for payload in [event("payment_intent.succeeded", "pi_nobody_knows"), event("charge.refunded", "pi_webhook_5")] {
        let sig = signed(&payload);
        let (status, body) = send_request(webhook_request(payload, sig), configure(db.clone(), registry.clone())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(json(&body), json_body!({"received": true}));
    }
    assert!(events.try_recv().is_err());
    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.order_status, OrderStatus::Pending);
    assert_eq!(stored.updated_at, order.updated_at);
}

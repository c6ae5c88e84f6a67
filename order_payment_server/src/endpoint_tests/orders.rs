use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use opg_common::Cents;
use order_payment_engine::{
    db_types::OrderItem,
    traits::{GatewayError, OrderManagement},
    OrderFlowApi,
    SqliteDatabase,
};
use serde_json::json as json_body;

use super::{
    helpers::{bearer, expired_token, insert_order, issue_token, json, send_api_request, test_db},
    mocks::MockGateway,
};
use crate::{
    auth::Role,
    routes::{CreateOrderRoute, MyOrderRoute, MyOrdersRoute},
};

fn configure(db: SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, gateway);
        cfg.app_data(web::Data::new(api))
            .service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase, MockGateway>::new())
            .service(MyOrderRoute::<SqliteDatabase, MockGateway>::new());
    }
}

fn new_order_request(token: &str, body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/api/orders").insert_header(bearer(token)).set_json(body)
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_intent()
        .withf(|_, amount, owner| *amount == Cents::from(2750) && owner == "user-alice")
        .times(1)
        .returning(|order_id, _, _| {
            Ok(order_payment_engine::traits::PaymentCredentials {
                client_secret: "pi_abc_secret_xyz".into(),
                payment_intent_id: format!("pi_{order_id}"),
            })
        });
    let token = issue_token("user-alice", Role::User);
    let body = json_body!({
        "items": [{"title": "Mug", "price": 10.0, "quantity": 2}, {"title": "Sticker", "price": 2.5, "quantity": 3}],
        "paymentMethod": "stripe"
    });
    let (status, body) = send_api_request(new_order_request(&token, body), configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let res = json(&body);
    assert_eq!(res["success"], true);
    assert_eq!(res["message"], "Order created successfully");
    let order = &res["data"]["order"];
    assert_eq!(order["userId"], "user-alice");
    assert_eq!(order["totalAmount"], 27.5);
    assert_eq!(order["paymentMethod"], "STRIPE");
    assert_eq!(order["paymentStatus"], "PENDING");
    assert_eq!(order["orderStatus"], "PENDING");
    assert_eq!(res["data"]["payment"]["clientSecret"], "pi_abc_secret_xyz");
    let order_id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["paymentIntentId"], format!("pi_{order_id}"));

    let stored = db.fetch_order_by_id(&order_id.as_str().into()).await.unwrap().unwrap();
    assert_eq!(stored.payment_intent_id, Some(format!("pi_{order_id}")));
}

#[actix_web::test]
async fn place_order_without_token() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let req = TestRequest::post()
        .uri("/api/orders")
        .set_json(json_body!({"items": [{"title": "Mug", "price": 10.0, "quantity": 1}], "paymentMethod": "stripe"}));
    let (status, body) = send_api_request(req, configure(db.clone(), MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let res = json(&body);
    assert_eq!(res["success"], false);
    assert_eq!(res["message"], "No token provided. Please login.");
    assert!(db.fetch_orders_for_owner("user-alice").await.unwrap().is_empty());
}

#[actix_web::test]
async fn expired_and_forged_tokens() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let token = expired_token("user-alice", Role::User);
    let req = TestRequest::get().uri("/api/orders").insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db.clone(), MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["message"], "Token expired. Please login again.");

    let mut token = issue_token("user-alice", Role::User);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::get().uri("/api/orders").insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db, MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["message"], "Invalid token");
}

#[actix_web::test]
async fn too_many_items() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let token = issue_token("user-alice", Role::User);
    let items = (0..51).map(|i| json_body!({"title": format!("Item {i}"), "price": 1.0, "quantity": 1})).collect::<Vec<_>>();
    let req = new_order_request(&token, json_body!({"items": items, "paymentMethod": "stripe"}));
    let (status, body) = send_api_request(req, configure(db.clone(), MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["success"], false);
    assert!(db.fetch_orders_for_owner("user-alice").await.unwrap().is_empty());
}

#[actix_web::test]
async fn invalid_order_bodies() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let token = issue_token("user-alice", Role::User);
    let bodies = [
        json_body!({"items": [], "paymentMethod": "stripe"}),
        json_body!({"items": [{"title": "Mug", "price": -1.0, "quantity": 1}], "paymentMethod": "stripe"}),
        json_body!({"items": [{"title": "Mug", "price": 10.0, "quantity": 0}], "paymentMethod": "stripe"}),
        json_body!({"items": [{"title": "Mug", "price": 10.0, "quantity": 1}], "paymentMethod": "paypal"}),
        json_body!({"items": [{"title": "Mug", "price": "ten", "quantity": 1}], "paymentMethod": "stripe"}),
        json_body!({"paymentMethod": "stripe"}),
    ];
    for body in bodies {
        let req = new_order_request(&token, body.clone());
        let (status, res) = send_api_request(req, configure(db.clone(), MockGateway::untouched())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} gave {res}");
        assert_eq!(json(&res)["success"], false);
    }
    assert!(db.fetch_orders_for_owner("user-alice").await.unwrap().is_empty());
}

#[actix_web::test]
async fn gateway_failure_leaves_no_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_create_intent().times(1).returning(|_, _, _| Err(GatewayError::Unavailable("connection refused".into())));
    let token = issue_token("user-alice", Role::User);
    let req = new_order_request(
        &token,
        json_body!({"items": [{"title": "Mug", "price": 10.0, "quantity": 1}], "paymentMethod": "stripe"}),
    );
    let (status, body) = send_api_request(req, configure(db.clone(), gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert_eq!(json(&body)["success"], false);

    let req = TestRequest::get().uri("/api/orders").insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db, MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["data"], json_body!([]));
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let first = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let second = insert_order(&db, "user-alice", vec![OrderItem::new("Tee", 20.0, 1)]).await;
    let _bobs = insert_order(&db, "user-bob", vec![OrderItem::new("Cap", 15.0, 1)]).await;

    let token = issue_token("user-alice", Role::User);
    let req = TestRequest::get().uri("/api/orders").insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db, MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::OK);
    let res = json(&body);
    assert_eq!(res["message"], "Orders retrieved successfully");
    let orders = res["data"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second.id.to_string());
    assert_eq!(orders[1]["id"], first.id.to_string());
}

#[actix_web::test]
async fn fetch_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let bobs = insert_order(&db, "user-bob", vec![OrderItem::new("Cap", 15.0, 1)]).await;
    let path = format!("/api/orders/{}", bobs.id);

    let token = issue_token("user-alice", Role::User);
    let req = TestRequest::get().uri(&path).insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db.clone(), MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Order not found");

    let token = issue_token("user-bob", Role::User);
    let req = TestRequest::get().uri(&path).insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db, MockGateway::untouched())).await;
    assert_eq!(status, StatusCode::OK);
    let res = json(&body);
    assert_eq!(res["data"]["id"], bobs.id.to_string());
    assert_eq!(res["data"]["totalAmount"], 15.0);
}

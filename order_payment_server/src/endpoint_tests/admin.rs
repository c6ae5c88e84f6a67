use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use order_payment_engine::{
    db_types::{Order, OrderItem, OrderStatus, PaymentStatus},
    notifications::PushEvent,
    traits::OrderManagement,
    AdminApi,
    ConnectionRegistry,
    SqliteDatabase,
};
use serde_json::json as json_body;

use super::helpers::{bearer, insert_order, issue_token, json, send_api_request, test_db};
use crate::{
    auth::Role,
    routes::{
        AdminOrderByIdRoute,
        AdminOrdersRoute,
        DeleteOrderRoute,
        OrderStatsRoute,
        PaymentStatusRoute,
        UpdateOrderStatusRoute,
    },
};

type Registry = Arc<ConnectionRegistry>;

fn configure(db: SqliteDatabase, registry: Registry) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AdminApi::new(db, registry);
        cfg.app_data(web::Data::new(api))
            .service(PaymentStatusRoute::<SqliteDatabase, Registry>::new())
            .service(AdminOrdersRoute::<SqliteDatabase, Registry>::new())
            .service(AdminOrderByIdRoute::<SqliteDatabase, Registry>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, Registry>::new())
            .service(DeleteOrderRoute::<SqliteDatabase, Registry>::new())
            .service(OrderStatsRoute::<SqliteDatabase, Registry>::new());
    }
}

async fn admin_get(db: &SqliteDatabase, path: &str) -> (StatusCode, serde_json::Value) {
    let token = issue_token("admin-1", Role::Admin);
    let req = TestRequest::get().uri(path).insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
    (status, json(&body))
}

/// Five orders: three paid, of which one has shipped.
async fn seed_orders(db: &SqliteDatabase) -> Vec<Order> {
    let mut orders = Vec::new();
    for (i, owner) in ["user-alice", "user-bob", "user-alice", "user-bob", "user-alice"].into_iter().enumerate() {
        let order = insert_order(db, owner, vec![OrderItem::new(format!("Item {i}"), 10.0, 1)]).await;
        orders.push(order);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    for order in &orders[..3] {
        db.update_payment_status(&order.id, PaymentStatus::Paid).await.unwrap();
    }
    db.update_order_status(&orders[0].id, OrderStatus::Shipped).await.unwrap();
    orders
}

#[actix_web::test]
async fn users_cannot_use_admin_routes() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    let token = issue_token("user-alice", Role::User);
    let requests = [
        TestRequest::get().uri("/api/admin/orders"),
        TestRequest::get().uri("/api/admin/stats"),
        TestRequest::get().uri(&format!("/api/admin/orders/{}", order.id)),
        TestRequest::get().uri(&format!("/api/payment/status/{}", order.id)),
        TestRequest::patch()
            .uri(&format!("/api/admin/orders/{}/status", order.id))
            .set_json(json_body!({"orderStatus": "SHIPPED"})),
        TestRequest::delete().uri(&format!("/api/admin/orders/{}", order.id)),
    ];
    for req in requests {
        let req = req.insert_header(bearer(&token));
        let (status, body) = send_api_request(req, configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
        let res = json(&body);
        assert_eq!(res["success"], false);
        assert_eq!(res["message"], "Access denied. Admin privileges required.");
    }
    let stored = db.fetch_order_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.order_status, OrderStatus::Pending);
}

#[actix_web::test]
async fn admin_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let req = TestRequest::get().uri("/api/admin/stats");
    let (status, body) = send_api_request(req, configure(db, Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["message"], "No token provided. Please login.");
}

#[actix_web::test]
async fn list_orders() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let orders = seed_orders(&db).await;

    let (status, res) = admin_get(&db, "/api/admin/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], "Orders retrieved successfully");
    assert_eq!(res["data"]["data"].as_array().unwrap().len(), 5);
    assert_eq!(res["data"]["pagination"], json_body!({"page": 1, "limit": 20, "total": 5, "totalPages": 1}));
    // Newest first, with the owner's details
    let newest = &res["data"]["data"][0];
    assert_eq!(newest["id"], orders[4].id.to_string());
    assert_eq!(newest["user"], json_body!({"id": "user-alice", "name": "Alice", "email": "alice@example.com"}));

    let (_, res) = admin_get(&db, "/api/admin/orders?page=2&limit=2").await;
    let page = res["data"]["data"].as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["id"], orders[2].id.to_string());
    assert_eq!(res["data"]["pagination"], json_body!({"page": 2, "limit": 2, "total": 5, "totalPages": 3}));

    let (_, res) = admin_get(&db, "/api/admin/orders?paymentStatus=PAID").await;
    assert_eq!(res["data"]["pagination"]["total"], 3);

    let (_, res) = admin_get(&db, "/api/admin/orders?status=SHIPPED&paymentStatus=PAID").await;
    let page = res["data"]["data"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], orders[0].id.to_string());
    assert_eq!(page[0]["orderStatus"], "SHIPPED");

    let (status, res) = admin_get(&db, "/api/admin/orders?status=LOST").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["success"], false);
}

#[actix_web::test]
async fn fetch_order_by_id() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-bob", vec![OrderItem::new("Cap", 15.0, 2)]).await;

    let (status, res) = admin_get(&db, &format!("/api/admin/orders/{}", order.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["totalAmount"], 30.0);
    assert_eq!(res["data"]["user"]["name"], "Bob");

    let (status, res) = admin_get(&db, "/api/admin/orders/no-such-order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["message"], "Order not found");
}

#[actix_web::test]
async fn order_statistics() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let (status, res) = admin_get(&db, "/api/admin/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        res["data"],
        json_body!({"total": 0, "pending": 0, "processing": 0, "shipped": 0, "delivered": 0, "totalRevenue": 0.0})
    );

    seed_orders(&db).await;
    let (status, res) = admin_get(&db, "/api/admin/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["message"], "Statistics retrieved successfully");
    assert_eq!(
        res["data"],
        json_body!({"total": 5, "pending": 2, "processing": 2, "shipped": 1, "delivered": 0, "totalRevenue": 30.0})
    );
}

#[actix_web::test]
async fn update_status_notifies_the_owner() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    let registry = Arc::new(ConnectionRegistry::new());
    let (_alice, mut alice_events) = registry.register("user-alice");
    let (_bob, mut bob_events) = registry.register("user-bob");
    let token = issue_token("admin-1", Role::Admin);
    let path = format!("/api/admin/orders/{}/status", order.id);

    let req = TestRequest::patch().uri(&path).insert_header(bearer(&token)).set_json(json_body!({"orderStatus": "LOST"}));
    let (status, body) = send_api_request(req, configure(db.clone(), registry.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(alice_events.try_recv().is_err());

    let req =
        TestRequest::patch().uri(&path).insert_header(bearer(&token)).set_json(json_body!({"orderStatus": "SHIPPED"}));
    let (status, body) = send_api_request(req, configure(db.clone(), registry.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let res = json(&body);
    assert_eq!(res["message"], "Order status updated successfully");
    assert_eq!(res["data"]["orderStatus"], "SHIPPED");
    assert_eq!(res["data"]["paymentStatus"], "PENDING");

    match alice_events.try_recv().expect("Alice should have been notified") {
        PushEvent::OrderUpdate(update) => {
            assert_eq!(update.order_id, order.id);
            assert_eq!(update.order_status, OrderStatus::Shipped);
            assert_eq!(update.message, "🚚 Your order has been shipped!");
        },
        ev => panic!("Unexpected event {ev:?}"),
    }
    assert!(bob_events.try_recv().is_err());

    let req = TestRequest::patch()
        .uri("/api/admin/orders/no-such-order/status")
        .insert_header(bearer(&token))
        .set_json(json_body!({"orderStatus": "SHIPPED"}));
    let (status, _) = send_api_request(req, configure(db, registry)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 10.0, 1)]).await;
    let token = issue_token("admin-1", Role::Admin);
    let path = format!("/api/admin/orders/{}", order.id);

    let req = TestRequest::delete().uri(&path).insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db.clone(), Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body), json_body!({"success": true, "message": "Order deleted successfully"}));
    assert!(db.fetch_order_by_id(&order.id).await.unwrap().is_none());

    let req = TestRequest::delete().uri(&path).insert_header(bearer(&token));
    let (status, body) = send_api_request(req, configure(db, Arc::new(ConnectionRegistry::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Order not found");
}

#[actix_web::test]
async fn payment_status() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = insert_order(&db, "user-alice", vec![OrderItem::new("Mug", 12.5, 2)]).await;
    let path = format!("/api/payment/status/{}", order.id);

    let (status, res) = admin_get(&db, &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["id"], order.id.to_string());
    assert_eq!(res["data"]["paymentStatus"], "PENDING");
    assert_eq!(res["data"]["paymentMethod"], "STRIPE");
    assert_eq!(res["data"]["totalAmount"], 25.0);

    db.update_payment_status(&order.id, PaymentStatus::Failed).await.unwrap();
    let (_, res) = admin_get(&db, &path).await;
    assert_eq!(res["data"]["paymentStatus"], "FAILED");

    let (status, _) = admin_get(&db, "/api/payment/status/no-such-order").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

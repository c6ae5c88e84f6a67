use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_payment_engine::{AdminApi, ConnectionRegistry, OrderFlowApi, PaymentWebhookApi, SqliteDatabase};
use stripe_tools::StripeApi;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::{show_error_detail, ServerError},
    helpers::configure_extractors,
    integrations::stripe::StripeGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AdminOrderByIdRoute,
        AdminOrdersRoute,
        CreateOrderRoute,
        DeleteOrderRoute,
        MyOrderRoute,
        MyOrdersRoute,
        OrderStatsRoute,
        PaymentStatusRoute,
        StripeWebhookRoute,
        UpdateOrderStatusRoute,
    },
    ws::realtime_channel,
};

type Registry = Arc<ConnectionRegistry>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let stripe = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = StripeGateway::new(stripe);
    let registry = Arc::new(ConnectionRegistry::new());
    let srv = create_server_instance(config, db, gateway, registry)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server. The connection registry is shared by every worker, so a push raised on one worker reaches
/// a channel held by another.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    registry: Registry,
) -> Result<Server, ServerError> {
    show_error_detail(!config.environment.is_production());
    info!("🚀️ Running in {} mode", config.environment);
    let verifier = Arc::new(TokenVerifier::new(&config.auth));
    let max_items = config.max_items_per_order;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone()).with_max_items(max_items);
        let admin_api = AdminApi::new(db.clone(), registry.clone());
        let webhook_api = PaymentWebhookApi::new(db.clone(), gateway.clone(), registry.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("opg::access_log"))
            .configure(configure_extractors)
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(admin_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::from(registry.clone()))
            .app_data(web::Data::from(verifier.clone()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(verifier.clone()))
            .service(CreateOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase, StripeGateway>::new())
            .service(MyOrderRoute::<SqliteDatabase, StripeGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, Registry>::new())
            .service(AdminOrdersRoute::<SqliteDatabase, Registry>::new())
            .service(AdminOrderByIdRoute::<SqliteDatabase, Registry>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, Registry>::new())
            .service(DeleteOrderRoute::<SqliteDatabase, Registry>::new())
            .service(OrderStatsRoute::<SqliteDatabase, Registry>::new());
        // The webhook authenticates with its own signature and must be registered ahead of the /api scope
        app.service(health)
            .service(StripeWebhookRoute::<SqliteDatabase, StripeGateway, Registry>::new())
            .service(realtime_channel)
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

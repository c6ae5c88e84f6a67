//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use order_payment_engine::{
    db_types::OrderId,
    order_objects::{NewOrderRequest, OrderQueryFilter, WebhookOutcome},
    traits::{Notifier, OrderManagement, PaymentGateway},
    AdminApi,
    OrderFlowApi,
    PaymentWebhookApi,
};
use stripe_tools::webhook::SIGNATURE_HEADER;

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{JsonResponse, StatusUpdateRequest, WebhookAck},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement, PaymentGateway);
/// Route handler for placing a new order
///
/// The body is `{"items": [{"title", "price", "quantity"}], "paymentMethod": "stripe"}`. The order belongs to the
/// caller identified by the access token. On success the response carries the stored order and the client secret the
/// browser needs to complete the payment with the gateway.
pub async fn create_order<B, G>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    debug!("💻️ POST new order for {} ({} items)", claims.user_id, body.items.len());
    let result = api.create_order(&claims.user_id, body.into_inner()).await.map_err(|e| {
        debug!("💻️ Could not create order for {}. {e}", claims.user_id);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(JsonResponse::success("Order created successfully", result)))
}

route!(my_orders => Get "/orders" impl OrderManagement, PaymentGateway);
/// Route handler for the orders endpoint
///
/// Authenticated users fetch their own orders, newest first.
pub async fn my_orders<B, G>(claims: JwtClaims, api: web::Data<OrderFlowApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    debug!("💻️ GET my_orders for {}", claims.user_id);
    let orders = api.orders_for_owner(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Orders retrieved successfully", orders)))
}

route!(my_order => Get "/orders/{order_id}" impl OrderManagement, PaymentGateway);
/// Someone else's order is reported as not found.
pub async fn my_order<B, G>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", claims.user_id);
    let order = api.order_for_owner(&order_id, &claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order retrieved successfully", order)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_status => Get "/payment/status/{order_id}" impl OrderManagement, Notifier where requires [Role::Admin]);
pub async fn payment_status<B, N>(
    path: web::Path<OrderId>,
    api: web::Data<AdminApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let order_id = path.into_inner();
    debug!("💻️ GET payment status for {order_id}");
    let status = api.payment_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment status retrieved successfully", status)))
}

route!(stripe_webhook => Post "/api/payment/webhook/stripe" impl OrderManagement, PaymentGateway, Notifier);
/// Route handler for Stripe webhook deliveries
///
/// This route is not behind the JWT middleware. Deliveries are authenticated by the `Stripe-Signature` header, which
/// is checked against the body bytes exactly as they arrived, so the body must not be parsed before verification.
///
/// Events that are authentic but not acted upon (unknown event types, unknown payment intents) are acknowledged with a
/// 200 so that Stripe stops re-delivering them.
pub async fn stripe_webhook<B, G, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<PaymentWebhookApi<B, G, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    G: PaymentGateway,
    N: Notifier,
{
    trace!("💻️ Received webhook request ({} bytes)", body.len());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).ok_or_else(|| {
        warn!("💻️ Webhook request without a {SIGNATURE_HEADER} header");
        ServerError::MissingSignature
    })?;
    match api.handle_event(signature, &body).await? {
        WebhookOutcome::Applied { order_id, payment_status, notified } => {
            debug!("💻️ Webhook applied. Order {order_id} is {payment_status}. Owner notified: {notified}");
        },
        WebhookOutcome::Ignored { event_type } => debug!("💻️ Webhook event {event_type} ignored"),
        WebhookOutcome::Unmatched { intent_id } => debug!("💻️ Webhook for unknown payment intent {intent_id}"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck::default()))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(admin_orders => Get "/admin/orders" impl OrderManagement, Notifier where requires [Role::Admin]);
/// Route handler for the paginated order listing
///
/// Query parameters: `page` (default 1), `limit` (default 20, at most 100), `status` and `paymentStatus`.
pub async fn admin_orders<B, N>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<AdminApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let query = query.into_inner();
    debug!("💻️ GET admin order listing. {query:?}");
    let orders = api.list_orders(&query).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Orders retrieved successfully", orders)))
}

route!(admin_order_by_id => Get "/admin/orders/{order_id}" impl OrderManagement, Notifier where requires [Role::Admin]);
pub async fn admin_order_by_id<B, N>(
    path: web::Path<OrderId>,
    api: web::Data<AdminApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let order_id = path.into_inner();
    debug!("💻️ GET admin order {order_id}");
    let order = api.order_by_id(&order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order retrieved successfully", order)))
}

route!(update_order_status => Patch "/admin/orders/{order_id}/status" impl OrderManagement, Notifier where requires [Role::Admin]);
/// Route handler for fulfilment status changes
///
/// The body is `{"orderStatus": "SHIPPED"}`. The owner is told about the change if they are connected.
pub async fn update_order_status<B, N>(
    path: web::Path<OrderId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<AdminApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let order_id = path.into_inner();
    let status = body.into_inner().order_status;
    debug!("💻️ PATCH order {order_id} status to {status}");
    let order = api.update_order_status(&order_id, status).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order status updated successfully", order)))
}

route!(delete_order => Delete "/admin/orders/{order_id}" impl OrderManagement, Notifier where requires [Role::Admin]);
pub async fn delete_order<B, N>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<AdminApi<B, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    let order_id = path.into_inner();
    info!("💻️ DELETE order {order_id} requested by {}", claims.user_id);
    api.delete_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::<()>::message("Order deleted successfully")))
}

route!(order_stats => Get "/admin/stats" impl OrderManagement, Notifier where requires [Role::Admin]);
pub async fn order_stats<B, N>(api: web::Data<AdminApi<B, N>>) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    N: Notifier,
{
    debug!("💻️ GET order stats");
    let stats = api.order_stats().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Statistics retrieved successfully", stats)))
}

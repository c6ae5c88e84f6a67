//! Access control list middleware for the order payment server.
//! This middleware can be placed on any route or service that sits behind the JWT middleware.
//!
//! It checks the role in the verified claims against the required roles for the route. If the caller has all of the
//! required roles, the request is allowed to continue. Otherwise, a 403 Forbidden response is returned.

use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
    ResponseError,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{JwtClaims, Role},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned();
            let error = match claims {
                Some(claims) if required_roles.iter().all(|role| claims.has_role(role)) => {
                    return service.call(req).await.map(ServiceResponse::map_into_left_body);
                },
                Some(claims) => {
                    info!("🔐️ {} ({}) may not access {}", claims.user_id, claims.role, req.path());
                    AuthError::InsufficientPermissions
                },
                None => {
                    warn!("🔐️ No JWT claims found in request extensions");
                    AuthError::MissingToken
                },
            };
            let response = ServerError::AuthenticationError(error).error_response();
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}

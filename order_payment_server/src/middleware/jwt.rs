//! Bearer token middleware.
//!
//! Every request passing through this middleware must carry an `Authorization: Bearer <token>` header with a valid
//! access token. The verified [`JwtClaims`] are stored in the request extensions, where handlers (via the `JwtClaims`
//! extractor) and the [`super::AclMiddlewareFactory`] pick them up. Anything else is answered with a 401 and never
//! reaches the handler.

use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
    ResponseError,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{bearer_token, JwtClaims, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    verifier: Arc<TokenVerifier>,
}

impl JwtMiddlewareFactory {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { verifier: Arc::clone(&self.verifier), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    verifier: Arc<TokenVerifier>,
    service: Rc<S>,
}

impl<S> JwtMiddlewareService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<JwtClaims, AuthError> {
        let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header).ok_or(AuthError::MissingToken)?;
        self.verifier.verify(token)
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        match self.authenticate(&req) {
            Ok(claims) => {
                trace!("🔐️ {} {} authenticated as {} ({})", req.method(), req.path(), claims.user_id, claims.role);
                req.extensions_mut().insert(claims);
                let service = Rc::clone(&self.service);
                Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) })
            },
            Err(e) => {
                debug!("🔐️ {} {} rejected. {e}", req.method(), req.path());
                let response = ServerError::AuthenticationError(e).error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            },
        }
    }
}

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    web,
    Error,
    HttpRequest,
};
use log::debug;

use crate::errors::ServerError;

fn invalid_request<E: std::fmt::Display>(err: E, req: &HttpRequest) -> Error {
    debug!("💻️ Rejected request to {}. {err}", req.path());
    ServerError::InvalidRequestBody(err.to_string()).into()
}

/// Extractor configuration so that malformed bodies, paths and query strings get the same JSON error envelope as
/// every other failure.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|e: JsonPayloadError, req| invalid_request(e, req)))
        .app_data(web::QueryConfig::default().error_handler(|e: QueryPayloadError, req| invalid_request(e, req)))
        .app_data(web::PathConfig::default().error_handler(|e: PathError, req| invalid_request(e, req)));
}

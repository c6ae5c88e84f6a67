use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use order_payment_engine::OrderFlowError;
use serde_json::json;
use thiserror::Error;

static SHOW_ERROR_DETAIL: AtomicBool = AtomicBool::new(true);

/// Controls whether error responses carry a `detail` field with the internal error. Switched off in production.
pub fn show_error_detail(enabled: bool) {
    SHOW_ERROR_DETAIL.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Invalid request. {0}")]
    InvalidRequestBody(String),
    #[error("Missing stripe signature")]
    MissingSignature,
    #[error("Webhook error. {0}")]
    WebhookRejected(String),
    #[error("{0}")]
    InvalidOrder(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("Payment gateway error. {0}")]
    GatewayUnavailable(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::MissingSignature => StatusCode::BAD_REQUEST,
            Self::WebhookRejected(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrder(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = if SHOW_ERROR_DETAIL.load(Ordering::Relaxed) {
            json!({ "success": false, "message": self.to_string(), "detail": format!("{self:?}") })
        } else {
            json!({ "success": false, "message": self.to_string() })
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrder(s) => Self::InvalidOrder(s),
            e @ OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            e @ OrderFlowError::SignatureInvalid(_) => Self::WebhookRejected(e.to_string()),
            e @ OrderFlowError::MalformedEvent(_) => Self::WebhookRejected(e.to_string()),
            OrderFlowError::GatewayUnavailable(s) => Self::GatewayUnavailable(s),
            OrderFlowError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No token provided. Please login.")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken(String),
    #[error("Token expired. Please login again.")]
    TokenExpired,
    #[error("Access denied. Admin privileges required.")]
    InsufficientPermissions,
    #[error("Could not issue access token. {0}")]
    CouldNotIssueToken(String),
}

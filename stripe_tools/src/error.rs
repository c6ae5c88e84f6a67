use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
    #[error("The webhook signing secret has not been configured")]
    MissingWebhookSecret,
    #[error("The signature header is malformed: {0}")]
    MalformedSignatureHeader(String),
    #[error("No signature in the header matches the expected signature for the payload")]
    SignatureMismatch,
    #[error("The signature timestamp is outside the tolerance window ({age}s old, {tolerance}s allowed)")]
    TimestampOutsideTolerance { age: i64, tolerance: i64 },
}

impl StripeApiError {
    /// Transport failures, rate limits and server-side errors are worth another attempt. Anything else will fail the
    /// same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RestRequestError(_) => true,
            Self::QueryError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True for any failure to authenticate a webhook payload.
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            Self::MissingWebhookSecret |
                Self::MalformedSignatureHeader(_) |
                Self::SignatureMismatch |
                Self::TimestampOutsideTolerance { .. }
        )
    }
}

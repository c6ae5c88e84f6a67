use std::time::Duration;

use log::*;
use opg_common::{parse_env_or_default, Secret, DEFAULT_CURRENCY_CODE};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Base url of the Stripe REST API, without a trailing slash.
    pub api_url: String,
    pub secret_key: Secret<String>,
    /// The `whsec_...` signing secret for the webhook endpoint.
    pub webhook_secret: Secret<String>,
    pub currency: String,
    /// Upper bound for a single request to Stripe.
    pub timeout: Duration,
    /// How many times a failed request is retried. Zero disables retries.
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Webhook signatures older than this many seconds are rejected. Zero disables the check.
    pub webhook_tolerance: i64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE_SECS,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("OPG_STRIPE_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_STRIPE_API_URL.to_string());
        let secret_key = Secret::new(std::env::var("OPG_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ OPG_STRIPE_SECRET_KEY not set. Payment intents cannot be created until it is.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("OPG_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ OPG_STRIPE_WEBHOOK_SECRET not set. All incoming webhook events will be rejected.");
            String::default()
        }));
        let currency = std::env::var("OPG_STRIPE_CURRENCY")
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_CURRENCY_CODE.to_string());
        let timeout_ms = parse_env_or_default("OPG_STRIPE_TIMEOUT_MS", DEFAULT_TIMEOUT_MS, |m| debug!("🪛️ {m}"));
        let max_retries = parse_env_or_default("OPG_STRIPE_MAX_RETRIES", DEFAULT_MAX_RETRIES, |m| debug!("🪛️ {m}"));
        let backoff_ms =
            parse_env_or_default("OPG_STRIPE_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS, |m| debug!("🪛️ {m}"));
        let webhook_tolerance =
            parse_env_or_default("OPG_STRIPE_WEBHOOK_TOLERANCE", DEFAULT_WEBHOOK_TOLERANCE_SECS, |m| {
                debug!("🪛️ {m}")
            });
        Self {
            api_url,
            secret_key,
            webhook_secret,
            currency,
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
            retry_backoff: Duration::from_millis(backoff_ms),
            webhook_tolerance,
        }
    }
}

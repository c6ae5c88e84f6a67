use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{config::StripeConfig, webhook, NewPaymentIntent, PaymentIntent, StripeApiError, StripeEvent};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Submits a form-encoded POST request, retrying transient failures up to `max_retries` times with a fixed
    /// backoff. The idempotency key, if given, is sent with every attempt.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            match self.try_post_form(&url, params, idempotency_key).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "💳️ Stripe request to {path} failed. {e}. Retrying in {}ms (attempt {attempt} of {})",
                        self.config.retry_backoff.as_millis(),
                        self.config.max_retries
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, StripeApiError> {
        trace!("Sending REST request: {url}");
        let mut req = self.client.post(url).bearer_auth(self.config.secret_key.reveal()).form(params);
        if let Some(key) = idempotency_key {
            req = req.header("Idempotency-Key", key);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub async fn create_payment_intent(&self, intent: &NewPaymentIntent) -> Result<PaymentIntent, StripeApiError> {
        if self.config.secret_key.is_empty() {
            return Err(StripeApiError::Initialization("The Stripe secret key has not been configured".into()));
        }
        let params = intent.form_params()?;
        let key = intent.idempotency_key();
        debug!("💳️ Opening payment intent for order {} ({})", intent.order_id, intent.amount);
        let result = self.post_form::<PaymentIntent>("/v1/payment_intents", &params, Some(&key)).await?;
        info!("💳️ Payment intent {} opened for order {}", result.id, intent.order_id);
        Ok(result)
    }

    /// Authenticates a webhook delivery with the configured signing secret and decodes it.
    pub fn construct_event(&self, payload: &[u8], signature_header: &str) -> Result<StripeEvent, StripeApiError> {
        webhook::construct_event(
            payload,
            signature_header,
            self.config.webhook_secret.reveal(),
            self.config.webhook_tolerance,
        )
    }
}

// Caller-side HTTP client for the promotional service
//
// Order and cart services treat promotions as optional: the `*_or_*` helpers
// turn any failure into the undiscounted outcome instead of an error.

use std::time::Duration;
use thiserror::Error;

use crate::error::ErrorResponse;
use crate::promotions::{ApplyPromotionsRequest, ApplyPromotionsResponse, CartContext, Promotion};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("promotion service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("promotion service returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct PromoClient {
    http: reqwest::Client,
    base_url: String,
}

impl PromoClient {
    /// Client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    /// POST /promotions/apply
    pub async fn apply(
        &self,
        request: &ApplyPromotionsRequest,
    ) -> Result<ApplyPromotionsResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/promotions/apply", self.base_url))
            .json(request)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Like [`apply`](Self::apply), but any failure yields the full price
    pub async fn apply_or_full_price(&self, request: &ApplyPromotionsRequest) -> ApplyPromotionsResponse {
        match self.apply(request).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    "Promotions not applied for user {}, charging full price: {}",
                    request.user_id,
                    err
                );
                ApplyPromotionsResponse::full_price(request.cart_total)
            }
        }
    }

    /// GET /promotions/available
    pub async fn available(&self, cart: &CartContext) -> Result<Vec<Promotion>, ClientError> {
        let response = self
            .http
            .get(format!("{}/promotions/available", self.base_url))
            .query(&[
                ("user_id", cart.user_id.to_string()),
                ("cart_total", cart.cart_total.to_string()),
                ("product_count", cart.product_count.to_string()),
            ])
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Like [`available`](Self::available), but any failure yields no promotions
    pub async fn available_or_empty(&self, cart: &CartContext) -> Vec<Promotion> {
        match self.available(cart).await {
            Ok(promotions) => promotions,
            Err(err) => {
                tracing::warn!("Available promotions unknown for user {}: {}", cart.user_id, err);
                Vec::new()
            }
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|error| error.message)
            .unwrap_or(body);

        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct StripeClient {
    http_client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// POST a form-encoded body, the encoding the Stripe API expects.
    pub async fn post_form<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        form: &B,
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_base, endpoint);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                tracing::error!("Failed to parse Stripe response: {} - Body: {}", e, body);
                AppError::Internal(format!("Failed to parse Stripe response: {}", e))
            })
        } else {
            tracing::error!("Stripe API error: {} - {}", status, body);

            let message = match serde_json::from_str::<StripeErrorBody>(&body) {
                Ok(error) => error.error.message.unwrap_or_else(|| default_message(status)),
                Err(_) => default_message(status),
            };

            Err(AppError::Stripe {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn default_message(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "Bad request".to_string(),
        StatusCode::UNAUTHORIZED => "Invalid API credentials".to_string(),
        StatusCode::NOT_FOUND => "Resource not found".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded".to_string(),
        _ => format!("API error: {}", status),
    }
}

#[derive(Debug, serde::Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, AppResult};
use crate::models::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// Parsed `stripe-signature` header: `t=<unix>,v1=<hex>[,v1=<hex>...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHeader<'a> {
    pub timestamp: i64,
    raw_timestamp: &'a str,
    pub v1_signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    pub fn parse(header: &'a str) -> AppResult<Self> {
        let mut raw_timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => raw_timestamp = Some(value),
                Some(("v1", value)) => v1_signatures.push(value),
                // v0 and unknown schemes are ignored
                _ => {}
            }
        }

        let raw_timestamp = raw_timestamp.ok_or_else(|| {
            AppError::WebhookSignature(
                "Unable to extract timestamp and signatures from header".to_string(),
            )
        })?;
        let timestamp = raw_timestamp.parse::<i64>().map_err(|_| {
            AppError::WebhookSignature(format!("Invalid timestamp in header: {}", raw_timestamp))
        })?;

        if v1_signatures.is_empty() {
            return Err(AppError::WebhookSignature(
                "No v1 signatures found in header".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            raw_timestamp,
            v1_signatures,
        })
    }
}

pub struct StripeWebhookVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Verify the signature header and parse the body into a Stripe event.
    pub fn construct_event(&self, payload: &[u8], signature: Option<&str>) -> AppResult<StripeEvent> {
        self.construct_event_at(payload, signature, chrono::Utc::now().timestamp())
    }

    pub fn construct_event_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> AppResult<StripeEvent> {
        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::WebhookSignature("No stripe-signature header value was provided".to_string())
            })?;

        self.verify_signature(payload, signature, now)?;

        serde_json::from_slice(payload).map_err(|e| {
            AppError::WebhookSignature(format!("Invalid event payload: {}", e))
        })
    }

    /// Signed payload is `"{t}.{body}"`, HMAC-SHA256 with the endpoint secret.
    pub fn verify_signature(&self, payload: &[u8], signature: &str, now: i64) -> AppResult<()> {
        let header = SignatureHeader::parse(signature)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(header.raw_timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = header.v1_signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });

        if !matched {
            return Err(AppError::WebhookSignature(
                "No signatures found matching the expected signature for payload".to_string(),
            ));
        }

        let within_tolerance = now
            .checked_sub(header.timestamp)
            .map(|age| age.unsigned_abs() <= self.tolerance_secs)
            .unwrap_or(false);

        if self.tolerance_secs > 0 && !within_tolerance {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook timestamp outside tolerance"
            );
            return Err(AppError::WebhookSignature(
                "Timestamp outside the tolerance zone".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds a valid header for `payload`, as Stripe would. Used by tests and local tooling.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("HMAC initialization failed: {}", e)))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        Ok(format!(
            "t={},v1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        ))
    }
}

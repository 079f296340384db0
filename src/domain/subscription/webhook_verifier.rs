//! Subscription webhook signature verification.
//!
//! The provider signs the raw request body with HMAC-SHA256 under the shared
//! webhook secret and sends the lowercase hex digest in a header. We recompute
//! the digest over the exact bytes received and compare in constant time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::event::InboundNotification;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex characters of the expected digest that may appear in logs.
const LOGGED_DIGEST_PREFIX: usize = 8;

/// Verifier for subscription webhook signatures.
///
/// The secret is injected at construction; a verifier without one rejects
/// every request with [`WebhookError::MissingSecret`].
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<SecretString>,
}

impl WebhookVerifier {
    /// Creates a verifier from an optional configured secret.
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Creates a verifier from a plain secret value.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self::new(Some(SecretString::new(secret.into())))
    }

    /// Returns true when a non-empty secret is available.
    pub fn is_configured(&self) -> bool {
        self.secret
            .as_ref()
            .map(|s| !s.expose_secret().is_empty())
            .unwrap_or(false)
    }

    /// Verifies the signature over `payload`.
    ///
    /// # Errors
    ///
    /// - `MissingSecret` - No secret configured (checked first)
    /// - `InvalidSignature` - Header absent, not hex, or not matching
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let secret = match &self.secret {
            Some(secret) if !secret.expose_secret().is_empty() => secret,
            _ => {
                tracing::error!("Webhook secret not configured");
                return Err(WebhookError::MissingSecret);
            }
        };

        let Some(signature) = signature else {
            tracing::warn!("Webhook rejected: missing signature header");
            return Err(WebhookError::InvalidSignature);
        };

        let provided = match hex::decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!(received = %signature, "Webhook rejected: signature is not hex");
                return Err(WebhookError::InvalidSignature);
            }
        };

        let expected = compute_mac(secret.expose_secret().as_bytes(), payload);

        if !constant_time_compare(&expected, &provided) {
            let expected_hex = hex::encode(&expected);
            tracing::warn!(
                expected_prefix = &expected_hex[..LOGGED_DIGEST_PREFIX],
                received = %signature,
                "Invalid webhook signature"
            );
            return Err(WebhookError::InvalidSignature);
        }

        Ok(())
    }

    /// Verifies the webhook signature and parses the notification.
    ///
    /// # Verification Steps
    ///
    /// 1. Ensure a secret is configured
    /// 2. Compute expected signature using HMAC-SHA256
    /// 3. Compare signatures using constant-time comparison
    /// 4. Parse the JSON envelope into an InboundNotification
    ///
    /// Entities inside the payload are not decoded here.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<InboundNotification, WebhookError> {
        self.verify(payload, signature)?;

        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse verified webhook payload");
            WebhookError::InvalidPayload(e.to_string())
        })
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Computes the lowercase hex HMAC-SHA256 of `payload` under `secret`.
///
/// This is the value the provider places in the signature header.
pub fn compute_signature(secret: &str, payload: &[u8]) -> String {
    hex::encode(compute_mac(secret.as_bytes(), payload))
}

fn compute_mac(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

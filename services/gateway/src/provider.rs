//! Provider usage-endpoint client
//!
//! Realizes [`AccountVerifier`] against the DNS-intelligence provider's
//! account usage endpoint. A credential's remaining budget is the monthly
//! allowance minus what it has already consumed; any non-OK answer means the
//! credential is unusable, not that verification failed.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use account_pool::{AccountVerifier, Verification, VerifyError};
use account_store::ApiKey;

/// HTTP client for `GET /account/usage/`.
pub struct UsageClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct UsageResponse {
    current_monthly_usage: u32,
    allowed_monthly_usage: u32,
}

impl UsageClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        }
    }
}

#[async_trait]
impl AccountVerifier for UsageClient {
    async fn verify(&self, api_key: &ApiKey) -> Result<Verification, VerifyError> {
        let url = format!("{}/account/usage/", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("APIKEY", api_key.as_str())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| VerifyError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let usage: UsageResponse = response
                .json()
                .await
                .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
            let available_requests = usage
                .allowed_monthly_usage
                .saturating_sub(usage.current_monthly_usage);
            return Ok(Verification {
                is_active: true,
                available_requests,
            });
        }

        // 429 means the key is spent, 401 that it was revoked; either way the
        // credential has nothing left to give.
        warn!(%status, "usage endpoint rejected credential");
        Ok(Verification {
            is_active: false,
            available_requests: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn ok_response_reports_remaining_budget() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/account/usage/")
                    .header("APIKEY", "k1");
                then.status(200).json_body(serde_json::json!({
                    "current_monthly_usage": 10,
                    "allowed_monthly_usage": 50
                }));
            })
            .await;

        let client = UsageClient::new(server.base_url(), reqwest::Client::new());
        let verification = client.verify(&ApiKey::new("k1")).await.unwrap();

        assert!(verification.is_active);
        assert_eq!(verification.available_requests, 40);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_allowance_never_goes_negative() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/account/usage/");
                then.status(200).json_body(serde_json::json!({
                    "current_monthly_usage": 99,
                    "allowed_monthly_usage": 50
                }));
            })
            .await;

        let client = UsageClient::new(server.base_url(), reqwest::Client::new());
        let verification = client.verify(&ApiKey::new("k1")).await.unwrap();

        assert!(verification.is_active);
        assert_eq!(verification.available_requests, 0);
    }

    #[tokio::test]
    async fn rejected_key_is_inactive_with_zero_budget() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/account/usage/");
                then.status(401);
            })
            .await;

        let client = UsageClient::new(server.base_url(), reqwest::Client::new());
        let verification = client.verify(&ApiKey::new("revoked")).await.unwrap();

        assert!(!verification.is_active);
        assert_eq!(verification.available_requests, 0);
    }

    #[tokio::test]
    async fn malformed_ok_body_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/account/usage/");
                then.status(200).body("not json");
            })
            .await;

        let client = UsageClient::new(server.base_url(), reqwest::Client::new());
        let result = client.verify(&ApiKey::new("k1")).await;

        assert!(matches!(result, Err(VerifyError::InvalidResponse(_))));
    }
}

//! Provider-side credential verification seam

use async_trait::async_trait;

use account_store::ApiKey;

/// Live status of a credential as reported by the provider usage endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Verification {
    pub is_active: bool,
    pub available_requests: u32,
}

/// Errors from the usage endpoint.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("usage endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected usage response: {0}")]
    InvalidResponse(String),
}

/// Checks a credential's activity and remaining budget against the provider.
///
/// A provider that answers but rejects the key reports an inactive
/// verification with zero budget; only transport or contract breakage is an
/// error.
#[async_trait]
pub trait AccountVerifier: Send + Sync {
    async fn verify(&self, api_key: &ApiKey) -> Result<Verification, VerifyError>;
}

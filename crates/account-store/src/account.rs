//! Provider credential model
//!
//! `available_requests` is `None` until the credential has been verified
//! against the provider usage endpoint. `decrement_requests` and
//! `has_requests` are total over that state, so callers never branch on a
//! sentinel value.

use std::fmt;

use common::Sensitive;

/// Store-assigned account identifier. Absent before first persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider api key. The pool's deduplication identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pooled provider credential.
///
/// Never deleted: deactivation is terminal but the row is retained for
/// audit/history.
#[derive(Debug, Clone)]
pub struct Account {
    /// Assigned by the store on `create`.
    pub id: Option<AccountId>,
    pub email: String,
    pub password: Sensitive<String>,
    pub api_key: ApiKey,
    /// Sign-up time as unix seconds, assigned by the store on `create`.
    pub sign_up: Option<u64>,
    pub is_active: bool,
    /// Remaining request budget. `None` before first verification.
    pub available_requests: Option<u32>,
}

impl Account {
    /// A freshly fabricated, unpersisted account: active, budget unset until
    /// verified against the provider.
    pub fn new(email: impl Into<String>, password: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            id: None,
            email: email.into(),
            password: Sensitive::new(password.into()),
            api_key,
            sign_up: None,
            is_active: true,
            available_requests: None,
        }
    }

    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    pub fn set_available_requests(&mut self, available_requests: u32) {
        self.available_requests = Some(available_requests);
    }

    /// Consume one request from the budget. Floors at zero; a no-op when the
    /// budget is unset.
    pub fn decrement_requests(&mut self) {
        match self.available_requests {
            Some(0) | None => {}
            Some(n) => self.available_requests = Some(n - 1),
        }
    }

    /// Whether the credential still has budget to spend.
    pub fn has_requests(&self) -> bool {
        matches!(self.available_requests, Some(n) if n > 0)
    }
}

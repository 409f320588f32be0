//! Mapping of `account_response` payloads into domain outcomes

use account_store::{Account, ApiKey};
use serde::Deserialize;

use crate::protocol::CorrelationId;

/// Worker-side states of a fabrication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricationStatus {
    Ready,
    NotFound,
    Forbidden,
    Processing,
    Rejected,
    Other(String),
}

impl FabricationStatus {
    fn as_str(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Processing => "processing",
            Self::Rejected => "rejected",
            Self::Other(status) => status,
        }
    }
}

impl From<&str> for FabricationStatus {
    fn from(status: &str) -> Self {
        match status {
            "ready" => Self::Ready,
            "not_found" => Self::NotFound,
            "forbidden" => Self::Forbidden,
            "processing" => Self::Processing,
            "rejected" => Self::Rejected,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Decoded outcome of a fabrication exchange.
///
/// Success carries an unpersisted, active account whose budget is unset; the
/// pool must verify the budget against the provider before trusting it.
#[derive(Debug)]
pub struct FabricationOutcome {
    pub id: CorrelationId,
    pub result: Result<Account, String>,
}

#[derive(Deserialize)]
struct ResponsePayload {
    status: String,
    error: Option<String>,
    data: Option<AccountFields>,
}

#[derive(Deserialize)]
struct AccountFields {
    email: String,
    password: String,
    api_key: String,
}

/// Interpret the `data` object of an `account_response` message.
///
/// Total: decode failures and unexpected shapes become failure outcomes, the
/// function itself never errors. `status == "ready"` yields the new account;
/// anything else is a failure carrying the explicit `error` text, falling
/// back to the status string.
pub fn map_account_response(id: CorrelationId, data: &serde_json::Value) -> FabricationOutcome {
    let payload: ResponsePayload = match serde_json::from_value(data.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            return FabricationOutcome {
                id,
                result: Err(format!("failed to decode response payload: {e}")),
            };
        }
    };

    let result = match FabricationStatus::from(payload.status.as_str()) {
        FabricationStatus::Ready => match payload.data {
            Some(fields) => Ok(Account::new(
                fields.email,
                fields.password,
                ApiKey::new(fields.api_key),
            )),
            None => Err("ready response is missing account data".to_owned()),
        },
        status => Err(payload.error.unwrap_or_else(|| status.as_str().to_owned())),
    };

    FabricationOutcome { id, result }
}

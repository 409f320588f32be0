//! Shared types for the credential-pool gateway

mod error;
mod sensitive;

pub use error::{Error, Result};
pub use sensitive::Sensitive;

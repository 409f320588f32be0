//! Shared error types

use thiserror::Error;

/// Errors shared across the workspace crates.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias using the shared Error
pub type Result<T> = std::result::Result<T, Error>;

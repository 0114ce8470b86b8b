// src/error.rs
use thiserror::Error;

/// Typed errors surfaced to API callers and startup.
/// Everything else travels as `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PulseError {
    #[error("invalid API key")]
    Forbidden,
    #[error("missing API key")]
    MissingCredential,
    #[error("configuration error: {0}")]
    Config(String),
}

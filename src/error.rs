//! # Error Taxonomy
//!
//! Every failure in the rain indicator falls into one of these enums. Only
//! [`FetchError`] is recovered inside the control loop; the others end the process
//! after the LED has been switched off.

use thiserror::Error;

/// Invalid or unreadable configuration. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`crate::config::Config`]
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but violates a constraint
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Forecast retrieval failure. Always recoverable: the next tick retries.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection refused, DNS failure, or timeout
    #[error("network error: {0}")]
    Network(String),

    /// Body is not JSON, or lacks the expected PoP fields
    #[error("parse error: {0}")]
    Parse(String),

    /// Well-formed response signalling an upstream failure
    #[error("service error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the API key
        let err = err.without_url();
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if err.is_status() {
            // Non-2xx via `error_for_status`
            FetchError::Service(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// LED write or button read failed. Fatal: the device exists to actuate.
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("GPIO error: {0}")]
    Io(String),
}

/// Decision engine misuse.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecisionError {
    /// `decide` was handed no samples
    #[error("invalid input: empty sample set")]
    InvalidInput,
}

/// Fatal errors a control loop tick can return.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error(transparent)]
    Decision(#[from] DecisionError),
}

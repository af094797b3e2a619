//! Forecast provider contract.
//!
//! A provider turns one request into a batch of PoP samples. It never retries;
//! retry timing belongs to [`crate::control::ControlLoop`].

use crate::error::FetchError;
use crate::ForecastSample;
use async_trait::async_trait;

/// Longest hourly window the loop ever requests
pub const MAX_HOURLY_SAMPLES: u8 = 12;

/// Forecast window requested on each refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// A single value for the current day
    Today,
    /// One value per hour, earliest first, at most [`MAX_HOURLY_SAMPLES`]
    NextHours(u8),
}

impl Horizon {
    /// Hourly horizon clamped to `1..=MAX_HOURLY_SAMPLES`
    pub fn next_hours(hours: u8) -> Self {
        Horizon::NextHours(hours.clamp(1, MAX_HOURLY_SAMPLES))
    }

    /// Upper bound on the number of samples a fetch may return
    pub fn max_samples(self) -> usize {
        match self {
            Horizon::Today => 1,
            Horizon::NextHours(n) => usize::from(n.min(MAX_HOURLY_SAMPLES)),
        }
    }
}

/// Source of precipitation forecasts.
///
/// Implementations own their location and credentials. A successful fetch returns
/// between 1 and `horizon.max_samples()` samples; an empty result is reported as
/// [`FetchError::Parse`] rather than `Ok(vec![])`.
#[async_trait]
pub trait ForecastProvider {
    async fn fetch(&self, horizon: Horizon) -> Result<Vec<ForecastSample>, FetchError>;
}

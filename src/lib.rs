//! # Rain LED Core Library
//!
//! This library provides the control loop and data types for the rain indicator
//! application. A single LED on a Raspberry Pi shows whether rain is likely, based on
//! the probability of precipitation (PoP) reported by a forecast service. A push
//! button forces an immediate re-check.
//!
//! ## Design Philosophy
//!
//! ### One Loop, One Owner
//! - **Single-threaded**: [`control::ControlLoop`] ticks on a fixed cadence and owns
//!   every piece of mutable state, the LED and the button included
//! - **Immutable configuration**: [`config::Config`] is loaded once at startup and
//!   handed to the loop by value
//! - **Explicit results**: each tick returns `Result<TickOutcome, LoopError>`; only
//!   fatal kinds escape to the binary
//!
//! ### Data Flow
//! 1. **Trigger**: first tick, hour/day rollover, or a button press sets `needs_refresh`
//! 2. **Fetch**: [`forecast::ForecastProvider`] returns one or up to 12 PoP samples
//! 3. **Decide**: [`decision::decide`] lights the LED iff the peak PoP exceeds the threshold
//! 4. **Actuate**: [`actuator::Actuator::set`] drives the LED
//!
//! A failed fetch leaves the LED exactly as it was and retries on the next tick.
//!
//! ## Core Types
//! - [`ForecastSample`]: a single PoP reading for one horizon step

use serde::{Deserialize, Serialize};

pub mod actuator;
pub mod clock;
pub mod config;
pub mod console;
pub mod control;
pub mod decision;
pub mod error;
pub mod forecast;
pub mod input;
pub mod wunderground;

pub use error::{ActuatorError, ConfigError, DecisionError, FetchError, LoopError};

/// A single probability-of-precipitation reading.
///
/// Created by a [`forecast::ForecastProvider`] on each successful fetch and consumed
/// immediately by the control loop; samples are never persisted.
///
/// # Example
/// ```
/// use rain_led_lib::ForecastSample;
///
/// // Today's forecast carries no hour tag
/// let today = ForecastSample { pop: 40, hour_offset: None };
///
/// // Third hour of the 12-hour window
/// let hourly = ForecastSample { pop: 65, hour_offset: Some(2) };
/// assert!(hourly.pop > today.pop);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Probability of precipitation in percent (0-100)
    pub pop: u8,
    /// Hours from now for hourly forecasts, `None` for a whole-day forecast
    pub hour_offset: Option<u8>,
}

impl ForecastSample {
    /// PoP values of a sample batch, preserving order.
    pub fn pops(samples: &[ForecastSample]) -> Vec<u8> {
        samples.iter().map(|s| s.pop).collect()
    }
}

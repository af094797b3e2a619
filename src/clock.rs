//! Wall-clock access and the refresh granularity used by the time-based trigger.

use chrono::{DateTime, Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

/// Source of local wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// How often the forecast is refreshed without a button press.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPeriod {
    /// Compare hour-of-day (0-23)
    #[default]
    Hourly,
    /// Compare day-of-month (1-31)
    Daily,
}

impl RefreshPeriod {
    /// The time unit compared against `last_refresh_unit`.
    pub fn unit_of(self, at: &DateTime<Local>) -> u32 {
        match self {
            RefreshPeriod::Hourly => at.hour(),
            RefreshPeriod::Daily => at.day(),
        }
    }
}

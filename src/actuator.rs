//! LED actuator contract, blink patterns, and the safe-shutdown guard.

use crate::config::BlinkConfig;
use crate::error::ActuatorError;
use std::time::Duration;
use tracing::{error, info};

/// Digital output driving the indicator LED.
pub trait Actuator {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// A run of identical on/off pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub count: u8,
    /// Length of each on phase and each off phase
    pub timing: Duration,
}

impl Default for BlinkPattern {
    fn default() -> Self {
        BlinkPattern {
            count: 5,
            timing: Duration::from_millis(100),
        }
    }
}

impl From<&BlinkConfig> for BlinkPattern {
    fn from(config: &BlinkConfig) -> Self {
        BlinkPattern {
            count: config.count,
            timing: Duration::from_millis(config.timing_ms),
        }
    }
}

/// Switch off, then pulse `pattern.count` times. Leaves the LED off.
pub async fn blink<A: Actuator + ?Sized>(
    actuator: &mut A,
    pattern: BlinkPattern,
) -> Result<(), ActuatorError> {
    actuator.set(false)?;
    for _ in 0..pattern.count {
        actuator.set(true)?;
        tokio::time::sleep(pattern.timing).await;
        actuator.set(false)?;
        tokio::time::sleep(pattern.timing).await;
    }
    Ok(())
}

/// Owns an actuator and guarantees it is driven off exactly once.
///
/// [`SafeActuator::shutdown`] is the normal path. If the guard is dropped without it
/// (early return, panic unwinding) `Drop` runs the same path. Writes after shutdown
/// are ignored.
pub struct SafeActuator<A: Actuator> {
    inner: A,
    shut_down: bool,
}

impl<A: Actuator> SafeActuator<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            shut_down: false,
        }
    }

    /// Drive the LED off. Only the first call touches the hardware.
    pub fn shutdown(&mut self) -> Result<(), ActuatorError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        info!("switching LED off for shutdown");
        self.inner.set(false)
    }
}

impl<A: Actuator> Actuator for SafeActuator<A> {
    fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.shut_down {
            return Ok(());
        }
        self.inner.set(on)
    }
}

impl<A: Actuator> Drop for SafeActuator<A> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(error = %e, "failed to switch LED off during cleanup");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLed;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_blink_pulses_and_ends_off() {
        let mut led = RecordingLed::default();
        blink(&mut led, BlinkPattern::default()).await.unwrap();
        let writes = led.writes();
        assert_eq!(writes.len(), 11);
        assert!(!writes[0]);
        assert_eq!(writes.iter().filter(|on| **on).count(), 5);
        assert_eq!(led.last(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_duration_follows_timing() {
        let mut led = RecordingLed::default();
        let start = tokio::time::Instant::now();
        let pattern = BlinkPattern {
            count: 3,
            timing: Duration::from_millis(50),
        };
        blink(&mut led, pattern).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn test_shutdown_runs_exactly_once() {
        let led = RecordingLed::default();
        let mut guard = SafeActuator::new(led.clone());
        guard.set(true).unwrap();
        guard.shutdown().unwrap();
        guard.shutdown().unwrap();
        guard.set(true).unwrap();
        drop(guard);
        assert_eq!(led.writes(), vec![true, false]);
    }

    #[test]
    fn test_drop_without_shutdown_switches_off() {
        let led = RecordingLed::default();
        {
            let mut guard = SafeActuator::new(led.clone());
            guard.set(true).unwrap();
        }
        assert_eq!(led.writes(), vec![true, false]);
    }

    #[test]
    fn test_blink_config_conversion() {
        let pattern = BlinkPattern::from(&BlinkConfig {
            count: 2,
            timing_ms: 250,
        });
        assert_eq!(pattern.count, 2);
        assert_eq!(pattern.timing, Duration::from_millis(250));
    }
}

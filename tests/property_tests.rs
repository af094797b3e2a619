//! Property tests for the rain decision and the time-based refresh trigger.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use proptest::prelude::*;
use rain_led_lib::actuator::{Actuator, BlinkPattern};
use rain_led_lib::clock::{Clock, RefreshPeriod};
use rain_led_lib::control::{ControlLoop, LoopSettings};
use rain_led_lib::decision::decide;
use rain_led_lib::forecast::{ForecastProvider, Horizon};
use rain_led_lib::input::EdgeLatch;
use rain_led_lib::{ActuatorError, DecisionError, FetchError, ForecastSample};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct CountingForecast(Arc<AtomicUsize>);

#[async_trait]
impl ForecastProvider for CountingForecast {
    async fn fetch(&self, _horizon: Horizon) -> Result<Vec<ForecastSample>, FetchError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ForecastSample {
            pop: 50,
            hour_offset: Some(0),
        }])
    }
}

struct NullLed;

impl Actuator for NullLed {
    fn set(&mut self, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
}

#[derive(Clone)]
struct HourClock(Rc<Cell<u32>>);

impl Clock for HourClock {
    fn now(&self) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 7, 24, self.0.get(), 0, 0)
            .unwrap()
    }
}

fn settings() -> LoopSettings {
    LoopSettings {
        threshold_percent: 30,
        refresh_period: RefreshPeriod::Hourly,
        horizon: Horizon::NextHours(12),
        poll_interval: Duration::from_millis(500),
        blink: BlinkPattern::default(),
        max_backoff: None,
    }
}

proptest! {
    /// decide(S, T) == max(S) > T for every non-empty S.
    #[test]
    fn decide_matches_strict_maximum(
        samples in proptest::collection::vec(0u8..=100u8, 1..=12),
        threshold in 0u8..=100u8,
    ) {
        let expected = *samples.iter().max().unwrap() > threshold;
        prop_assert_eq!(decide(&samples, threshold), Ok(expected));
    }

    /// All samples at the threshold never light the LED.
    #[test]
    fn decide_boundary_is_off(threshold in 0u8..=100u8, len in 1usize..=12) {
        let samples = vec![threshold; len];
        prop_assert_eq!(decide(&samples, threshold), Ok(false));
    }

    /// Order of samples does not matter.
    #[test]
    fn decide_ignores_order(
        mut samples in proptest::collection::vec(0u8..=100u8, 1..=12),
        threshold in 0u8..=100u8,
    ) {
        let forward = decide(&samples, threshold);
        samples.reverse();
        prop_assert_eq!(decide(&samples, threshold), forward);
    }

    /// One fetch at startup plus one per hour change, whatever the tick pattern.
    #[test]
    fn fetches_once_per_hour_change(hours in proptest::collection::vec(0u32..24, 1..60)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        let calls = CountingForecast::default();
        let hour = Rc::new(Cell::new(hours[0]));
        let mut control = ControlLoop::new(
            settings(),
            calls.clone(),
            NullLed,
            EdgeLatch::new(),
            HourClock(hour.clone()),
        );

        rt.block_on(async {
            for h in &hours {
                hour.set(*h);
                control.tick().await.unwrap();
            }
        });

        let changes = hours.windows(2).filter(|w| w[0] != w[1]).count();
        prop_assert_eq!(calls.0.load(Ordering::SeqCst), 1 + changes);
        prop_assert_eq!(control.state().last_refresh_unit, *hours.last().unwrap());
    }
}

#[test]
fn decide_rejects_empty_input() {
    assert_eq!(decide(&[], 0), Err(DecisionError::InvalidInput));
}

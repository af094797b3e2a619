//! # Control Loop
//!
//! The state machine that decides when to refresh the forecast and drives the LED.
//!
//! ## Tick Order
//! Every `poll_interval` the loop evaluates, in this order:
//! 1. **Time trigger**: the current hour (or day) differs from `last_refresh_unit`.
//!    Level-triggered, so a missed boundary still fires on the next tick.
//! 2. **Button trigger**: a pending rising edge is taken, acknowledged with a blink,
//!    and forces a refresh.
//! 3. **Refresh**: fetch, decide, actuate. Completes before the next tick starts.
//!
//! The first tick always refreshes because `needs_refresh` starts out `true`.
//!
//! ## Failure Policy
//! - [`FetchError`]: logged, `needs_refresh` stays set, LED untouched. The next tick
//!   retries, or the next tick after the backoff delay when `max_backoff` is set.
//! - [`ActuatorError`] and [`DecisionError`]: returned from [`ControlLoop::tick`] as
//!   [`LoopError`]; [`ControlLoop::run`] switches the LED off and hands the error back.
//!
//! [`ActuatorError`]: crate::error::ActuatorError
//! [`DecisionError`]: crate::error::DecisionError

use crate::actuator::{blink, Actuator, BlinkPattern, SafeActuator};
use crate::clock::{Clock, RefreshPeriod};
use crate::config::Config;
use crate::decision::{decide, peak};
use crate::error::{DecisionError, FetchError, LoopError};
use crate::forecast::{ForecastProvider, Horizon};
use crate::input::InputSource;
use crate::ForecastSample;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Loop parameters extracted from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub threshold_percent: u8,
    pub refresh_period: RefreshPeriod,
    pub horizon: Horizon,
    pub poll_interval: Duration,
    pub blink: BlinkPattern,
    /// `None` retries a failed fetch on every tick
    pub max_backoff: Option<Duration>,
}

impl From<&Config> for LoopSettings {
    fn from(config: &Config) -> Self {
        LoopSettings {
            threshold_percent: config.decision.threshold_percent,
            refresh_period: config.schedule.refresh_period,
            horizon: config.horizon(),
            poll_interval: config.schedule.poll_interval(),
            blink: BlinkPattern::from(&config.blink),
            max_backoff: config.schedule.max_backoff(),
        }
    }
}

/// Mutable loop state. Owned by [`ControlLoop`] and never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    pub needs_refresh: bool,
    /// Hour-of-day or day-of-month of the last time trigger
    pub last_refresh_unit: u32,
    /// LED state set by the last successful refresh
    pub led_state: bool,
    pub consecutive_failures: u32,
}

impl LoopState {
    fn new(current_unit: u32) -> Self {
        LoopState {
            needs_refresh: true,
            last_refresh_unit: current_unit,
            led_state: false,
            consecutive_failures: 0,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No trigger pending
    Idle,
    /// Fetch succeeded and the LED now shows `decision`
    Refreshed { decision: bool, peak: u8 },
    /// Fetch failed; retry pending
    FetchFailed,
    /// Retry pending but the backoff delay has not elapsed
    BackingOff,
}

pub struct ControlLoop<P, A, I, C>
where
    A: Actuator,
{
    settings: LoopSettings,
    provider: P,
    actuator: SafeActuator<A>,
    input: I,
    clock: C,
    state: LoopState,
    retry_at: Option<Instant>,
}

impl<P, A, I, C> ControlLoop<P, A, I, C>
where
    P: ForecastProvider,
    A: Actuator,
    I: InputSource,
    C: Clock,
{
    pub fn new(settings: LoopSettings, provider: P, actuator: A, input: I, clock: C) -> Self {
        let unit = settings.refresh_period.unit_of(&clock.now());
        ControlLoop {
            settings,
            provider,
            actuator: SafeActuator::new(actuator),
            input,
            clock,
            state: LoopState::new(unit),
            retry_at: None,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Blink to signal readiness.
    pub async fn startup(&mut self) -> Result<(), LoopError> {
        info!(
            threshold = self.settings.threshold_percent,
            period = ?self.settings.refresh_period,
            horizon = ?self.settings.horizon,
            "rain indicator ready"
        );
        blink(&mut self.actuator, self.settings.blink).await?;
        Ok(())
    }

    /// Evaluate triggers, then refresh if one is pending.
    pub async fn tick(&mut self) -> Result<TickOutcome, LoopError> {
        self.check_schedule();

        if self.input.take_edge()? {
            info!("button pressed, forcing refresh");
            blink(&mut self.actuator, self.settings.blink).await?;
            // Blink ends dark; show the last decision again until the refresh lands
            self.actuator.set(self.state.led_state)?;
            self.state.needs_refresh = true;
            self.retry_at = None;
        }

        if !self.state.needs_refresh {
            return Ok(TickOutcome::Idle);
        }
        if self.retry_at.is_some_and(|at| Instant::now() < at) {
            return Ok(TickOutcome::BackingOff);
        }
        self.refresh().await
    }

    /// Run one fetch+decide+actuate cycle regardless of triggers.
    pub async fn refresh_once(&mut self) -> Result<TickOutcome, LoopError> {
        self.state.needs_refresh = true;
        self.refresh().await
    }

    /// Blink, then tick until `shutdown` resolves or a fatal error occurs.
    ///
    /// `shutdown` is polled before each tick and while sleeping between ticks,
    /// never during a refresh. The LED is
    /// switched off before returning on every path.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), LoopError>
    where
        F: Future<Output = ()>,
    {
        let result = self.drive(shutdown).await;
        if let Err(e) = &result {
            warn!(error = %e, "control loop stopped on fatal error");
        }
        let cleanup = self.actuator.shutdown();
        info!("exiting, GPIO left in a safe state");
        result?;
        cleanup?;
        Ok(())
    }

    async fn drive<F>(&mut self, shutdown: F) -> Result<(), LoopError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.startup().await?;
        loop {
            // Seen at the top of every tick, including the first after startup
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("termination requested");
                    return Ok(());
                }
                _ = std::future::ready(()) => {}
            }
            self.tick().await?;
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("termination requested");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    fn check_schedule(&mut self) {
        let unit = self.settings.refresh_period.unit_of(&self.clock.now());
        if unit != self.state.last_refresh_unit {
            debug!(
                from = self.state.last_refresh_unit,
                to = unit,
                "time unit rolled over, refresh due"
            );
            self.state.needs_refresh = true;
            self.state.last_refresh_unit = unit;
        }
    }

    async fn refresh(&mut self) -> Result<TickOutcome, LoopError> {
        info!("retrieving forecast");
        let samples = match self.provider.fetch(self.settings.horizon).await {
            Ok(samples) => samples,
            Err(e) => {
                self.record_failure(&e);
                return Ok(TickOutcome::FetchFailed);
            }
        };

        let pops = ForecastSample::pops(&samples);
        let peak = peak(&pops).ok_or(DecisionError::InvalidInput)?;
        let decision = decide(&pops, self.settings.threshold_percent)?;
        self.actuator.set(decision)?;

        self.state.needs_refresh = false;
        self.state.led_state = decision;
        self.state.consecutive_failures = 0;
        self.retry_at = None;

        let led = if decision { "on" } else { "off" };
        info!(
            pop = peak,
            min_pop = self.settings.threshold_percent,
            samples = pops.len(),
            led,
            "forecast refreshed"
        );
        Ok(TickOutcome::Refreshed { decision, peak })
    }

    fn record_failure(&mut self, err: &FetchError) {
        let failures = self.state.consecutive_failures.saturating_add(1);
        self.state.consecutive_failures = failures;
        let poll = self.settings.poll_interval;
        let delay = self
            .settings
            .max_backoff
            .map(|cap| backoff_delay(poll, failures, cap));
        self.retry_at = delay.map(|d| Instant::now() + d);
        warn!(
            error = %err,
            failures,
            retry_in = ?delay.unwrap_or(self.settings.poll_interval),
            "forecast fetch failed, LED unchanged"
        );
    }
}

/// `poll_interval * 2^failures`, capped at `cap`.
pub fn backoff_delay(poll_interval: Duration, failures: u32, cap: Duration) -> Duration {
    let factor = 1u32 << failures.min(16);
    poll_interval.saturating_mul(factor).min(cap)
}

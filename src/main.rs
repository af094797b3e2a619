//! # Rain LED Application Entry Point
//!
//! This binary crate wires configuration, the forecast client, and the LED/button
//! backends into a [`ControlLoop`] and runs it until SIGINT or SIGTERM.
//! It supports both production mode (GPIO, `--features hardware`) and development
//! mode (`--stdout`: terminal LED, Enter as the button).


#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_rppal;

use anyhow::{bail, Context};
use clap::Parser;
use rain_led_lib::actuator::Actuator;
use rain_led_lib::clock::SystemClock;
use rain_led_lib::config::{Config, DEFAULT_CONFIG_PATH};
use rain_led_lib::console::{ConsoleButton, ConsoleLed};
use rain_led_lib::control::{ControlLoop, LoopSettings, TickOutcome};
use rain_led_lib::forecast::ForecastProvider;
use rain_led_lib::input::InputSource;
use rain_led_lib::wunderground::WundergroundClient;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Light an LED when rain is likely.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the terminal instead of GPIO: LED changes are printed, Enter presses the button
    #[arg(long)]
    stdout: bool,

    /// Refresh once, print the decision, and exit
    #[arg(long)]
    once: bool,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    init_config: bool,

    /// Let --init-config replace an existing file
    #[arg(long, requires = "init_config")]
    force: bool,
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    // Load .env file if present (RAIN_LED_API_KEY)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.init_config {
        return init_config(&cli.config, cli.force);
    }

    let config = Config::load_from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    // One thread: the loop is the only task
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(&cli, config))
}

/// Write the default configuration, refusing to replace an existing file unless forced.
fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    Config::default().save_to_path(path)
}

async fn run(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let settings = LoopSettings::from(&config);
    let provider =
        WundergroundClient::new(config.forecast.clone()).context("building HTTP client")?;

    if cli.stdout {
        let button = ConsoleButton::spawn().context("starting stdin reader")?;
        info!("development mode: press Enter to force a refresh");
        let control = ControlLoop::new(settings, provider, ConsoleLed::new(), button, SystemClock);
        return drive(control, cli.once).await;
    }

    run_hardware(&config, settings, provider, cli.once).await
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
async fn run_hardware(
    config: &Config,
    settings: LoopSettings,
    provider: WundergroundClient,
    once: bool,
) -> anyhow::Result<()> {
    let (led, button) = gpio_rppal::open(&config.hardware).context("GPIO unavailable")?;
    let control = ControlLoop::new(settings, provider, led, button, SystemClock);
    drive(control, once).await
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
async fn run_hardware(
    _config: &Config,
    _settings: LoopSettings,
    _provider: WundergroundClient,
    _once: bool,
) -> anyhow::Result<()> {
    bail!("GPIO support not enabled. Rebuild with --features hardware on Linux, or use --stdout")
}

async fn drive<P, A, I>(
    mut control: ControlLoop<P, A, I, SystemClock>,
    once: bool,
) -> anyhow::Result<()>
where
    P: ForecastProvider,
    A: Actuator,
    I: InputSource,
{
    if once {
        let outcome = control.refresh_once().await?;
        println!("{}", describe(outcome, control.settings().threshold_percent)?);
        return Ok(());
    }

    let shutdown = shutdown_signal().context("installing signal handlers")?;
    control.run(shutdown).await?;
    info!("clean shutdown");
    Ok(())
}

/// One-line summary of a `--once` refresh.
fn describe(outcome: TickOutcome, threshold: u8) -> anyhow::Result<String> {
    match outcome {
        TickOutcome::Refreshed { decision, peak } => Ok(format!(
            "Pop: {peak} MinPop: {threshold} -> {}",
            if decision { "rain likely" } else { "dry" }
        )),
        TickOutcome::FetchFailed => bail!("forecast fetch failed"),
        TickOutcome::Idle | TickOutcome::BackingOff => bail!("no refresh performed"),
    }
}

/// Resolves on SIGINT or SIGTERM. Handlers are installed before returning so a
/// signal during startup is not lost.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}

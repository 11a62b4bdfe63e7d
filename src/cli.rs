use crate::engine::driver::{GpioStepDriver, Line, LineIndicator, Polarity, PulseTiming};
use crate::engine::sync::SyncScheduler;
use crate::engine::time_source::HttpTimeSource;
use crate::engine::timing::TokioSleeper;
use crate::engine::ClockController;
use crate::orchestrator::{run_console, Station};
use crate::position::Position;
use crate::storage::{self, JsonFileStore, PositionStore};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::Notify;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "station-clock",
    version,
    about = "Keeps a stepper-driven station clock on network time"
)]
pub struct Cli {
    /// Path to the configuration file (display position, timezone URL)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Time the hands currently show (HH:MM); recorded before starting
    #[arg(long, value_parser = crate::command::parse_clock_time)]
    pub display_time: Option<Position>,

    /// Time service URL; recorded before starting
    #[arg(long)]
    pub timezone_url: Option<String>,

    /// GPIO number of the driver enable line
    #[arg(long, default_value_t = 6)]
    pub enable_pin: u64,

    /// GPIO number of the driver step line
    #[arg(long, default_value_t = 7)]
    pub step_pin: u64,

    /// GPIO number of the sync status LED
    #[arg(long, default_value_t = 8)]
    pub led_pin: u64,

    /// Treat the enable line as active high (default: active low)
    #[arg(long)]
    pub enable_active_high: bool,

    /// Treat the LED line as active high (default: active low)
    #[arg(long)]
    pub led_active_high: bool,

    /// Log GPIO transitions instead of driving real lines
    #[arg(long)]
    pub dry_run: bool,

    /// Delay between enabling the driver and the first step edge
    #[arg(long, default_value = "10ms")]
    pub settle: humantime::Duration,

    /// Step pulse width
    #[arg(long, default_value = "25ms")]
    pub pulse_width: humantime::Duration,

    /// Gap after each step pulse
    #[arg(long, default_value = "250ms")]
    pub pulse_gap: humantime::Duration,

    /// How often to re-synchronize with the time service
    #[arg(long, default_value = "1h")]
    pub sync_interval: humantime::Duration,

    /// Give up on a time service request after this long
    #[arg(long, default_value = "10s")]
    pub sync_timeout: humantime::Duration,

    /// Start in the interactive console instead of automatic mode
    #[arg(long)]
    pub console: bool,
}

fn polarity(active_high: bool) -> Polarity {
    if active_high {
        Polarity::ActiveHigh
    } else {
        Polarity::ActiveLow
    }
}

/// Raise `stop` and wake an idle console on every Ctrl-C. Installing the
/// handler also keeps Ctrl-C from killing the process, so it can fall back to
/// the console.
fn spawn_stop_listener(stop: Arc<AtomicBool>, interrupts: Arc<Notify>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::Relaxed);
            interrupts.notify_waiters();
        }
    });
}

/// Process exit code for the outcome of [`run`], reporting a failure on `err`.
pub fn exit_code(outcome: Result<()>, err: &mut impl std::io::Write) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "Error: {e:#}");
            1
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let store = JsonFileStore::new(
        args.config
            .clone()
            .unwrap_or_else(storage::default_config_path),
    );
    tracing::info!(path = %store.path().display(), "using configuration file");
    let mut config = storage::load_or_default(&store);

    if args.display_time.is_some() || args.timezone_url.is_some() {
        if let Some(pos) = args.display_time {
            config.display = pos;
        }
        if let Some(url) = args.timezone_url.clone() {
            config.timezone_url = url;
        }
        if let Err(e) = store.save(&config) {
            tracing::warn!(error = %e, "failed to record startup overrides");
        }
    }

    let sleeper = TokioSleeper;
    let enable = Line::open("enable", args.enable_pin, args.dry_run)
        .with_context(|| format!("failed to open enable line (GPIO {})", args.enable_pin))?;
    let step = Line::open("step", args.step_pin, args.dry_run)
        .with_context(|| format!("failed to open step line (GPIO {})", args.step_pin))?;
    let led = Line::open("led", args.led_pin, args.dry_run)
        .with_context(|| format!("failed to open LED line (GPIO {})", args.led_pin))?;

    let timing = PulseTiming {
        settle: Duration::from(args.settle),
        width: Duration::from(args.pulse_width),
        gap: Duration::from(args.pulse_gap),
    };
    let driver = GpioStepDriver::new(
        enable,
        step,
        polarity(args.enable_active_high),
        timing,
        sleeper,
    )
    .context("failed to initialize step driver")?;
    let indicator = LineIndicator::new(led, polarity(args.led_active_high));

    let time = HttpTimeSource::new(Duration::from(args.sync_timeout))
        .context("failed to build time service client")?;
    let sync = SyncScheduler::new(Duration::from(args.sync_interval), indicator);
    let controller = ClockController::new(config, driver, store);

    let stop = Arc::new(AtomicBool::new(false));
    let interrupts = Arc::new(Notify::new());
    spawn_stop_listener(stop.clone(), interrupts.clone());

    let mut station = Station::new(controller, time, sync, sleeper, stop);

    let mut stdout = std::io::stdout();
    if !args.console {
        println!("Clock started. Press Ctrl+C to enter interactive mode.");
        station.run_automatic().await;
        println!("\nClock stopped. Entering interactive mode...");
    }
    run_console(
        &mut station,
        BufReader::new(tokio::io::stdin()),
        &mut stdout,
        &interrupts,
    )
    .await?;
    tracing::info!(displayed = %station.controller().displayed(), "console closed");
    Ok(())
}

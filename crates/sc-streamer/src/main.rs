use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

mod config;
mod stats;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "sc-streamer")]
#[command(about = "Screen capture driving loop", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "scopecast.toml")]
    config: PathBuf,

    /// Screen index to capture (overrides config)
    #[arg(short, long)]
    monitor: Option<usize>,

    /// Capture rate in frames per second (overrides config)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// List available screens and exit
    #[arg(long)]
    list_screens: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    info!("scopecast streamer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if args.config.exists() {
        info!("Loading configuration from: {}", args.config.display());
        Config::from_file(&args.config)?
    } else {
        warn!("Config file not found, using defaults");
        Config::default()
    };

    if let Some(monitor) = args.monitor {
        config.capture.monitor = monitor;
    }
    if let Some(fps) = args.fps {
        config.capture.fps = fps;
    }
    config.validate()?;

    run(config, args.list_screens).await
}

#[cfg(windows)]
async fn run(config: Config, list_screens: bool) -> anyhow::Result<()> {
    use sc_capture::{CaptureOutcome, Capturer, DxgiBackend};
    use std::time::Duration;
    use tokio::time::interval;
    use tracing::debug;

    let mut capturer = Capturer::new(DxgiBackend);

    if list_screens {
        let bounds = capturer.virtual_screen_bounds();
        println!("Available screens: {}", capturer.screen_count());
        println!(
            "Virtual desktop: {}x{} at ({}, {})",
            bounds.width, bounds.height, bounds.left, bounds.top
        );
        return Ok(());
    }

    capturer.set_selected_screen(config.capture.monitor);
    capturer.on_screen_changed(|bounds| {
        info!(
            "Screen changed: {}x{} at ({}, {})",
            bounds.width, bounds.height, bounds.left, bounds.top
        );
    });

    let mut stats = stats::StatsCollector::new();
    let mut tick = interval(Duration::from_micros(
        1_000_000 / u64::from(config.capture.fps),
    ));
    let mut report = interval(Duration::from_secs(config.stats.report_interval_secs));

    info!(
        "Capturing screen {} at {} fps, press Ctrl+C to stop",
        config.capture.monitor, config.capture.fps
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match capturer.capture() {
                    CaptureOutcome::Updated(pair) => {
                        stats.frames_updated += 1;
                        // a real consumer would diff previous against current
                        // here and ship the delta
                        debug!(
                            "Frame {}x{} ({} bytes)",
                            pair.current.width(),
                            pair.current.height(),
                            pair.current.data().len()
                        );
                        if capturer.capture_fullscreen() {
                            capturer.set_capture_fullscreen(false);
                        }
                    }
                    CaptureOutcome::NoChange => stats.ticks_unchanged += 1,
                    CaptureOutcome::Recovering => stats.recoveries += 1,
                }
            }
            _ = report.tick() => {
                info!(
                    "Captured {} frames ({} unchanged ticks, {} recoveries, {:.1} avg fps)",
                    stats.frames_updated, stats.ticks_unchanged, stats.recoveries,
                    stats.average_fps()
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    capturer.dispose();
    info!(
        "Capture stopped after {} frames in {}s",
        stats.frames_updated,
        stats.uptime_secs()
    );
    Ok(())
}

// No-op stub keeps non-Windows builds compiling
#[cfg(not(windows))]
async fn run(_config: Config, _list_screens: bool) -> anyhow::Result<()> {
    anyhow::bail!("desktop duplication capture is only supported on Windows")
}

//! # GPS/IMU Monitor
//!
//! Listens for the receivers' GPS datagrams and logs the last-known position
//! and orientation.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use gps_imu_monitor::config::{Config, LoggingConfig};
use gps_imu_monitor::converter::ConversionClient;
use gps_imu_monitor::gps::listener::GpsListener;
use gps_imu_monitor::TelemetryAggregator;

/// File name prefix of the rolling log
const LOG_FILE_PREFIX: &str = "gps-imu-monitor.log";

/// Number of datagrams between summary log messages
const LOG_INTERVAL_DATAGRAMS: u64 = 1000;

/// Main entry point for the GPS/IMU monitor
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, defaults when absent)
///    - Set up logging to the console or a daily rolling file
///    - Bind the UDP listener
///
/// 2. **Main Loop**
///    - Decode each datagram and apply it to the aggregator
///    - Log the GPS status line after every update
///    - Handle Ctrl+C for graceful shutdown
///
/// The IMU path needs a time-series store client and is driven by embedders
/// through [`TelemetryAggregator::poll_imu`]; this binary tracks GPS only.
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be loaded
/// - The UDP socket cannot be bound
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
///
/// Expected output:
/// ```text
/// INFO gps_imu_monitor: GPS/IMU Monitor v0.1.0 starting...
/// INFO gps_imu_monitor::gps::listener: Listening for GPS datagrams on 0.0.0.0:6003
/// INFO gps_imu_monitor: (GPS1) T = 12:34:56 LONG = 11.23450 LAT = 45.12340 YAW = nan TILT = nan ALTITUDE = 123.400
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    // Dropping the guard flushes the file writer
    let _log_guard = init_logging(&config.logging)?;

    info!("GPS/IMU Monitor v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut listener = GpsListener::from_config(&config.gps)
        .await
        .context("Failed to bind GPS listener")?;

    let mut aggregator = TelemetryAggregator::new(
        config.imu.descriptors(),
        config.imu.query_interval_s,
        ConversionClient::disabled(),
    );

    info!("Press Ctrl+C to exit");

    let mut datagram_count: u64 = 0;
    let mut rejected_count: u64 = 0;

    loop {
        tokio::select! {
            received = listener.recv_datagram() => {
                let (raw, peer) = match received {
                    Ok(datagram) => datagram,
                    Err(e) => {
                        warn!("Failed to receive datagram: {}", e);
                        continue;
                    }
                };

                datagram_count += 1;

                match aggregator.update_gps(raw) {
                    Ok(update) if update.is_empty() => {
                        debug!("No readings in datagram from {}", peer);
                    }
                    Ok(_) => info!("{}", aggregator.gps()),
                    Err(e) => {
                        rejected_count += 1;
                        warn!("Dropping datagram from {}: {}", peer, e);
                    }
                }

                if datagram_count % LOG_INTERVAL_DATAGRAMS == 0 {
                    info!("Received {} datagrams ({} rejected)", datagram_count, rejected_count);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total datagrams received: {} ({} rejected)", datagram_count, rejected_count);
                break;
            }
        }
    }

    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` directives take precedence over the configured level. When
/// `log_dir` is set, output goes to a daily rolling file and the returned
/// guard must live as long as logging is needed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: tracing::Level = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level {:?}", config.level))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if config.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

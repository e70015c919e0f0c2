//! Command-line interface for Dyson Pure Link devices.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use purelink_core::config::env_vars;
use purelink_core::{FanMode, StandbyMonitoring};
use purelink_devices::{AdapterError, DeviceConfig, PureLinkDevice};
use tracing::warn;

/// PureLink - Read and control a Dyson Pure Link air purifier.
#[derive(Parser, Debug)]
#[command(name = "purelink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to $PURELINK_CONFIG, then ./purelink.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set the fan mode (OFF, FAN, AUTO).
    #[arg(long)]
    fan: Option<FanMode>,

    /// Set air quality monitoring on standby (ON, OFF).
    #[arg(long)]
    standby: Option<StandbyMonitoring>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = DeviceConfig::load(args.config.as_deref()).context("Failed to load config")?;
    println!("Parsed config file: {:?}", config);

    let mut device = PureLinkDevice::new(config);
    let result = run(&mut device, &args).await;

    // Close the link even when a step above failed. A link that never
    // opened, or was already torn down, has nothing to report.
    let disconnected = match device.disconnect().await {
        Err(AdapterError::NotConnected) => Ok(()),
        Ok(()) => {
            println!("Disconnected: true");
            Ok(())
        }
        Err(e) => {
            println!("Disconnected: false ({})", e);
            Err(e)
        }
    };

    result?;
    disconnected.context("Failed to disconnect")?;
    Ok(())
}

async fn run(device: &mut PureLinkDevice, args: &Args) -> Result<()> {
    device.connect().await.context("Failed to connect")?;
    println!("Connected: true");
    print_data(device);

    if let Some(mode) = args.fan {
        println!("Setting fan mode: {}", mode);
        device.set_fan_mode(mode).await?;
        device.refresh().await?;
        print_data(device);
        if let Some((state, _)) = device.get_data() {
            if state.fan_mode_kind() != Some(mode) {
                warn!(category = "cli", reported = %state.fan_mode, "Fan mode not applied yet");
            }
        }
    }

    if let Some(monitoring) = args.standby {
        println!("Setting standby monitoring: {}", monitoring);
        device.set_standby_monitoring(monitoring).await?;
        device.refresh().await?;
        print_data(device);
        if let Some((state, _)) = device.get_data() {
            if state.standby_monitoring_kind() != Some(monitoring) {
                warn!(
                    category = "cli",
                    reported = %state.standby_monitoring,
                    "Standby monitoring not applied yet"
                );
            }
        }
    }

    Ok(())
}

fn print_data(device: &PureLinkDevice) {
    match device.get_data() {
        Some((state, sensors)) => {
            println!("{}", state);
            println!("{}", sensors);
        }
        None => println!("No sensor data available yet"),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    // JSON logging for container/service environments
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("warn,purelink={level}"))
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}

//! mdparb binary
//!
//! Joins the incremental A/B feeds of the selected CME Globex channels and
//! periodically logs per-line and arbitrated packet loss.
//!
//! Usage:
//!   mdparb --interface 10.0.0.5 --config config.xml --channels 310,312
//!
//! Environment:
//!   MDPARB_INTERFACE - Interface address used to join groups
//!   MDPARB_CONFIG - Path to the CME config.xml
//!   MDPARB_CHANNELS - Comma-separated channel ids
//!   RUST_LOG - Log filter (default: info)

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mdparb::arbitration::{ArbitrationConfig, LoggingSink};
use mdparb::config::{CmeConfig, parse_channel_list};
use mdparb::{DetectorConfig, PacketLossDetector};

#[derive(Parser, Debug)]
#[command(name = "mdparb", version)]
#[command(about = "CME Globex A/B line arbitration and packet loss monitor")]
struct Args {
    /// Local interface address used to join multicast groups
    #[arg(long, env = "MDPARB_INTERFACE")]
    interface: Ipv4Addr,

    /// CME Globex config.xml
    #[arg(long, env = "MDPARB_CONFIG")]
    config: PathBuf,

    /// Channels to monitor (comma-separated)
    #[arg(long, env = "MDPARB_CHANNELS")]
    channels: String,

    /// Log every per-line gap at info level
    #[arg(long)]
    packet_logging: bool,

    /// Zero counters after each report
    #[arg(long)]
    reset_after_report: bool,

    /// Out-of-order cache slots per channel
    #[arg(long, env = "MDPARB_CACHE_CAPACITY", default_value = "4096")]
    cache_capacity: usize,

    /// Report interval in milliseconds
    #[arg(long, env = "MDPARB_REPORT_INTERVAL_MS", default_value = "5000")]
    report_interval_ms: u64,

    /// Seconds of traffic discarded after joining
    #[arg(long, env = "MDPARB_WARMUP_SECS", default_value = "1")]
    warmup_secs: u64,

    /// Requested socket receive buffer in bytes
    #[arg(long, env = "MDPARB_RECV_BUFFER", default_value = "16777216")]
    recv_buffer: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let channels = parse_channel_list(&args.channels).context("invalid --channels")?;
    let cme = CmeConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    info!("Starting mdparb");
    info!("  Interface: {}", args.interface);
    info!("  Config: {}", args.config.display());
    info!("  Channels: {:?}", channels);

    let config = DetectorConfig::new(args.interface)
        .arbitration(ArbitrationConfig::new().cache_capacity(args.cache_capacity))
        .report_interval(Duration::from_millis(args.report_interval_ms))
        .warmup(Duration::from_secs(args.warmup_secs))
        .recv_buffer_size(args.recv_buffer)
        .packet_logging(args.packet_logging)
        .reset_after_report(args.reset_after_report);

    let (mut detector, handle) = PacketLossDetector::new(config, &cme, &channels, LoggingSink)
        .context("failed to set up detector")?;

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        handle.shutdown();
    });

    detector.run().await.context("detector failed")?;
    info!("mdparb stopped");
    Ok(())
}

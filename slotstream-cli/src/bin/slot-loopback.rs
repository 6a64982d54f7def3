//! Slot Loopback - in-process send/receive demo
//!
//! Publishes synthetic sine waves from a send node and reads them back with
//! a receive node over the loopback transport, one cycle per tick.

use clap::Parser;
use slotstream::{LoopbackTransport, ReceiveNode, SendNode};
use slotstream_cli::{display_compact_stats, display_node_stats, Config};
use slotstream_transport::Timer;
use std::f64::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slot-loopback")]
#[command(about = "Drive a send node and a receive node over an in-process bus", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of streams (ignored with --config)
    #[arg(short, long, default_value = "2")]
    streams: usize,

    /// Channels per stream (ignored with --config)
    #[arg(long, default_value = "8")]
    channels: usize,

    /// Rate advertised by every stream; without --tick-ms one sample is
    /// pushed per 1/rate seconds (ignored with --config)
    #[arg(short, long, default_value = "250")]
    rate: f64,

    /// Stream type (ignored with --config)
    #[arg(long = "type", default_value = "EEG")]
    stream_type: String,

    /// Cycle period in milliseconds; one sample per stream is pushed per cycle
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Run time in seconds (0 runs until interrupted)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Statistics interval in seconds
    #[arg(long)]
    stats: Option<u64>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.print_example_config {
        print!("{}", toml::to_string_pretty(&Config::example())?);
        return Ok(());
    }

    let generated = Config::loopback(&args.stream_type, args.streams, args.channels, args.rate);
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => generated.clone(),
    };

    if let Some(tick_ms) = args.tick_ms {
        config.loopback.tick_ms = tick_ms;
    }
    if let Some(duration_secs) = args.duration_secs {
        config.loopback.duration_secs = duration_secs;
    }
    if let Some(stats) = args.stats {
        config.loopback.stats_interval_secs = stats;
    }

    let send_settings = config
        .sender
        .clone()
        .or(generated.sender)
        .unwrap_or_default();
    let receive_settings = config
        .receiver
        .clone()
        .or(generated.receiver)
        .unwrap_or_default();

    tracing::info!(
        "Slot loopback starting: {} outlet(s), {} inlet slot(s), tick {:?}",
        send_settings.stream_names.len(),
        receive_settings.slot_count,
        config.loopback.tick()
    );

    let transport = LoopbackTransport::new();
    let mut sender = SendNode::new(transport.clone(), send_settings);
    let mut receiver = ReceiveNode::new(transport, receive_settings)?;

    let ticker = crossbeam::channel::tick(config.loopback.tick());
    let started = Instant::now();
    let mut stats_timer = Timer::new(config.loopback.stats_interval());

    loop {
        ticker.recv()?;
        let t = started.elapsed().as_secs_f64();

        let declared = sender.settings().stream_names.len();
        for slot in 0..declared {
            let channels = sender
                .settings()
                .channel_counts
                .get(slot)
                .copied()
                .unwrap_or(0)
                .max(0) as usize;
            sender.set_values(slot, synth_sample(t, config.loopback.signal_hz, slot, channels))?;
        }

        let sent = sender.evaluate();
        if sent.suppressed && sent.reconnected {
            tracing::warn!("Sending suppressed: {}", sender.status_message());
        }

        let received = receiver.evaluate();
        if !received.failed_slots.is_empty() {
            tracing::warn!(
                "Receive slots {:?} lost their stream: {}",
                received.failed_slots,
                receiver.status_message()
            );
        }
        tracing::trace!(
            "cycle {}: pushed {}, drained {} from {} slot(s)",
            received.cycle,
            sent.samples,
            received.samples,
            received.active_slots
        );

        if !stats_timer.interval().is_zero() && stats_timer.try_fire() {
            display_compact_stats(&sender.stats(), &receiver.stats(), started.elapsed());
        }

        if config
            .loopback
            .duration()
            .map_or(false, |limit| started.elapsed() >= limit)
        {
            break;
        }
    }

    println!();
    display_node_stats("SEND NODE", &sender.stats());
    display_node_stats("RECEIVE NODE", &receiver.stats());

    tracing::info!("Slot loopback finished after {:?}", started.elapsed());
    Ok(())
}

/// One sample of a sine per channel, phase-shifted by slot and channel
fn synth_sample(t: f64, hz: f64, slot: usize, channels: usize) -> Vec<f64> {
    (0..channels)
        .map(|channel| {
            let phase = (slot * channels + channel) as f64 * 0.25;
            (TAU * hz * t + phase).sin()
        })
        .collect()
}

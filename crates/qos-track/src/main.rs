// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! qos-track CLI
//!
//! Runs loopback sessions through the tracking layer and manages config files.
//!
//! # Usage
//!
//! ```bash
//! # 20 samples, pause between #6 and #12, lose every 3rd best-effort sample
//! qos-track simulate --count 20 --pause-at 6 --resume-at 12 --drop-every 3
//!
//! # KEEP_ALL history with a 30 sample cap
//! qos-track simulate --history keep-all:30
//!
//! # Channel QoS, lease and log level from a config file
//! qos-track simulate --config qos-track.toml
//!
//! # Generate and check a config file
//! qos-track gen-config --output qos-track.toml
//! qos-track validate --config qos-track.toml
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossbeam::channel::Receiver;
use qos_track::{
    run_consumer, ConsumerExit, Direction, DiscoveryMonitor, HistoryPolicy, InboundChannel,
    LoopbackTransport, Offer, OutboundChannel, OwnershipArbiter, QosProfile, QosTrackConfig,
    Sample, SampleSequencer, ServiceInfo, Shutdown, Timestamp,
};
use tracing_subscriber::EnvFilter;

const RELIABLE_TOPIC: &str = "ReliableTopic";
const BEST_EFFORT_TOPIC: &str = "BestEffortTopic";
const STEERING_TOPIC: &str = "SteeringControl";

/// Steering controllers and their ownership strengths.
const CONTROLLERS: [(&str, u32); 3] = [
    ("Manual Steering", 10),
    ("ADAS Controller", 20),
    ("Emergency Controller", 30),
];

/// qos-track - sample tracking and arbitration for pub/sub QoS
#[derive(Parser, Debug)]
#[command(name = "qos-track")]
#[command(about = "Sample tracking and arbitration for pub/sub QoS")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a loopback publisher/subscriber session
    Simulate(SimulateArgs),

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "qos-track.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct SimulateArgs {
    /// Configuration file (channel QoS, discovery lease, log level)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of samples each producer publishes
    #[arg(short = 'n', long, default_value = "20")]
    count: u32,

    /// Lose every Nth best-effort sample in flight (0 = no loss)
    #[arg(long, default_value = "0")]
    drop_every: u32,

    /// Pause the reliable producer before this sequence number
    #[arg(long)]
    pause_at: Option<u32>,

    /// Resume the reliable producer before this sequence number
    #[arg(long, requires = "pause_at")]
    resume_at: Option<u32>,

    /// Flag every Nth sample as critical (0 = none)
    #[arg(long, default_value_t = SampleSequencer::DEFAULT_CRITICAL_EVERY)]
    critical_every: u32,

    /// History policy of the reliable subscriber: keep-last:N or keep-all:N
    #[arg(long, default_value = "keep-last:5", value_parser = parse_history)]
    history: HistoryPolicy,

    /// Active steering strengths (can repeat)
    #[arg(long = "activate", default_value = "10", value_delimiter = ',')]
    active_strengths: Vec<u32>,

    /// Delay between publications (milliseconds)
    #[arg(long, default_value = "0")]
    interval_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is loaded first so its log level applies from the start
    let file_config = match &args.command {
        Commands::Simulate(sim) => sim.config.as_ref().map(QosTrackConfig::from_file).transpose()?,
        _ => None,
    };
    let directive = log_directive(args.log_level.as_deref(), file_config.as_ref());

    // Initialize logging
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Simulate(sim) => cmd_simulate(sim, file_config.unwrap_or_default()),
        Commands::GenConfig { output } => cmd_gen_config(output),
        Commands::Validate { config } => cmd_validate(config),
    }
}

fn log_directive(cli: Option<&str>, config: Option<&QosTrackConfig>) -> String {
    match (cli, config) {
        (Some(level), _) => level.to_string(),
        (None, Some(config)) => config.log_level.clone(),
        (None, None) => "info".to_string(),
    }
}

/// QoS of `topic` from the config file, or `fallback` if it is not listed.
fn channel_qos(
    config: &QosTrackConfig,
    topic: &str,
    direction: Direction,
    fallback: QosProfile,
) -> QosProfile {
    config.channel(topic, direction).map_or(fallback, |c| c.qos)
}

fn parse_history(s: &str) -> Result<HistoryPolicy, String> {
    let (kind, depth) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid history '{}' (expected keep-last:N or keep-all:N)", s))?;
    let depth: u32 = depth
        .parse()
        .map_err(|e| format!("invalid history depth '{}': {}", depth, e))?;
    match kind {
        "keep-last" => Ok(HistoryPolicy::KeepLast(depth)),
        "keep-all" => Ok(HistoryPolicy::KeepAll(depth)),
        other => Err(format!(
            "unknown history kind '{}' (expected keep-last or keep-all)",
            other
        )),
    }
}

fn spawn_subscriber(
    channel: InboundChannel,
    rx: Receiver<Sample>,
    shutdown: Shutdown,
) -> thread::JoinHandle<(InboundChannel, ConsumerExit)> {
    thread::spawn(move || {
        let mut channel = channel;
        let mut last_missing: HashMap<String, u64> = HashMap::new();
        let exit = run_consumer(&rx, &shutdown, |sample| {
            let seq = sample.sequence_number;
            let producer = sample.producer_id.clone();
            let delivery = channel.on_sample(sample);
            if let Some(report) = &delivery.gap {
                let seen = last_missing.entry(producer.clone()).or_default();
                if report.total_missing() != *seen {
                    *seen = report.total_missing();
                    println!("[{}] {} gap report: {}", channel.name(), producer, report);
                }
            }
            if delivery.authoritative {
                tracing::debug!(channel = channel.name(), seq, producer = %producer, "received");
            }
        });
        (channel, exit)
    })
}

fn cmd_simulate(
    args: SimulateArgs,
    config: QosTrackConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = Arc::new(LoopbackTransport::new());
    let shutdown = Shutdown::new();
    let mut monitor = DiscoveryMonitor::new(config.lease());

    if args.drop_every > 0 {
        let every = args.drop_every;
        transport.set_drop_filter(move |channel, sample| {
            channel == BEST_EFFORT_TOPIC && (sample.sequence_number + 1) % every == 0
        });
    }

    // Subscribers
    let arbiter = Arc::new(OwnershipArbiter::new());
    for (name, strength) in CONTROLLERS {
        arbiter.register_producer(name, strength);
    }
    for strength in &args.active_strengths {
        arbiter.activate(controller_name(*strength), *strength);
    }

    let reliable_qos = channel_qos(
        &config,
        RELIABLE_TOPIC,
        Direction::Inbound,
        QosProfile {
            history: args.history,
            ..QosProfile::reliable()
        },
    );
    let best_effort_qos = channel_qos(
        &config,
        BEST_EFFORT_TOPIC,
        Direction::Inbound,
        QosProfile::best_effort().keep_last(args.count),
    );
    let steering_qos = channel_qos(
        &config,
        STEERING_TOPIC,
        Direction::Inbound,
        QosProfile::reliable().keep_last(5).exclusive(0),
    );

    let subscribers = vec![
        spawn_subscriber(
            InboundChannel::new(RELIABLE_TOPIC, reliable_qos),
            transport.subscribe(RELIABLE_TOPIC),
            shutdown.clone(),
        ),
        // Losses are expected here; auditing them shows what reliability buys
        spawn_subscriber(
            InboundChannel::new(BEST_EFFORT_TOPIC, best_effort_qos).with_gap_audit(),
            transport.subscribe(BEST_EFFORT_TOPIC),
            shutdown.clone(),
        ),
        spawn_subscriber(
            InboundChannel::with_arbiter(STEERING_TOPIC, steering_qos, Arc::clone(&arbiter)),
            transport.subscribe(STEERING_TOPIC),
            shutdown.clone(),
        ),
    ];

    // Publishers
    let mut reliable = OutboundChannel::with_sequencer(
        RELIABLE_TOPIC,
        channel_qos(&config, RELIABLE_TOPIC, Direction::Outbound, QosProfile::reliable()),
        Arc::clone(&transport),
        SampleSequencer::new(args.critical_every),
    );
    let mut best_effort = OutboundChannel::new(
        BEST_EFFORT_TOPIC,
        channel_qos(&config, BEST_EFFORT_TOPIC, Direction::Outbound, QosProfile::best_effort()),
        Arc::clone(&transport),
    );
    let mut steering: Vec<_> = CONTROLLERS
        .iter()
        .map(|(name, strength)| {
            let channel = OutboundChannel::new(
                STEERING_TOPIC,
                QosProfile::reliable().exclusive(*strength),
                Arc::clone(&transport),
            );
            (*name, channel)
        })
        .collect();
    drop(transport);

    let started = Timestamp::now();
    for (producer, topic) in [
        ("Reliability_Publisher", RELIABLE_TOPIC),
        ("BestEffort_Publisher", BEST_EFFORT_TOPIC),
    ]
    .into_iter()
    .chain(steering.iter().map(|(name, _)| (*name, STEERING_TOPIC)))
    {
        monitor.on_discovery_update(
            producer,
            ServiceInfo::new(format!("loopback://{}", topic)).with_capability(topic),
            started,
        );
    }

    println!("qos-track simulate v{} ({})", env!("CARGO_PKG_VERSION"), config.name);
    println!("=====================================");
    println!("Samples: {}  history: {:?}", args.count, args.history);
    println!("Active steering strengths: {:?}", arbiter.active_strengths());
    println!();

    let interval = Duration::from_millis(args.interval_ms);
    for seq in 0..args.count {
        if args.pause_at == Some(seq) {
            reliable.pause();
            println!("[{}] paused before #{}", RELIABLE_TOPIC, seq);
        }
        if args.resume_at == Some(seq) {
            let pending = reliable.resume();
            println!(
                "[{}] resumed before #{} ({} critical samples pending)",
                RELIABLE_TOPIC,
                seq,
                pending.len()
            );
        }

        let payload = format!("Message #{}", seq).into_bytes();
        let (sample, outcome) = reliable.publish_next("Reliability_Publisher", payload.clone())?;
        match outcome {
            Offer::Sent => {}
            Offer::Queued => {
                println!("[{}] queued critical #{}", RELIABLE_TOPIC, sample.sequence_number);
            }
            Offer::Dropped => {
                println!("[{}] skipped #{} while paused", RELIABLE_TOPIC, sample.sequence_number);
            }
        }
        best_effort.publish_next("BestEffort_Publisher", payload)?;
        for (name, channel) in &mut steering {
            let command = format!("{} steering command #{}", name, seq).into_bytes();
            channel.publish_next(*name, command)?;
        }

        if !interval.is_zero() && shutdown.wait_timeout(interval) {
            break;
        }
    }

    // Whatever is still queued goes out before the producers hang up
    if reliable.is_paused() {
        reliable.resume();
    }
    let flushed = reliable.flush()?;
    if flushed > 0 {
        println!("[{}] flushed {} queued samples at end", RELIABLE_TOPIC, flushed);
    }
    drop(reliable);
    drop(best_effort);
    drop(steering);

    println!();
    for handle in subscribers {
        let (channel, exit) = handle.join().map_err(|_| "subscriber thread panicked")?;
        print_summary(&channel, exit);
    }

    // Producers announced once at start; a session longer than the lease expires them
    let expired = monitor.prune(Timestamp::now());
    println!(
        "--- discovery (lease {}s) --- {} live, {} expired {:?}",
        monitor.lease().as_secs(),
        monitor.list().len(),
        expired.len(),
        expired
    );
    Ok(())
}

fn controller_name(strength: u32) -> &'static str {
    CONTROLLERS
        .iter()
        .find(|(_, s)| *s == strength)
        .map_or("unknown controller", |(name, _)| name)
}

fn print_summary(channel: &InboundChannel, exit: ConsumerExit) {
    println!("--- {} ({:?}) ---", channel.name(), exit);
    println!(
        "  accepted {} samples, rejected {}",
        channel.accepted_count(),
        channel.window().total_rejected()
    );
    for (producer, tracker) in channel.trackers() {
        if let Some(report) = tracker.report() {
            println!("  {:<22} {}", producer, report);
        }
    }
    if let Some(arbiter) = channel.arbiter() {
        println!("  active strengths: {:?}", arbiter.active_strengths());
    }
    let history = channel.history(None);
    println!("  history ({} retained, {:?}):", history.len(), channel.qos().history);
    for sample in &history {
        println!(
            "    #{:<4} {:<22} {}",
            sample.sequence_number,
            sample.producer_id,
            String::from_utf8_lossy(&sample.payload)
        );
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = QosTrackConfig::example();
    let toml_str = toml::to_string_pretty(&config)?;

    // Add comments
    let content = format!(
        r#"# qos-track configuration
# Generated by qos-track gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match QosTrackConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Name: {}", config.name);
            println!("Discovery lease: {}s", config.discovery.lease_secs);
            println!("Channels: {}", config.channels.len());
            for (i, channel) in config.channels.iter().enumerate() {
                println!(
                    "  [{}] {} {} {:?} {:?} {:?}",
                    i,
                    match channel.direction {
                        Direction::Inbound => "<-",
                        Direction::Outbound => "->",
                    },
                    channel.name,
                    channel.qos.reliability,
                    channel.qos.history,
                    channel.qos.ownership
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

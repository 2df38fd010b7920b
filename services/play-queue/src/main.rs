use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use prizecast_execution::{
    CompletionOrigin, DeviceError, HapticPort, Lane, MemoryLedger, StatsLedger,
};
use prizecast_play_queue::{Engine, QueueConfig};
use prizecast_types::game::{
    BoardConfig, BoardSettings, DropSettings, HapticMode, HapticSpec, PlayMode, PlayRequest,
    PushEvent, RewardSpec, Segment, WheelSettings,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON queue configuration (built-in demo boards when omitted or empty).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of plays to trigger.
    #[arg(long, default_value_t = 6)]
    plays: usize,

    /// Master seed for outcomes and the simulated display (optional).
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of plays the simulated display never acknowledges.
    #[arg(long, default_value_t = 0.2)]
    ack_drop_rate: f64,

    /// Spin duration for the built-in demo wheel in milliseconds.
    #[arg(long, default_value_t = 1_500)]
    spin_ms: u64,

    /// Run every play on the test lane.
    #[arg(long, default_value_t = false)]
    test_mode: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.ack_drop_rate) {
            anyhow::bail!("--ack-drop-rate must be within [0, 1]");
        }
        Ok(())
    }
}

/// Haptic port that only logs commands.
struct LoggingHaptics {
    devices: Vec<String>,
}

impl HapticPort for LoggingHaptics {
    fn available_devices(&self) -> Vec<String> {
        self.devices.clone()
    }

    fn send_command(
        &self,
        device_id: &str,
        mode: HapticMode,
        intensity: u8,
        duration_ms: u64,
    ) -> Result<(), DeviceError> {
        info!(device_id, ?mode, intensity, duration_ms, "haptic command");
        Ok(())
    }
}

fn segment(label: &str, weight: f64, currency: i64, xp: i64) -> Segment {
    Segment {
        label: label.to_string(),
        weight,
        reward: RewardSpec {
            currency,
            xp,
            multiplier: None,
        },
        haptic: None,
    }
}

fn demo_boards(spin_ms: u64) -> Vec<BoardConfig> {
    let mut wheel = vec![
        segment("Jackpot", 1.0, 1_000, 100),
        segment("Double", 3.0, 200, 20),
        segment("Coins", 6.0, 50, 5),
        segment("Miss", 8.0, 0, 1),
        segment("Buzz", 2.0, 0, 10),
    ];
    wheel[4].haptic = Some(HapticSpec {
        device_ids: vec!["desk-pad".to_string()],
        mode: HapticMode::Vibrate,
        intensity: 30,
        duration_ms: 800,
    });

    let multipliers = vec![10.0, 3.0, 1.0, 0.5, 1.0, 3.0, 10.0];
    let slots = multipliers
        .iter()
        .map(|m| segment(&format!("x{m}"), 1.0, 0, 1))
        .collect();

    vec![
        BoardConfig {
            id: "demo-wheel".to_string(),
            name: "Demo wheel".to_string(),
            channel: "stage".to_string(),
            segments: wheel,
            settings: BoardSettings::Wheel(WheelSettings {
                spin_duration_ms: spin_ms,
                ..WheelSettings::default()
            }),
        },
        BoardConfig {
            id: "demo-drop".to_string(),
            name: "Demo drop".to_string(),
            channel: "lobby".to_string(),
            segments: slots,
            settings: BoardSettings::Plinko(DropSettings {
                multipliers,
                ..DropSettings::default()
            }),
        },
    ]
}

fn load_config(args: &Args) -> Result<QueueConfig> {
    let config = match &args.config {
        Some(path) => QueueConfig::load(path).context("failed to load queue config")?,
        None => QueueConfig::default(),
    };
    let mut config = config.with_env().context("invalid PRIZECAST_* override")?;
    if args.seed.is_some() {
        config.master_seed = args.seed;
    }
    if config.boards.is_empty() {
        config.boards = demo_boards(args.spin_ms);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;
    args.validate()?;

    let config = load_config(&args)?;
    let ledger = Arc::new(MemoryLedger::new());
    let live_stats = Arc::new(StatsLedger::new());
    let test_stats = Arc::new(StatsLedger::new());
    let haptics = Arc::new(LoggingHaptics {
        devices: vec!["desk-pad".to_string(), "chair".to_string()],
    });
    let engine = Arc::new(
        Engine::new(
            config,
            Lane::new(ledger.clone(), haptics, live_stats.clone()),
            Lane::test(test_stats.clone()),
        )
        .context("invalid board configuration")?,
    );
    let mut events = engine.subscribe();

    // Trigger plays round-robin across boards.
    let boards = engine.boards().summaries();
    let mode = if args.test_mode {
        PlayMode::Test
    } else {
        PlayMode::Live
    };
    let mut accepted = 0;
    for i in 0..args.plays {
        let board = &boards[i % boards.len()];
        let request = PlayRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            board_id: board.board_id.clone(),
            actor_id: format!("viewer-{}", i % 3),
            actor_display_name: format!("Viewer {}", i % 3),
            stake: 10,
            enqueued_at_ms: 0,
            mode,
        };
        match engine.enqueue(request).await {
            Ok(queued) => {
                accepted += 1;
                info!(channel = %queued.channel, position = queued.position, "play queued");
            }
            Err(err) => warn!(error = %err, "play rejected"),
        }
    }

    // Simulated display client: print events and acknowledge animations.
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut completed = 0;
    while completed < accepted {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "display client lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        println!("{}", serde_json::to_string(&event)?);
        match event {
            PushEvent::PlayStart { channel, contract } => {
                if rng.gen_bool(args.ack_drop_rate) {
                    info!(request_id = %contract.request_id, "display dropping acknowledgment");
                    continue;
                }
                let engine = engine.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(contract.duration_ms)).await;
                    engine
                        .complete(&channel, &contract.request_id, CompletionOrigin::Client)
                        .await;
                });
            }
            PushEvent::PlayCompleted { .. } => completed += 1,
            PushEvent::PlayQueued { .. } | PushEvent::ConfigChanged { .. } => {}
        }
    }

    for channel in engine.channels() {
        if let Some(snapshot) = engine.snapshot(&channel).await {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    }
    let totals = ledger.totals();
    info!(
        currency = totals.currency,
        xp = totals.xp,
        writes = ledger.writes(),
        live = ?live_stats.totals(),
        test = ?test_stats.totals(),
        "session finished"
    );
    engine.shutdown();
    Ok(())
}

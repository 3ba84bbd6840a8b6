//! Toppler demo runner
//!
//! Builds a small level, plays a scripted solution while recording the
//! input, then replays the recording and checks that both runs end in the
//! same state hash.
//!
//! Usage: `toppler [config.json]`

use anyhow::{bail, Context, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use toppler::{
    VERSION, TICK_RATE,
    game::{
        ant::AntState,
        builder::LevelBuilder,
        config::SimConfig,
        grid::DominoType,
        input::{InputMask, ReplayLog},
        state::{LevelResult, LevelState},
        tick::{replay_level, tick},
    },
};

/// Ticks to keep simulating once the result is known.
const RUN_OUT_TICKS: u32 = 120;

fn main() -> Result<()> {
    // Initialize logging
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    }

    info!("Toppler v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            SimConfig::from_json(&json).with_context(|| format!("parsing config {}", path))?
        }
        None => SimConfig::default(),
    };
    info!("Level time: {} ticks, pushes: {}", config.level_time_ticks, config.pushes_per_level);

    demo_level(&config)
}

/// Demo layout: one floor, a standard domino next to the trigger.
fn build_demo(config: &SimConfig) -> Result<LevelState> {
    let grid = LevelBuilder::new(10)
        .floor(8, 0..=19)
        .entry(2, 8)
        .exit(17, 8)
        .domino(9, 8, DominoType::Standard)
        .domino(10, 8, DominoType::Trigger)
        .build()
        .context("building demo level")?;
    Ok(LevelState::new(grid, config))
}

/// Walk to the standard domino and push it toward the trigger.
fn scripted_input(state: &LevelState) -> InputMask {
    match (state.ant.pos.x, state.ant.state) {
        _ if state.ant.pushes_left == 0 => InputMask::NONE,
        (8, AntState::Walk(_)) => InputMask::NONE,
        (x, _) if x < 9 => InputMask::RIGHT,
        _ => InputMask::RIGHT | InputMask::ACTION,
    }
}

fn demo_level(config: &SimConfig) -> Result<()> {
    info!("=== Starting Demo Level ===");

    let initial = build_demo(config)?;
    let mut state = initial.clone();
    let mut log = ReplayLog::new();
    let mut decided_at = None;
    let mut total_events = 0;

    while !state.is_over() && state.time_left > -(RUN_OUT_TICKS as i32) {
        let mask = scripted_input(&state);
        log.record(mask);

        let result = tick(&mut state, mask, config).context("simulation failed")?;
        total_events += result.events.len();

        if result.result != LevelResult::Undecided && decided_at.is_none() {
            info!("Tick {}: level {:?}", state.tick, result.result);
            decided_at = Some(state.tick);
        }
        if let Some(at) = decided_at {
            if state.tick >= at + RUN_OUT_TICKS {
                break;
            }
        }
    }

    // Print final results
    info!("=== Level Results ===");
    info!("Result: {:?} after {} ticks", state.result, state.tick);
    info!("Ant: {:?} at ({}, {})", state.ant.state, state.ant.pos.x, state.ant.pos.y);
    info!("Total events: {}", total_events);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Replay: {} runs over {} ticks, checksum {}",
          log.runs().len(), log.tick_count(), hex::encode(log.compute_hash()));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let bytes = log.to_bytes().context("encoding replay")?;
    let decoded = ReplayLog::from_bytes(&bytes).context("decoding replay")?;
    let (replayed, results) = replay_level(initial, &decoded, config).context("replay failed")?;
    let replay_hash = replayed.compute_hash();

    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if results.last().copied().unwrap_or_default() != state.result {
        warn!("replayed result {:?} differs from live result {:?}", results.last(), state.result);
    }

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}

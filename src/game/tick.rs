//! Simulation Clock
//!
//! One call advances a level by one discrete tick. The order of the steps
//! is part of the replay contract.

use tracing::{debug, error};

use crate::game::completion::{level_completed, CompletionFailure};
use crate::game::config::SimConfig;
use crate::game::context::SimContext;
use crate::game::domino::run_dominoes;
use crate::game::error::SimError;
use crate::game::events::{EventLog, EventSink, SimEvent, SoundEffect};
use crate::game::grid::{DominoExtra, DominoType, DoorEdge, LevelGrid};
use crate::game::input::{InputMask, ReplayLog};
use crate::game::state::{LevelResult, LevelState};

/// Result of a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Level outcome after this tick (sticky)
    pub result: LevelResult,
    /// Dirty marks and sounds emitted this tick
    pub events: Vec<SimEvent>,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The level state (will be mutated)
/// * `input` - Keys held this tick
/// * `config` - Simulation tunables
///
/// # Errors
///
/// `SimError::DispatchMiss` when a cell reached a state with no
/// transition. The state is left mid-tick and must not be used further.
pub fn tick(state: &mut LevelState, input: InputMask, config: &SimConfig) -> Result<TickResult, SimError> {
    let mut log = EventLog::new();

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Doors
    step_doors(&mut state.grid, &mut log);

    let before = state.grid.cells().to_vec();
    {
        let mut ctx = SimContext::new(&mut state.grid, &mut log, config);

        // 2. Ant
        state.ant.step(&mut ctx, input);

        // 3. Dominoes
        if let Err(err) = run_dominoes(&mut ctx) {
            error!("tick {}: {}", state.tick, err);
            return Err(err);
        }
    }

    if state.grid.cells() == before.as_slice() {
        state.quiet_ticks = state.quiet_ticks.saturating_add(1);
    } else {
        state.quiet_ticks = 0;
    }

    // 4. Time
    state.time_left -= 1;

    // 5. Finish logic
    check_finish(state, config);

    Ok(TickResult {
        result: state.result,
        events: log.take_events(),
    })
}

fn step_doors(grid: &mut LevelGrid, events: &mut dyn EventSink) {
    for (name, door) in [("entry", &mut grid.entry), ("exit", &mut grid.exit)] {
        let Some(edge) = door.step() else {
            continue;
        };
        let effect = match edge {
            DoorEdge::StartedOpening => SoundEffect::DoorOpen,
            DoorEdge::FinishedClosing => SoundEffect::DoorClose,
        };
        debug!("{} door {:?}", name, edge);
        events.play(effect);
        events.mark_dirty_column(door.pos);
    }
}

/// Has a trigger come to rest lying flat?
fn trigger_fallen(grid: &LevelGrid) -> bool {
    grid.cells().iter().any(|c| {
        c.domino == DominoType::Trigger && (c.state == 1 || c.state == 15) && c.extra == DominoExtra::None
    })
}

fn trigger_standing(grid: &LevelGrid) -> bool {
    grid.cells().iter().any(|c| {
        c.domino == DominoType::Trigger && !(c.state == 1 || c.state == 15)
    })
}

fn failure_of(failure: CompletionFailure) -> LevelResult {
    match failure {
        CompletionFailure::Crash { .. } => LevelResult::Crashes,
        CompletionFailure::Incomplete { .. } => LevelResult::TriggerNotLast,
    }
}

fn check_finish(state: &mut LevelState, config: &SimConfig) {
    if !state.finish_check_done {
        if trigger_fallen(&state.grid) {
            state.finish_check_done = true;
            let result = match level_completed(&state.grid) {
                Err(failure) => failure_of(failure),
                Ok(()) if state.ant.carried != DominoType::Empty => LevelResult::SomeLeft,
                Ok(()) if state.time_left > 0 => LevelResult::Solved,
                Ok(()) => LevelResult::SolvedLate,
            };
            report(state, result);
        }
    } else if state.result.is_success() {
        if let Err(failure) = level_completed(&state.grid) {
            report(state, failure_of(failure));
        }
    }

    if !state.ant.is_living() {
        report(state, LevelResult::Died);
    }

    if state.result == LevelResult::Undecided
        && !state.finish_check_done
        && state.ant.pushes_left == 0
        && state.quiet_ticks >= config.settle_ticks
        && trigger_standing(&state.grid)
    {
        report(state, LevelResult::TriggerNotFlat);
    }
}

/// Record a result. Failures are final.
fn report(state: &mut LevelState, result: LevelResult) {
    if state.result.is_failure() || state.result == result {
        return;
    }
    debug!("tick {}: level {:?} -> {:?}", state.tick, state.result, result);
    state.result = result;

    if result.is_success() {
        state.ant.success(&mut state.grid);
    } else {
        state.ant.fail();
    }
}

/// Replay a level from a recorded input log.
///
/// Returns the final state and the result after every tick.
pub fn replay_level(
    initial_state: LevelState,
    log: &ReplayLog,
    config: &SimConfig,
) -> Result<(LevelState, Vec<LevelResult>), SimError> {
    let mut state = initial_state;
    let mut results = Vec::with_capacity(log.tick_count() as usize);

    for mask in log.iter() {
        let result = tick(&mut state, mask, config)?;
        results.push(result.result);
    }

    Ok((state, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::CellPos;
    use crate::game::ant::AntState;
    use crate::game::builder::LevelBuilder;
    use crate::game::grid::Cell;

    fn level(extra: &[(i32, DominoType)]) -> LevelState {
        let mut builder = LevelBuilder::new(10).floor(8, 0..=19).entry(2, 8).exit(17, 8);
        for (x, domino) in extra {
            builder = builder.domino(*x, 8, *domino);
        }
        LevelState::new(builder.build().unwrap(), &SimConfig::default())
    }

    fn set(state: &mut LevelState, x: i32, domino: DominoType, cell_state: u8, dir: i8) {
        state.grid.update(CellPos::new(x, 8), |c| {
            c.set_domino(domino, cell_state, dir, DominoExtra::None)
        });
    }

    fn idle(state: &mut LevelState, ticks: usize) -> LevelResult {
        let config = SimConfig::default();
        let mut result = LevelResult::Undecided;
        for _ in 0..ticks {
            result = tick(state, InputMask::NONE, &config).unwrap().result;
        }
        result
    }

    /// Walk to column 9, push right, then wait.
    fn script(state: &LevelState) -> InputMask {
        match (state.ant.pos.x, state.ant.state) {
            _ if state.ant.pushes_left == 0 => InputMask::NONE,
            (8, AntState::Walk(_)) => InputMask::NONE,
            (x, _) if x < 9 => InputMask::RIGHT,
            _ => InputMask::RIGHT | InputMask::ACTION,
        }
    }

    fn play(state: &mut LevelState, ticks: usize) -> (ReplayLog, Vec<LevelResult>) {
        let config = SimConfig::default();
        let mut log = ReplayLog::new();
        let mut results = Vec::new();
        for _ in 0..ticks {
            let mask = script(state);
            log.record(mask);
            results.push(tick(state, mask, &config).unwrap().result);
        }
        (log, results)
    }

    #[test]
    fn test_scripted_solution() {
        let mut state = level(&[(9, DominoType::Standard), (10, DominoType::Trigger)]);
        play(&mut state, 300);

        assert_eq!(state.result, LevelResult::Solved);
        assert!(state.finish_check_done);
        assert!(state.ant.level_success);
        assert!(state.grid.exit.open_requested);
        assert_eq!(state.ant.pushes_left, 0);
        assert_eq!(state.grid.cell(CellPos::new(10, 8)).state, 15);
    }

    #[test]
    fn test_replay_reproduces_run() {
        let initial = level(&[(9, DominoType::Standard), (10, DominoType::Trigger)]);
        let mut live = initial.clone();
        let (log, live_results) = play(&mut live, 300);

        let decoded = ReplayLog::from_bytes(&log.to_bytes().unwrap()).unwrap();
        let (replayed, results) = replay_level(initial, &decoded, &SimConfig::default()).unwrap();

        assert_eq!(results, live_results);
        assert_eq!(replayed.compute_hash(), live.compute_hash());
    }

    #[test]
    fn test_entry_door_sounds() {
        let mut state = level(&[]);
        let config = SimConfig::default();

        let first = tick(&mut state, InputMask::NONE, &config).unwrap();
        assert!(first.events.is_empty());
        assert!(state.grid.entry.open_requested);

        let second = tick(&mut state, InputMask::NONE, &config).unwrap();
        assert!(second.events.contains(&SimEvent::Sound { effect: SoundEffect::DoorOpen }));
    }

    #[test]
    fn test_crash_fails_first_check() {
        let mut state = level(&[]);
        set(&mut state, 10, DominoType::Trigger, 15, 1);
        set(&mut state, 5, DominoType::Crash3, 56, 0);

        assert_eq!(idle(&mut state, 1), LevelResult::Crashes);
        assert!(state.ant.level_fail);
        assert!(state.did_crash());
    }

    #[test]
    fn test_standing_domino_means_trigger_not_last() {
        let mut state = level(&[(4, DominoType::Standard)]);
        set(&mut state, 10, DominoType::Trigger, 1, -1);

        assert_eq!(idle(&mut state, 1), LevelResult::TriggerNotLast);
    }

    #[test]
    fn test_carried_domino_means_some_left() {
        let mut state = level(&[]);
        set(&mut state, 10, DominoType::Trigger, 15, 1);
        state.ant.carried = DominoType::Stopper;

        assert_eq!(idle(&mut state, 1), LevelResult::SomeLeft);
    }

    #[test]
    fn test_out_of_time_is_late() {
        let mut state = level(&[]);
        set(&mut state, 10, DominoType::Trigger, 15, 1);
        state.time_left = 1;

        assert_eq!(idle(&mut state, 1), LevelResult::SolvedLate);
        assert!(state.is_solved());
    }

    #[test]
    fn test_late_crash_revokes_success() {
        let mut state = level(&[]);
        set(&mut state, 10, DominoType::Trigger, 15, 1);
        assert_eq!(idle(&mut state, 1), LevelResult::Solved);

        set(&mut state, 3, DominoType::Crash5, 56, 0);
        assert_eq!(idle(&mut state, 1), LevelResult::Crashes);

        state.grid.update(CellPos::new(3, 8), Cell::clear_domino);
        assert_eq!(idle(&mut state, 5), LevelResult::Crashes);
    }

    #[test]
    fn test_dead_ant() {
        let mut state = level(&[]);
        state.ant.state = AntState::Ghost;
        assert_eq!(idle(&mut state, 1), LevelResult::Died);
        assert!(state.is_over());
    }

    #[test]
    fn test_settled_level_with_standing_trigger() {
        let mut state = level(&[(12, DominoType::Trigger)]);
        state.ant.pushes_left = 0;
        let settle = SimConfig::default().settle_ticks as usize;

        assert_eq!(idle(&mut state, settle - 1), LevelResult::Undecided);
        assert_eq!(idle(&mut state, 1), LevelResult::TriggerNotFlat);
    }

    #[test]
    fn test_dispatch_miss_fails_tick() {
        let mut state = level(&[]);
        set(&mut state, 6, DominoType::Standard, 30, 1);

        let err = tick(&mut state, InputMask::NONE, &SimConfig::default());
        assert!(matches!(err, Err(SimError::DispatchMiss { state: 30, .. })));
    }
}

//! Level State Definitions
//!
//! Everything that changes while a level is played: the grid, the ant and
//! the clock latches. Hashing covers every field, so two runs agree on the
//! hash only if they agree on the whole state.

use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::ant::Ant;
use crate::game::config::SimConfig;
use crate::game::grid::LevelGrid;

// =============================================================================
// LEVEL RESULT
// =============================================================================

/// Outcome of a level attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LevelResult {
    /// Still playing
    #[default]
    Undecided = 0,
    /// Solved in time
    Solved = 1,
    /// Solved after the time ran out
    SolvedLate = 2,
    /// A crash pile exists
    Crashes = 3,
    /// Solved but the ant still holds a domino
    SomeLeft = 4,
    /// The ant died
    Died = 5,
    /// The trigger fell before everything else was down
    TriggerNotLast = 6,
    /// Everything settled but the trigger is not lying flat
    TriggerNotFlat = 7,
}

impl LevelResult {
    /// Solved, in time or late.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, LevelResult::Solved | LevelResult::SolvedLate)
    }

    /// Any failure code.
    #[inline]
    pub fn is_failure(self) -> bool {
        !self.is_success() && self != LevelResult::Undecided
    }
}

// =============================================================================
// LEVEL STATE
// =============================================================================

/// Complete state of one level attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelState {
    /// Cells and doors
    pub grid: LevelGrid,
    /// The avatar
    pub ant: Ant,
    /// Ticks simulated so far
    pub tick: u32,
    /// Remaining level time in ticks (goes negative)
    pub time_left: i32,
    /// The trigger fell and the authoritative check ran
    pub finish_check_done: bool,
    /// Sticky outcome
    pub result: LevelResult,
    /// Consecutive ticks without any domino change
    pub quiet_ticks: u32,
}

impl LevelState {
    /// Start a level: the ant waits inside the entry door.
    pub fn new(grid: LevelGrid, config: &SimConfig) -> Self {
        let ant = Ant::new(grid.entry.pos, config.pushes_per_level);
        Self {
            grid,
            ant,
            tick: 0,
            time_left: config.level_time_ticks,
            finish_check_done: false,
            result: LevelResult::Undecided,
            quiet_ticks: 0,
        }
    }

    /// Compute deterministic hash of the full state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            self.grid.hash_into(hasher);
            self.ant.hash_into(hasher);
            hasher.update_i32(self.time_left);
            hasher.update_bool(self.finish_check_done);
            hasher.update_u8(self.result as u8);
            hasher.update_u32(self.quiet_ticks);
        })
    }

    /// Solved, possibly late.
    pub fn is_solved(&self) -> bool {
        self.result.is_success()
    }

    /// Failed for any reason.
    pub fn did_fail(&self) -> bool {
        self.result.is_failure()
    }

    /// Failed because of a crash.
    pub fn did_crash(&self) -> bool {
        self.result == LevelResult::Crashes
    }

    /// Nothing more will happen: the ant left through the exit or died.
    pub fn is_over(&self) -> bool {
        self.ant.final_animation_played || !self.ant.is_living()
    }
}

// =============================================================================
// TESTS
// =============================================================================

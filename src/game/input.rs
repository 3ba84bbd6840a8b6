//! Input Capture and Replay
//!
//! The ant reads a 5-bit key mask each tick. A replay is the run-length
//! encoded stream of those masks: one `(repeat, mask)` run per change.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::error::SimError;

// =============================================================================
// INPUT MASK
// =============================================================================

/// Keys held during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputMask(u8);

impl InputMask {
    /// No keys held
    pub const NONE: InputMask = InputMask(0);
    /// Walk or push left
    pub const LEFT: InputMask = InputMask(0x01);
    /// Climb up, enter a door
    pub const UP: InputMask = InputMask(0x02);
    /// Walk or push right
    pub const RIGHT: InputMask = InputMask(0x04);
    /// Climb down
    pub const DOWN: InputMask = InputMask(0x08);
    /// Pick up, put down, push modifier
    pub const ACTION: InputMask = InputMask(0x10);

    const ALL_BITS: u8 = 0x1F;

    /// Mask from raw bits; unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        InputMask(bits & Self::ALL_BITS)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Are all keys of `other` held?
    #[inline]
    pub const fn contains(self, other: InputMask) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Is no key held?
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for InputMask {
    type Output = InputMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        InputMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for InputMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// =============================================================================
// REPLAY LOG
// =============================================================================

/// One run of identical input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRun {
    /// Number of consecutive ticks
    pub repeat: u32,
    /// Mask held for those ticks
    pub mask: InputMask,
}

/// Run-length encoded input recording for one level attempt.
///
/// Used for:
/// - Replay playback
/// - Checksum validation of a solution
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayLog {
    runs: Vec<InputRun>,
}

impl ReplayLog {
    /// Empty log.
    pub fn new() -> Self {
        Self { runs: Vec::with_capacity(64) }
    }

    /// Build a log from runs, merging neighbours and dropping empty runs.
    pub fn from_runs(runs: impl IntoIterator<Item = (u32, InputMask)>) -> Self {
        let mut log = Self::new();
        for (repeat, mask) in runs {
            log.record_run(repeat, mask);
        }
        log
    }

    /// Record the mask of the next tick.
    ///
    /// Extends the current run when the mask did not change.
    pub fn record(&mut self, mask: InputMask) {
        self.record_run(1, mask);
    }

    fn record_run(&mut self, repeat: u32, mask: InputMask) {
        if repeat == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.mask == mask => last.repeat += repeat,
            _ => self.runs.push(InputRun { repeat, mask }),
        }
    }

    /// Recorded runs.
    pub fn runs(&self) -> &[InputRun] {
        &self.runs
    }

    /// Total number of ticks.
    pub fn tick_count(&self) -> u64 {
        self.runs.iter().map(|r| r.repeat as u64).sum()
    }

    /// Expand into one mask per tick.
    pub fn iter(&self) -> ReplayIter<'_> {
        ReplayIter { runs: &self.runs, run_idx: 0, used: 0 }
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SimError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SimError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checksum of the run list.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_replay();
        hasher.update_u32(self.runs.len() as u32);
        for run in &self.runs {
            hasher.update_u32(run.repeat);
            hasher.update_u8(run.mask.bits());
        }
        hasher.finalize()
    }
}

/// Iterator replaying a log tick by tick.
pub struct ReplayIter<'a> {
    runs: &'a [InputRun],
    run_idx: usize,
    used: u32,
}

impl<'a> Iterator for ReplayIter<'a> {
    type Item = InputMask;

    fn next(&mut self) -> Option<Self::Item> {
        // Decoded logs may carry empty runs; they hold no ticks.
        let run = loop {
            let run = self.runs.get(self.run_idx)?;
            if self.used < run.repeat {
                break run;
            }
            self.run_idx += 1;
            self.used = 0;
        };
        self.used += 1;
        Some(run.mask)
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Level Grid
//!
//! The cell data model: one `Cell` per grid position holding the domino
//! automaton fields plus the terrain (floor, ladder) and the two render
//! layer ids. Doors live alongside the cells.
//!
//! All accessors are bounds-checked. Reads outside the grid see an empty
//! cell without floor, writes outside the grid are silently dropped.

use serde::{Serialize, Deserialize};

use crate::core::geom::{CellPos, GRID_WIDTH, MAX_GRID_HEIGHT};
use crate::core::hash::StateHasher;
use crate::game::error::SimError;

// =============================================================================
// DOMINO TYPE
// =============================================================================

/// Kind of domino occupying a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DominoType {
    /// No domino
    #[default]
    Empty = 0,
    /// Plain yellow domino
    Standard = 1,
    /// Never falls
    Stopper = 2,
    /// Splits into two halves falling apart
    Splitter = 3,
    /// Blows a hole into the floor
    Exploder = 4,
    /// Falls after a countdown
    Delay = 5,
    /// Keeps rolling until it rests against something
    Tumbler = 6,
    /// Bridges a one-cell gap in the floor
    Bridger = 7,
    /// Disappears once flat
    Vanish = 8,
    /// Its fall starts the completion check
    Trigger = 9,
    /// Rises to the ceiling
    Ascender = 10,
    /// Entangled pair, first half
    ConnectedA = 11,
    /// Entangled pair, second half
    ConnectedB = 12,
    /// Counter stone, highest priority
    Counter1 = 13,
    /// Counter stone
    Counter2 = 14,
    /// Counter stone, lowest priority
    Counter3 = 15,
    /// Large yellow pile
    Crash0 = 16,
    /// Large mixed pile
    Crash1 = 17,
    /// Large red pile
    Crash2 = 18,
    /// Small yellow pile
    Crash3 = 19,
    /// Small mixed pile
    Crash4 = 20,
    /// Small red pile
    Crash5 = 21,
}

impl DominoType {
    /// Every type, in index order.
    pub const ALL: [DominoType; 22] = [
        DominoType::Empty,
        DominoType::Standard,
        DominoType::Stopper,
        DominoType::Splitter,
        DominoType::Exploder,
        DominoType::Delay,
        DominoType::Tumbler,
        DominoType::Bridger,
        DominoType::Vanish,
        DominoType::Trigger,
        DominoType::Ascender,
        DominoType::ConnectedA,
        DominoType::ConnectedB,
        DominoType::Counter1,
        DominoType::Counter2,
        DominoType::Counter3,
        DominoType::Crash0,
        DominoType::Crash1,
        DominoType::Crash2,
        DominoType::Crash3,
        DominoType::Crash4,
        DominoType::Crash5,
    ];

    /// Types a level may place (and the ant may carry).
    pub const PLACEABLE: [DominoType; 15] = [
        DominoType::Standard,
        DominoType::Stopper,
        DominoType::Splitter,
        DominoType::Exploder,
        DominoType::Delay,
        DominoType::Tumbler,
        DominoType::Bridger,
        DominoType::Vanish,
        DominoType::Trigger,
        DominoType::Ascender,
        DominoType::ConnectedA,
        DominoType::ConnectedB,
        DominoType::Counter1,
        DominoType::Counter2,
        DominoType::Counter3,
    ];

    /// Get type from index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Is this a crash pile?
    #[inline]
    pub const fn is_crash(self) -> bool {
        matches!(
            self,
            DominoType::Crash0
                | DominoType::Crash1
                | DominoType::Crash2
                | DominoType::Crash3
                | DominoType::Crash4
                | DominoType::Crash5
        )
    }

    /// Priority rank of a counter stone (1 is pushed first).
    #[inline]
    pub const fn counter_rank(self) -> Option<u8> {
        match self {
            DominoType::Counter1 => Some(1),
            DominoType::Counter2 => Some(2),
            DominoType::Counter3 => Some(3),
            _ => None,
        }
    }

    /// Does this type fall through the ordinary 1..=15 sweep?
    #[inline]
    pub const fn sweeps(self) -> bool {
        matches!(
            self,
            DominoType::Standard
                | DominoType::Delay
                | DominoType::Tumbler
                | DominoType::Bridger
                | DominoType::Vanish
                | DominoType::Trigger
                | DominoType::Ascender
                | DominoType::ConnectedA
                | DominoType::ConnectedB
                | DominoType::Counter1
                | DominoType::Counter2
                | DominoType::Counter3
        )
    }

    /// Is `state` inside the range this type may ever hold?
    pub fn valid_state(self, state: u8) -> bool {
        match self {
            DominoType::Empty => state == 0,
            DominoType::Stopper => state == 8,
            DominoType::Splitter => state == 7 || state == 8 || (23..=35).contains(&state),
            DominoType::Exploder => state == 7 || state == 8 || (16..=22).contains(&state),
            DominoType::Ascender => (1..=15).contains(&state) || (36..=49).contains(&state),
            t if t.is_crash() => (51..=56).contains(&state),
            _ => (1..=15).contains(&state),
        }
    }
}

// =============================================================================
// EXTRA FLAG
// =============================================================================

/// Secondary sub-state layered on top of the primary domino state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DominoExtra {
    /// Nothing pending
    #[default]
    None,
    /// Pivoting down onto a half step (legacy 0x40)
    HalfStepPivot,
    /// Ascender hanging under a ceiling (legacy 0x50)
    ClingingToCeiling,
    /// Ascender moving up (legacy 0x60)
    Rising,
    /// Falling through empty cells (legacy 0x70)
    FreeFallingRubble,
    /// Delay countdown ticks remaining
    Countdown(u8),
    /// Splitter: type of the domino that struck it (display only)
    StruckBy(DominoType),
}

impl DominoExtra {
    /// Legacy byte encoding, used for checksums.
    pub fn legacy_code(self) -> u8 {
        match self {
            DominoExtra::None => 0,
            DominoExtra::HalfStepPivot => 0x40,
            DominoExtra::ClingingToCeiling => 0x50,
            DominoExtra::Rising => 0x60,
            DominoExtra::FreeFallingRubble => 0x70,
            DominoExtra::Countdown(n) => n & 0x3F,
            DominoExtra::StruckBy(t) => t as u8,
        }
    }

    /// Is the domino moving between cells?
    #[inline]
    pub const fn in_transit(self) -> bool {
        matches!(
            self,
            DominoExtra::HalfStepPivot | DominoExtra::Rising | DominoExtra::FreeFallingRubble
        )
    }

    /// Does this flag make a crash pile keep falling?
    #[inline]
    pub const fn airborne(self) -> bool {
        matches!(self, DominoExtra::Rising | DominoExtra::FreeFallingRubble)
    }
}

// =============================================================================
// CELL
// =============================================================================

/// Foreground tile ids (render layer). Only the bridger rewrites these.
pub mod fg {
    /// No foreground
    pub const EMPTY: u16 = 0;
    /// Inner platform piece
    pub const PLATFORM_MIDDLE: u16 = 1;
    /// Left end of a platform run
    pub const PLATFORM_LEFT_END: u16 = 2;
    /// Right end of a platform run
    pub const PLATFORM_RIGHT_END: u16 = 3;
    /// Half-height step
    pub const STEP: u16 = 4;
    /// Ladder
    pub const LADDER: u16 = 5;
    /// Platform added by a bridger
    pub const BRIDGE: u16 = 6;
}

/// One grid position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Domino occupying the cell
    pub domino: DominoType,
    /// Progress within the type's behaviour (0 = inert)
    pub state: u8,
    /// -1, 0 or +1
    pub dir: i8,
    /// Sub-row displacement while moving between cells
    pub y_offset: i8,
    /// Secondary sub-state
    pub extra: DominoExtra,
    /// Floor at the bottom of this cell
    pub platform: bool,
    /// Ladder through this cell
    pub ladder: bool,
    /// Background layer id (render only)
    pub bg: u16,
    /// Foreground layer id (render only)
    pub fg: u16,
}

impl Cell {
    /// Empty cell without terrain.
    pub const EMPTY: Cell = Cell {
        domino: DominoType::Empty,
        state: 0,
        dir: 0,
        y_offset: 0,
        extra: DominoExtra::None,
        platform: false,
        ladder: false,
        bg: 0,
        fg: 0,
    };

    /// Upright resting state.
    pub const UPRIGHT: u8 = 8;

    /// Does the cell hold a domino?
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.domino != DominoType::Empty
    }

    /// Standing at rest, not pushed, nothing pending.
    #[inline]
    pub fn is_upright(&self) -> bool {
        self.is_occupied()
            && self.state == Self::UPRIGHT
            && self.dir == 0
            && self.extra == DominoExtra::None
            && self.y_offset == 0
    }

    /// Forward progress of a sweeping domino (0 upright, 7 flat).
    ///
    /// Negative while a tumbler stands back up after a roll.
    #[inline]
    pub fn progress(&self) -> i8 {
        (self.state as i8 - Self::UPRIGHT as i8) * self.dir
    }

    /// Is this a sweeping domino lying flat?
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.domino.sweeps() && (self.state == 1 || self.state == 15)
    }

    /// Place a domino, keeping terrain.
    pub fn set_domino(&mut self, domino: DominoType, state: u8, dir: i8, extra: DominoExtra) {
        self.domino = domino;
        self.state = state;
        self.dir = dir;
        self.extra = extra;
        self.y_offset = 0;
    }

    /// Remove the domino, keeping terrain.
    pub fn clear_domino(&mut self) {
        self.set_domino(DominoType::Empty, 0, 0, DominoExtra::None);
    }

    /// Copy only the domino fields from another cell.
    pub fn copy_domino_from(&mut self, other: &Cell) {
        self.domino = other.domino;
        self.state = other.state;
        self.dir = other.dir;
        self.y_offset = other.y_offset;
        self.extra = other.extra;
    }
}

static OUTSIDE: Cell = Cell::EMPTY;

// =============================================================================
// DOORS
// =============================================================================

/// Fully open door state.
pub const DOOR_OPEN: u8 = 3;

/// Edge crossed by a door step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorEdge {
    /// Left the closed state
    StartedOpening,
    /// Arrived at the closed state
    FinishedClosing,
}

/// Entry or exit door with its 0..=3 open counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Cell the ant stands in to use the door
    pub pos: CellPos,
    /// 0 closed .. 3 open
    pub state: u8,
    /// Target requested by the simulation
    pub open_requested: bool,
}

impl Door {
    /// Closed door at a position.
    pub const fn closed(pos: CellPos) -> Self {
        Self { pos, state: 0, open_requested: false }
    }

    /// Fully open?
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == DOOR_OPEN
    }

    /// Advance one step toward the requested state.
    pub fn step(&mut self) -> Option<DoorEdge> {
        if self.open_requested && self.state < DOOR_OPEN {
            self.state += 1;
            if self.state == 1 {
                return Some(DoorEdge::StartedOpening);
            }
        } else if !self.open_requested && self.state > 0 {
            self.state -= 1;
            if self.state == 0 {
                return Some(DoorEdge::FinishedClosing);
            }
        }
        None
    }
}

// =============================================================================
// LEVEL GRID
// =============================================================================

/// Cell grid plus doors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelGrid {
    height: i32,
    cells: Vec<Cell>,
    /// Door the ant enters through
    pub entry: Door,
    /// Door the ant leaves through
    pub exit: Door,
}

impl LevelGrid {
    /// Create an empty grid of the given height.
    pub fn new(height: i32) -> Result<Self, SimError> {
        if !(1..=MAX_GRID_HEIGHT).contains(&height) {
            return Err(SimError::InvalidLevel(format!(
                "height {} outside 1..={}",
                height, MAX_GRID_HEIGHT
            )));
        }
        Ok(Self {
            height,
            cells: vec![Cell::EMPTY; (GRID_WIDTH * height) as usize],
            entry: Door::closed(CellPos::default()),
            exit: Door::closed(CellPos::default()),
        })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> i32 {
        GRID_WIDTH
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Is the position inside the grid?
    #[inline]
    pub fn in_bounds(&self, pos: CellPos) -> bool {
        pos.x >= 0 && pos.x < GRID_WIDTH && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: CellPos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y * GRID_WIDTH + pos.x) as usize)
    }

    /// Cell at a position (an empty cell when out of range).
    #[inline]
    pub fn cell(&self, pos: CellPos) -> &Cell {
        match self.index(pos) {
            Some(i) => &self.cells[i],
            None => &OUTSIDE,
        }
    }

    /// Mutable cell, `None` when out of range.
    #[inline]
    pub fn cell_mut(&mut self, pos: CellPos) -> Option<&mut Cell> {
        let i = self.index(pos)?;
        Some(&mut self.cells[i])
    }

    /// Apply a change to a cell; ignored when out of range.
    #[inline]
    pub fn update(&mut self, pos: CellPos, f: impl FnOnce(&mut Cell)) {
        if let Some(cell) = self.cell_mut(pos) {
            f(cell);
        }
    }

    /// All cells in raster order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Every in-range position, row 0 first, left to right.
    pub fn positions(&self) -> impl Iterator<Item = CellPos> {
        let height = self.height;
        (0..height).flat_map(|y| (0..GRID_WIDTH).map(move |x| CellPos::new(x, y)))
    }

    /// Does the cell have a floor?
    #[inline]
    pub fn platform(&self, pos: CellPos) -> bool {
        self.cell(pos).platform
    }

    /// Does the cell have a ladder?
    #[inline]
    pub fn ladder(&self, pos: CellPos) -> bool {
        self.cell(pos).ladder
    }

    /// Domino type at a position.
    #[inline]
    pub fn domino(&self, pos: CellPos) -> DominoType {
        self.cell(pos).domino
    }

    /// Is the neighbour column one half step higher than `pos`?
    #[inline]
    pub fn step_up_at(&self, pos: CellPos) -> bool {
        self.in_bounds(pos) && !self.platform(pos) && self.platform(pos.up())
    }

    /// Is the position one of the two doors?
    #[inline]
    pub fn is_door(&self, pos: CellPos) -> bool {
        pos == self.entry.pos || pos == self.exit.pos
    }

    /// Positions of every domino of a type, in raster order.
    pub fn find(&self, domino: DominoType) -> Vec<CellPos> {
        self.positions().filter(|p| self.domino(*p) == domino).collect()
    }

    /// Hash every cell and both doors.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_i32(self.height);
        for cell in &self.cells {
            hasher.update_u8(cell.domino as u8);
            hasher.update_u8(cell.state);
            hasher.update_i8(cell.dir);
            hasher.update_i8(cell.y_offset);
            hasher.update_u8(cell.extra.legacy_code());
            hasher.update_bool(cell.platform);
            hasher.update_bool(cell.ladder);
            hasher.update_u16(cell.fg);
        }
        for door in [&self.entry, &self.exit] {
            hasher.update_pos(door.pos);
            hasher.update_u8(door.state);
            hasher.update_bool(door.open_requested);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Ant Controller
//!
//! The avatar state machine. Every tick the current state's animation
//! runs one frame. When it finishes, the state applies its consequence
//! (move, push, pick up, put down) and, usually, hands back `Nothing` so
//! the decision step picks the next action in the same tick.
//!
//! Decision precedence:
//!
//! 1. nothing to stand on: fall
//! 2. pushing and a domino leans into the ant: die
//! 3. LEFT, RIGHT, UP, DOWN, ACTION in that order
//! 4. ladder continuation
//! 5. idle sub-machine

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::geom::{CellPos, Facing};
use crate::core::hash::StateHasher;
use crate::game::context::SimContext;
use crate::game::crash::domino_crash;
use crate::game::domino::tilting_toward;
use crate::game::grid::{Cell, DominoExtra, DominoType, LevelGrid};
use crate::game::input::InputMask;
use crate::game::push::{can_pick_up, can_place, is_pushable, pick_up, push, put_down};

// =============================================================================
// STATES
// =============================================================================

/// Vertical travel on a ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Climb {
    /// Toward row 0
    Up,
    /// Toward the bottom row
    Down,
}

/// Ant action/animation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntState {
    /// Ready for the decision step
    Nothing,

    /// Walk one column
    Walk(Facing),
    /// Walk one column carrying a domino
    Carry(Facing),
    /// Hop up onto a half step
    JumpUp(Facing),
    /// Hop up carrying a domino
    CarryJumpUp(Facing),
    /// Hop down off a half step
    JumpDown(Facing),
    /// Hop down carrying a domino
    CarryJumpDown(Facing),

    /// Climb one row up a ladder
    ClimbUp,
    /// Climb one row down a ladder
    ClimbDown,
    /// Climb up carrying a domino
    CarryClimbUp,
    /// Climb down carrying a domino
    CarryClimbDown,
    /// Step sideways off a ladder onto a floor
    LadderStepOff(Facing),
    /// Step off a ladder carrying a domino
    CarryLadderStepOff(Facing),

    /// Lift the domino out of the ant's cell
    PullOut,
    /// Put the carried domino down
    PushIn,
    /// Stop and hold the carried domino
    CarryStop,

    /// Push a domino
    Push(Facing),
    /// Push a stopper (nothing happens)
    PushStopper(Facing),
    /// Push an ascender
    PushRiser(Facing),
    /// Push a delay domino
    PushDelay(Facing),

    /// Refuse an impossible action
    NoNo,
    /// Idle foot tapping
    Tapping,
    /// Idle yawn
    Yawning,
    /// Covering the ears next to a lit exploder
    InFrontOfExploder,
    /// Shrug after a failed level
    Shrugging,
    /// Cheer after a solved level
    Victory,
    /// Refusing to walk off a deadly edge
    StrugglingAgainstFall(Facing),

    /// Losing the ground
    SuddenFall(Facing),
    /// Falling one row per frame
    Falling,
    /// Survived a fall
    Landing,
    /// Fell too far
    LandDying,
    /// Dead, floating away
    Ghost,
    /// Crushed by a domino
    DominoDying,
    /// Losing the carried domino while falling
    LoseDominoPrelude,
    /// The carried domino drops away
    LoosingDomino(Facing),

    /// Walking into the exit door
    EnterDoor,
    /// Gone through the exit
    InsideDoor,
    /// Coming out of the entry door
    LeaveDoorEnterLevel,
    /// Stepping clear of the entry door
    StepAsideAfterEnter,
}

impl AntState {
    /// Frames the animation lasts.
    pub fn frames(self) -> u8 {
        use AntState::*;
        match self {
            Nothing => 1,
            Walk(_) | Carry(_) => 5,
            JumpUp(_) | CarryJumpUp(_) | JumpDown(_) | CarryJumpDown(_) => 6,
            ClimbUp | ClimbDown | CarryClimbUp | CarryClimbDown => 4,
            LadderStepOff(_) | CarryLadderStepOff(_) => 4,
            PullOut | PushIn => 6,
            CarryStop => 2,
            Push(_) | PushRiser(_) | PushDelay(_) => 5,
            PushStopper(_) => 8,
            NoNo => 6,
            Tapping => 8,
            Yawning => 12,
            InFrontOfExploder => 4,
            Shrugging => 12,
            Victory => 16,
            StrugglingAgainstFall(_) => 8,
            SuddenFall(_) => 2,
            Falling => 1,
            Landing => 4,
            LandDying => 10,
            Ghost => 20,
            DominoDying => 10,
            LoseDominoPrelude => 2,
            LoosingDomino(_) => 3,
            EnterDoor => 6,
            InsideDoor => 1,
            LeaveDoorEnterLevel => 6,
            StepAsideAfterEnter => 4,
        }
    }

    /// Carrying counterpart of a plain movement state.
    pub fn carrying(self) -> Self {
        use AntState::*;
        match self {
            Walk(f) => Carry(f),
            JumpUp(f) => CarryJumpUp(f),
            JumpDown(f) => CarryJumpDown(f),
            ClimbUp => CarryClimbUp,
            ClimbDown => CarryClimbDown,
            LadderStepOff(f) => CarryLadderStepOff(f),
            other => other,
        }
    }

    fn index(self) -> u8 {
        use AntState::*;
        let facing = |f: Facing| if f == Facing::Left { 0 } else { 1 };
        match self {
            Nothing => 0,
            Walk(f) => 1 + facing(f),
            Carry(f) => 3 + facing(f),
            JumpUp(f) => 5 + facing(f),
            CarryJumpUp(f) => 7 + facing(f),
            JumpDown(f) => 9 + facing(f),
            CarryJumpDown(f) => 11 + facing(f),
            ClimbUp => 13,
            ClimbDown => 14,
            CarryClimbUp => 15,
            CarryClimbDown => 16,
            LadderStepOff(f) => 17 + facing(f),
            CarryLadderStepOff(f) => 19 + facing(f),
            PullOut => 21,
            PushIn => 22,
            CarryStop => 23,
            Push(f) => 24 + facing(f),
            PushStopper(f) => 26 + facing(f),
            PushRiser(f) => 28 + facing(f),
            PushDelay(f) => 30 + facing(f),
            NoNo => 32,
            Tapping => 33,
            Yawning => 34,
            InFrontOfExploder => 35,
            Shrugging => 36,
            Victory => 37,
            StrugglingAgainstFall(f) => 38 + facing(f),
            SuddenFall(f) => 40 + facing(f),
            Falling => 42,
            Landing => 43,
            LandDying => 44,
            Ghost => 45,
            DominoDying => 46,
            LoseDominoPrelude => 47,
            LoosingDomino(f) => 48 + facing(f),
            EnterDoor => 50,
            InsideDoor => 51,
            LeaveDoorEnterLevel => 52,
            StepAsideAfterEnter => 53,
        }
    }
}

// =============================================================================
// ANT
// =============================================================================

/// The player avatar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ant {
    /// Cell the ant occupies
    pub pos: CellPos,
    /// Current action
    pub state: AntState,
    /// Animation frame within the action
    pub image: u8,
    /// Ticks until the next frame
    pub timer: u8,
    /// Horizontal facing
    pub facing: Facing,
    /// Set while the ant hangs on a ladder
    pub climbing: Option<Climb>,
    /// Domino in hand (Empty when none)
    pub carried: DominoType,
    /// Consecutive idle decision steps
    pub inactive: u32,
    /// Rows fallen so far
    pub falling_height: u8,
    /// Ticks the ant holds still after a push
    pub push_delay: u8,
    /// Pushes still allowed
    pub pushes_left: u8,
    /// Level failed
    pub level_fail: bool,
    /// Level solved
    pub level_success: bool,
    /// Walked through the exit
    pub final_animation_played: bool,
    reacted: bool,
    place_offset: i32,
}

impl Ant {
    /// Ant standing in the entry door.
    pub fn new(entry: CellPos, pushes: u8) -> Self {
        Self {
            pos: entry,
            state: AntState::LeaveDoorEnterLevel,
            image: 0,
            timer: 0,
            facing: Facing::Right,
            climbing: None,
            carried: DominoType::Empty,
            inactive: 0,
            falling_height: 0,
            push_delay: 0,
            pushes_left: pushes,
            level_fail: false,
            level_success: false,
            final_animation_played: false,
            reacted: false,
            place_offset: 0,
        }
    }

    /// Legacy direction value: -1/+1 walking, -20/+20 on a ladder.
    pub fn direction(&self) -> i32 {
        match self.climbing {
            Some(Climb::Up) => -20,
            Some(Climb::Down) => 20,
            None => self.facing.dx(),
        }
    }

    /// False once the ant died.
    pub fn is_living(&self) -> bool {
        !matches!(self.state, AntState::LandDying | AntState::Ghost | AntState::DominoDying)
    }

    /// The level was solved: open the exit.
    pub fn success(&mut self, grid: &mut LevelGrid) {
        self.level_success = true;
        grid.exit.open_requested = true;
    }

    /// The level failed.
    pub fn fail(&mut self) {
        self.level_fail = true;
    }

    /// Advance one tick.
    pub fn step(&mut self, ctx: &mut SimContext<'_>, input: InputMask) {
        self.push_delay = self.push_delay.saturating_sub(1);

        match self.run_state(ctx) {
            None => {}
            Some(AntState::Nothing) => {
                let next = self.decide(ctx, input);
                self.enter(next);
            }
            Some(next) => self.enter(next),
        }
    }

    fn enter(&mut self, state: AntState) {
        if state != self.state {
            debug!("ant {:?} -> {:?} at ({}, {})", self.state, state, self.pos.x, self.pos.y);
        }
        self.state = state;
        self.image = 0;
        self.timer = 0;
    }

    /// Run one animation frame.
    ///
    /// # Returns
    ///
    /// `true` once the current state's last frame has been shown.
    fn animate(&mut self, delay: u8) -> bool {
        if self.timer > 0 {
            self.timer -= 1;
            return false;
        }
        self.timer = delay;
        if self.image + 1 >= self.state.frames() {
            return true;
        }
        self.image += 1;
        false
    }

    // =========================================================================
    // STATE FUNCTIONS
    // =========================================================================

    /// Run the current state.
    ///
    /// `None` while the animation is still playing, otherwise the state to
    /// enter (`Nothing` asks for a decision).
    fn run_state(&mut self, ctx: &mut SimContext<'_>) -> Option<AntState> {
        use AntState::*;

        if self.state == Nothing {
            return Some(Nothing);
        }
        if self.state == LeaveDoorEnterLevel && !ctx.grid.entry.is_open() {
            ctx.grid.entry.open_requested = true;
            return None;
        }
        if !self.animate(ctx.config.ant_frame_delay) {
            return None;
        }

        match self.state {
            Walk(f) | Carry(f) => {
                self.facing = f;
                self.pos = self.pos.toward(f);
            }
            JumpUp(f) | CarryJumpUp(f) => {
                self.facing = f;
                self.pos = self.pos.toward(f).up();
            }
            JumpDown(f) | CarryJumpDown(f) => {
                self.facing = f;
                self.pos = self.pos.toward(f).down();
            }
            ClimbUp | CarryClimbUp => self.climb(ctx.grid, Climb::Up),
            ClimbDown | CarryClimbDown => self.climb(ctx.grid, Climb::Down),
            LadderStepOff(f) | CarryLadderStepOff(f) => {
                self.facing = f;
                self.pos = self.pos.toward(f);
                self.climbing = None;
            }

            PullOut => {
                if can_pick_up(ctx.grid, self.pos) {
                    self.carried = pick_up(ctx, self.pos);
                }
            }
            PushIn => {
                let target = self.pos.offset(self.place_offset, 0);
                let domino = std::mem::replace(&mut self.carried, DominoType::Empty);
                put_down(ctx, target, domino, self.place_offset != 0);
            }

            Push(f) | PushStopper(f) | PushRiser(f) | PushDelay(f) => {
                let target = ctx.grid.domino(self.pos);
                push(ctx, self.pos, f);
                if target != DominoType::Stopper {
                    self.pushes_left = self.pushes_left.saturating_sub(1);
                }
                self.push_delay = ctx.config.push_recover_ticks;
            }

            StrugglingAgainstFall(f) => self.facing = f,

            SuddenFall(_) => return Some(Falling),
            Falling => return Some(self.fall_row(ctx.grid, ctx.config.fall_death_rows)),
            LoseDominoPrelude => return Some(LoosingDomino(self.facing)),
            LoosingDomino(_) => self.release_carried(ctx),

            LandDying | DominoDying => return Some(Ghost),
            Ghost | InsideDoor => return None,

            EnterDoor => {
                self.final_animation_played = true;
                ctx.grid.exit.open_requested = false;
                return Some(InsideDoor);
            }
            LeaveDoorEnterLevel => return Some(StepAsideAfterEnter),
            StepAsideAfterEnter => ctx.grid.entry.open_requested = false,

            Nothing | CarryStop | NoNo | Tapping | Yawning | InFrontOfExploder | Shrugging
            | Victory | Landing => {}
        }
        Some(Nothing)
    }

    fn climb(&mut self, grid: &LevelGrid, climb: Climb) {
        self.pos = match climb {
            Climb::Up => self.pos.up(),
            Climb::Down => self.pos.down(),
        };
        self.climbing = if grid.platform(self.pos) && self.pos.on_even_row() {
            None
        } else {
            Some(climb)
        };
    }

    fn fall_row(&mut self, grid: &LevelGrid, death_rows: u8) -> AntState {
        self.pos = self.pos.down();
        self.falling_height = self.falling_height.saturating_add(1);

        if grid.platform(self.pos) {
            let height = std::mem::take(&mut self.falling_height);
            return if height > death_rows {
                AntState::LandDying
            } else {
                AntState::Landing
            };
        }
        if self.pos.y >= grid.height() - 1 {
            return AntState::LandDying;
        }
        AntState::Falling
    }

    fn release_carried(&mut self, ctx: &mut SimContext<'_>) {
        let domino = std::mem::replace(&mut self.carried, DominoType::Empty);
        if domino == DominoType::Empty {
            return;
        }
        if ctx.grid.cell(self.pos).is_occupied() {
            domino_crash(ctx, self.pos, domino, DominoExtra::FreeFallingRubble);
            return;
        }
        ctx.grid.update(self.pos, |c| {
            c.set_domino(domino, Cell::UPRIGHT, 0, DominoExtra::FreeFallingRubble)
        });
        ctx.dirty(self.pos);
    }
}

// =============================================================================
// DECISION STEP
// =============================================================================

impl Ant {
    /// Choose the next action from the keys held this tick.
    ///
    /// While a domino is carried, plain movement states come back as their
    /// carrying counterparts.
    pub fn decide(&mut self, ctx: &SimContext<'_>, input: InputMask) -> AntState {
        if !input.is_empty() {
            self.inactive = 0;
        }
        let next = self.choose(ctx, input);
        if self.carried != DominoType::Empty {
            next.carrying()
        } else {
            next
        }
    }

    fn choose(&mut self, ctx: &SimContext<'_>, input: InputMask) -> AntState {
        use AntState::*;
        let grid = &*ctx.grid;
        let pos = self.pos;

        // 1. Ground
        if !grid.platform(pos) && !grid.ladder(pos) {
            self.climbing = None;
            if self.carried != DominoType::Empty {
                return LoseDominoPrelude;
            }
            if pos.y >= grid.height() - 1 {
                return LandDying;
            }
            return SuddenFall(self.facing);
        }

        // 2. Push recovery
        if self.push_delay > 0 {
            if self.crushed(grid) {
                return DominoDying;
            }
            return Nothing;
        }

        // 3. Keys. Between two ladder rows the ant cannot let go.
        let mid_ladder = self.climbing.is_some() && !pos.on_even_row();
        if !mid_ladder {
            let action = input.contains(InputMask::ACTION);
            if input.contains(InputMask::LEFT) {
                return self.sideways(grid, ctx, Facing::Left, action);
            }
            if input.contains(InputMask::RIGHT) {
                return self.sideways(grid, ctx, Facing::Right, action);
            }
            if input.contains(InputMask::UP) {
                if pos == grid.exit.pos && grid.exit.is_open() && self.level_success {
                    return EnterDoor;
                }
                if grid.ladder(pos) && grid.ladder(pos.up()) {
                    return ClimbUp;
                }
            }
            if input.contains(InputMask::DOWN) && grid.ladder(pos.down()) {
                return ClimbDown;
            }
            if action {
                return self.lift_or_place(grid);
            }
        }

        // 4. Ladder continuation
        if mid_ladder {
            return match self.climbing {
                Some(Climb::Up) if grid.ladder(pos.up()) => ClimbUp,
                Some(Climb::Down) if grid.ladder(pos.down()) => ClimbDown,
                _ => Nothing,
            };
        }

        // 5. Idle
        if input.is_empty() {
            return self.idle(grid, ctx);
        }
        Nothing
    }

    fn sideways(&mut self, grid: &LevelGrid, ctx: &SimContext<'_>, facing: Facing, action: bool) -> AntState {
        use AntState::*;
        let target = self.pos.toward(facing);

        if self.climbing.is_some() {
            return if grid.in_bounds(target) && grid.platform(target) {
                LadderStepOff(facing)
            } else {
                Nothing
            };
        }
        if action {
            return self.push_action(grid, facing);
        }
        if !grid.in_bounds(target) {
            return Nothing;
        }
        if grid.step_up_at(target) {
            return JumpUp(facing);
        }
        if grid.platform(target) {
            return Walk(facing);
        }
        if grid.platform(target.down()) {
            return JumpDown(facing);
        }
        match drop_rows(grid, target) {
            Some(rows) if rows <= ctx.config.fall_death_rows => Walk(facing),
            _ => StrugglingAgainstFall(facing),
        }
    }

    fn push_action(&self, grid: &LevelGrid, facing: Facing) -> AntState {
        use AntState::*;
        if self.carried != DominoType::Empty || !is_pushable(grid, self.pos, 0) {
            return NoNo;
        }
        match grid.domino(self.pos) {
            DominoType::Stopper => PushStopper(facing),
            _ if self.pushes_left == 0 => NoNo,
            DominoType::Ascender => PushRiser(facing),
            DominoType::Delay => PushDelay(facing),
            _ => Push(facing),
        }
    }

    fn lift_or_place(&mut self, grid: &LevelGrid) -> AntState {
        if self.climbing.is_some() {
            return AntState::Nothing;
        }
        if self.carried == DominoType::Empty {
            return if can_pick_up(grid, self.pos) {
                AntState::PullOut
            } else {
                AntState::NoNo
            };
        }
        for offset in [0, self.facing.dx()] {
            if can_place(grid, self.pos, offset) {
                self.place_offset = offset;
                return AntState::PushIn;
            }
        }
        AntState::NoNo
    }

    /// Idle sub-machine, run when no key is held.
    fn idle(&mut self, grid: &LevelGrid, ctx: &SimContext<'_>) -> AntState {
        use AntState::*;
        self.inactive = self.inactive.saturating_add(1);
        let t = self.inactive;

        if self.climbing.is_some() {
            if t > ctx.config.ladder_idle_ticks {
                for f in [self.facing, self.facing.opposite()] {
                    let side = self.pos.toward(f);
                    if grid.in_bounds(side) && grid.platform(side) {
                        return LadderStepOff(f);
                    }
                }
            }
            return Nothing;
        }

        if self.carried != DominoType::Empty {
            if t == 1 {
                return CarryStop;
            }
            if t > ctx.config.carry_place_ticks {
                let dx = self.facing.dx();
                for offset in [0, dx, -dx] {
                    if can_place(grid, self.pos, offset) {
                        self.place_offset = offset;
                        return PushIn;
                    }
                }
            }
            return Nothing;
        }

        if !self.reacted && (self.level_fail || self.level_success) {
            self.reacted = true;
            return if self.level_fail { Shrugging } else { Victory };
        }

        if grid.domino(self.pos) == DominoType::Exploder {
            return InFrontOfExploder;
        }

        if t >= 220 {
            self.inactive = 0;
            return Nothing;
        }
        if t == 204 {
            return Yawning;
        }
        if t < 204 && t & 0x20 != 0 && t & 0x1F == 0 {
            return Tapping;
        }
        Nothing
    }

    /// Is a neighbour leaning far enough into the ant's cell to hit it?
    fn crushed(&self, grid: &LevelGrid) -> bool {
        [-1i8, 1].into_iter().any(|dir| {
            let cell = grid.cell(self.pos.offset(dir as i32, 0));
            tilting_toward(cell, dir) && cell.progress() >= 3
        })
    }

    /// Hash every field that influences later ticks.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_pos(self.pos);
        hasher.update_u8(self.state.index());
        hasher.update_u8(self.image);
        hasher.update_u8(self.timer);
        hasher.update_i32(self.direction());
        hasher.update_u8(self.carried as u8);
        hasher.update_u32(self.inactive);
        hasher.update_u8(self.falling_height);
        hasher.update_u8(self.push_delay);
        hasher.update_u8(self.pushes_left);
        hasher.update_bool(self.level_fail);
        hasher.update_bool(self.level_success);
        hasher.update_bool(self.final_animation_played);
        hasher.update_bool(self.reacted);
        hasher.update_i32(self.place_offset);
    }
}

/// Rows below `from` until the first floor, `None` if there is none.
fn drop_rows(grid: &LevelGrid, from: CellPos) -> Option<u8> {
    (1..grid.height())
        .find(|k| grid.platform(from.offset(0, *k)))
        .map(|k| k as u8)
}

// =============================================================================
// TESTS
// =============================================================================

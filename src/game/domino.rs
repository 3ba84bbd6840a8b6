//! Domino Automaton
//!
//! Advances every active cell one logical step per tick, in raster order
//! (row 0 first, left to right within a row).
//!
//! ## Dispatch
//!
//! `Transition::select` is a closed match over the semantic key
//! (type, state, direction, extra). A key with no arm is an internal
//! consistency violation and surfaces as `SimError::DispatchMiss`.
//!
//! ## Sweep phases
//!
//! Sweeping types share one falling sequence over states 1..=15 (8 is
//! upright). With forward progress `p = (state - 8) * dir`:
//!
//! | p      | Transition  | Meaning                                   |
//! |--------|-------------|-------------------------------------------|
//! | < 2    | `FreeStep`  | nothing can touch the domino yet          |
//! | 2      | `Collide`   | the domino reaches the neighbour cell     |
//! | 3..=6  | `Follow`    | lean as far as the neighbour allows       |
//! | 7      | `Flat`      | lying down: edges, rolling, vanishing     |

use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::geom::{CellPos, Facing, ROW_UNITS};
use crate::game::ascender;
use crate::game::context::SimContext;
use crate::game::crash::{domino_crash, CRASH_LAST_STATE};
use crate::game::error::SimError;
use crate::game::events::SoundEffect;
use crate::game::grid::{fg, Cell, DominoExtra, DominoType};
use crate::game::push::push;
use crate::game::splitter;

// =============================================================================
// DISPATCH
// =============================================================================

/// One transition procedure of the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do this tick
    Idle,
    /// Advance one frame unconditionally
    FreeStep,
    /// Reaching the neighbour cell
    Collide,
    /// Leaning further onto the neighbour
    Follow,
    /// Lying flat
    Flat,
    /// Falling (or pivoting) between rows
    FreeFall,
    /// Delay countdown running
    Countdown,
    /// Exploder fuse lit
    ExploderFuse,
    /// Exploder burning down
    ExploderBurn,
    /// Exploder blows its hole
    ExploderHole,
    /// Splitter halves
    Splitter,
    /// Ascender about to lift off
    AscenderLaunch,
    /// Ascender rising
    AscenderRise,
    /// Ascender tipping along the ceiling
    AscenderCeilingTilt,
    /// Ascender lying flat on the ceiling
    AscenderCeilingFlat,
    /// Ascender flipping onto a platform
    AscenderFlip,
    /// Crash pile dissolving
    CrashDissolve,
}

impl Transition {
    /// Select the transition for a cell, `None` if the key is unreachable.
    pub fn select(cell: &Cell) -> Option<Self> {
        use DominoExtra as X;
        use DominoType as T;

        let t = cell.domino;
        if t == T::Empty || !t.valid_state(cell.state) {
            return None;
        }

        let transition = match (t, cell.state, cell.extra) {
            // Crash piles
            (t, _, X::FreeFallingRubble) if t.is_crash() => Transition::FreeFall,
            (t, s, X::None) if t.is_crash() && s < CRASH_LAST_STATE => Transition::CrashDissolve,
            (t, _, X::None) if t.is_crash() => Transition::Idle,

            // Anything released into the air
            (_, _, X::HalfStepPivot | X::FreeFallingRubble) => Transition::FreeFall,

            (T::Stopper, _, X::None) => Transition::Idle,

            (T::Exploder, 8, X::None) => Transition::Idle,
            (T::Exploder, 7, X::None) => Transition::ExploderFuse,
            (T::Exploder, 16..=21, X::None) => Transition::ExploderBurn,
            (T::Exploder, 22, X::None) => Transition::ExploderHole,

            (T::Splitter, 8, X::None) => Transition::Idle,
            (T::Splitter, 7 | 23..=35, X::None | X::StruckBy(_)) => Transition::Splitter,

            (T::Delay, 8, X::Countdown(_)) => Transition::Countdown,

            (T::Ascender, 36, X::None) => Transition::AscenderLaunch,
            (T::Ascender, 37 | 38, X::Rising) => Transition::AscenderRise,
            (T::Ascender, 39, X::ClingingToCeiling) if cell.dir == 0 => Transition::Idle,
            (T::Ascender, 39..=42 | 44..=46, X::ClingingToCeiling) => Transition::AscenderCeilingTilt,
            (T::Ascender, 43 | 47, X::ClingingToCeiling) => Transition::AscenderCeilingFlat,
            (T::Ascender, 48 | 49, X::None) => Transition::AscenderFlip,

            (t, 1..=15, X::None) if t.sweeps() => {
                if cell.dir == 0 {
                    Transition::Idle
                } else {
                    match cell.progress() {
                        p if p < 2 => Transition::FreeStep,
                        2 => Transition::Collide,
                        3..=6 => Transition::Follow,
                        7 => Transition::Flat,
                        _ => return None,
                    }
                }
            }

            _ => return None,
        };
        Some(transition)
    }
}

/// Build the error for a cell that has no transition.
pub(crate) fn dispatch_miss(pos: CellPos, cell: &Cell) -> SimError {
    SimError::DispatchMiss {
        pos,
        domino: cell.domino,
        state: cell.state,
        dir: cell.dir,
        extra: cell.extra,
    }
}

/// Run the automaton over the whole grid.
///
/// Cells are visited in raster order. A domino that moved into a cell the
/// scan has not reached yet is not stepped again this tick.
pub fn run_dominoes(ctx: &mut SimContext<'_>) -> Result<(), SimError> {
    ctx.reset_arrivals();
    let positions: Vec<CellPos> = ctx.grid.positions().collect();

    for pos in positions {
        if ctx.has_arrived(pos) {
            continue;
        }
        let cell = ctx.grid.cell(pos);
        if cell.domino == DominoType::Empty || cell.state == 0 {
            continue;
        }
        step_cell(ctx, pos)?;
    }
    Ok(())
}

/// Run one transition for a single cell.
pub fn step_cell(ctx: &mut SimContext<'_>, pos: CellPos) -> Result<(), SimError> {
    let cell = *ctx.grid.cell(pos);
    let transition = Transition::select(&cell).ok_or_else(|| dispatch_miss(pos, &cell))?;

    #[cfg(feature = "debug-tracing")]
    trace!(
        "({}, {}) {:?} state {} dir {} -> {:?}",
        pos.x, pos.y, cell.domino, cell.state, cell.dir, transition
    );

    match transition {
        Transition::Idle => {}
        Transition::FreeStep => advance(ctx, pos),
        Transition::Collide => collide(ctx, pos),
        Transition::Follow => follow(ctx, pos),
        Transition::Flat => flat(ctx, pos),
        Transition::FreeFall => free_fall(ctx, pos),
        Transition::Countdown => countdown(ctx, pos),
        Transition::ExploderFuse => set_state(ctx, pos, 16),
        Transition::ExploderBurn => set_state(ctx, pos, cell.state + 1),
        Transition::ExploderHole => explode(ctx, pos),
        Transition::Splitter => splitter::step(ctx, pos)?,
        Transition::AscenderLaunch => ascender::launch(ctx, pos),
        Transition::AscenderRise => ascender::rise(ctx, pos),
        Transition::AscenderCeilingTilt => ascender::ceiling_tilt(ctx, pos),
        Transition::AscenderCeilingFlat => ascender::ceiling_flat(ctx, pos),
        Transition::AscenderFlip => ascender::flip(ctx, pos),
        Transition::CrashDissolve => set_state(ctx, pos, cell.state + 1),
    }
    Ok(())
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Facing of a domino direction.
#[inline]
pub(crate) fn facing_of(dir: i8) -> Option<Facing> {
    Facing::from_dir(dir as i32)
}

/// Neighbour cell in a domino direction.
#[inline]
pub(crate) fn neighbour(pos: CellPos, dir: i8) -> CellPos {
    pos.offset(dir as i32, 0)
}

fn set_state(ctx: &mut SimContext<'_>, pos: CellPos, state: u8) {
    ctx.grid.update(pos, |c| c.state = state);
    ctx.dirty(pos);
}

/// Advance the state one frame in the domino's direction.
fn advance(ctx: &mut SimContext<'_>, pos: CellPos) {
    ctx.grid.update(pos, |c| c.state = (c.state as i8 + c.dir) as u8);
    ctx.dirty(pos);
}

/// Is `cell` a sweeping domino falling toward a domino that falls in `dir`?
pub(crate) fn tilting_toward(cell: &Cell, dir: i8) -> bool {
    cell.domino.sweeps() && cell.extra == DominoExtra::None && cell.dir == -dir
}

/// Is `cell` a sweeping domino falling in `dir` with at least `min` progress?
pub(crate) fn falling_away(cell: &Cell, dir: i8, min: i8) -> bool {
    cell.domino.sweeps()
        && cell.extra == DominoExtra::None
        && cell.dir == dir
        && cell.progress() >= min
}

/// Move the domino from `from` into the empty cell `to`.
pub(crate) fn relocate(ctx: &mut SimContext<'_>, from: CellPos, to: CellPos, moved: Cell) {
    ctx.grid.update(from, Cell::clear_domino);
    ctx.grid.update(to, |c| c.copy_domino_from(&moved));
    ctx.arrived(to);
    ctx.dirty(from);
    ctx.dirty(to);
}

/// Merge the domino at `pos` into `target` and empty `pos`.
pub(crate) fn merge_into(ctx: &mut SimContext<'_>, pos: CellPos, target: CellPos) {
    let cell = *ctx.grid.cell(pos);
    ctx.grid.update(pos, Cell::clear_domino);
    ctx.dirty(pos);
    domino_crash(ctx, target, cell.domino, cell.extra);
}

// =============================================================================
// SWEEP
// =============================================================================

fn collide(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    let d = cell.dir;
    let n = neighbour(pos, d);

    if ctx.grid.step_up_at(n) {
        advance(ctx, pos);
        return;
    }
    if !ctx.grid.in_bounds(n) {
        return;
    }

    let next = *ctx.grid.cell(n);
    if !next.is_occupied() {
        advance(ctx, pos);
    } else if next.domino.is_crash() || tilting_toward(&next, d) {
        merge_into(ctx, pos, n);
    } else if next.domino.sweeps() && next.extra == DominoExtra::None && next.dir == d {
        if next.progress() >= 4 {
            advance(ctx, pos);
        }
    } else if let Some(facing) = facing_of(d) {
        if push(ctx, n, facing) {
            advance(ctx, pos);
        }
    }
}

fn follow(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    let d = cell.dir;
    let p = cell.progress();
    let n = neighbour(pos, d);

    if ctx.grid.step_up_at(n) {
        if p < 4 {
            advance(ctx, pos);
        }
        return;
    }
    if !ctx.grid.in_bounds(n) {
        return;
    }

    let next = ctx.grid.cell(n);
    if !next.is_occupied() || falling_away(next, d, (p + 2).min(7)) {
        advance(ctx, pos);
    }
}

fn flat(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    let d = cell.dir;
    let n = neighbour(pos, d);

    match cell.domino {
        DominoType::Vanish => {
            ctx.grid.update(pos, Cell::clear_domino);
            ctx.play(SoundEffect::Vanish);
            ctx.dirty(pos);
            return;
        }
        DominoType::Tumbler if can_roll_into(ctx, n) => {
            let mut rolled = cell;
            rolled.state = if d > 0 { 1 } else { 15 };
            relocate(ctx, pos, n, rolled);
            return;
        }
        DominoType::Bridger if can_bridge(ctx, pos, d) => {
            bridge(ctx, pos, d);
            return;
        }
        _ => {}
    }

    drop_over_edge(ctx, pos, cell, n);
}

fn can_roll_into(ctx: &SimContext<'_>, n: CellPos) -> bool {
    ctx.grid.in_bounds(n) && ctx.grid.platform(n) && !ctx.grid.cell(n).is_occupied()
}

fn can_bridge(ctx: &SimContext<'_>, pos: CellPos, d: i8) -> bool {
    let gap = neighbour(pos, d);
    let far = neighbour(gap, d);
    ctx.grid.in_bounds(far)
        && !ctx.grid.platform(gap)
        && !ctx.grid.cell(gap).is_occupied()
        && ctx.grid.platform(far)
}

fn bridge(ctx: &mut SimContext<'_>, pos: CellPos, d: i8) {
    let gap = neighbour(pos, d);
    let far = neighbour(gap, d);

    ctx.grid.update(gap, |c| {
        c.platform = true;
        c.fg = fg::BRIDGE;
    });
    ctx.grid.update(pos, |c| {
        c.fg = fg::PLATFORM_MIDDLE;
        c.clear_domino();
    });
    ctx.grid.update(far, |c| c.fg = fg::PLATFORM_MIDDLE);

    debug!("bridge closed at ({}, {})", gap.x, gap.y);
    ctx.play(SoundEffect::Bridger);
    ctx.dirty(pos);
    ctx.dirty(gap);
    ctx.dirty(far);
}

/// Tip a flat domino over a platform edge, if there is one.
fn drop_over_edge(ctx: &mut SimContext<'_>, pos: CellPos, cell: Cell, n: CellPos) {
    if !ctx.grid.in_bounds(n) || ctx.grid.platform(n) || ctx.grid.cell(n).is_occupied() {
        return;
    }

    let below = n.down();
    if ctx.grid.in_bounds(below) && ctx.grid.platform(below) {
        // Half step down. The left pivot starts one frame further on.
        let mut pivot = cell;
        pivot.state = if cell.dir > 0 { 14 } else { 3 };
        pivot.extra = DominoExtra::HalfStepPivot;
        pivot.y_offset = -ROW_UNITS;

        if ctx.grid.cell(below).is_occupied() {
            merge_into(ctx, pos, below);
        } else {
            relocate(ctx, pos, below, pivot);
        }
        return;
    }

    let mut rubble = cell;
    rubble.state = (8 + 5 * cell.dir) as u8;
    rubble.extra = DominoExtra::FreeFallingRubble;
    rubble.y_offset = 0;
    relocate(ctx, pos, n, rubble);
}

// =============================================================================
// FREE FALL
// =============================================================================

fn fall_state(cell: &Cell) -> u8 {
    if cell.domino.is_crash() {
        (cell.state + 1).min(CRASH_LAST_STATE)
    } else if cell.dir != 0 && cell.domino.sweeps() {
        (cell.state as i8 + cell.dir).clamp(1, 15) as u8
    } else {
        cell.state
    }
}

fn free_fall(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);

    if ctx.grid.platform(pos) && cell.y_offset >= 0 {
        ctx.grid.update(pos, |c| {
            c.extra = DominoExtra::None;
            c.y_offset = 0;
        });
        ctx.dirty(pos);
        return;
    }

    let mut moved = cell;
    moved.y_offset += 2;
    moved.state = fall_state(&cell);

    if moved.y_offset < ROW_UNITS {
        ctx.grid.update(pos, |c| c.copy_domino_from(&moved));
        ctx.dirty(pos);
        return;
    }

    moved.y_offset -= ROW_UNITS;
    let below = pos.down();

    if !ctx.grid.in_bounds(below) {
        debug!("{:?} fell out of the level at column {}", cell.domino, pos.x);
        ctx.grid.update(pos, Cell::clear_domino);
        ctx.dirty(pos);
        return;
    }

    let target = *ctx.grid.cell(below);
    if !target.is_occupied() {
        relocate(ctx, pos, below, moved);
    } else if target.domino == DominoType::Splitter && target.is_upright() {
        ctx.grid.update(pos, Cell::clear_domino);
        ctx.dirty(pos);
        splitter::split_struck(ctx, below, cell.domino);
    } else {
        merge_into(ctx, pos, below);
    }
}

// =============================================================================
// DELAY / EXPLODER
// =============================================================================

fn countdown(ctx: &mut SimContext<'_>, pos: CellPos) {
    ctx.grid.update(pos, |c| {
        c.extra = match c.extra {
            DominoExtra::Countdown(n) if n > 1 => DominoExtra::Countdown(n - 1),
            _ => DominoExtra::None,
        };
    });
}

fn explode(ctx: &mut SimContext<'_>, pos: CellPos) {
    ctx.grid.update(pos, |c| {
        c.clear_domino();
        c.platform = false;
        c.fg = fg::EMPTY;
    });
    debug!("exploder blew a hole at ({}, {})", pos.x, pos.y);
    ctx.play(SoundEffect::Explosion);
    ctx.dirty(pos);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::SimConfig;
    use crate::game::events::EventLog;
    use crate::game::grid::LevelGrid;

    /// Grid with a floor on row 2 for every listed column.
    fn floor(columns: impl IntoIterator<Item = i32>) -> LevelGrid {
        let mut grid = LevelGrid::new(8).unwrap();
        for x in columns {
            grid.update(CellPos::new(x, 2), |c| c.platform = true);
        }
        grid
    }

    fn place(grid: &mut LevelGrid, x: i32, domino: DominoType) {
        grid.update(CellPos::new(x, 2), |c| c.set_domino(domino, 8, 0, DominoExtra::None));
    }

    fn run(grid: &mut LevelGrid, ticks: usize) {
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(grid, &mut log, &config);
        for _ in 0..ticks {
            run_dominoes(&mut ctx).unwrap();
        }
    }

    fn shove(grid: &mut LevelGrid, x: i32, facing: Facing) -> bool {
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(grid, &mut log, &config);
        push(&mut ctx, CellPos::new(x, 2), facing)
    }

    #[test]
    fn test_standard_falls_off_edge() {
        let mut grid = floor(0..=5);
        place(&mut grid, 5, DominoType::Standard);
        let start = CellPos::new(5, 2);

        assert!(shove(&mut grid, 5, Facing::Right));
        assert_eq!(grid.cell(start).dir, 1);
        assert_eq!(grid.cell(start).state, 8);

        run(&mut grid, 1);
        assert_eq!(grid.cell(start).state, 9);

        run(&mut grid, 6);
        assert_eq!(grid.cell(start).state, 15);

        run(&mut grid, 1);
        assert!(!grid.cell(start).is_occupied());
        let landed = grid.cell(CellPos::new(6, 2));
        assert_eq!(landed.domino, DominoType::Standard);
        assert_eq!(landed.extra, DominoExtra::FreeFallingRubble);
        assert_eq!(landed.state, 13);
    }

    #[test]
    fn test_rubble_falls_until_floor() {
        let mut grid = floor(0..=5);
        grid.update(CellPos::new(6, 6), |c| c.platform = true);
        grid.update(CellPos::new(7, 6), |c| c.platform = true);
        place(&mut grid, 5, DominoType::Standard);
        shove(&mut grid, 5, Facing::Right);

        run(&mut grid, 40);

        let resting = grid.cell(CellPos::new(6, 6));
        assert_eq!(resting.domino, DominoType::Standard);
        assert_eq!(resting.extra, DominoExtra::None);
        assert_eq!(resting.y_offset, 0);
        assert_eq!(resting.state, 15);
    }

    #[test]
    fn test_rubble_leaves_the_grid() {
        let mut grid = floor(0..=5);
        place(&mut grid, 5, DominoType::Standard);
        shove(&mut grid, 5, Facing::Right);

        run(&mut grid, 60);

        assert!(grid.cells().iter().all(|c| !c.is_occupied()));
    }

    #[test]
    fn test_chain_reaction_lies_flat() {
        let mut grid = floor(0..=10);
        place(&mut grid, 3, DominoType::Standard);
        place(&mut grid, 4, DominoType::Standard);
        shove(&mut grid, 3, Facing::Right);

        run(&mut grid, 30);

        assert_eq!(grid.cell(CellPos::new(3, 2)).state, 15);
        assert_eq!(grid.cell(CellPos::new(4, 2)).state, 15);
    }

    #[test]
    fn test_head_on_crash() {
        let mut grid = floor(0..=10);
        place(&mut grid, 3, DominoType::Standard);
        place(&mut grid, 4, DominoType::Standard);
        shove(&mut grid, 3, Facing::Right);
        shove(&mut grid, 4, Facing::Left);

        run(&mut grid, 3);

        assert_eq!(grid.domino(CellPos::new(3, 2)), DominoType::Empty);
        assert_eq!(grid.domino(CellPos::new(4, 2)), DominoType::Crash3);
    }

    #[test]
    fn test_rests_against_wall() {
        let mut grid = floor(15..=19);
        place(&mut grid, 19, DominoType::Standard);
        shove(&mut grid, 19, Facing::Right);

        run(&mut grid, 20);

        assert_eq!(grid.cell(CellPos::new(19, 2)).state, 10);
    }

    #[test]
    fn test_stops_on_step_up() {
        let mut grid = floor(0..=5);
        grid.update(CellPos::new(6, 1), |c| c.platform = true);
        place(&mut grid, 5, DominoType::Standard);
        shove(&mut grid, 5, Facing::Right);

        run(&mut grid, 20);

        assert_eq!(grid.cell(CellPos::new(5, 2)).state, 12);
    }

    #[test]
    fn test_half_step_pivot() {
        let mut grid = floor(0..=5);
        grid.update(CellPos::new(6, 3), |c| c.platform = true);
        place(&mut grid, 5, DominoType::Standard);
        shove(&mut grid, 5, Facing::Right);

        run(&mut grid, 8);

        let pivot = grid.cell(CellPos::new(6, 3));
        assert_eq!(pivot.extra, DominoExtra::HalfStepPivot);
        assert_eq!(pivot.y_offset, -ROW_UNITS);
        assert_eq!(pivot.state, 14);

        run(&mut grid, 3);
        let landed = grid.cell(CellPos::new(6, 3));
        assert_eq!(landed.extra, DominoExtra::None);
        assert_eq!(landed.y_offset, 0);
    }

    #[test]
    fn test_left_half_step_skips_a_frame() {
        let mut grid = floor(5..=9);
        grid.update(CellPos::new(4, 3), |c| c.platform = true);
        place(&mut grid, 5, DominoType::Standard);
        shove(&mut grid, 5, Facing::Left);

        run(&mut grid, 8);

        let pivot = grid.cell(CellPos::new(4, 3));
        assert_eq!(pivot.extra, DominoExtra::HalfStepPivot);
        assert_eq!(pivot.state, 3);
    }

    #[test]
    fn test_vanish_disappears_when_flat() {
        let mut grid = floor(0..=10);
        place(&mut grid, 4, DominoType::Vanish);
        shove(&mut grid, 4, Facing::Left);

        run(&mut grid, 7);
        assert_eq!(grid.cell(CellPos::new(4, 2)).state, 1);

        run(&mut grid, 1);
        assert_eq!(grid.domino(CellPos::new(4, 2)), DominoType::Empty);
    }

    #[test]
    fn test_tumbler_rolls_until_blocked() {
        let mut grid = floor(0..=6);
        place(&mut grid, 2, DominoType::Tumbler);
        place(&mut grid, 6, DominoType::Stopper);
        shove(&mut grid, 2, Facing::Right);

        run(&mut grid, 80);

        let tumbler = grid.find(DominoType::Tumbler);
        assert_eq!(tumbler, vec![CellPos::new(5, 2)]);
        assert_eq!(grid.cell(CellPos::new(5, 2)).progress(), 2);
    }

    #[test]
    fn test_bridger_closes_gap() {
        let mut grid = floor((0..=4).chain(6..=9));
        place(&mut grid, 4, DominoType::Bridger);
        shove(&mut grid, 4, Facing::Right);

        run(&mut grid, 9);

        let gap = grid.cell(CellPos::new(5, 2));
        assert!(gap.platform);
        assert_eq!(gap.fg, fg::BRIDGE);
        assert_eq!(grid.cell(CellPos::new(4, 2)).fg, fg::PLATFORM_MIDDLE);
        assert_eq!(grid.cell(CellPos::new(6, 2)).fg, fg::PLATFORM_MIDDLE);
        assert_eq!(grid.domino(CellPos::new(4, 2)), DominoType::Empty);
    }

    #[test]
    fn test_bridger_without_far_side_falls() {
        let mut grid = floor(0..=4);
        place(&mut grid, 4, DominoType::Bridger);
        shove(&mut grid, 4, Facing::Right);

        run(&mut grid, 8);

        assert!(!grid.platform(CellPos::new(5, 2)));
        assert_eq!(grid.cell(CellPos::new(5, 2)).extra, DominoExtra::FreeFallingRubble);
    }

    #[test]
    fn test_delay_waits_for_countdown() {
        let mut grid = floor(0..=10);
        place(&mut grid, 4, DominoType::Delay);
        assert!(!shove(&mut grid, 4, Facing::Right));
        assert_eq!(grid.cell(CellPos::new(4, 2)).extra, DominoExtra::Countdown(20));

        run(&mut grid, 20);
        let cell = grid.cell(CellPos::new(4, 2));
        assert_eq!(cell.extra, DominoExtra::None);
        assert_eq!(cell.state, 8);

        run(&mut grid, 1);
        assert_eq!(grid.cell(CellPos::new(4, 2)).state, 9);
    }

    #[test]
    fn test_exploder_blocks_until_hole() {
        let mut grid = floor(0..=10);
        place(&mut grid, 4, DominoType::Exploder);
        let pos = CellPos::new(4, 2);

        assert!(!shove(&mut grid, 4, Facing::Right));
        assert_eq!(grid.cell(pos).state, 7);
        assert_eq!(grid.cell(pos).dir, -1);

        let mut ticks = 0;
        while grid.domino(pos) == DominoType::Exploder {
            assert!(!shove(&mut grid, 4, Facing::Right));
            run(&mut grid, 1);
            ticks += 1;
            assert!(ticks < 20);
        }

        assert_eq!(ticks, 8);
        assert!(!grid.platform(pos));
        assert_eq!(grid.cell(pos).fg, fg::EMPTY);
    }

    #[test]
    fn test_crash_pile_dissolves_and_stays() {
        let mut grid = floor(0..=3);
        grid.update(CellPos::new(1, 2), |c| {
            c.set_domino(DominoType::Crash3, 51, 0, DominoExtra::None)
        });

        run(&mut grid, 10);

        assert_eq!(grid.cell(CellPos::new(1, 2)).state, CRASH_LAST_STATE);
    }

    #[test]
    fn test_dispatch_miss_is_reported() {
        let mut grid = floor(0..=3);
        grid.update(CellPos::new(1, 2), |c| {
            c.set_domino(DominoType::Standard, 8, 0, DominoExtra::ClingingToCeiling)
        });
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(&mut grid, &mut log, &config);

        let err = run_dominoes(&mut ctx).unwrap_err();
        assert!(matches!(err, SimError::DispatchMiss { state: 8, .. }));
    }

    #[test]
    fn test_select_covers_sweep_range() {
        for domino in DominoType::ALL.iter().filter(|t| t.sweeps()) {
            for state in 1..=15u8 {
                for dir in [-1i8, 0, 1] {
                    let mut cell = Cell::EMPTY;
                    cell.set_domino(*domino, state, dir, DominoExtra::None);
                    assert!(Transition::select(&cell).is_some(), "{:?} {} {}", domino, state, dir);
                }
            }
        }
    }

    #[test]
    fn test_falling_domino_waits_for_higher_counter() {
        let mut grid = floor(0..=12);
        place(&mut grid, 1, DominoType::Counter1);
        place(&mut grid, 5, DominoType::Standard);
        place(&mut grid, 6, DominoType::Counter2);

        assert!(shove(&mut grid, 5, Facing::Right));
        run(&mut grid, 10);
        assert_eq!(grid.cell(CellPos::new(5, 2)).state, 10);
        assert!(grid.cell(CellPos::new(6, 2)).is_upright());

        assert!(shove(&mut grid, 1, Facing::Left));
        run(&mut grid, 1);
        assert_eq!(grid.cell(CellPos::new(6, 2)).dir, 1);
        assert_eq!(grid.cell(CellPos::new(5, 2)).state, 11);
    }
}

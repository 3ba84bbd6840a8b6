//! Ascender Sub-Automaton
//!
//! A pushed ascender lifts off, rises until it meets a ceiling, tips over
//! along the ceiling in the pushed direction and, at the end of the
//! ceiling, rises on in the next column. Passing a free platform on the
//! way up it flips down onto it and lies there like an ordinary domino.
//!
//! | State  | Phase                                  |
//! |--------|----------------------------------------|
//! | 36     | pushed, about to lift off              |
//! | 37     | rising slowly (one row per transfer)   |
//! | 38     | rising fast (two rows per transfer)    |
//! | 39     | clinging to the ceiling                |
//! | 40..43 | tipping left along the ceiling         |
//! | 44..47 | tipping right along the ceiling        |
//! | 48, 49 | flipping onto a platform left / right  |

use tracing::debug;

use crate::core::geom::{CellPos, ROW_UNITS};
use crate::game::context::SimContext;
use crate::game::crash::domino_crash;
use crate::game::domino::{facing_of, merge_into, neighbour, relocate};
use crate::game::events::SoundEffect;
use crate::game::grid::{Cell, DominoExtra, DominoType, LevelGrid};
use crate::game::push::push;

/// Pushed, waiting to lift off.
pub const LAUNCH: u8 = 36;
/// Clinging to the ceiling.
pub const CLINGING: u8 = 39;
/// Lying flat on the ceiling after tipping left.
pub const CEILING_FLAT_LEFT: u8 = 43;
/// Lying flat on the ceiling after tipping right.
pub const CEILING_FLAT_RIGHT: u8 = 47;

const SLOW_RISE: u8 = 37;
const FAST_RISE: u8 = 38;
const FLIP_LEFT: u8 = 48;
const FLIP_RIGHT: u8 = 49;

/// Is there a floor directly above the cell?
#[inline]
fn has_ceiling(grid: &LevelGrid, pos: CellPos) -> bool {
    grid.platform(pos.up())
}

/// Can the ascender pass `rows` rows straight up?
fn clear_above(grid: &LevelGrid, pos: CellPos, rows: i32) -> bool {
    (1..=rows).all(|k| {
        let cell = pos.offset(0, -k);
        grid.in_bounds(cell) && !grid.platform(cell) && !grid.cell(cell).is_occupied()
    })
}

fn rise_state(grid: &LevelGrid, pos: CellPos) -> u8 {
    if clear_above(grid, pos, 2) {
        FAST_RISE
    } else {
        SLOW_RISE
    }
}

fn cling(ctx: &mut SimContext<'_>, pos: CellPos) {
    ctx.grid.update(pos, |c| {
        c.state = CLINGING;
        c.extra = DominoExtra::ClingingToCeiling;
        c.y_offset = 0;
    });
    ctx.dirty(pos);
}

/// State 36: lift off (or cling at once under a low ceiling).
pub(crate) fn launch(ctx: &mut SimContext<'_>, pos: CellPos) {
    if has_ceiling(ctx.grid, pos) {
        cling(ctx, pos);
        return;
    }

    let state = rise_state(ctx.grid, pos);
    ctx.grid.update(pos, |c| {
        c.state = state;
        c.extra = DominoExtra::Rising;
        c.y_offset = 0;
    });
    ctx.play(SoundEffect::Ascender);
    ctx.dirty(pos);
}

/// States 37 and 38: climb, transferring into the cell above.
pub(crate) fn rise(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    if has_ceiling(ctx.grid, pos) {
        cling(ctx, pos);
        return;
    }

    let (speed, rows) = if cell.state == FAST_RISE { (4, 2) } else { (2, 1) };
    let y_offset = cell.y_offset - speed;
    let span = ROW_UNITS * rows as i8;
    if y_offset > -span {
        ctx.grid.update(pos, |c| c.y_offset = y_offset);
        ctx.dirty(pos);
        return;
    }

    let dest = pos.offset(0, -rows);
    if !ctx.grid.in_bounds(dest) {
        debug!("ascender left the level at column {}", pos.x);
        ctx.grid.update(pos, Cell::clear_domino);
        ctx.dirty(pos);
        return;
    }

    if ctx.grid.cell(dest).is_occupied() {
        ctx.grid.update(pos, Cell::clear_domino);
        ctx.dirty(pos);
        domino_crash(ctx, dest, DominoType::Ascender, DominoExtra::Rising);
        return;
    }

    let mut moved = cell;
    moved.y_offset = y_offset + span;
    relocate(ctx, pos, dest, moved);
    arrive(ctx, dest);
}

/// Pick the next phase after moving into a new cell.
fn arrive(ctx: &mut SimContext<'_>, pos: CellPos) {
    let dir = ctx.grid.cell(pos).dir;
    if dir != 0 {
        let n = neighbour(pos, dir);
        if ctx.grid.in_bounds(n) && ctx.grid.platform(n) && !ctx.grid.cell(n).is_occupied() {
            let state = if dir < 0 { FLIP_LEFT } else { FLIP_RIGHT };
            ctx.grid.update(pos, |c| {
                c.state = state;
                c.extra = DominoExtra::None;
                c.y_offset = 0;
            });
            return;
        }
    }

    let state = rise_state(ctx.grid, pos);
    ctx.grid.update(pos, |c| c.state = state);
}

/// States 48 and 49: drop onto the neighbouring platform, lying flat.
pub(crate) fn flip(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    let dir: i8 = if cell.state == FLIP_LEFT { -1 } else { 1 };
    let flat = if dir < 0 { 1 } else { 15 };
    let n = neighbour(pos, dir);

    if ctx.grid.in_bounds(n) && ctx.grid.cell(n).is_occupied() {
        merge_into(ctx, pos, n);
        return;
    }

    let mut moved = cell;
    moved.state = flat;
    moved.dir = dir;
    moved.extra = DominoExtra::None;
    moved.y_offset = 0;
    if ctx.grid.in_bounds(n) {
        relocate(ctx, pos, n, moved);
    } else {
        ctx.grid.update(pos, |c| c.copy_domino_from(&moved));
        ctx.dirty(pos);
    }
}

/// States 39 (with a direction), 40..42 and 44..46: tip along the ceiling.
pub(crate) fn ceiling_tilt(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);

    if cell.state == CLINGING {
        let state = if cell.dir < 0 { 40 } else { 44 };
        ctx.grid.update(pos, |c| c.state = state);
        ctx.dirty(pos);
        return;
    }

    let (dir, phase): (i8, u8) = if cell.state < 44 { (-1, cell.state - 40) } else { (1, cell.state - 44) };
    if phase == 1 && !ceiling_neighbour_yields(ctx, pos, dir) {
        return;
    }

    ctx.grid.update(pos, |c| {
        c.state += 1;
        c.dir = dir;
    });
    ctx.dirty(pos);
}

fn ceiling_neighbour_yields(ctx: &mut SimContext<'_>, pos: CellPos, dir: i8) -> bool {
    let n = neighbour(pos, dir);
    if !ctx.grid.in_bounds(n) {
        return false;
    }
    if !has_ceiling(ctx.grid, n) {
        return true;
    }

    let next = *ctx.grid.cell(n);
    if !next.is_occupied() {
        return true;
    }
    if next.domino == DominoType::Ascender && next.state == CLINGING {
        if let Some(facing) = facing_of(dir) {
            push(ctx, n, facing);
        }
        return true;
    }
    false
}

/// States 43 and 47: at the end of the ceiling, rise on next door.
pub(crate) fn ceiling_flat(ctx: &mut SimContext<'_>, pos: CellPos) {
    let cell = *ctx.grid.cell(pos);
    let dir: i8 = if cell.state == CEILING_FLAT_LEFT { -1 } else { 1 };
    let n = neighbour(pos, dir);

    if !ctx.grid.in_bounds(n) || has_ceiling(ctx.grid, n) || ctx.grid.cell(n).is_occupied() {
        return;
    }

    let mut moved = cell;
    moved.state = SLOW_RISE;
    moved.dir = dir;
    moved.extra = DominoExtra::Rising;
    moved.y_offset = 0;
    relocate(ctx, pos, n, moved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Facing;
    use crate::game::config::SimConfig;
    use crate::game::domino::run_dominoes;
    use crate::game::events::EventLog;

    const START: CellPos = CellPos::new(5, 8);

    fn setup(platforms: &[(i32, i32)]) -> LevelGrid {
        let mut grid = LevelGrid::new(10).unwrap();
        grid.update(START, |c| {
            c.platform = true;
            c.set_domino(DominoType::Ascender, 8, 0, DominoExtra::None);
        });
        for (x, y) in platforms {
            grid.update(CellPos::new(*x, *y), |c| c.platform = true);
        }
        grid
    }

    fn push_and_run(grid: &mut LevelGrid, ticks: usize) {
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(grid, &mut log, &config);
        assert!(!push(&mut ctx, START, Facing::Right));
        for _ in 0..ticks {
            run_dominoes(&mut ctx).unwrap();
        }
    }

    fn run_more(grid: &mut LevelGrid, ticks: usize) {
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(grid, &mut log, &config);
        for _ in 0..ticks {
            run_dominoes(&mut ctx).unwrap();
        }
    }

    #[test]
    fn test_push_defers_lift_off() {
        let mut grid = setup(&[]);
        push_and_run(&mut grid, 0);
        let cell = grid.cell(START);
        assert_eq!(cell.state, LAUNCH);
        assert_eq!(cell.dir, 1);
    }

    #[test]
    fn test_rise_cling_and_tip_over() {
        let ceiling: Vec<_> = (3..=7).map(|x| (x, 5)).collect();
        let mut grid = setup(&ceiling);

        push_and_run(&mut grid, 4);
        let hanging = grid.cell(CellPos::new(5, 6));
        assert_eq!(hanging.domino, DominoType::Ascender);
        assert_eq!(hanging.state, CLINGING);
        assert_eq!(hanging.extra, DominoExtra::ClingingToCeiling);

        run_more(&mut grid, 5);
        assert_eq!(grid.cell(CellPos::new(5, 6)).state, CEILING_FLAT_RIGHT);
    }

    #[test]
    fn test_leaves_short_ceiling() {
        let mut grid = setup(&[(5, 5)]);
        push_and_run(&mut grid, 9);

        let moved = grid.cell(CellPos::new(6, 6));
        assert_eq!(moved.domino, DominoType::Ascender);
        assert_eq!(moved.state, SLOW_RISE);
        assert_eq!(moved.extra, DominoExtra::Rising);
    }

    #[test]
    fn test_rises_out_of_the_level() {
        let mut grid = setup(&[]);
        push_and_run(&mut grid, 30);
        assert!(grid.find(DominoType::Ascender).is_empty());
    }

    #[test]
    fn test_flips_onto_ledge() {
        let mut grid = setup(&[(6, 6), (7, 6)]);
        push_and_run(&mut grid, 4);

        let flat = grid.cell(CellPos::new(6, 6));
        assert_eq!(flat.domino, DominoType::Ascender);
        assert_eq!(flat.state, 15);
        assert_eq!(flat.extra, DominoExtra::None);
        assert_eq!(grid.domino(CellPos::new(5, 6)), DominoType::Empty);
    }

    #[test]
    fn test_transfer_crashes_into_occupant() {
        let mut grid = setup(&[]);
        grid.update(CellPos::new(5, 7), |c| {
            c.set_domino(DominoType::Stopper, 8, 0, DominoExtra::None)
        });

        push_and_run(&mut grid, 3);

        let pile = grid.cell(CellPos::new(5, 7));
        assert_eq!(pile.domino, DominoType::Crash1);
        assert_eq!(pile.extra, DominoExtra::FreeFallingRubble);
        assert_eq!(grid.domino(START), DominoType::Empty);
    }
}

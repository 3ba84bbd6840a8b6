//! Push Interaction
//!
//! What happens when something (the ant, a falling neighbour, a splitter
//! half) pushes a domino, and the ant's pick-up and put-down rules.
//!
//! `push` returns whether the push was *absorbed*: true means the pushed
//! domino gave way and a falling pusher may lean on into its cell.

use tracing::debug;

use crate::core::geom::{CellPos, Facing};
use crate::game::ascender;
use crate::game::context::SimContext;
use crate::game::crash::domino_crash;
use crate::game::domino::tilting_toward;
use crate::game::events::SoundEffect;
use crate::game::grid::{Cell, DominoExtra, DominoType, LevelGrid};

// =============================================================================
// PUSH
// =============================================================================

/// Push the domino at `pos` toward `facing`.
///
/// # Returns
///
/// `true` if the domino started falling and the pusher may continue.
pub fn push(ctx: &mut SimContext<'_>, pos: CellPos, facing: Facing) -> bool {
    let cell = *ctx.grid.cell(pos);
    let upright = cell.is_upright();

    match cell.domino {
        DominoType::Standard
        | DominoType::Tumbler
        | DominoType::Bridger
        | DominoType::Vanish
        | DominoType::Trigger => start_fall(ctx, pos, facing),

        DominoType::Counter1 | DominoType::Counter2 | DominoType::Counter3 => {
            if counter_blocked(ctx.grid, cell.domino) {
                debug!("{:?} at ({}, {}) held back by a higher counter", cell.domino, pos.x, pos.y);
                return false;
            }
            start_fall(ctx, pos, facing)
        }

        DominoType::ConnectedA | DominoType::ConnectedB => {
            upright && push_connected(ctx, cell.domino, facing)
        }

        DominoType::Splitter => {
            if upright {
                // Both halves lean together before cracking.
                ctx.grid.update(pos, |c| {
                    c.state = 7;
                    c.dir = -1;
                });
                ctx.dirty(pos);
            }
            upright
        }

        DominoType::Exploder => {
            if upright {
                ctx.grid.update(pos, |c| {
                    c.state = 7;
                    c.dir = -1;
                });
                ctx.play(SoundEffect::Exploder);
                ctx.dirty(pos);
            }
            false
        }

        DominoType::Delay => {
            if upright {
                let ticks = ctx.config.delay_ticks;
                ctx.grid.update(pos, |c| {
                    c.dir = facing.dir();
                    c.extra = DominoExtra::Countdown(ticks);
                });
                ctx.play(SoundEffect::Delay);
                ctx.dirty(pos);
            }
            false
        }

        DominoType::Ascender => {
            if upright {
                ctx.grid.update(pos, |c| {
                    c.state = ascender::LAUNCH;
                    c.dir = facing.dir();
                });
                ctx.dirty(pos);
            } else if cell.state == ascender::CLINGING && cell.extra == DominoExtra::ClingingToCeiling {
                ctx.grid.update(pos, |c| c.dir = facing.dir());
            }
            false
        }

        // Stopper, crash piles
        _ => false,
    }
}

fn start_fall(ctx: &mut SimContext<'_>, pos: CellPos, facing: Facing) -> bool {
    let cell = *ctx.grid.cell(pos);
    if !cell.is_upright() {
        return false;
    }
    ctx.grid.update(pos, |c| c.dir = facing.dir());
    if let Some(effect) = SoundEffect::for_domino(cell.domino) {
        ctx.play(effect);
    }
    ctx.dirty(pos);
    true
}

/// Is a counter stone of higher priority still standing somewhere?
pub fn counter_blocked(grid: &LevelGrid, counter: DominoType) -> bool {
    let Some(rank) = counter.counter_rank() else {
        return false;
    };
    grid.cells().iter().any(|c| {
        c.domino.counter_rank().map_or(false, |r| r < rank) && c.is_upright()
    })
}

/// Start every upright entangled domino at once.
///
/// The pushed type falls toward `facing`, its partner type the other way.
fn push_connected(ctx: &mut SimContext<'_>, pushed: DominoType, facing: Facing) -> bool {
    let partner_facing = facing.opposite();
    let positions: Vec<CellPos> = ctx.grid.positions().collect();
    let mut moved = false;

    for pos in positions {
        let cell = ctx.grid.cell(pos);
        if !cell.is_upright() {
            continue;
        }
        let dir = match cell.domino {
            t @ (DominoType::ConnectedA | DominoType::ConnectedB) if t == pushed => facing.dir(),
            DominoType::ConnectedA | DominoType::ConnectedB => partner_facing.dir(),
            _ => continue,
        };
        ctx.grid.update(pos, |c| c.dir = dir);
        ctx.dirty(pos);
        moved = true;
    }

    if moved {
        ctx.play(SoundEffect::Connected);
    }
    moved
}

// =============================================================================
// ANT PREDICATES
// =============================================================================

/// Can a domino be put down `offset` columns from `pos`?
pub fn can_place(grid: &LevelGrid, pos: CellPos, offset: i32) -> bool {
    let target = pos.offset(offset, 0);
    grid.in_bounds(target)
        && target.on_even_row()
        && grid.platform(target)
        && !grid.cell(target).is_occupied()
        && !grid.is_door(target)
}

/// Is there a domino `offset` columns from `pos` that can be pushed?
pub fn is_pushable(grid: &LevelGrid, pos: CellPos, offset: i32) -> bool {
    let target = pos.offset(offset, 0);
    let cell = grid.cell(target);
    grid.in_bounds(target) && target.on_even_row() && cell.is_upright() && !cell.domino.is_crash()
}

/// Can the ant lift the domino at `pos`?
pub fn can_pick_up(grid: &LevelGrid, pos: CellPos) -> bool {
    let cell = grid.cell(pos);
    pos.on_even_row()
        && cell.is_upright()
        && cell.domino != DominoType::Trigger
        && !cell.domino.is_crash()
}

// =============================================================================
// PICK UP / PUT DOWN
// =============================================================================

/// Remove the domino at `pos` and return its type.
pub fn pick_up(ctx: &mut SimContext<'_>, pos: CellPos) -> DominoType {
    let domino = ctx.grid.domino(pos);
    if domino == DominoType::Empty {
        return domino;
    }
    ctx.grid.update(pos, Cell::clear_domino);
    ctx.play(SoundEffect::PickUp);
    ctx.dirty(pos);
    domino
}

/// Put a domino down at `pos`.
///
/// An occupied target crashes. A neighbour already leaning into the cell
/// lands on the new domino and both become a crash pile. `is_push_in` is
/// set when the ant slides the domino in from the side.
pub fn put_down(ctx: &mut SimContext<'_>, pos: CellPos, domino: DominoType, is_push_in: bool) {
    if ctx.grid.cell(pos).is_occupied() {
        domino_crash(ctx, pos, domino, DominoExtra::None);
        return;
    }

    // The floor may have been blown away while the ant was placing.
    if !ctx.grid.platform(pos) {
        ctx.grid.update(pos, |c| c.set_domino(domino, Cell::UPRIGHT, 0, DominoExtra::FreeFallingRubble));
        ctx.dirty(pos);
        return;
    }

    ctx.grid.update(pos, |c| c.set_domino(domino, Cell::UPRIGHT, 0, DominoExtra::None));
    if is_push_in {
        ctx.play(SoundEffect::PutDown);
    }
    ctx.dirty(pos);

    for dir in [-1i8, 1] {
        let n = pos.offset(dir as i32, 0);
        let next = *ctx.grid.cell(n);
        if tilting_toward(&next, dir) && next.progress() >= 3 {
            ctx.grid.update(n, Cell::clear_domino);
            ctx.dirty(n);
            domino_crash(ctx, pos, next.domino, next.extra);
            return;
        }
    }
}

//! Level Construction
//!
//! Programmatic level setup for tests, benches and the demo binary.
//! Collects floors, ladders, dominoes and doors, then validates the
//! layout and derives the foreground tiles.

use std::ops::RangeInclusive;

use crate::core::geom::CellPos;
use crate::game::error::SimError;
use crate::game::grid::{fg, Cell, Door, DominoExtra, DominoType, LevelGrid};

/// Fluent level constructor.
#[derive(Clone, Debug, Default)]
pub struct LevelBuilder {
    height: i32,
    platforms: Vec<CellPos>,
    ladders: Vec<CellPos>,
    dominoes: Vec<(CellPos, DominoType)>,
    entry: Option<CellPos>,
    exit: Option<CellPos>,
}

impl LevelBuilder {
    /// Start a level with the given number of rows.
    pub fn new(height: i32) -> Self {
        Self { height, ..Self::default() }
    }

    /// Floor across a run of columns on row `y`.
    pub fn floor(mut self, y: i32, columns: RangeInclusive<i32>) -> Self {
        self.platforms.extend(columns.map(|x| CellPos::new(x, y)));
        self
    }

    /// Single floor tile.
    pub fn platform(mut self, x: i32, y: i32) -> Self {
        self.platforms.push(CellPos::new(x, y));
        self
    }

    /// Ladder through a run of rows in column `x` (top and bottom included).
    pub fn ladder(mut self, x: i32, rows: RangeInclusive<i32>) -> Self {
        self.ladders.extend(rows.map(|y| CellPos::new(x, y)));
        self
    }

    /// Upright domino.
    pub fn domino(mut self, x: i32, y: i32, domino: DominoType) -> Self {
        self.dominoes.push((CellPos::new(x, y), domino));
        self
    }

    /// Door the ant enters through.
    pub fn entry(mut self, x: i32, y: i32) -> Self {
        self.entry = Some(CellPos::new(x, y));
        self
    }

    /// Door the ant leaves through.
    pub fn exit(mut self, x: i32, y: i32) -> Self {
        self.exit = Some(CellPos::new(x, y));
        self
    }

    /// Validate and produce the grid.
    ///
    /// # Errors
    ///
    /// `SimError::InvalidLevel` for a bad height, anything placed outside
    /// the grid, a missing door, a door or domino without floor, two
    /// dominoes in one cell, or a type that cannot be placed.
    pub fn build(self) -> Result<LevelGrid, SimError> {
        let mut grid = LevelGrid::new(self.height)?;

        for pos in self.platforms.iter().chain(&self.ladders) {
            check_in_bounds(&grid, *pos, "terrain")?;
        }
        for pos in &self.platforms {
            grid.update(*pos, |c| c.platform = true);
        }
        for pos in &self.ladders {
            grid.update(*pos, |c| c.ladder = true);
        }

        let entry = door(&grid, self.entry, "entry")?;
        let exit = door(&grid, self.exit, "exit")?;
        grid.entry = Door::closed(entry);
        grid.exit = Door::closed(exit);

        for (pos, domino) in &self.dominoes {
            check_in_bounds(&grid, *pos, "domino")?;
            if !DominoType::PLACEABLE.contains(domino) {
                return Err(invalid(*pos, format!("{:?} cannot be placed", domino)));
            }
            if !grid.platform(*pos) {
                return Err(invalid(*pos, "domino without floor".to_string()));
            }
            if grid.cell(*pos).is_occupied() {
                return Err(invalid(*pos, "two dominoes in one cell".to_string()));
            }
            grid.update(*pos, |c| c.set_domino(*domino, Cell::UPRIGHT, 0, DominoExtra::None));
        }

        paint_foreground(&mut grid);
        Ok(grid)
    }
}

fn invalid(pos: CellPos, reason: String) -> SimError {
    SimError::InvalidLevel(format!("({}, {}): {}", pos.x, pos.y, reason))
}

fn check_in_bounds(grid: &LevelGrid, pos: CellPos, what: &str) -> Result<(), SimError> {
    if grid.in_bounds(pos) {
        Ok(())
    } else {
        Err(invalid(pos, format!("{} outside the grid", what)))
    }
}

fn door(grid: &LevelGrid, pos: Option<CellPos>, name: &str) -> Result<CellPos, SimError> {
    let pos = pos.ok_or_else(|| SimError::InvalidLevel(format!("missing {} door", name)))?;
    check_in_bounds(grid, pos, name)?;
    if !grid.platform(pos) {
        return Err(invalid(pos, format!("{} door without floor", name)));
    }
    Ok(pos)
}

/// Derive foreground tile ids from the terrain.
fn paint_foreground(grid: &mut LevelGrid) {
    let positions: Vec<CellPos> = grid.positions().collect();
    for pos in positions {
        let tile = if grid.platform(pos) {
            let left = grid.platform(pos.offset(-1, 0));
            let right = grid.platform(pos.offset(1, 0));
            match (pos.on_even_row(), left, right) {
                (false, _, _) => fg::STEP,
                (true, false, true) => fg::PLATFORM_LEFT_END,
                (true, true, false) => fg::PLATFORM_RIGHT_END,
                _ => fg::PLATFORM_MIDDLE,
            }
        } else if grid.ladder(pos) {
            fg::LADDER
        } else {
            fg::EMPTY
        };
        grid.update(pos, |c| c.fg = tile);
    }
}

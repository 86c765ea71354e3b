//! One player's 10×10 grid: ship placement and shot history.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};
use rand::Rng;

use crate::common::{Coordinate, PlacementError, ShotOutcome};
use crate::config::{BOARD_SIZE, FLEET};
use crate::ship::{Orientation, Ship, ShipKind};

const N: usize = BOARD_SIZE as usize;

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// No ship, never fired upon.
    Empty,
    /// Ship segment, never fired upon.
    Ship,
    /// Fired upon, no ship.
    Miss,
    /// Fired upon, ship segment.
    Hit,
}

impl Cell {
    /// The cell has been fired upon.
    pub fn is_fired(&self) -> bool {
        matches!(self, Cell::Miss | Cell::Hit)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; N]; N],
    ships: Vec<Ship>,
    shots: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board (no ships placed, nothing fired).
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; N]; N],
            ships: Vec::new(),
            shots: 0,
        }
    }

    /// State of the cell at `coord`, `None` when off the grid.
    pub fn cell(&self, coord: Coordinate) -> Option<Cell> {
        coord.index().map(|(r, c)| self.cells[r][c])
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// A ship of `kind` is already on the board.
    pub fn has_ship(&self, kind: ShipKind) -> bool {
        self.ships.iter().any(|s| s.kind() == kind)
    }

    /// Number of distinct coordinates fired upon.
    pub fn shots_fired(&self) -> usize {
        self.shots
    }

    /// Place a ship of `kind` at `origin`. Nothing is modified on error.
    ///
    /// Fleet composition (one of each kind, five in total) is left to the caller.
    pub fn place(
        &mut self,
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<(), PlacementError> {
        let ship = Ship::new(kind, origin, orientation)?;
        if ship.cells().iter().any(|&c| self.cell(c) == Some(Cell::Ship)) {
            return Err(PlacementError::Collision);
        }
        for (r, c) in ship.cells().iter().filter_map(Coordinate::index) {
            self.cells[r][c] = Cell::Ship;
        }
        self.ships.push(ship);
        Ok(())
    }

    /// Fire at `coord`.
    ///
    /// Off-grid coordinates count as a miss without touching the board; a
    /// coordinate fired upon before reports [`ShotOutcome::AlreadyShot`] and
    /// is not processed again.
    pub fn shoot(&mut self, coord: Coordinate) -> ShotOutcome {
        let Some((r, c)) = coord.index() else {
            return ShotOutcome::Miss;
        };
        match self.cells[r][c] {
            Cell::Miss | Cell::Hit => ShotOutcome::AlreadyShot,
            Cell::Empty => {
                self.shots += 1;
                self.cells[r][c] = Cell::Miss;
                ShotOutcome::Miss
            }
            Cell::Ship => {
                self.shots += 1;
                self.cells[r][c] = Cell::Hit;
                match self.ships.iter_mut().find(|s| s.occupies(coord)) {
                    Some(ship) => {
                        ship.register_hit(coord);
                        if ship.is_sunk() {
                            ShotOutcome::Sunk
                        } else {
                            ShotOutcome::Hit
                        }
                    }
                    // cells marked Ship always belong to a placed ship
                    None => ShotOutcome::Hit,
                }
            }
        }
    }

    /// At least one ship placed and every placed ship sunk.
    pub fn is_defeated(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }

    /// The ship covering `coord`, only if it has been sunk.
    pub fn ship_sunk_at(&self, coord: Coordinate) -> Option<&Ship> {
        self.ships
            .iter()
            .find(|s| s.occupies(coord) && s.is_sunk())
    }

    /// Returns a random non-overlapping (origin, orientation) for `kind`.
    pub fn random_placement<R: Rng>(
        &self,
        rng: &mut R,
        kind: ShipKind,
    ) -> Result<(Coordinate, Orientation), PlacementError> {
        for _ in 0..100 {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orientation {
                Orientation::Horizontal => (N - 1, N - kind.length()),
                Orientation::Vertical => (N - kind.length(), N - 1),
            };
            let origin = Coordinate::new(
                rng.random_range(0..=max_r) as i32,
                rng.random_range(0..=max_c) as i32,
            );
            let ship = Ship::new(kind, origin, orientation)?;
            if ship.cells().iter().all(|&c| self.cell(c) == Some(Cell::Empty)) {
                return Ok((origin, orientation));
            }
        }
        Err(PlacementError::UnableToPlaceShip)
    }

    /// Place every catalogue ship not yet on the board at a random spot.
    pub fn random_fleet<R: Rng>(&mut self, rng: &mut R) -> Result<(), PlacementError> {
        for kind in FLEET {
            if self.has_ship(kind) {
                continue;
            }
            let (origin, orientation) = self.random_placement(rng, kind)?;
            self.place(kind, origin, orientation)?;
        }
        Ok(())
    }

    /// Text view of the grid. Unhit ships are drawn only when `reveal_ships`.
    pub fn render(&self, reveal_ships: bool) -> String {
        let mut out = String::new();
        let _ = self.write_grid(&mut out, reveal_ships);
        out
    }

    fn write_grid<W: Write>(&self, out: &mut W, reveal_ships: bool) -> fmt::Result {
        out.write_str("   ")?;
        for c in 0..N {
            write!(out, " {}", c)?;
        }
        out.write_char('\n')?;
        for r in 0..N {
            write!(out, "{:2} ", r)?;
            for c in 0..N {
                let symbol = match self.cells[r][c] {
                    Cell::Empty => '·',
                    Cell::Ship if reveal_ships => self
                        .ships
                        .iter()
                        .find(|s| s.occupies(Coordinate::new(r as i32, c as i32)))
                        .map(|s| s.kind().symbol())
                        .unwrap_or('?'),
                    Cell::Ship => '·',
                    Cell::Miss => 'O',
                    Cell::Hit => 'X',
                };
                write!(out, " {}", symbol)?;
            }
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_grid(f, true)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Board {{\n  ships: {:?},\n  shots: {}\n}}",
            self.ships, self.shots
        )
    }
}

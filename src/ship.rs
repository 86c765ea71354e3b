//! Ship catalogue, orientation and placed-ship hit tracking.

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::common::{Coordinate, PlacementError};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Extends to the right of the origin.
    Horizontal,
    /// Extends downwards from the origin.
    Vertical,
}

impl Orientation {
    pub fn token(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "H",
            Orientation::Vertical => "V",
        }
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "H" | "h" => Ok(Orientation::Horizontal),
            "V" | "v" => Ok(Orientation::Vertical),
            _ => Err(()),
        }
    }
}

/// The five vessel types of the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipKind {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipKind {
    /// Number of cells the ship occupies.
    pub const fn length(&self) -> usize {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }

    /// Wire token, as clients name the ship.
    pub fn token(&self) -> &'static str {
        match self {
            ShipKind::Carrier => "PORTAAVIONES",
            ShipKind::Battleship => "ACORAZADO",
            ShipKind::Cruiser => "CRUCERO",
            ShipKind::Submarine => "SUBMARINO",
            ShipKind::Destroyer => "DESTRUCTOR",
        }
    }

    /// English name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ShipKind::Carrier => "Carrier",
            ShipKind::Battleship => "Battleship",
            ShipKind::Cruiser => "Cruiser",
            ShipKind::Submarine => "Submarine",
            ShipKind::Destroyer => "Destroyer",
        }
    }

    /// Single-letter marker used when rendering a revealed board.
    pub fn symbol(&self) -> char {
        match self {
            ShipKind::Carrier => 'P',
            ShipKind::Battleship => 'A',
            ShipKind::Cruiser => 'C',
            ShipKind::Submarine => 'S',
            ShipKind::Destroyer => 'D',
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ShipKind {
    type Err = ();

    /// Accepts the wire token or the English name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        crate::config::FLEET
            .iter()
            .copied()
            .find(|kind| kind.token().eq_ignore_ascii_case(s) || kind.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// A ship placed on a board, with the cells it covers and the cells hit so far.
#[derive(Clone, PartialEq, Eq)]
pub struct Ship {
    kind: ShipKind,
    orientation: Orientation,
    cells: Vec<Coordinate>,
    hits: Vec<Coordinate>,
}

impl Ship {
    /// Lay out `kind` from `origin` along `orientation`.
    /// Fails if any covered cell falls off the grid.
    pub fn new(
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<Self, PlacementError> {
        if !origin.is_valid() {
            return Err(PlacementError::OutOfBounds);
        }
        let cells: Vec<Coordinate> = (0..kind.length() as i32)
            .map(|i| origin.offset(orientation, i))
            .collect();
        if !cells.iter().all(Coordinate::is_valid) {
            return Err(PlacementError::OutOfBounds);
        }
        Ok(Ship {
            kind,
            orientation,
            cells,
            hits: Vec::with_capacity(kind.length()),
        })
    }

    pub fn kind(&self) -> ShipKind {
        self.kind
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// First cell of the ship.
    pub fn origin(&self) -> Coordinate {
        self.cells[0]
    }

    /// Occupied cells, from the origin outwards.
    pub fn cells(&self) -> &[Coordinate] {
        &self.cells
    }

    pub fn hits(&self) -> &[Coordinate] {
        &self.hits
    }

    pub fn occupies(&self, coord: Coordinate) -> bool {
        self.cells.contains(&coord)
    }

    /// Record a hit at `coord`. Returns `false` if the ship does not cover
    /// `coord` or the cell was already hit.
    pub fn register_hit(&mut self, coord: Coordinate) -> bool {
        if !self.occupies(coord) || self.hits.contains(&coord) {
            return false;
        }
        self.hits.push(coord);
        true
    }

    /// All segments hit.
    pub fn is_sunk(&self) -> bool {
        self.hits.len() == self.cells.len()
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ kind: {}, origin: {}, orientation: {:?}, hits: {}/{} }}",
            self.kind.name(),
            self.origin(),
            self.orientation,
            self.hits.len(),
            self.cells.len(),
        )
    }
}

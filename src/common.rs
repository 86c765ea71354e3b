//! Common types for Battleship: coordinates, shot outcomes, identifiers and
//! placement errors.

use core::fmt;
use core::str::FromStr;

use crate::config::BOARD_SIZE;

/// A (row, column) position on the grid.
///
/// Components are signed so that positions off the board (a ship running
/// past the edge, a client sending `-1`) are representable and rejected by
/// [`Coordinate::is_valid`] rather than by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Both components lie in `0..BOARD_SIZE`.
    pub fn is_valid(&self) -> bool {
        let n = BOARD_SIZE as i32;
        (0..n).contains(&self.row) && (0..n).contains(&self.col)
    }

    /// Grid indices for a valid coordinate.
    pub fn index(&self) -> Option<(usize, usize)> {
        if self.is_valid() {
            Some((self.row as usize, self.col as usize))
        } else {
            None
        }
    }

    /// The coordinate `steps` cells away along `orientation`.
    ///
    /// Saturates at the `i32` limits; such a coordinate is never valid.
    pub fn offset(&self, orientation: crate::ship::Orientation, steps: i32) -> Self {
        match orientation {
            crate::ship::Orientation::Horizontal => {
                Self::new(self.row, self.col.saturating_add(steps))
            }
            crate::ship::Orientation::Vertical => {
                Self::new(self.row.saturating_add(steps), self.col)
            }
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Result of firing at a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Shot landed in open water.
    Miss,
    /// Shot hit a ship that is still afloat.
    Hit,
    /// Shot hit the last intact cell of a ship.
    Sunk,
    /// The coordinate had already been fired upon; nothing changed.
    AlreadyShot,
}

impl ShotOutcome {
    /// Wire token for this outcome.
    pub fn token(&self) -> &'static str {
        match self {
            ShotOutcome::Miss => "AGUA",
            ShotOutcome::Hit => "TOCADO",
            ShotOutcome::Sunk => "HUNDIDO",
            ShotOutcome::AlreadyShot => "YA_DISPARADO",
        }
    }

    /// `true` for outcomes that actually changed the target board.
    pub fn is_fresh(&self) -> bool {
        !matches!(self, ShotOutcome::AlreadyShot)
    }
}

impl fmt::Display for ShotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ShotOutcome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGUA" => Ok(ShotOutcome::Miss),
            "TOCADO" => Ok(ShotOutcome::Hit),
            "HUNDIDO" => Ok(ShotOutcome::Sunk),
            "YA_DISPARADO" => Ok(ShotOutcome::AlreadyShot),
            _ => Err(()),
        }
    }
}

/// Errors returned by ship placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// Part of the ship would lie outside the grid.
    OutOfBounds,
    /// Part of the ship would overlap a ship already on the board.
    Collision,
    /// No free spot was found for a random placement.
    UnableToPlaceShip,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::OutOfBounds => write!(f, "Ship placement is out of bounds"),
            PlacementError::Collision => write!(f, "Ship placement overlaps with another ship"),
            PlacementError::UnableToPlaceShip => write!(f, "Unable to place ship"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlacementError {}

/// Identifier of a match, assigned by the registry in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchId(pub u32);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(MatchId)
    }
}

/// Opaque identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//! The grid, ships, and fleet placement rules.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlacementError;

/// Side length of the square board.
pub const BOARD_SIZE: i32 = 10;

/// Required ship lengths, in placement order.
pub const FLEET_TEMPLATE: [usize; 5] = [5, 4, 3, 3, 2];

/// Most cards a player may hold.
pub const HAND_CAPACITY: usize = 5;

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A `(row, col)` cell. Serializes as a two-element array `[row, col]`.
///
/// Signed so that out-of-range input from a client decodes and is then
/// rejected by [`in_bounds`](Self::in_bounds) instead of failing to parse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord(pub i32, pub i32);

impl Coord {
    pub fn row(self) -> i32 {
        self.0
    }

    pub fn col(self) -> i32 {
        self.1
    }

    /// Returns `true` if `0 <= row, col < BOARD_SIZE`.
    pub fn in_bounds(self) -> bool {
        (0..BOARD_SIZE).contains(&self.0) && (0..BOARD_SIZE).contains(&self.1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

// ---------------------------------------------------------------------------
// Ship / Fleet
// ---------------------------------------------------------------------------

/// The cells of one ship that have not been hit yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ship {
    cells: Vec<Coord>,
}

impl Ship {
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A player's surviving ships.
///
/// Serializes as a list of coordinate lists, the same shape a client
/// sends in `placement`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    /// Validates a placement against [`FLEET_TEMPLATE`] and builds a fleet.
    ///
    /// Ships must come in template order with matching lengths, every cell
    /// must be on the board, and no cell may be used twice. Cells of one
    /// ship need not be contiguous.
    ///
    /// # Errors
    /// Returns the first [`PlacementError`] found.
    pub fn from_placement(ships: Vec<Vec<Coord>>) -> Result<Self, PlacementError> {
        if ships.len() != FLEET_TEMPLATE.len() {
            return Err(PlacementError::WrongShipCount {
                expected: FLEET_TEMPLATE.len(),
                actual: ships.len(),
            });
        }

        let mut occupied = HashSet::new();
        for (index, (ship, &expected)) in ships.iter().zip(&FLEET_TEMPLATE).enumerate() {
            if ship.len() != expected {
                return Err(PlacementError::WrongLength {
                    index,
                    expected,
                    actual: ship.len(),
                });
            }
            for &cell in ship {
                if !cell.in_bounds() {
                    return Err(PlacementError::OutOfBounds(cell));
                }
                if !occupied.insert(cell) {
                    return Err(PlacementError::Overlap(cell));
                }
            }
        }

        Ok(Self {
            ships: ships.into_iter().map(|cells| Ship { cells }).collect(),
        })
    }

    /// Returns `true` if any surviving ship covers `cell`.
    pub fn occupies(&self, cell: Coord) -> bool {
        self.ships.iter().any(|ship| ship.cells.contains(&cell))
    }

    /// Hits `cell`. Returns `true` on a hit.
    ///
    /// The cell is removed from its ship, and a ship with no cells left is
    /// removed from the fleet.
    pub fn strike(&mut self, cell: Coord) -> bool {
        let Some(index) = self.ships.iter().position(|s| s.cells.contains(&cell)) else {
            return false;
        };
        let ship = &mut self.ships[index];
        ship.cells.retain(|&c| c != cell);
        if ship.cells.is_empty() {
            self.ships.remove(index);
        }
        true
    }

    /// Returns `true` once every ship has sunk.
    pub fn is_destroyed(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }
}

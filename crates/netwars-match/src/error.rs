//! Error types for match rules.

use netwars_protocol::PlayerId;

use crate::{Coord, Phase};

/// Why a fleet placement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("expected {expected} ships, got {actual}")]
    WrongShipCount { expected: usize, actual: usize },

    #[error("ship {index} must have length {expected}, got {actual}")]
    WrongLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cell {0} is off the board")]
    OutOfBounds(Coord),

    #[error("cell {0} is used by more than one ship")]
    Overlap(Coord),
}

/// A rule violation. None of these change match state.
///
/// Only [`MatchError::InvalidPlacement`] is reported to the client; the
/// rest are logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("player {0} is not in this match")]
    UnknownPlayer(PlayerId),

    #[error("action not allowed during {0:?}")]
    WrongPhase(Phase),

    #[error("player {0} has already placed a fleet")]
    AlreadyPlaced(PlayerId),

    #[error("invalid placement: {0}")]
    InvalidPlacement(#[from] PlacementError),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("target {0} is off the board")]
    OutOfBounds(Coord),

    #[error("target {0} was already attacked")]
    AlreadyAttacked(Coord),

    #[error("player {0}'s hand is full")]
    HandFull(PlayerId),

    #[error("player {0} is not disconnected")]
    NotDisconnected(PlayerId),
}

//! The card catalog and what each card effect does to the board.
//!
//! Resolution depends only on a card's [`Effect`]; its display name is
//! used for hand bookkeeping and nothing else.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{BOARD_SIZE, Coord};

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// What a card does when played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// One cell.
    #[default]
    Single,
    /// Three cells in a row, centred on the target.
    Horizontal,
    /// Three cells in a column, centred on the target.
    Vertical,
    /// 3×3 block.
    Bombardment,
    /// 3×3 scan. Reports ships without damaging or spending the cells.
    Recon,
    /// 5×5 block that damages and reveals.
    Sonar,
    /// One cell; the defender loses their next attack.
    #[serde(rename = "EMP")]
    Emp,
}

impl Effect {
    /// Half-height and half-width of the effect area.
    fn reach(self) -> (i32, i32) {
        match self {
            Self::Single | Self::Emp => (0, 0),
            Self::Horizontal => (0, 1),
            Self::Vertical => (1, 0),
            Self::Bombardment | Self::Recon => (1, 1),
            Self::Sonar => (2, 2),
        }
    }

    /// Cells covered when played on `origin`, clipped to the board, in
    /// row-major order.
    pub fn affected_cells(self, origin: Coord) -> Vec<Coord> {
        let (dr, dc) = self.reach();
        let rows = (origin.row() - dr).max(0)..(origin.row() + dr + 1).min(BOARD_SIZE);
        let cols = (origin.col() - dc).max(0)..(origin.col() + dc + 1).min(BOARD_SIZE);

        rows.flat_map(|r| cols.clone().map(move |c| Coord(r, c)))
            .collect()
    }

    /// Whether hits remove ship cells.
    pub fn deals_damage(self) -> bool {
        !matches!(self, Self::Recon)
    }

    /// Whether the area is added to the defender's revealed cells.
    pub fn reveals(self) -> bool {
        matches!(self, Self::Recon | Self::Sonar)
    }

    /// Whether playing it broadcasts a one-turn attack disable aimed at
    /// the defender. Clients honour the notice.
    pub fn disables_next_turn(self) -> bool {
        matches!(self, Self::Emp)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A card as held in a hand and sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub description: String,
    pub effect: Effect,
    /// Plays left on this copy. A card without a count leaves the hand
    /// after one play.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<u32>,
}

impl Card {
    fn new(name: &str, description: &str, effect: Effect, uses: Option<u32>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            effect,
            uses,
        }
    }
}

/// The card a client names in an `attack`.
///
/// Clients echo the whole card back; only `name` and `effect` matter and
/// unknown fields are ignored. A missing effect means [`Effect::Single`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub effect: Effect,
}

// ---------------------------------------------------------------------------
// CardCatalog
// ---------------------------------------------------------------------------

/// The immutable table cards are drawn from.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: Vec<Card>,
}

impl CardCatalog {
    /// The seven standard cards.
    pub fn standard() -> Self {
        Self {
            cards: vec![
                Card::new("Standard", "Basic attack", Effect::Single, None),
                Card::new("Vertical", "3 vertical cells", Effect::Vertical, None),
                Card::new("Horizontal", "3 horizontal cells", Effect::Horizontal, None),
                Card::new("Bombardment", "3x3 area", Effect::Bombardment, None),
                Card::new("Recon Drone", "Reveal 3x3 area (2 uses)", Effect::Recon, Some(2)),
                Card::new("Sonar Ping", "Detect in 5x5 area (1 use)", Effect::Sonar, Some(1)),
                Card::new(
                    "EMP",
                    "Disable enemy attacks for one turn",
                    Effect::Emp,
                    None,
                ),
            ],
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Draws a card uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        self.cards[rng.random_range(0..self.cards.len())].clone()
    }
}

impl Default for CardCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

//! Wire messages. Both directions use a `"type"` tag with snake_case
//! names, e.g. `{"type":"draw_card"}`.

use netwars_protocol::PlayerId;
use serde::{Deserialize, Serialize};

use crate::{Card, CardRef, Coord, Effect, Fleet};

/// Messages a client sends after registering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Five ships as coordinate lists, in template order.
    Placement { ships: Vec<Vec<Coord>> },

    /// Fire at `(row, col)`. A missing card is a standard shot.
    Attack {
        row: i32,
        col: i32,
        #[serde(default)]
        card: Option<CardRef>,
    },

    /// Draw a card, ending the turn.
    DrawCard,

    /// Rejoin after a dropped connection.
    Reconnect,
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    InvalidPlacement,

    GameStart {
        current_player: PlayerId,
    },

    RemoveCard {
        card_name: String,
    },

    /// `coords` lists only cells not previously attacked, with `hits`
    /// index-aligned to it.
    AttackResult {
        player: PlayerId,
        coords: Vec<Coord>,
        hits: Vec<bool>,
        special_effect: Effect,
    },

    TurnUpdate {
        current_player: PlayerId,
    },

    /// `player` is the one affected.
    SpecialEffect {
        effect: Effect,
        player: PlayerId,
    },

    NewCard {
        card: Card,
    },

    DisableDraw,

    ReconnectSuccess {
        username: PlayerId,
    },

    /// Snapshot for a rejoining player.
    GameStateUpdate {
        ships: Fleet,
        hand: Vec<Card>,
        current_turn: Option<PlayerId>,
    },

    GameOver {
        winner: PlayerId,
        message: String,
    },
}

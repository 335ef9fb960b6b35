//! Authoritative match rules for Netwars.
//!
//! A match is two players, two hidden 10×10 boards, and a deck of attack
//! cards. This crate owns every rule:
//!
//! - **Placement** ([`Fleet::from_placement`]): the `[5,4,3,3,2]` fleet
//!   template, bounds, and overlap checks.
//! - **Cards** ([`CardCatalog`], [`Effect`]): what each card covers and
//!   which side effects it has.
//! - **Turns** ([`MatchState`]): attacks, draws, reconnects, and
//!   forfeits, each returning the messages to deliver.
//!
//! # Example
//!
//! ```rust
//! use netwars_match::{ClientMessage, MatchState, Phase};
//! use netwars_protocol::PlayerId;
//!
//! let alice = PlayerId::new("alice");
//! let bob = PlayerId::new("bob");
//! let mut game = MatchState::with_seed([alice.clone(), bob], 42);
//!
//! // An empty placement is rejected with a unicast `invalid_placement`.
//! let out = game.handle_message(&alice, ClientMessage::Placement { ships: vec![] });
//! assert_eq!(out.len(), 1);
//! assert_eq!(game.phase(), Phase::Placement);
//! ```

mod board;
mod card;
mod error;
mod messages;
mod state;

pub use board::{BOARD_SIZE, Coord, FLEET_TEMPLATE, Fleet, HAND_CAPACITY, Ship};
pub use card::{Card, CardCatalog, CardRef, Effect};
pub use error::{MatchError, PlacementError};
pub use messages::{ClientMessage, ServerMessage};
pub use state::{MatchState, Outbound, Phase};

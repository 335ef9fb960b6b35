//! # Netwars
//!
//! Authoritative two-player server for Netwars, a Battleship variant
//! played with attack cards over plain TCP.
//!
//! The server owns the only copy of the match: both hidden fleets, both
//! hands, and the turn. Clients send a raw username, then JSON messages;
//! the server validates every move, resolves card effects, and keeps a
//! dropped player's seat open for a grace period.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netwars::prelude::*;
//!
//! # async fn start() -> Result<(), NetwarsError> {
//! let server = NetwarsServer::builder()
//!     .bind("0.0.0.0:5555")
//!     .build()
//!     .await?;
//! // Returns once the match is won or forfeited.
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod manager;
mod server;
mod supervisor;

pub use error::NetwarsError;
pub use server::{NetwarsServer, NetwarsServerBuilder};

/// Re-exports everything needed to run a server or speak its protocol.
pub mod prelude {
    pub use crate::{NetwarsError, NetwarsServer, NetwarsServerBuilder};
    pub use netwars_match::{
        Card, CardRef, ClientMessage, Coord, Effect, FLEET_TEMPLATE, ServerMessage,
    };
    pub use netwars_protocol::PlayerId;
    pub use netwars_session::SessionConfig;
}

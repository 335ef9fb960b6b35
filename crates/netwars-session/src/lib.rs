//! Player seating and connection tracking for Netwars.
//!
//! This crate handles the lifecycle of a player's connection:
//!
//! 1. **Seating**: the first two distinct usernames take the match's
//!    two seats ([`SessionManager::register`]).
//! 2. **Binding**: each seat points at the socket its messages go to.
//! 3. **Grace tracking**: dropped players get a window to come back,
//!    tracked per disconnect with an epoch number.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← owns the manager behind its single mutex
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport (below)  ← PlayerId, ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{Registration, SEATS, SessionManager};
pub use session::{Session, SessionConfig, SessionState};

//! Identity and addressing types shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity: the username they registered with.
///
/// Usernames are opaque. They key every per-player map in a match and
/// are unique within a match, nothing more.
///
/// `#[serde(transparent)]` makes `PlayerId("alice")` serialize as the
/// plain string `"alice"`, which is what clients compare against.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player ID from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the username.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Game logic returns `(Recipient, message)` pairs; the connection
/// manager resolves each recipient to live sockets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Send to every player with a live connection.
    All,

    /// Send to one specific player.
    Player(PlayerId),
}

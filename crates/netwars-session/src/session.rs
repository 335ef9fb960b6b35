//! Session types: the server's record of one seated player.

use std::time::{Duration, Instant};

use netwars_protocol::PlayerId;
use netwars_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a disconnected player has to send `reconnect` before the
    /// match is forfeited to their opponent.
    ///
    /// Default: 60 seconds.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a player's session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(timer)──→ Expired
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// Every entry into `Disconnected` carries a fresh `epoch`. A grace timer
/// remembers the epoch it was started for and only expires the session
/// if that epoch is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Player is connected and playing.
    Connected,

    /// Player dropped at `since`; grace timer `epoch` is running.
    Disconnected { since: Instant, epoch: u64 },

    /// Grace period elapsed. The seat stays taken but can never be
    /// reclaimed.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single seated player.
#[derive(Debug, Clone)]
pub struct Session {
    /// Which player this session belongs to.
    pub player_id: PlayerId,

    /// Current lifecycle state.
    pub state: SessionState,

    /// The socket outbound messages for this player go to.
    ///
    /// Rebinding happens when a dropped player opens a new socket, before
    /// they send `reconnect`.
    pub connection: ConnectionId,
}

impl Session {
    /// Returns `true` if the player is in the `Connected` state.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected)
    }

    /// Returns `true` if the player is waiting out a grace period.
    pub fn is_disconnected(&self) -> bool {
        matches!(self.state, SessionState::Disconnected { .. })
    }
}

//! Error types for the session layer.

use netwars_protocol::PlayerId;
use netwars_transport::ConnectionId;

/// Errors that can occur while seating, binding, or reconnecting players.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// Both seats are taken and this username holds neither of them.
    #[error("match is full, refusing player {0}")]
    MatchFull(PlayerId),

    /// The player is seated and their current socket is still live.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),

    /// The reconnection grace period has elapsed.
    #[error("session expired for player {0}")]
    SessionExpired(PlayerId),

    /// A reconnect was requested for a player who never dropped.
    #[error("player {0} is not disconnected")]
    NotDisconnected(PlayerId),

    /// The request came from a socket the player is no longer bound to.
    #[error("player {0} is no longer bound to {1}")]
    StaleConnection(PlayerId, ConnectionId),
}

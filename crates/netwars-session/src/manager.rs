//! The session manager: the match's two seats and who sits in them.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself. It lives inside the
//! server's connection manager, behind the one mutex that serializes
//! every state change, so a plain `HashMap` is enough here.

use std::collections::HashMap;
use std::time::Instant;

use netwars_protocol::PlayerId;
use netwars_transport::ConnectionId;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Number of seats in a match.
pub const SEATS: usize = 2;

/// Outcome of a successful [`SessionManager::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The username took a free seat.
    New,

    /// The username belongs to a disconnected seated player; its seat is
    /// now bound to the new socket, but the player stays disconnected
    /// until they send `reconnect`.
    Rebound,
}

/// Tracks the seated players and their connection state.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ [Connected] ──disconnect()──→ [Disconnected{epoch}]
///                     ↑                          │         │
///                     └───────reconnect()────────┘         │
///                                                 expire(epoch)
///                                                          ▼
///                                                      [Expired]
/// ```
///
/// Before the match exists, a dropped player's seat is simply freed with
/// [`release`](Self::release).
pub struct SessionManager {
    /// Sessions keyed by username.
    sessions: HashMap<PlayerId, Session>,

    /// Seat order: first registrant first.
    seats: Vec<PlayerId>,

    /// Source of grace-timer epochs. Never reused.
    next_epoch: u64,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates an empty manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            seats: Vec::with_capacity(SEATS),
            next_epoch: 0,
            config,
        }
    }

    /// Seats a username, or rebinds a dropped player's seat to `conn`.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyConnected`]: the player's socket is live
    /// - [`SessionError::SessionExpired`]: the player's grace ran out
    /// - [`SessionError::MatchFull`]: both seats belong to others
    pub fn register(
        &mut self,
        player_id: PlayerId,
        conn: ConnectionId,
    ) -> Result<Registration, SessionError> {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            return match session.state {
                SessionState::Connected => {
                    Err(SessionError::AlreadyConnected(player_id))
                }
                SessionState::Expired => {
                    Err(SessionError::SessionExpired(player_id))
                }
                SessionState::Disconnected { .. } => {
                    session.connection = conn;
                    tracing::info!(%player_id, %conn, "seat rebound to new connection");
                    Ok(Registration::Rebound)
                }
            };
        }

        if self.seats.len() >= SEATS {
            return Err(SessionError::MatchFull(player_id));
        }

        self.seats.push(player_id.clone());
        self.sessions.insert(
            player_id.clone(),
            Session {
                player_id: player_id.clone(),
                state: SessionState::Connected,
                connection: conn,
            },
        );

        tracing::info!(%player_id, %conn, seat = self.seats.len(), "player seated");
        Ok(Registration::New)
    }

    /// Frees a seat outright. Used when a player drops before the match
    /// has been created.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: the player holds no seat
    /// - [`SessionError::StaleConnection`]: `conn` is not the bound socket
    pub fn release(
        &mut self,
        player_id: &PlayerId,
        conn: ConnectionId,
    ) -> Result<(), SessionError> {
        self.bound_session(player_id, conn)?;
        self.sessions.remove(player_id);
        self.seats.retain(|seated| seated != player_id);

        tracing::info!(%player_id, "seat released");
        Ok(())
    }

    /// Marks a player as disconnected and starts a grace period.
    ///
    /// Returns the new epoch, or `None` if the player was not connected
    /// (a rebound socket dropping before `reconnect` leaves the earlier
    /// grace period running).
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: the player holds no seat
    /// - [`SessionError::StaleConnection`]: `conn` is not the bound socket
    pub fn disconnect(
        &mut self,
        player_id: &PlayerId,
        conn: ConnectionId,
    ) -> Result<Option<u64>, SessionError> {
        self.bound_session(player_id, conn)?;

        let epoch = self.next_epoch;
        let Some(session) = self.sessions.get_mut(player_id) else {
            return Err(SessionError::NotFound(player_id.clone()));
        };
        if !session.is_connected() {
            return Ok(None);
        }

        self.next_epoch += 1;
        session.state = SessionState::Disconnected {
            since: Instant::now(),
            epoch,
        };

        tracing::info!(%player_id, epoch, "player disconnected, grace period started");
        Ok(Some(epoch))
    }

    /// Restores a disconnected player whose seat is bound to `conn`.
    ///
    /// A reconnect that arrives after the grace period is refused without
    /// changing state; the pending timer settles it.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: the player holds no seat
    /// - [`SessionError::StaleConnection`]: `conn` is not the bound socket
    /// - [`SessionError::NotDisconnected`]: the player never dropped
    /// - [`SessionError::SessionExpired`]: grace period elapsed
    pub fn reconnect(
        &mut self,
        player_id: &PlayerId,
        conn: ConnectionId,
    ) -> Result<(), SessionError> {
        self.bound_session(player_id, conn)?;
        let grace = self.config.reconnect_grace;

        let Some(session) = self.sessions.get_mut(player_id) else {
            return Err(SessionError::NotFound(player_id.clone()));
        };
        match session.state {
            SessionState::Connected => {
                Err(SessionError::NotDisconnected(player_id.clone()))
            }
            SessionState::Expired => {
                Err(SessionError::SessionExpired(player_id.clone()))
            }
            SessionState::Disconnected { since, .. } => {
                if since.elapsed() >= grace {
                    return Err(SessionError::SessionExpired(player_id.clone()));
                }
                session.state = SessionState::Connected;
                tracing::info!(%player_id, "player reconnected");
                Ok(())
            }
        }
    }

    /// Expires a player if they are still disconnected under `epoch`.
    ///
    /// Returns `true` if the session moved to `Expired`. A timer from an
    /// earlier disconnect, or one that fires after a reconnect, is a no-op.
    pub fn expire(&mut self, player_id: &PlayerId, epoch: u64) -> bool {
        let Some(session) = self.sessions.get_mut(player_id) else {
            return false;
        };
        match session.state {
            SessionState::Disconnected { epoch: current, .. }
                if current == epoch =>
            {
                session.state = SessionState::Expired;
                tracing::info!(%player_id, epoch, "session expired (grace period elapsed)");
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `player_id`'s seat is bound to `conn`.
    pub fn is_bound(&self, player_id: &PlayerId, conn: ConnectionId) -> bool {
        self.sessions
            .get(player_id)
            .is_some_and(|s| s.connection == conn)
    }

    /// Looks up a session by username.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Seated players in registration order.
    pub fn seats(&self) -> &[PlayerId] {
        &self.seats
    }

    /// Returns `true` once both seats are taken.
    pub fn is_full(&self) -> bool {
        self.seats.len() >= SEATS
    }

    /// Returns the number of sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The config this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn bound_session(
        &self,
        player_id: &PlayerId,
        conn: ConnectionId,
    ) -> Result<&Session, SessionError> {
        let session = self
            .sessions
            .get(player_id)
            .ok_or_else(|| SessionError::NotFound(player_id.clone()))?;
        if session.connection != conn {
            return Err(SessionError::StaleConnection(player_id.clone(), conn));
        }
        Ok(session)
    }
}

// =========================================================================
// Tests
// =========================================================================

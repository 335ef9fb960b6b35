//! The connection manager: the single piece of shared state.
//!
//! It owns the seat registry, the match, and one outbound channel per
//! bound player. The server keeps it behind one mutex, so every inbound
//! message, disconnect, and timer is applied as one critical section.
//! Nothing in here awaits.

use std::collections::HashMap;

use netwars_match::{ClientMessage, MatchState, Outbound};
use netwars_protocol::{Codec, JsonCodec, PlayerId, Recipient};
use netwars_session::{Registration, SessionConfig, SessionError, SessionManager};
use netwars_transport::ConnectionId;
use tokio::sync::mpsc;

/// Encoded frames queued for one socket's writer task.
pub(crate) type OutboundSender = mpsc::UnboundedSender<Vec<u8>>;

/// Where a player's outbound messages go.
struct Peer {
    conn: ConnectionId,
    outbound: OutboundSender,
}

pub(crate) struct ConnectionManager {
    sessions: SessionManager,
    peers: HashMap<PlayerId, Peer>,
    game: Option<MatchState>,
    codec: JsonCodec,
    seed: Option<u64>,
}

impl ConnectionManager {
    pub(crate) fn new(config: SessionConfig, seed: Option<u64>) -> Self {
        Self {
            sessions: SessionManager::new(config),
            peers: HashMap::new(),
            game: None,
            codec: JsonCodec,
            seed,
        }
    }

    /// Seats or rebinds `player` and routes their messages to `outbound`.
    /// Creates the match when the second seat fills.
    pub(crate) fn register(
        &mut self,
        player: PlayerId,
        conn: ConnectionId,
        outbound: OutboundSender,
    ) -> Result<Registration, SessionError> {
        let registration = self.sessions.register(player.clone(), conn)?;
        self.peers.insert(player, Peer { conn, outbound });

        if self.game.is_none() {
            if let [first, second] = self.sessions.seats() {
                let players = [first.clone(), second.clone()];
                self.game = Some(match self.seed {
                    Some(seed) => MatchState::with_seed(players, seed),
                    None => MatchState::new(players),
                });
            }
        }

        Ok(registration)
    }

    /// Applies one decoded message from `player` on `conn`.
    pub(crate) fn handle(&mut self, player: &PlayerId, conn: ConnectionId, msg: ClientMessage) {
        if !self.sessions.is_bound(player, conn) {
            tracing::debug!(player_id = %player, %conn, "message from stale connection dropped");
            return;
        }
        let Some(game) = self.game.as_mut() else {
            tracing::debug!(player_id = %player, "message before match start ignored");
            return;
        };

        if matches!(msg, ClientMessage::Reconnect) {
            if let Err(e) = self.sessions.reconnect(player, conn) {
                tracing::debug!(player_id = %player, error = %e, "reconnect refused");
                return;
            }
        }

        let out = game.handle_message(player, msg);
        self.dispatch(out);
    }

    /// Unbinds `conn` after its socket closed.
    ///
    /// Before the match exists the seat is freed. During a match the
    /// player is flagged disconnected and the new grace epoch is returned
    /// for the caller to start a timer with.
    pub(crate) fn teardown(&mut self, player: &PlayerId, conn: ConnectionId) -> Option<u64> {
        if !self.sessions.is_bound(player, conn) {
            return None;
        }
        if self.peers.get(player).is_some_and(|peer| peer.conn == conn) {
            self.peers.remove(player);
        }

        let Some(game) = self.game.as_mut() else {
            if let Err(e) = self.sessions.release(player, conn) {
                tracing::debug!(player_id = %player, error = %e, "seat release failed");
            }
            return None;
        };
        if game.is_finished() {
            return None;
        }

        match self.sessions.disconnect(player, conn) {
            Ok(Some(epoch)) => {
                game.player_disconnected(player);
                Some(epoch)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(player_id = %player, error = %e, "disconnect failed");
                None
            }
        }
    }

    /// Forfeits the match for `player` if grace period `epoch` is still
    /// the current one.
    pub(crate) fn expire(&mut self, player: &PlayerId, epoch: u64) {
        if !self.sessions.expire(player, epoch) {
            tracing::debug!(player_id = %player, epoch, "stale grace timer ignored");
            return;
        }
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.forfeit(player) {
            Ok(out) => self.dispatch(out),
            Err(e) => tracing::debug!(player_id = %player, error = %e, "forfeit skipped"),
        }
    }

    /// Encodes each message once and queues it for its recipients.
    ///
    /// A recipient whose writer has gone away is skipped; delivery to the
    /// other player is unaffected.
    fn dispatch(&self, out: Vec<Outbound>) {
        for (recipient, msg) in out {
            let bytes = match self.codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode server message");
                    continue;
                }
            };
            match recipient {
                Recipient::All => {
                    for (player, peer) in &self.peers {
                        if peer.outbound.send(bytes.clone()).is_err() {
                            tracing::debug!(player_id = %player, conn_id = %peer.conn, "writer gone, message dropped");
                        }
                    }
                }
                Recipient::Player(player) => {
                    let Some(peer) = self.peers.get(&player) else {
                        tracing::debug!(player_id = %player, "no bound socket, message dropped");
                        continue;
                    };
                    if peer.outbound.send(bytes).is_err() {
                        tracing::debug!(player_id = %player, conn_id = %peer.conn, "writer gone, message dropped");
                    }
                }
            }
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.game.as_ref().is_some_and(MatchState::is_finished)
    }

    /// Drops every outbound channel. Writers flush what is queued and
    /// shut their sockets down.
    pub(crate) fn close_all(&mut self) {
        self.peers.clear();
    }

    #[cfg(test)]
    pub(crate) fn game(&self) -> Option<&MatchState> {
        self.game.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

//! Grace timers for disconnected players.
//!
//! One timer per disconnect. It sleeps out the grace period, then takes
//! the manager lock and asks it to expire that exact epoch; a player who
//! came back (or dropped again since) is left alone.

use std::sync::Arc;

use netwars_protocol::PlayerId;

use crate::server::ServerState;

/// Spawns the grace timer for `player`'s disconnect `epoch`.
pub(crate) fn start_grace_timer(state: Arc<ServerState>, player: PlayerId, epoch: u64) {
    let grace = state.config.reconnect_grace;
    tracing::debug!(player_id = %player, epoch, ?grace, "grace timer started");

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;

        let mut manager = state.manager.lock().await;
        manager.expire(&player, epoch);
        state.settle(&mut manager);
    });
}

//! Per-connection handler: registration, then the read loop.
//!
//! Each accepted socket gets its own task running [`handle_connection`]
//! and a writer task draining its outbound channel. The flow is:
//!   1. Read the raw username (30 s deadline)
//!   2. Seat or rebind the player
//!   3. Loop: read chunks → frame → decode → apply under the lock
//!   4. On close: tear down, maybe start a grace timer

use std::sync::Arc;
use std::time::Duration;

use netwars_match::ClientMessage;
use netwars_protocol::{Codec, Framer, JsonCodec, PlayerId, ProtocolError, parse_registration};
use netwars_transport::{Connection, ConnectionId, TcpConnection, TransportError};
use tokio::sync::mpsc;

use crate::NetwarsError;
use crate::server::ServerState;
use crate::supervisor::start_grace_timer;

/// How long a new socket has to send its username.
const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), NetwarsError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    // --- Step 1: Registration ---
    let (player_id, pipelined) = match read_registration(&conn).await {
        Ok(registration) => registration,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };

    // --- Step 2: Seat ---
    let (tx, rx) = mpsc::unbounded_channel();
    let registration = state
        .manager
        .lock()
        .await
        .register(player_id.clone(), conn_id, tx);
    let registration = match registration {
        Ok(registration) => registration,
        Err(e) => {
            tracing::info!(%conn_id, %player_id, error = %e, "registration refused");
            let _ = conn.close().await;
            return Err(e.into());
        }
    };
    tracing::info!(%conn_id, %player_id, %peer, ?registration, "player registered");

    state.writers.lock().await.spawn(write_loop(Arc::clone(&conn), rx));

    // --- Step 3: Message loop ---
    let mut framer = Framer::new();
    framer.push(&pipelined);
    process_frames(&state, &mut framer, &player_id, conn_id).await;

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                framer.push(&data);
                process_frames(&state, &mut framer, &player_id, conn_id).await;
            }
            Ok(None) => {
                tracing::info!(%player_id, %conn_id, "connection closed by peer");
                break;
            }
            Err(e) => {
                tracing::info!(%player_id, %conn_id, error = %e, "connection lost");
                break;
            }
        }
    }

    // --- Step 4: Teardown ---
    let epoch = state.manager.lock().await.teardown(&player_id, conn_id);
    if let Some(epoch) = epoch {
        start_grace_timer(Arc::clone(&state), player_id, epoch);
    }
    Ok(())
}

/// Reads until the first chunk arrives and splits off the username.
async fn read_registration(
    conn: &TcpConnection,
) -> Result<(PlayerId, Vec<u8>), NetwarsError> {
    let data = match tokio::time::timeout(REGISTRATION_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(TransportError::ConnectionClosed(
                "connection closed before registration".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidRegistration(
                "registration timed out".into(),
            )
            .into());
        }
    };

    let (player_id, rest) = parse_registration(&data)?;
    Ok((player_id, rest.to_vec()))
}

/// Decodes every complete frame and applies it under the lock.
///
/// Bad frames are logged and skipped; the connection stays open.
async fn process_frames(
    state: &ServerState,
    framer: &mut Framer,
    player_id: &PlayerId,
    conn_id: ConnectionId,
) {
    loop {
        let frame = match framer.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "discarding oversized frame");
                continue;
            }
        };

        let msg: ClientMessage = match JsonCodec.decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to decode message");
                continue;
            }
        };

        let mut manager = state.manager.lock().await;
        manager.handle(player_id, conn_id, msg);
        state.settle(&mut manager);
    }
}

/// Drains one socket's outbound queue. Ends when the channel closes or a
/// send fails, then shuts the write half down.
async fn write_loop(conn: Arc<TcpConnection>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = rx.recv().await {
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
    let _ = conn.close().await;
}

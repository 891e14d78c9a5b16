//! Per-connection handler: event decoding and routing into the arena.
//!
//! Each accepted connection gets its own Tokio task running this handler
//! plus a writer task draining the player's outbox. The flow is:
//!   1. Allocate a `PlayerId` for the connection and spawn the writer
//!   2. Loop: receive frames → decode `ClientEvent` → dispatch to `Arena`
//!   3. On close, error, or idle timeout: run disconnect cleanup

use std::sync::Arc;

use skirmish_protocol::{ClientEvent, Codec, PlayerId, ServerEvent};
use skirmish_session::Outbox;
use skirmish_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::{Arena, SkirmishError};

/// Drop guard that runs disconnect cleanup when the handler exits.
///
/// Fires even if the handler panics. `Drop` is synchronous, so the async
/// cleanup runs in a detached task.
struct DisconnectGuard {
    player_id: PlayerId,
    arena: Arena,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let arena = self.arena.clone();
        tokio::spawn(async move {
            arena.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError> {
    let conn = Arc::new(conn);
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(%player_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbox, outbound) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        player_id,
        outbound,
    ));
    let _guard = DisconnectGuard {
        player_id,
        arena: state.arena.clone(),
    };

    let idle_timeout = state.arena.config().connection_idle_timeout;
    loop {
        let data = match tokio::time::timeout(idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection idle, closing");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode event");
                let _ = outbox.send(ServerEvent::error(e.to_string()));
                continue;
            }
        };

        let name = event.name();
        tracing::trace!(%player_id, event = name, "received event");
        if let Err(e) = dispatch(&state.arena, player_id, &outbox, event).await {
            if e.is_internal() {
                tracing::error!(%player_id, event = name, error = %e, "operation failed");
            } else {
                tracing::debug!(%player_id, event = name, error = %e, "operation rejected");
            }
            let _ = outbox.send(ServerEvent::error(e.client_message()));
        }
    }

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → disconnect cleanup fires.
    Ok(())
}

/// Routes one decoded event to the matching arena operation.
async fn dispatch(
    arena: &Arena,
    player_id: PlayerId,
    outbox: &Outbox,
    event: ClientEvent,
) -> Result<(), SkirmishError> {
    match event {
        ClientEvent::Join { name } => arena.join(player_id, name.as_deref(), outbox.clone()).await,
        ClientEvent::FindMatch => arena.find_match(player_id).await,
        ClientEvent::CreateRoom => arena.create_room(player_id).await.map(|_| ()),
        ClientEvent::JoinRoom { room_code } => arena.join_room(player_id, &room_code).await,
        ClientEvent::MakeChoice { choice } => arena.make_choice(player_id, &choice).await,
        ClientEvent::CancelMatchmaking => arena.cancel_matchmaking(player_id).await,
        ClientEvent::SendChat { text } => arena.send_chat(player_id, text).await,
        ClientEvent::RequestRematch => arena.request_rematch(player_id).await,
        ClientEvent::AcceptRematch => arena.accept_rematch(player_id).await,
        ClientEvent::LeaveMatch => arena.leave_match(player_id).await,
        ClientEvent::GetStats => arena.stats(player_id).await.map(|_| ()),
        ClientEvent::Ping => {
            arena.ping(player_id, outbox).await;
            Ok(())
        }
    }
}

/// Drains the outbox onto the wire until either side goes away.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    player_id: PlayerId,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = outbound.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%player_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

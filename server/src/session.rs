use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use minerace_common::RequestKind;
use minerace_common::api::{
    CreateGameResponse, ExplicitNewstateRequest, FetchRoomParamsRequest, FetchRoomParamsResponse,
    IngameInput, JoinGameRequest, JoinGameResponse, JoinRequest, JoinResponse,
    RoomCreationParameters, json_bytes,
};
use minerace_common::pipe::{Pipe, PipeSender};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::{Rejection, ServerContext};

/// Interval after which a blocked read wakes up to check liveness. Bounds
/// shutdown latency; elapsed timeouts are retried silently.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

struct SessionState {
    /// Set once the connection completes a JOIN.
    player_id: Mutex<Option<u32>>,
}

impl SessionState {
    fn player_id(&self) -> Option<u32> {
        *self
            .player_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_player_id(&self, player_id: u32) -> bool {
        let mut slot = self
            .player_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return false;
        }
        *slot = Some(player_id);
        true
    }
}

/// Serve one client connection until it disconnects or violates the
/// protocol, then clean its player and seats out of the context.
pub async fn run_connection(context: Arc<ServerContext>, stream: TcpStream) {
    let session_id = Uuid::new_v4();
    info!(%session_id, peer = ?stream.peer_addr().ok(), "client connected");

    let (mut read_half, mut write_half) = stream.into_split();
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    // All outgoing frames of this connection funnel through one writer task.
    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = outgoing_rx.recv().await {
            if let Err(error) = write_half.write_all(&bytes).await {
                debug!("write failed: {}", error);
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let mut pipe = Pipe::new(outgoing);
    let sender = pipe.sender();

    let alive = Arc::new(AtomicBool::new(true));
    {
        let alive = alive.clone();
        sender.on_dead(move || alive.store(false, Ordering::SeqCst));
    }

    let session = Arc::new(SessionState {
        player_id: Mutex::new(None),
    });
    register_handlers(&mut pipe, &context, &session, &sender);

    let mut buffer = [0u8; 4096];
    loop {
        if !alive.load(Ordering::SeqCst) {
            break;
        }
        match timeout(READ_TIMEOUT, read_half.read(&mut buffer)).await {
            Err(_) => continue,
            Ok(Ok(0)) => {
                info!(%session_id, "connection closed by client");
                break;
            }
            Ok(Ok(received)) => {
                if let Err(error) = pipe.receive(&buffer[..received]) {
                    warn!(%session_id, "protocol violation, dropping client: {}", error);
                    break;
                }
            }
            Ok(Err(error)) => {
                info!(%session_id, "connection lost: {}", error);
                break;
            }
        }
    }

    sender.close();
    let _ = writer_task.await;

    if let Some(player_id) = session.player_id() {
        context.disconnect_player(player_id);
    }
    info!(%session_id, "session finished");
}

/// Wire the request catalog to the context. Handlers run on the connection's
/// read task and never block on other connections; room work happens under
/// the per-room lock only.
fn register_handlers(
    pipe: &mut Pipe,
    context: &Arc<ServerContext>,
    session: &Arc<SessionState>,
    sender: &PipeSender,
) {
    {
        let context = context.clone();
        let session = session.clone();
        let sender = sender.clone();
        pipe.on_request(RequestKind::Join, move |payload| {
            let response = match serde_json::from_slice::<JoinRequest>(payload) {
                Ok(request) => match context.register_player(&request.username, sender.clone()) {
                    Ok(player_id) => {
                        if session.set_player_id(player_id) {
                            JoinResponse::ok(player_id)
                        } else {
                            context.disconnect_player(player_id);
                            JoinResponse::failure(Rejection::AlreadyLoggedIn.to_string())
                        }
                    }
                    Err(rejection) => JoinResponse::failure(rejection.to_string()),
                },
                Err(error) => JoinResponse::failure(error.to_string()),
            };
            json_bytes(&response)
        });
    }

    {
        let context = context.clone();
        pipe.on_request(RequestKind::GetGameListing, move |_payload| {
            json_bytes(&context.game_listing())
        });
    }

    {
        let context = context.clone();
        pipe.on_request(RequestKind::CreateGame, move |payload| {
            let response = match serde_json::from_slice::<RoomCreationParameters>(payload) {
                Ok(params) => match context.create_room(&params) {
                    Ok(room_id) => CreateGameResponse::ok(room_id),
                    Err(rejection) => CreateGameResponse::failure(rejection.to_string()),
                },
                Err(error) => CreateGameResponse::failure(error.to_string()),
            };
            json_bytes(&response)
        });
    }

    {
        let context = context.clone();
        pipe.on_request(RequestKind::JoinGame, move |payload| {
            let response = match serde_json::from_slice::<JoinGameRequest>(payload) {
                Ok(request) => join_game(&context, &request),
                Err(error) => JoinGameResponse::failure(error.to_string()),
            };
            json_bytes(&response)
        });
    }

    {
        let context = context.clone();
        pipe.on_notify(RequestKind::IngameInput, move |payload| {
            let input: IngameInput = match serde_json::from_slice(payload) {
                Ok(input) => input,
                Err(error) => {
                    warn!("discarding malformed input: {}", error);
                    return;
                }
            };
            match context.room(input.room_id) {
                Ok(room) => room
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .apply_input(&input),
                Err(rejection) => warn!(room_id = input.room_id, "input dropped: {}", rejection),
            }
        });
    }

    {
        let context = context.clone();
        pipe.on_request(RequestKind::IngameFetchRoomParams, move |payload| {
            let response = match serde_json::from_slice::<FetchRoomParamsRequest>(payload) {
                Ok(request) => match context.room(request.room_id) {
                    Ok(room) => FetchRoomParamsResponse::ok(
                        room.lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .room_params(),
                    ),
                    Err(rejection) => FetchRoomParamsResponse::failure(rejection.to_string()),
                },
                Err(error) => FetchRoomParamsResponse::failure(error.to_string()),
            };
            json_bytes(&response)
        });
    }

    {
        let context = context.clone();
        pipe.on_notify(RequestKind::IngameExplicitNewstateRequest, move |payload| {
            let request: ExplicitNewstateRequest = match serde_json::from_slice(payload) {
                Ok(request) => request,
                Err(error) => {
                    warn!("discarding malformed newstate request: {}", error);
                    return;
                }
            };
            match context.room_of_player(request.player_id) {
                Some(room) => room
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push_board_to(request.player_id),
                None => debug!(
                    player_id = request.player_id,
                    "newstate requested outside any room"
                ),
            }
        });
    }

    // Liveness probe; the empty reply is the pong.
    pipe.on_request(RequestKind::Keepalive, |_payload| Vec::new());
}

fn join_game(context: &Arc<ServerContext>, request: &JoinGameRequest) -> JoinGameResponse {
    let (username, pipe) = match context.player(request.player_id) {
        Ok(player) => player,
        Err(rejection) => return JoinGameResponse::failure(rejection.to_string()),
    };
    let room = match context.room(request.room_id) {
        Ok(room) => room,
        Err(rejection) => return JoinGameResponse::failure(rejection.to_string()),
    };

    let seated = room
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .seat_player(request.player_id, username, pipe);
    match seated {
        Ok(player_index) => JoinGameResponse::ok(request.room_id, player_index),
        Err(rejection) => JoinGameResponse::failure(rejection.to_string()),
    }
}

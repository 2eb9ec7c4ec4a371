use minerace_common::RequestKind;
use minerace_common::api::{
    self, CreateGameResponse, ExplicitNewstateRequest, FetchRoomParamsRequest,
    FetchRoomParamsResponse, GameRoomData, InGameRoomParams, IngameInput, InputAck,
    JoinGameRequest, JoinGameResponse, JoinRequest, JoinResponse, RoomCreationParameters,
    RoomParamChanged, json_bytes,
};
use minerace_common::board::Board;
use minerace_common::pipe::{PipeError, PipeSender};
use thiserror::Error;
use tokio::net::ToSocketAddrs;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

use crate::connection::Connection;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pipe(#[from] PipeError),
    #[error("malformed server payload: {0}")]
    BadPayload(#[from] serde_json::Error),
    #[error("request rejected by server: {0}")]
    Rejected(String),
    #[error("no board snapshot received from the server yet")]
    NotSynced,
}

/// Unsolicited push from the server, surfaced through the event channel
/// returned by [`GameClient::connect`].
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// New authoritative board, with the echo of the input it acknowledges.
    Newstate { ack: InputAck, board: Board },
    /// A room's parameters changed (players joined or left, game over).
    RoomParamsChanged { room_id: u32 },
}

/// Connection to a minerace server, exposing the request catalog as async
/// methods. All traffic multiplexes over one TCP connection.
pub struct GameClient {
    connection: Connection,
    pipe: PipeSender,
}

impl GameClient {
    /// Connect to a server. Also returns the channel on which unsolicited
    /// server pushes arrive.
    pub async fn connect(
        addr: impl ToSocketAddrs,
    ) -> Result<(Self, UnboundedReceiver<ServerEvent>), ClientError> {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        let connection = Connection::connect(addr, |pipe| {
            let events = event_sender.clone();
            pipe.on_notify(RequestKind::IngameNewstateAndAck, move |payload| {
                match api::decode_newstate_and_ack(payload) {
                    Ok((ack, board)) => {
                        let _ = events.send(ServerEvent::Newstate { ack, board });
                    }
                    Err(error) => warn!("dropping malformed board push: {}", error),
                }
            });

            let events = event_sender.clone();
            pipe.on_notify(RequestKind::IngameNotifyRoomParamChanged, move |payload| {
                match serde_json::from_slice::<RoomParamChanged>(payload) {
                    Ok(changed) => {
                        let _ = events.send(ServerEvent::RoomParamsChanged {
                            room_id: changed.room_id,
                        });
                    }
                    Err(error) => warn!("dropping malformed room-param push: {}", error),
                }
            });

            // Server-initiated liveness probe; the empty reply is the pong.
            pipe.on_request(RequestKind::Keepalive, |_| Vec::new());
        })
        .await?;

        let pipe = connection.sender();
        Ok((Self { connection, pipe }, event_receiver))
    }

    async fn roundtrip(&self, kind: RequestKind, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let receiver = self.pipe.request(kind, payload)?;
        receiver.await.map_err(|_| PipeError::NoReply.into())
    }

    /// Register a username with the server. Returns the assigned player id.
    pub async fn login(&self, username: &str) -> Result<u32, ClientError> {
        let request = JoinRequest {
            username: username.to_owned(),
        };
        let raw = self.roundtrip(RequestKind::Join, json_bytes(&request)).await?;
        let player_id = serde_json::from_slice::<JoinResponse>(&raw)?
            .into_result()
            .map_err(ClientError::Rejected)?;
        info!(username, player_id, "logged in");
        Ok(player_id)
    }

    pub async fn fetch_game_list(&self) -> Result<Vec<GameRoomData>, ClientError> {
        let raw = self
            .roundtrip(RequestKind::GetGameListing, Vec::new())
            .await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Create a room. Returns the new room id; the room starts empty, so the
    /// creator still has to join it.
    pub async fn create_game(&self, params: &RoomCreationParameters) -> Result<u32, ClientError> {
        let raw = self
            .roundtrip(RequestKind::CreateGame, json_bytes(params))
            .await?;
        serde_json::from_slice::<CreateGameResponse>(&raw)?
            .into_result()
            .map_err(ClientError::Rejected)
    }

    /// Take a seat in a room. Returns the room id and the assigned seat index.
    pub async fn join_game(&self, player_id: u32, room_id: u32) -> Result<(u32, u8), ClientError> {
        let request = JoinGameRequest { player_id, room_id };
        let raw = self
            .roundtrip(RequestKind::JoinGame, json_bytes(&request))
            .await?;
        serde_json::from_slice::<JoinGameResponse>(&raw)?
            .into_result()
            .map_err(ClientError::Rejected)
    }

    pub async fn fetch_room_params(&self, room_id: u32) -> Result<InGameRoomParams, ClientError> {
        let request = FetchRoomParamsRequest { room_id };
        let raw = self
            .roundtrip(RequestKind::IngameFetchRoomParams, json_bytes(&request))
            .await?;
        serde_json::from_slice::<FetchRoomParamsResponse>(&raw)?
            .into_result()
            .map_err(ClientError::Rejected)
    }

    /// Fire-and-forget board action. The server answers with a board
    /// broadcast to the whole room, not with a response frame.
    pub fn send_input(&self, input: &IngameInput) -> Result<(), ClientError> {
        self.pipe
            .notify(RequestKind::IngameInput, json_bytes(input))?;
        Ok(())
    }

    /// Ask the server to push a fresh board snapshot.
    pub fn request_newstate(&self, player_id: u32) -> Result<(), ClientError> {
        let request = ExplicitNewstateRequest { player_id };
        self.pipe.notify(
            RequestKind::IngameExplicitNewstateRequest,
            json_bytes(&request),
        )?;
        Ok(())
    }

    /// Probe the connection; resolves once the server answers.
    pub async fn keepalive(&self) -> Result<(), ClientError> {
        self.roundtrip(RequestKind::Keepalive, Vec::new()).await?;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_alive()
    }

    /// Register a callback fired when the connection dies.
    pub fn on_dead(&self, listener: impl FnMut() + Send + 'static) {
        self.pipe.on_dead(listener);
    }

    pub async fn disconnect(self) {
        self.connection.shutdown().await;
    }
}

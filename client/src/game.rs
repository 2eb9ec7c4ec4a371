use std::collections::HashMap;

use minerace_common::api::IngameInput;
use minerace_common::board::{Board, Input};
use minerace_common::predict::PredictionBuffer;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::client::{ClientError, GameClient, ServerEvent};

/// Game-level notification produced by [`ClientGame::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The predicted board changed; redraw.
    BoardUpdated,
    /// Room parameters changed; refetch them if displayed.
    RoomParamsChanged { room_id: u32 },
}

/// One seat in one room: wraps a [`GameClient`] with client-side prediction.
///
/// Clicks apply to the local board immediately and are reconciled against the
/// server's broadcasts as they arrive, so the player never waits on a
/// roundtrip to see the result of their own click.
pub struct ClientGame {
    client: GameClient,
    events: UnboundedReceiver<ServerEvent>,
    player_id: u32,
    room_id: u32,
    player_index: u8,
    buffer: Option<PredictionBuffer>,
}

impl ClientGame {
    /// Take a seat in `room_id` and request the initial board snapshot.
    pub async fn join(
        client: GameClient,
        events: UnboundedReceiver<ServerEvent>,
        player_id: u32,
        room_id: u32,
    ) -> Result<Self, ClientError> {
        let (room_id, player_index) = client.join_game(player_id, room_id).await?;
        client.request_newstate(player_id)?;
        Ok(Self {
            client,
            events,
            player_id,
            room_id,
            player_index,
            buffer: None,
        })
    }

    /// Apply a click locally and submit it to the server.
    ///
    /// Fails with [`ClientError::NotSynced`] until the first board snapshot
    /// has arrived.
    pub fn click(&mut self, x: u16, y: u16, button: u8) -> Result<u64, ClientError> {
        let Some(buffer) = &mut self.buffer else {
            return Err(ClientError::NotSynced);
        };
        let input_id = buffer.add_input(Input {
            x,
            y,
            button,
            player_index: self.player_index,
        });
        self.client.send_input(&IngameInput {
            x,
            y,
            button,
            player_index: self.player_index,
            input_id,
            room_id: self.room_id,
        })?;
        Ok(input_id)
    }

    /// Wait for the next server push and fold it into the local state.
    /// Returns `None` once the connection is gone.
    pub async fn next_event(&mut self) -> Option<GameEvent> {
        let event = self.events.recv().await?;
        Some(self.apply_event(event))
    }

    fn apply_event(&mut self, event: ServerEvent) -> GameEvent {
        match event {
            ServerEvent::Newstate { ack, board } => {
                match &mut self.buffer {
                    Some(buffer) => {
                        if ack.player_index == self.player_index {
                            debug!(input_id = ack.input_id, "server acknowledged own input");
                            buffer.ack_until(ack.input_id);
                        }
                        buffer.set_base_state(board);
                    }
                    None => self.buffer = Some(PredictionBuffer::new(board)),
                }
                GameEvent::BoardUpdated
            }
            ServerEvent::RoomParamsChanged { room_id } => GameEvent::RoomParamsChanged { room_id },
        }
    }

    /// Predicted board: the last server snapshot with all unacknowledged own
    /// inputs replayed on top. `None` until the first snapshot arrives.
    pub fn board(&mut self) -> Option<Board> {
        self.buffer.as_mut().map(PredictionBuffer::current_state)
    }

    /// Per-seat scores of the predicted board.
    pub fn scores(&mut self) -> HashMap<u8, i32> {
        self.board().map(|board| board.scores()).unwrap_or_default()
    }

    pub fn player_id(&self) -> u32 {
        self.player_id
    }

    pub fn room_id(&self) -> u32 {
        self.room_id
    }

    pub fn player_index(&self) -> u8 {
        self.player_index
    }

    pub fn client(&self) -> &GameClient {
        &self.client
    }

    pub async fn leave(self) {
        self.client.disconnect().await;
    }
}

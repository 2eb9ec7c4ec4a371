use minerace_common::api::{
    self, GameRoomData, InGameRoomParams, IngameInput, InputAck, RoomCreationParameters,
    RoomParamChanged, json_bytes,
};
use minerace_common::board::{Board, Players};
use minerace_common::pipe::PipeSender;
use minerace_common::RequestKind;
use tracing::{debug, info};

use crate::context::Rejection;

/// One occupied seat in a room.
pub struct Seat {
    pub player_id: u32,
    pub player_index: u8,
    pub username: String,
    pub pipe: PipeSender,
}

/// One match: the authoritative board plus the players seated at it.
///
/// Guarded by a mutex in the room table; every input of a room is applied
/// under that lock, which is what makes the server authoritative and the
/// input order total.
pub struct Room {
    room_id: u32,
    name: String,
    width: u16,
    height: u16,
    /// Mine probability as a percentage, as submitted at creation.
    mine_prob: f64,
    players: Players,
    seats: Vec<Seat>,
    board: Board,
    started: bool,
    game_active: bool,
    popup_message: String,
}

impl Room {
    /// Create the room and generate its board up front, so every joiner sees
    /// the same minefield. Two-player boards are mirrored for fairness;
    /// four-player boards are plain random.
    pub fn new(room_id: u32, params: &RoomCreationParameters, players: Players) -> Self {
        let probability = params.mine_prob / 100.0;
        let board = match players {
            Players::Two => Board::generate_symmetric(
                params.field_size_x,
                params.field_size_y,
                probability,
                players,
            ),
            Players::Four => Board::generate_random(
                params.field_size_x,
                params.field_size_y,
                probability,
                players,
            ),
        };

        Self {
            room_id,
            name: params.name.clone(),
            width: params.field_size_x,
            height: params.field_size_y,
            mine_prob: params.mine_prob,
            players,
            seats: Vec::new(),
            board,
            started: false,
            game_active: true,
            popup_message: String::new(),
        }
    }

    pub fn room_id(&self) -> u32 {
        self.room_id
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn has_player(&self, player_id: u32) -> bool {
        self.seats.iter().any(|seat| seat.player_id == player_id)
    }

    /// Seat a player, assigning the smallest free seat index. Re-joining is
    /// idempotent and returns the existing index.
    pub fn seat_player(
        &mut self,
        player_id: u32,
        username: String,
        pipe: PipeSender,
    ) -> Result<u8, Rejection> {
        if let Some(seat) = self.seats.iter().find(|seat| seat.player_id == player_id) {
            return Ok(seat.player_index);
        }
        if self.seats.len() >= self.players.count() as usize {
            return Err(Rejection::RoomFull);
        }

        let player_index = (1..=self.players.count())
            .find(|index| self.seats.iter().all(|seat| seat.player_index != *index))
            .unwrap_or(self.players.count());
        info!(
            room_id = self.room_id,
            player_id, username, player_index, "player seated"
        );
        self.seats.push(Seat {
            player_id,
            player_index,
            username,
            pipe,
        });
        self.notify_params_changed();
        Ok(player_index)
    }

    /// Remove a player's seat. Returns true when the room is empty afterwards
    /// and should be torn down.
    pub fn unseat_player(&mut self, player_id: u32) -> bool {
        let before = self.seats.len();
        self.seats.retain(|seat| seat.player_id != player_id);
        if self.seats.len() != before {
            info!(room_id = self.room_id, player_id, "player unseated");
            self.notify_params_changed();
        }
        self.seats.is_empty()
    }

    /// Apply one input to the board, broadcast the new snapshot to every seat
    /// and check for game end.
    pub fn apply_input(&mut self, input: &IngameInput) {
        if !self.game_active {
            debug!(room_id = self.room_id, "input after game end ignored");
            return;
        }

        self.board = self.board.apply(&input.input());
        self.started = true;
        self.broadcast_board(input.ack());
        self.check_game_end();
    }

    /// Push the current board to one player, with an empty acknowledgement.
    pub fn push_board_to(&self, player_id: u32) {
        let Some(seat) = self.seats.iter().find(|seat| seat.player_id == player_id) else {
            debug!(
                room_id = self.room_id,
                player_id, "board requested by player without a seat"
            );
            return;
        };
        let payload = api::encode_newstate_and_ack(&InputAck::none(), &self.board);
        if let Err(error) = seat.pipe.notify(RequestKind::IngameNewstateAndAck, payload) {
            debug!(
                room_id = self.room_id,
                player_id, "board push failed: {}", error
            );
        }
    }

    fn broadcast_board(&self, ack: InputAck) {
        let payload = api::encode_newstate_and_ack(&ack, &self.board);
        for seat in &self.seats {
            if let Err(error) = seat
                .pipe
                .notify(RequestKind::IngameNewstateAndAck, payload.clone())
            {
                debug!(
                    room_id = self.room_id,
                    player_id = seat.player_id,
                    "board broadcast failed: {}",
                    error
                );
            }
        }
    }

    fn check_game_end(&mut self) {
        let seated: Vec<u8> = self.seats.iter().map(|seat| seat.player_index).collect();
        if !self.board.all_opened(&seated) {
            return;
        }

        self.game_active = false;
        self.popup_message = self.final_score_message();
        info!(room_id = self.room_id, "game over: {}", self.popup_message);
        self.notify_params_changed();
    }

    fn final_score_message(&self) -> String {
        let scores = self.board.scores();
        let mut by_index: Vec<&Seat> = self.seats.iter().collect();
        by_index.sort_by_key(|seat| seat.player_index);

        let lines: Vec<String> = by_index
            .iter()
            .map(|seat| {
                let score = scores.get(&seat.player_index).copied().unwrap_or(0);
                format!("{}: {}", seat.username, score)
            })
            .collect();
        format!("Game over! Final scores:\n{}", lines.join("\n"))
    }

    /// Tell every seat the room parameters changed; clients refetch them.
    pub fn notify_params_changed(&self) {
        let payload = json_bytes(&RoomParamChanged {
            room_id: self.room_id,
        });
        for seat in &self.seats {
            if let Err(error) = seat
                .pipe
                .notify(RequestKind::IngameNotifyRoomParamChanged, payload.clone())
            {
                debug!(
                    room_id = self.room_id,
                    player_id = seat.player_id,
                    "room-param notification failed: {}",
                    error
                );
            }
        }
    }

    pub fn listing_entry(&self) -> GameRoomData {
        GameRoomData {
            name: self.name.clone(),
            parameters: format!("{}x{}@{:.3}%", self.width, self.height, self.mine_prob),
            room_id: self.room_id,
            current_players: self.seats.len() as u32,
            max_players: self.players.count() as u32,
            joinable: !self.started && self.seats.len() < self.players.count() as usize,
        }
    }

    pub fn room_params(&self) -> InGameRoomParams {
        InGameRoomParams {
            player_index_mapping: self
                .seats
                .iter()
                .map(|seat| (seat.player_index, seat.player_id))
                .collect(),
            player_names_mapping: self
                .seats
                .iter()
                .map(|seat| (seat.player_index, seat.username.clone()))
                .collect(),
            field_size_x: self.width,
            field_size_y: self.height,
            max_players: self.players.count(),
            game_active: self.game_active,
            popup_message: self.popup_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerace_common::Frame;
    use minerace_common::Pipe;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn test_pipe() -> (PipeSender, UnboundedReceiver<Vec<u8>>) {
        let (outgoing, written) = mpsc::unbounded_channel();
        (Pipe::new(outgoing).sender(), written)
    }

    fn test_room(max_players: u8) -> Room {
        Room::new(
            2001,
            &RoomCreationParameters {
                name: "unit room".into(),
                field_size_x: 10,
                field_size_y: 10,
                mine_prob: 5.0,
                max_players,
            },
            Players::from_count(max_players).unwrap(),
        )
    }

    fn received_kinds(written: &mut UnboundedReceiver<Vec<u8>>) -> Vec<u16> {
        let mut kinds = Vec::new();
        let mut buffer = Vec::new();
        while let Ok(chunk) = written.try_recv() {
            buffer.extend_from_slice(&chunk);
        }
        let mut offset = 0;
        while offset < buffer.len() {
            let (frame, consumed) = Frame::decode(&buffer[offset..]).unwrap().unwrap();
            kinds.push(frame.request_type);
            offset += consumed;
        }
        kinds
    }

    #[test]
    fn seats_get_the_smallest_free_index() {
        let mut room = test_room(4);
        let (pipe, _written) = test_pipe();

        assert_eq!(room.seat_player(1001, "a".into(), pipe.clone()), Ok(1));
        assert_eq!(room.seat_player(1002, "b".into(), pipe.clone()), Ok(2));
        assert_eq!(room.seat_player(1003, "c".into(), pipe.clone()), Ok(3));

        room.unseat_player(1002);
        assert_eq!(room.seat_player(1004, "d".into(), pipe.clone()), Ok(2));
        // Re-joining gives back the existing seat.
        assert_eq!(room.seat_player(1001, "a".into(), pipe), Ok(1));
    }

    #[test]
    fn full_room_rejects_joiners() {
        let mut room = test_room(2);
        let (pipe, _written) = test_pipe();

        room.seat_player(1001, "a".into(), pipe.clone()).unwrap();
        room.seat_player(1002, "b".into(), pipe.clone()).unwrap();

        let rejection = room.seat_player(1003, "c".into(), pipe).unwrap_err();
        assert_eq!(rejection, Rejection::RoomFull);
        assert_eq!(rejection.to_string(), "Room full!");
    }

    #[test]
    fn listing_entry_formats_parameters() {
        let mut room = test_room(2);
        let entry = room.listing_entry();
        assert_eq!(entry.parameters, "10x10@5.000%");
        assert_eq!(entry.room_id, 2001);
        assert_eq!(entry.current_players, 0);
        assert_eq!(entry.max_players, 2);
        assert!(entry.joinable);

        let (pipe, _written) = test_pipe();
        room.seat_player(1001, "a".into(), pipe.clone()).unwrap();
        room.seat_player(1002, "b".into(), pipe).unwrap();
        assert!(!room.listing_entry().joinable);
    }

    #[test]
    fn joins_and_inputs_are_broadcast_to_seats() {
        let mut room = test_room(2);
        let (pipe_a, mut written_a) = test_pipe();
        let (pipe_b, mut written_b) = test_pipe();

        room.seat_player(1001, "a".into(), pipe_a).unwrap();
        room.seat_player(1002, "b".into(), pipe_b).unwrap();
        // a saw both join notifications, b only its own.
        assert_eq!(
            received_kinds(&mut written_a),
            vec![
                RequestKind::IngameNotifyRoomParamChanged.code(),
                RequestKind::IngameNotifyRoomParamChanged.code()
            ]
        );
        assert_eq!(
            received_kinds(&mut written_b),
            vec![RequestKind::IngameNotifyRoomParamChanged.code()]
        );

        room.apply_input(&IngameInput {
            x: 0,
            y: 0,
            button: 1,
            player_index: 1,
            input_id: 4001,
            room_id: 2001,
        });
        assert_eq!(
            received_kinds(&mut written_a),
            vec![RequestKind::IngameNewstateAndAck.code()]
        );
        assert_eq!(
            received_kinds(&mut written_b),
            vec![RequestKind::IngameNewstateAndAck.code()]
        );
    }

    #[test]
    fn broadcast_echoes_the_triggering_input() {
        let mut room = test_room(2);
        let (pipe, mut written) = test_pipe();
        room.seat_player(1001, "a".into(), pipe).unwrap();
        let _ = received_kinds(&mut written);

        room.apply_input(&IngameInput {
            x: 0,
            y: 3,
            button: 1,
            player_index: 1,
            input_id: 4007,
            room_id: 2001,
        });

        let mut buffer = Vec::new();
        while let Ok(chunk) = written.try_recv() {
            buffer.extend_from_slice(&chunk);
        }
        let (frame, _) = Frame::decode(&buffer).unwrap().unwrap();
        let (ack, board) = api::decode_newstate_and_ack(&frame.payload).unwrap();
        assert_eq!(
            ack,
            InputAck {
                player_index: 1,
                input_id: 4007
            }
        );
        assert_eq!(board.width(), 10);
    }

    #[test]
    fn explicit_push_carries_an_empty_ack() {
        let mut room = test_room(2);
        let (pipe, mut written) = test_pipe();
        room.seat_player(1001, "a".into(), pipe).unwrap();
        let _ = received_kinds(&mut written);

        room.push_board_to(1001);

        let mut buffer = Vec::new();
        while let Ok(chunk) = written.try_recv() {
            buffer.extend_from_slice(&chunk);
        }
        let (frame, _) = Frame::decode(&buffer).unwrap().unwrap();
        let (ack, _board) = api::decode_newstate_and_ack(&frame.payload).unwrap();
        assert_eq!(ack, InputAck::none());
    }

    #[test]
    fn game_ends_when_every_reachable_cell_is_open() {
        let mut room = test_room(2);
        // Replace the random board with a deterministic mine-free one so a
        // single flood fill per player finishes the game.
        room.board = Board::from_mine_map(4, 4, &[false; 16], Players::Two);
        let (pipe, _written) = test_pipe();
        room.seat_player(1001, "alice".into(), pipe.clone()).unwrap();
        room.seat_player(1002, "bob".into(), pipe).unwrap();

        room.apply_input(&IngameInput {
            x: 0,
            y: 0,
            button: 1,
            player_index: 1,
            input_id: 4001,
            room_id: 2001,
        });
        // Player 2's starting column is still closed, so the game goes on.
        assert!(room.room_params().game_active);

        room.apply_input(&IngameInput {
            x: 3,
            y: 0,
            button: 1,
            player_index: 2,
            input_id: 4002,
            room_id: 2001,
        });
        assert!(!room.room_params().game_active);
        assert!(room.room_params().popup_message.contains("alice"));
        assert!(room.room_params().popup_message.contains("bob"));

        // Inputs after game end change nothing.
        let frozen = room.board.clone();
        room.apply_input(&IngameInput {
            x: 1,
            y: 1,
            button: 2,
            player_index: 2,
            input_id: 4003,
            room_id: 2001,
        });
        assert_eq!(room.board, frozen);
    }

    #[test]
    fn room_params_map_seats_to_ids_and_names() {
        let mut room = test_room(2);
        let (pipe, _written) = test_pipe();
        room.seat_player(1001, "alice".into(), pipe.clone()).unwrap();
        room.seat_player(1002, "bob".into(), pipe).unwrap();

        let params = room.room_params();
        assert_eq!(params.player_index_mapping.get(&1), Some(&1001));
        assert_eq!(params.player_names_mapping.get(&2), Some(&"bob".to_string()));
        assert_eq!(params.field_size_x, 10);
        assert_eq!(params.max_players, 2);
        assert!(params.game_active);
        assert!(params.popup_message.is_empty());
    }
}

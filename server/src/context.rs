use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use minerace_common::api::{GameRoomData, RoomCreationParameters};
use minerace_common::board::Players;
use minerace_common::pipe::PipeSender;
use thiserror::Error;
use tracing::info;

use crate::room::Room;

/// A request the server refuses. The messages are part of the wire contract;
/// clients display them verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Duplicate username! Please choose another name.")]
    DuplicateUsername,
    #[error("Room full!")]
    RoomFull,
    #[error("WHAT? Invalid room id")]
    InvalidRoomId,
    #[error("WHAT? Invalid user id")]
    InvalidUserId,
    #[error("Unsupported player count {0}, must be 2 or 4")]
    UnsupportedPlayerCount(u8),
    #[error("Unsupported board size {0}x{1}, dimensions must be nonzero")]
    UnsupportedBoardSize(u16, u16),
    #[error("Already logged in!")]
    AlreadyLoggedIn,
}

/// A logged-in player, with the pipe back to their connection.
pub struct Player {
    pub player_id: u32,
    pub username: String,
    pub pipe: PipeSender,
}

pub type SharedRoom = Arc<Mutex<Room>>;

const FIRST_PLAYER_ID: u32 = 1001;
const FIRST_ROOM_ID: u32 = 2001;

/// All server-global state: the player registry and the room table.
/// Shared across every connection task behind one `Arc`.
pub struct ServerContext {
    players: DashMap<u32, Player>,
    rooms: DashMap<u32, SharedRoom>,
    next_player_id: AtomicU32,
    next_room_id: AtomicU32,
    /// Serializes the duplicate-username check against the insert.
    registration: Mutex<()>,
}

impl ServerContext {
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            rooms: DashMap::new(),
            next_player_id: AtomicU32::new(FIRST_PLAYER_ID),
            next_room_id: AtomicU32::new(FIRST_ROOM_ID),
            registration: Mutex::new(()),
        }
    }

    /// Register a username and hand out a fresh player id. Usernames are
    /// unique across the whole server.
    pub fn register_player(&self, username: &str, pipe: PipeSender) -> Result<u32, Rejection> {
        let _guard = self
            .registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self
            .players
            .iter()
            .any(|player| player.username == username)
        {
            return Err(Rejection::DuplicateUsername);
        }

        let player_id = self.next_player_id.fetch_add(1, Ordering::Relaxed);
        self.players.insert(
            player_id,
            Player {
                player_id,
                username: username.to_owned(),
                pipe,
            },
        );
        info!(username, player_id, "player registered");
        Ok(player_id)
    }

    /// Look up a player's username and pipe.
    pub fn player(&self, player_id: u32) -> Result<(String, PipeSender), Rejection> {
        self.players
            .get(&player_id)
            .map(|player| (player.username.clone(), player.pipe.clone()))
            .ok_or(Rejection::InvalidUserId)
    }

    /// Create an empty room with a freshly generated board.
    pub fn create_room(&self, params: &RoomCreationParameters) -> Result<u32, Rejection> {
        let players = Players::from_count(params.max_players)
            .ok_or(Rejection::UnsupportedPlayerCount(params.max_players))?;
        if params.field_size_x == 0 || params.field_size_y == 0 {
            return Err(Rejection::UnsupportedBoardSize(
                params.field_size_x,
                params.field_size_y,
            ));
        }

        let room_id = self.next_room_id.fetch_add(1, Ordering::Relaxed);
        let room = Room::new(room_id, params, players);
        self.rooms.insert(room_id, Arc::new(Mutex::new(room)));
        info!(
            room_id,
            name = params.name,
            width = params.field_size_x,
            height = params.field_size_y,
            mine_prob = params.mine_prob,
            max_players = params.max_players,
            "room created"
        );
        Ok(room_id)
    }

    pub fn room(&self, room_id: u32) -> Result<SharedRoom, Rejection> {
        self.rooms
            .get(&room_id)
            .map(|room| room.clone())
            .ok_or(Rejection::InvalidRoomId)
    }

    /// The room the player currently sits in, if any.
    pub fn room_of_player(&self, player_id: u32) -> Option<SharedRoom> {
        self.rooms.iter().map(|entry| entry.value().clone()).find(|room| {
            room.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .has_player(player_id)
        })
    }

    /// Lobby listing of every room, newest last.
    pub fn game_listing(&self) -> Vec<GameRoomData> {
        let mut listing: Vec<GameRoomData> = self
            .rooms
            .iter()
            .map(|entry| {
                entry
                    .value()
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .listing_entry()
            })
            .collect();
        listing.sort_by_key(|room| room.room_id);
        listing
    }

    /// Drop a disconnected player: registry entry, seat, and any room that
    /// ends up empty.
    pub fn disconnect_player(&self, player_id: u32) {
        if let Some((_, player)) = self.players.remove(&player_id) {
            info!(player_id, username = player.username, "player disconnected");
        }

        let mut empty_rooms = Vec::new();
        for entry in self.rooms.iter() {
            let mut room = entry
                .value()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if room.has_player(player_id) && room.unseat_player(player_id) {
                empty_rooms.push(room.room_id());
            }
        }
        for room_id in empty_rooms {
            self.rooms.remove(&room_id);
            info!(room_id, "empty room torn down");
        }
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn test_pipe() -> PipeSender {
        let (outgoing, _incoming) = mpsc::unbounded_channel();
        minerace_common::Pipe::new(outgoing).sender()
    }

    fn params(max_players: u8) -> RoomCreationParameters {
        RoomCreationParameters {
            name: "test room".into(),
            field_size_x: 10,
            field_size_y: 10,
            mine_prob: 5.0,
            max_players,
        }
    }

    #[test]
    fn player_ids_start_at_1001() {
        let context = ServerContext::new();
        assert_eq!(context.register_player("alice", test_pipe()), Ok(1001));
        assert_eq!(context.register_player("bob", test_pipe()), Ok(1002));
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let context = ServerContext::new();
        context.register_player("alice", test_pipe()).unwrap();

        let rejection = context.register_player("alice", test_pipe()).unwrap_err();
        assert_eq!(rejection, Rejection::DuplicateUsername);
        assert_eq!(
            rejection.to_string(),
            "Duplicate username! Please choose another name."
        );
    }

    #[test]
    fn room_ids_start_at_2001() {
        let context = ServerContext::new();
        assert_eq!(context.create_room(&params(2)), Ok(2001));
        assert_eq!(context.create_room(&params(4)), Ok(2002));
    }

    #[test]
    fn odd_player_counts_are_rejected() {
        let context = ServerContext::new();
        assert_eq!(
            context.create_room(&params(3)),
            Err(Rejection::UnsupportedPlayerCount(3))
        );
    }

    #[test]
    fn zero_dimension_boards_are_rejected() {
        let context = ServerContext::new();

        let mut flat = params(2);
        flat.field_size_x = 0;
        assert_eq!(
            context.create_room(&flat),
            Err(Rejection::UnsupportedBoardSize(0, 10))
        );

        let mut thin = params(4);
        thin.field_size_y = 0;
        assert_eq!(
            context.create_room(&thin),
            Err(Rejection::UnsupportedBoardSize(10, 0))
        );

        // The rejected attempts consumed no room ids.
        assert_eq!(context.create_room(&params(2)), Ok(2001));
    }

    #[test]
    fn unknown_ids_are_rejected_with_wire_messages() {
        let context = ServerContext::new();
        assert_eq!(
            context.room(42).map(|_| ()).unwrap_err().to_string(),
            "WHAT? Invalid room id"
        );
        assert_eq!(
            context.player(42).map(|_| ()).unwrap_err().to_string(),
            "WHAT? Invalid user id"
        );
    }

    #[test]
    fn disconnect_tears_down_empty_rooms() {
        let context = ServerContext::new();
        let player_id = context.register_player("alice", test_pipe()).unwrap();
        let room_id = context.create_room(&params(2)).unwrap();

        {
            let room = context.room(room_id).unwrap();
            let mut room = room.lock().unwrap();
            room.seat_player(player_id, "alice".into(), test_pipe())
                .unwrap();
        }
        assert!(context.room_of_player(player_id).is_some());

        context.disconnect_player(player_id);
        assert!(context.room(room_id).is_err());
        assert!(context.player(player_id).is_err());
    }
}

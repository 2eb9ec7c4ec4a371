//! Client library for the minerace multiplayer server.
//!
//! Two levels of API:
//! - [`GameClient`]: the raw request catalog (login, lobby, room management)
//!   plus a channel of unsolicited server pushes.
//! - [`ClientGame`]: one seat in one room, with client-side prediction; clicks
//!   apply locally right away and reconcile against server broadcasts.
//!
//! ```no_run
//! use minerace_client::{ClientGame, GameClient, RoomCreationParameters};
//!
//! # async fn run() -> Result<(), minerace_client::ClientError> {
//! let (client, events) = GameClient::connect("localhost:7849").await?;
//! let player_id = client.login("alice").await?;
//! let room_id = client
//!     .create_game(&RoomCreationParameters {
//!         name: "my room".into(),
//!         field_size_x: 10,
//!         field_size_y: 10,
//!         mine_prob: 5.0,
//!         max_players: 2,
//!     })
//!     .await?;
//! let mut game = ClientGame::join(client, events, player_id, room_id).await?;
//! while let Some(event) = game.next_event().await {
//!     // redraw from game.board()
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
mod game;

pub use client::{ClientError, GameClient, ServerEvent};
pub use connection::Connection;
pub use game::{ClientGame, GameEvent};

/// Shorthand for results carrying a [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;

pub use minerace_common::api::{
    GameRoomData, InGameRoomParams, IngameInput, InputAck, RoomCreationParameters,
};
pub use minerace_common::board::{Board, Cell, CellState, Input, Players};

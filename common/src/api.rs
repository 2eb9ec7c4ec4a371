use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, BoardError, Input};

/// Closed set of request types carried in the frame header.
///
/// The numeric codes are part of the wire contract; both sides must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RequestKind {
    Join = 10,
    GetGameListing = 20,
    CreateGame = 21,
    JoinGame = 31,
    IngameInput = 100,
    IngameNewstateAndAck = 110,
    IngameNotifyRoomParamChanged = 112,
    IngameFetchRoomParams = 113,
    IngameExplicitNewstateRequest = 114,
    Keepalive = 200,
}

impl RequestKind {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            10 => Some(Self::Join),
            20 => Some(Self::GetGameListing),
            21 => Some(Self::CreateGame),
            31 => Some(Self::JoinGame),
            100 => Some(Self::IngameInput),
            110 => Some(Self::IngameNewstateAndAck),
            112 => Some(Self::IngameNotifyRoomParamChanged),
            113 => Some(Self::IngameFetchRoomParams),
            114 => Some(Self::IngameExplicitNewstateRequest),
            200 => Some(Self::Keepalive),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("composite payload has no separator byte")]
    MissingSeparator,
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Serialize a payload struct to JSON bytes. Message types in this module
/// cannot fail to serialize; an empty payload on the wire would surface as a
/// JSON error on the peer.
pub fn json_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum JoinResponse {
    Ok { success: bool, player_id: u32 },
    Failure { success: bool, failure_reason: String },
}

impl JoinResponse {
    pub fn ok(player_id: u32) -> Self {
        Self::Ok {
            success: true,
            player_id,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            failure_reason: reason.into(),
        }
    }

    pub fn into_result(self) -> Result<u32, String> {
        match self {
            Self::Ok { player_id, .. } => Ok(player_id),
            Self::Failure { failure_reason, .. } => Err(failure_reason),
        }
    }
}

/// One row of the lobby's game listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRoomData {
    pub name: String,
    /// Display string, e.g. `10x10@5.000%`.
    pub parameters: String,
    pub room_id: u32,
    pub current_players: u32,
    pub max_players: u32,
    pub joinable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomCreationParameters {
    pub name: String,
    pub field_size_x: u16,
    pub field_size_y: u16,
    /// Mine probability as a percentage (5.0 means 5%).
    pub mine_prob: f64,
    pub max_players: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CreateGameResponse {
    Ok { success: bool, created_room_id: u32 },
    Failure { success: bool, failure_reason: String },
}

impl CreateGameResponse {
    pub fn ok(created_room_id: u32) -> Self {
        Self::Ok {
            success: true,
            created_room_id,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            failure_reason: reason.into(),
        }
    }

    pub fn into_result(self) -> Result<u32, String> {
        match self {
            Self::Ok { created_room_id, .. } => Ok(created_room_id),
            Self::Failure { failure_reason, .. } => Err(failure_reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinGameRequest {
    pub player_id: u32,
    pub room_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum JoinGameResponse {
    Ok {
        success: bool,
        room_id: u32,
        player_index: u8,
    },
    Failure {
        success: bool,
        failure_reason: String,
    },
}

impl JoinGameResponse {
    pub fn ok(room_id: u32, player_index: u8) -> Self {
        Self::Ok {
            success: true,
            room_id,
            player_index,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            failure_reason: reason.into(),
        }
    }

    pub fn into_result(self) -> Result<(u32, u8), String> {
        match self {
            Self::Ok {
                room_id,
                player_index,
                ..
            } => Ok((room_id, player_index)),
            Self::Failure { failure_reason, .. } => Err(failure_reason),
        }
    }
}

/// A player action as submitted over the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngameInput {
    pub x: u16,
    pub y: u16,
    pub button: u8,
    pub player_index: u8,
    pub input_id: u64,
    pub room_id: u32,
}

impl IngameInput {
    pub fn input(&self) -> Input {
        Input {
            x: self.x,
            y: self.y,
            button: self.button,
            player_index: self.player_index,
        }
    }

    pub fn ack(&self) -> InputAck {
        InputAck {
            player_index: self.player_index,
            input_id: self.input_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomParamChanged {
    pub room_id: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchRoomParamsRequest {
    pub room_id: u32,
}

/// In-game room parameters ("igrp"): seat/name mappings plus board shape and
/// the room's lifecycle flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InGameRoomParams {
    pub player_index_mapping: BTreeMap<u8, u32>,
    pub player_names_mapping: BTreeMap<u8, String>,
    pub field_size_x: u16,
    pub field_size_y: u16,
    pub max_players: u8,
    pub game_active: bool,
    pub popup_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FetchRoomParamsResponse {
    Ok {
        success: bool,
        igrp: InGameRoomParams,
    },
    Failure {
        success: bool,
        failure_reason: String,
    },
}

impl FetchRoomParamsResponse {
    pub fn ok(igrp: InGameRoomParams) -> Self {
        Self::Ok {
            success: true,
            igrp,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            failure_reason: reason.into(),
        }
    }

    pub fn into_result(self) -> Result<InGameRoomParams, String> {
        match self {
            Self::Ok { igrp, .. } => Ok(igrp),
            Self::Failure { failure_reason, .. } => Err(failure_reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplicitNewstateRequest {
    pub player_id: u32,
}

/// Echo of the input a board broadcast acknowledges. A zero echo
/// (player_index 0) acknowledges nothing; it is used for pushes that were not
/// triggered by a player input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputAck {
    pub player_index: u8,
    pub input_id: u64,
}

impl InputAck {
    pub const fn none() -> Self {
        Self {
            player_index: 0,
            input_id: 0,
        }
    }
}

/// Composite NEWSTATE_AND_ACK payload: JSON-encoded [`InputAck`], one NUL
/// byte, then the serialized board. The NUL separator is unambiguous because
/// serde_json escapes control characters inside strings.
pub fn encode_newstate_and_ack(ack: &InputAck, board: &Board) -> Vec<u8> {
    let mut payload = json_bytes(ack);
    payload.push(0x00);
    payload.extend_from_slice(&board.to_bytes());
    payload
}

pub fn decode_newstate_and_ack(payload: &[u8]) -> Result<(InputAck, Board), ApiError> {
    let separator = payload
        .iter()
        .position(|&byte| byte == 0x00)
        .ok_or(ApiError::MissingSeparator)?;
    let ack: InputAck = serde_json::from_slice(&payload[..separator])?;
    let board = Board::from_bytes(&payload[separator + 1..])?;
    Ok((ack, board))
}

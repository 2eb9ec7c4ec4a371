//! Shared core for the minerace client and server.
//!
//! Layered bottom-up: [`frame`] is the pure length-framed codec, [`pipe`]
//! multiplexes request/response traffic over one byte-stream connection,
//! [`api`] is the request catalog both sides speak, [`board`] is the
//! deterministic board-state engine and [`predict`] the client-side
//! prediction/reconciliation buffer on top of it. Nothing in this crate
//! touches a socket; transports are injected by the client and server crates.

pub mod api;
pub mod board;
pub mod frame;
pub mod pipe;
pub mod predict;

pub use api::RequestKind;
pub use board::{Board, Cell, CellState, Input, Players};
pub use frame::Frame;
pub use pipe::{Pipe, PipeError, PipeSender, SendPolicy};
pub use predict::PredictionBuffer;

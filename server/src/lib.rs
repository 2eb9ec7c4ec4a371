//! Authoritative server for minerace matches.
//!
//! Connections speak the length-framed pipe protocol from
//! `minerace_common`; each one is served by [`session::run_connection`].
//! All shared state lives in [`context::ServerContext`]: the player registry
//! and the room table, with one mutex per room.

pub mod context;
pub mod room;
pub mod session;

pub use context::{Rejection, ServerContext};
pub use room::Room;

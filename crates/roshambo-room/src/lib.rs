//! Room management: lobby lifecycle, timed rounds, scoring, chat, and
//! the actor/registry machinery that runs each room in its own task.
//!
//! The layering is strict:
//!
//! - [`Room`] is a synchronous state machine. Every mutation returns the
//!   events it produced (or an error), and it never touches a socket or
//!   a clock beyond reading instants it is handed.
//! - The room actor (see [`RoomHandle`]) owns one `Room` plus its timer
//!   slots inside a tokio task and serializes all access through a
//!   command channel.
//! - [`RoomRegistry`] spawns actors and maps public room codes to them.

mod actor;
mod chat;
mod config;
mod error;
mod registry;
mod room;

pub use actor::{EventSender, JoinReply, RoomHandle, RoomInfo};
pub use chat::ChatLog;
pub use config::{Phase, RoomConfig};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Events, Player, Room};

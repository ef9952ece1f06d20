//! Session layer: which connection is which player, and in which room.
//!
//! Connection ids are transient; player identity is stable. This crate
//! owns the mapping between the two so a dropped socket can be traced
//! back to its room, and a rejoining player can be bound to the seat
//! they already hold. Grace-period bookkeeping for disconnected players
//! lives with the room roster, not here: a session exists exactly as
//! long as its connection does.

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::Session;

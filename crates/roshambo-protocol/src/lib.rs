//! Wire protocol for Roshambo.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`Choice`], [`Outcome`],
//!   payload structs): the values that travel on the wire.
//! - **Intents** ([`ClientIntent`]): everything a browser may ask for.
//! - **Events** ([`ServerEvent`]): everything the server may push.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are
//!   converted to and from WebSocket text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! The protocol layer sits between transport (text frames) and the room
//! layer (game state). It knows nothing about connections or rooms, only
//! how messages are shaped.
//!
//! Every message is a single JSON object with a kebab-case `type` tag, so
//! a browser client can dispatch on `msg.type` directly.

mod codec;
mod error;
mod event;
mod intent;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::ServerEvent;
pub use intent::ClientIntent;
pub use types::{
    ChatEntry, Choice, LeaderboardEntry, MessageId, Outcome, PlayerId,
    PlayerInfo, Recipient, RoomCode, RoomId,
};

//! # Roshambo
//!
//! Server for a browser-based real-time rock-paper-scissors party game:
//! code-joined rooms, simultaneous timed rounds with random pairing,
//! cumulative scoring to a win threshold, reconnection grace, and
//! host-moderated chat.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use roshambo::RoshamboServer;
//!
//! # async fn run() -> Result<(), roshambo::RoshamboError> {
//! let server = RoshamboServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .public_url("https://play.example.com")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::RoshamboError;
pub use server::{RoshamboServer, RoshamboServerBuilder};

pub use roshambo_room::RoomConfig;

//! Pure game logic for Roshambo.
//!
//! Everything here is synchronous and side-effect free: given choices and
//! rosters, compute outcomes, pairings, and standings. The room actor owns
//! all state and timing; this crate only answers questions.

mod leaderboard;
mod outcome;
mod pairing;

pub use leaderboard::{build_leaderboard, winners};
pub use outcome::{resolve, resolve_submissions};
pub use pairing::Pairings;

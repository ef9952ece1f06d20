//! Deadline slots for Roshambo's round scheduler.
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming a slot that
//! already has a deadline replaces it, so a room can never accumulate two
//! competing round timers. An unarmed slot pends forever, which makes it
//! safe to keep in a `tokio::select!` loop unconditionally.
//!
//! # Integration
//!
//! Each slot is owned by a single room actor and lives inside its
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = round_timer.fired() => { /* resolve the round */ }
//!         _ = results_timer.fired() => { /* start the next round */ }
//!     }
//! }
//! ```
//!
//! Because the slot is actor-local, tearing the actor down drops every
//! pending deadline with it. There is no callback registry to leak.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// A single-occupancy deadline.
///
/// `label` only feeds trace logging, so collisions are harmless.
#[derive(Debug)]
pub struct TimerSlot {
    label: &'static str,
    deadline: Option<Instant>,
}

impl TimerSlot {
    /// Creates an unarmed slot.
    pub fn new(label: &'static str) -> Self {
        Self { label, deadline: None }
    }

    /// Arms the slot to fire after `duration`, replacing any pending
    /// deadline.
    pub fn arm(&mut self, duration: Duration) {
        self.deadline = Some(Instant::now() + duration);
        trace!(slot = self.label, ?duration, "timer armed");
    }

    /// Disarms the slot. Returns whether a deadline was actually pending,
    /// so callers can tell a real cancellation from a no-op.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.deadline.take().is_some();
        if was_armed {
            trace!(slot = self.label, "timer cancelled");
        }
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits for the deadline and disarms the slot on firing.
    ///
    /// When the slot is unarmed this future never resolves; inside a
    /// `select!` the other branches still run. The slot disarms itself
    /// before returning, so a fired deadline cannot fire twice.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
                trace!(slot = self.label, "timer fired");
            }
            None => {
                // Never completes; select! handles the other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

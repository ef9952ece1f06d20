//! Integration tests for the deadline slot.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) so sleeps resolve
//! deterministically when the test advances the clock.

use std::time::Duration;

use roshambo_timer::TimerSlot;

// =========================================================================
// Arming and firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_armed_slot_fires_after_duration() {
    let mut slot = TimerSlot::new("round");
    slot.arm(Duration::from_secs(30));
    assert!(slot.is_armed());

    slot.fired().await;
    assert!(!slot.is_armed(), "slot should disarm itself after firing");
}

#[tokio::test(start_paused = true)]
async fn test_unarmed_slot_pends_forever() {
    let mut slot = TimerSlot::new("round");

    let result =
        tokio::time::timeout(Duration::from_secs(300), slot.fired()).await;
    assert!(result.is_err(), "unarmed slot should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_slot_does_not_fire_early() {
    let mut slot = TimerSlot::new("round");
    slot.arm(Duration::from_secs(30));

    let result =
        tokio::time::timeout(Duration::from_secs(29), slot.fired()).await;
    assert!(result.is_err(), "slot must not fire before its deadline");
    assert!(slot.is_armed(), "an unfired slot stays armed");
}

// =========================================================================
// Cancel / re-arm
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_slot_never_fires() {
    let mut slot = TimerSlot::new("round");
    slot.arm(Duration::from_secs(5));

    assert!(slot.cancel(), "cancel of an armed slot reports true");
    assert!(!slot.is_armed());

    let result =
        tokio::time::timeout(Duration::from_secs(60), slot.fired()).await;
    assert!(result.is_err(), "cancelled slot should pend forever");
}

#[test]
fn test_cancel_of_unarmed_slot_is_a_noop() {
    let mut slot = TimerSlot::new("results");
    assert!(!slot.cancel());
}

#[tokio::test(start_paused = true)]
async fn test_rearming_replaces_the_pending_deadline() {
    let mut slot = TimerSlot::new("round");
    slot.arm(Duration::from_secs(5));
    // Supersede with a longer deadline: the old 5 s one must not fire.
    slot.arm(Duration::from_secs(60));

    let result =
        tokio::time::timeout(Duration::from_secs(30), slot.fired()).await;
    assert!(result.is_err(), "superseded deadline must not fire");

    slot.fired().await;
    assert!(!slot.is_armed());
}

// =========================================================================
// select! integration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_losing_a_select_keeps_the_slot_armed() {
    // A command arriving before the deadline wins the select!; the slot
    // must stay armed so the round still resolves later.
    let mut slot = TimerSlot::new("round");
    slot.arm(Duration::from_secs(30));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send("make-choice").unwrap();

    tokio::select! {
        cmd = rx.recv() => assert_eq!(cmd, Some("make-choice")),
        _ = slot.fired() => panic!("timer should not have fired yet"),
    }

    assert!(slot.is_armed());
    slot.fired().await;
}

#[tokio::test(start_paused = true)]
async fn test_two_slots_fire_independently() {
    let mut round = TimerSlot::new("round");
    let mut results = TimerSlot::new("results");
    round.arm(Duration::from_secs(30));
    results.arm(Duration::from_secs(5));

    tokio::select! {
        _ = round.fired() => panic!("results deadline is sooner"),
        _ = results.fired() => {}
    }

    assert!(round.is_armed());
    assert!(!results.is_armed());
}

//! Standings and win-threshold checks.

use roshambo_protocol::LeaderboardEntry;

/// Sorts entries into display order: wins descending, then username
/// ascending so equal scores render stably.
pub fn build_leaderboard(
    entries: impl IntoIterator<Item = LeaderboardEntry>,
) -> Vec<LeaderboardEntry> {
    let mut board: Vec<_> = entries.into_iter().collect();
    board.sort_by(|a, b| {
        b.wins.cmp(&a.wins).then_with(|| a.username.cmp(&b.username))
    });
    board
}

/// Usernames of every player who has reached the win threshold.
///
/// Empty when nobody has; more than one entry when several players cross
/// the line in the same round.
pub fn winners(board: &[LeaderboardEntry], threshold: u32) -> Vec<String> {
    board
        .iter()
        .filter(|e| e.wins >= threshold)
        .map(|e| e.username.clone())
        .collect()
}

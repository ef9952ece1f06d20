//! Round pairing generation.

use rand::seq::SliceRandom;
use roshambo_protocol::PlayerId;

/// The pairings for one round: disjoint pairs plus at most one bye.
///
/// Computed once at round start from the non-host players present, then
/// held fixed for the round. A player disconnecting mid-round stays
/// paired; the no-show rule settles their match at resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairings {
    pairs: Vec<(PlayerId, PlayerId)>,
    bye: Option<PlayerId>,
}

impl Pairings {
    /// Pairs the given players uniformly at random.
    ///
    /// An odd count leaves one player as the bye. Zero or one player
    /// yields zero pairs (and, for one, a bye).
    pub fn generate(players: &[PlayerId]) -> Self {
        let mut shuffled = players.to_vec();
        shuffled.shuffle(&mut rand::rng());

        let mut pairs = Vec::with_capacity(shuffled.len() / 2);
        let mut chunks = shuffled.chunks_exact(2);
        for chunk in &mut chunks {
            pairs.push((chunk[0], chunk[1]));
        }
        let bye = chunks.remainder().first().copied();

        Self { pairs, bye }
    }

    /// An empty pairing set, used outside of rounds.
    pub fn empty() -> Self {
        Self { pairs: Vec::new(), bye: None }
    }

    pub fn pairs(&self) -> &[(PlayerId, PlayerId)] {
        &self.pairs
    }

    pub fn bye(&self) -> Option<PlayerId> {
        self.bye
    }

    /// The opponent of `player`, or `None` for the bye and for players
    /// not in this round (the host, late joiners).
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.pairs.iter().find_map(|&(a, b)| {
            if a == player {
                Some(b)
            } else if b == player {
                Some(a)
            } else {
                None
            }
        })
    }

    pub fn is_bye(&self, player: PlayerId) -> bool {
        self.bye == Some(player)
    }

    /// All players that have an opponent this round.
    pub fn paired_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.pairs.iter().flat_map(|&(a, b)| [a, b])
    }
}

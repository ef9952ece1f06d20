//! Round outcome resolution.

use roshambo_protocol::{Choice, Outcome};

/// Whether `a` beats `b` under the standard relation:
/// rock blunts scissors, scissors cut paper, paper covers rock.
fn beats(a: Choice, b: Choice) -> bool {
    matches!(
        (a, b),
        (Choice::Rock, Choice::Scissors)
            | (Choice::Scissors, Choice::Paper)
            | (Choice::Paper, Choice::Rock)
    )
}

/// Resolves one match-up from `a`'s point of view.
pub fn resolve(a: Choice, b: Choice) -> Outcome {
    if a == b {
        Outcome::Tie
    } else if beats(a, b) {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

/// Resolves a pair's submissions at round end, applying the no-show rule:
/// a player who submitted beats one who did not; two no-shows tie.
///
/// Returns `(outcome_for_a, outcome_for_b)`.
pub fn resolve_submissions(
    a: Option<Choice>,
    b: Option<Choice>,
) -> (Outcome, Outcome) {
    match (a, b) {
        (Some(a), Some(b)) => (resolve(a, b), resolve(b, a)),
        (Some(_), None) => (Outcome::Win, Outcome::Lose),
        (None, Some(_)) => (Outcome::Lose, Outcome::Win),
        (None, None) => (Outcome::Tie, Outcome::Tie),
    }
}

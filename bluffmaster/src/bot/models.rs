//! Bot moves and tuning knobs.

use serde::{Deserialize, Serialize};

use crate::game::{Card, Rank};

/// A move chosen by a bot on its turn.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BotMove {
    Play { cards: Vec<Card>, claimed_rank: Rank },
    Pass,
    CallBluff,
}

/// Outcome of the challenge heuristic for one outstanding claim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChallengeOdds {
    /// The claim is provably false (or cannot be answered); always challenge.
    Certain,
    /// Challenge with this probability.
    Chance(f64),
}

/// Thresholds for bot decisions.
///
/// # Examples
///
/// ```
/// use bluffmaster::bot::BotDecisionConfig;
///
/// let config = BotDecisionConfig::default();
/// assert_eq!(config.mass_claim_threshold, 3);
/// assert_eq!(config.pass_pile_threshold, 5);
/// ```
#[derive(Clone, Debug)]
pub struct BotDecisionConfig {
    /// Claims of at least this many cards are treated as suspicious.
    ///
    /// **Typical**: 3
    pub mass_claim_threshold: usize,

    /// Probability of challenging a suspiciously large claim.
    ///
    /// **Range**: 0.0-1.0 (typical: 0.5)
    pub mass_claim_probability: f64,

    /// Probability of challenging any other plausible claim.
    ///
    /// **Range**: 0.0-1.0 (typical: 0.1)
    /// **Higher** = more trigger-happy bots
    pub baseline_probability: f64,

    /// A bot without matching cards passes rather than bluffing once the pile
    /// holds more than this many cards (if passing is still possible).
    ///
    /// **Typical**: 5
    /// **Lower** = more cautious bots
    pub pass_pile_threshold: usize,
}

impl Default for BotDecisionConfig {
    fn default() -> Self {
        Self {
            mass_claim_threshold: 3,
            mass_claim_probability: 0.5,
            baseline_probability: 0.1,
            pass_pile_threshold: 5,
        }
    }
}

//! Heuristic bot decision-making.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::models::{BotDecisionConfig, BotMove, ChallengeOdds};
use crate::game::{
    Card, Claim, Player, PlayerId, Room,
    constants::CARDS_PER_RANK,
};

/// Bot decision maker
pub struct BotDecisionMaker {
    /// Random number generator
    rng: StdRng,
    /// Configuration for decision-making
    config: BotDecisionConfig,
}

impl Default for BotDecisionMaker {
    fn default() -> Self {
        Self::new()
    }
}

impl BotDecisionMaker {
    /// Create a new decision maker with default config, seeded from the OS
    pub fn new() -> Self {
        Self::with_config(BotDecisionConfig::default())
    }

    /// Create a new decision maker with custom config
    pub fn with_config(config: BotDecisionConfig) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            config,
        }
    }

    /// Create a deterministic decision maker
    pub fn with_seed(seed: u64, config: BotDecisionConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn config(&self) -> &BotDecisionConfig {
        &self.config
    }

    /// Decide the move for `bot_id` in `room`.
    ///
    /// # Returns
    ///
    /// * `Option<BotMove>` - `None` if the bot isn't seated or has no cards
    pub fn decide(&mut self, room: &Room, bot_id: &PlayerId) -> Option<BotMove> {
        let me = room.player(bot_id)?;

        if let Some(claim) = room.last_play.as_ref().filter(|c| &c.player_id != bot_id) {
            let odds = self.challenge_odds(room, me, claim);
            if self.roll(odds) {
                return Some(BotMove::CallBluff);
            }
        }

        let Some(rank) = room.current_rank else {
            return Self::opening_play(&me.hand);
        };

        let matching: Vec<Card> = me
            .hand
            .iter()
            .filter(|card| card.rank == rank)
            .copied()
            .collect();
        if !matching.is_empty() {
            return Some(BotMove::Play {
                cards: matching,
                claimed_rank: rank,
            });
        }

        let can_pass = room
            .players
            .iter()
            .any(|p| !p.finished && &p.id != bot_id && !room.passed.contains(&p.id));
        if can_pass && room.pile.len() > self.config.pass_pile_threshold {
            return Some(BotMove::Pass);
        }

        // Bluff with the first card.
        let card = *me.hand.first()?;
        Some(BotMove::Play {
            cards: vec![card],
            claimed_rank: rank,
        })
    }

    /// How keen the bot is to challenge `claim`.
    ///
    /// A claimant with an empty hand is always challenged, and so is a claim
    /// that would put more than four cards of the rank in play given what the
    /// bot itself holds.
    pub fn challenge_odds(&self, room: &Room, me: &Player, claim: &Claim) -> ChallengeOdds {
        let claimant_empty = room
            .player(&claim.player_id)
            .is_some_and(|p| p.hand.is_empty());
        if claimant_empty {
            return ChallengeOdds::Certain;
        }

        let claimed = claim.cards.len();
        if claimed >= self.config.mass_claim_threshold {
            return ChallengeOdds::Chance(self.config.mass_claim_probability);
        }

        if me.count_of(claim.claimed_rank) + claimed > CARDS_PER_RANK {
            return ChallengeOdds::Certain;
        }

        ChallengeOdds::Chance(self.config.baseline_probability)
    }

    fn roll(&mut self, odds: ChallengeOdds) -> bool {
        match odds {
            ChallengeOdds::Certain => true,
            ChallengeOdds::Chance(p) => self.rng.random_bool(p.clamp(0.0, 1.0)),
        }
    }

    /// Opens a round with every card sharing the rank of the first card in hand.
    fn opening_play(hand: &[Card]) -> Option<BotMove> {
        let rank = hand.first()?.rank;
        let cards = hand.iter().filter(|card| card.rank == rank).copied().collect();
        Some(BotMove::Play {
            cards,
            claimed_rank: rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Rank, constants::MAX_PLAYERS};
    use uuid::Uuid;

    fn cards(tokens: &[&str]) -> Vec<Card> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    /// Human at seat 0, bot at seat 1, mid-match with the bot to act.
    fn table(human_hand: &[&str], bot_hand: &[&str]) -> (Room, PlayerId, PlayerId) {
        let mut room = Room::new("BOTS", MAX_PLAYERS);
        let (human, _) = room.join(Uuid::new_v4(), "human").unwrap();
        let (bot, _) = room.add_bot(&human).unwrap();
        room.start(&human, &mut StdRng::seed_from_u64(1)).unwrap();
        room.players[0].hand = cards(human_hand);
        room.players[1].hand = cards(bot_hand);
        room.current_player_index = 1;
        (room, human, bot)
    }

    fn claim(room: &mut Room, by: &PlayerId, tokens: &[&str], rank: Rank) {
        let played = cards(tokens);
        room.pile.extend(played.iter().copied());
        room.current_rank = Some(rank);
        room.last_play = Some(Claim {
            player_id: by.clone(),
            cards: played,
            claimed_rank: rank,
        });
    }

    #[test]
    fn test_mass_claim_is_coin_flip() {
        let (mut room, human, bot) = table(&["2H"], &["3S", "4S"]);
        claim(&mut room, &human, &["KH", "KD", "KC"], Rank::King);
        let maker = BotDecisionMaker::with_seed(42, BotDecisionConfig::default());
        let me = room.player(&bot).unwrap();
        let odds = maker.challenge_odds(&room, me, room.last_play.as_ref().unwrap());
        assert_eq!(odds, ChallengeOdds::Chance(0.5));
    }

    #[test]
    fn test_mass_claim_decision_is_reproducible() {
        let (mut room, human, bot) = table(&["2H"], &["3S", "4S"]);
        claim(&mut room, &human, &["KH", "KD", "KC"], Rank::King);
        let first = BotDecisionMaker::with_seed(42, BotDecisionConfig::default())
            .decide(&room, &bot);
        let second = BotDecisionMaker::with_seed(42, BotDecisionConfig::default())
            .decide(&room, &bot);
        assert_eq!(first, second);
        assert!(matches!(
            first,
            Some(BotMove::CallBluff) | Some(BotMove::Play { .. })
        ));
    }

    #[test]
    fn test_empty_handed_claimant_always_challenged() {
        let (mut room, human, bot) = table(&[], &["3S"]);
        claim(&mut room, &human, &["KH"], Rank::King);
        let mut maker = BotDecisionMaker::with_seed(7, BotDecisionConfig::default());
        let me = room.player(&bot).unwrap();
        assert_eq!(
            maker.challenge_odds(&room, me, room.last_play.as_ref().unwrap()),
            ChallengeOdds::Certain
        );
        assert_eq!(maker.decide(&room, &bot), Some(BotMove::CallBluff));
    }

    #[test]
    fn test_impossible_claim_always_challenged() {
        let (mut room, human, bot) = table(&["2H", "9C"], &["KS", "KD", "KC"]);
        claim(&mut room, &human, &["KH", "2D"], Rank::King);
        let maker = BotDecisionMaker::with_seed(7, BotDecisionConfig::default());
        let me = room.player(&bot).unwrap();
        assert_eq!(
            maker.challenge_odds(&room, me, room.last_play.as_ref().unwrap()),
            ChallengeOdds::Certain
        );
    }

    #[test]
    fn test_plausible_claim_uses_baseline() {
        let (mut room, human, bot) = table(&["2H", "9C"], &["KS", "5D"]);
        claim(&mut room, &human, &["KH"], Rank::King);
        let maker = BotDecisionMaker::with_seed(7, BotDecisionConfig::default());
        let me = room.player(&bot).unwrap();
        assert_eq!(
            maker.challenge_odds(&room, me, room.last_play.as_ref().unwrap()),
            ChallengeOdds::Chance(0.1)
        );
    }

    #[test]
    fn test_opening_plays_first_rank_group() {
        let (room, _, bot) = table(&["2H"], &["7S", "3D", "7H"]);
        let mut maker = BotDecisionMaker::with_seed(1, BotDecisionConfig::default());
        assert_eq!(
            maker.decide(&room, &bot),
            Some(BotMove::Play {
                cards: cards(&["7S", "7H"]),
                claimed_rank: Rank::Seven,
            })
        );
    }

    #[test]
    fn test_plays_matching_cards_truthfully() {
        let never = BotDecisionConfig {
            baseline_probability: 0.0,
            ..BotDecisionConfig::default()
        };
        let (mut room, human, bot) = table(&["2H", "9C"], &["QS", "5D", "QH"]);
        claim(&mut room, &human, &["QD"], Rank::Queen);
        let mut maker = BotDecisionMaker::with_seed(1, never);
        assert_eq!(
            maker.decide(&room, &bot),
            Some(BotMove::Play {
                cards: cards(&["QS", "QH"]),
                claimed_rank: Rank::Queen,
            })
        );
    }

    #[test]
    fn test_passes_on_big_pile_without_match() {
        let never = BotDecisionConfig {
            baseline_probability: 0.0,
            ..BotDecisionConfig::default()
        };
        let (mut room, human, bot) = table(&["2H", "9C"], &["3S", "5D"]);
        room.pile = cards(&["AH", "AD", "AC", "2S", "2D"]);
        claim(&mut room, &human, &["AS"], Rank::Ace);
        let mut maker = BotDecisionMaker::with_seed(1, never);
        assert_eq!(maker.decide(&room, &bot), Some(BotMove::Pass));
    }

    #[test]
    fn test_bluffs_on_small_pile_without_match() {
        let never = BotDecisionConfig {
            baseline_probability: 0.0,
            ..BotDecisionConfig::default()
        };
        let (mut room, human, bot) = table(&["2H", "9C"], &["3S", "5D"]);
        claim(&mut room, &human, &["AS"], Rank::Ace);
        let mut maker = BotDecisionMaker::with_seed(1, never);
        assert_eq!(
            maker.decide(&room, &bot),
            Some(BotMove::Play {
                cards: cards(&["3S"]),
                claimed_rank: Rank::Ace,
            })
        );
    }

    #[test]
    fn test_unknown_bot_has_no_move() {
        let (room, _, _) = table(&["2H"], &["3S"]);
        let mut maker = BotDecisionMaker::with_seed(1, BotDecisionConfig::default());
        assert_eq!(maker.decide(&room, &PlayerId::from("bot-99")), None);
    }
}

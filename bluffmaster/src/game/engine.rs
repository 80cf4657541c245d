//! Room transitions.
//!
//! Each transition validates the request completely before mutating the room,
//! so an `Err` always leaves the room exactly as it was. On success the room's
//! `version` is bumped and the events to deliver are returned in order.

use chrono::Utc;
use rand::Rng;

use super::{
    constants::MIN_PLAYERS,
    entities::{self, Card, Claim, ConnectionId, Player, PlayerId, Rank, normalize_name},
    errors::{GameError, GameResult},
    events::{Outbound, ServerEvent},
    state::{Room, RoomPhase},
};
use crate::bot::BotMove;

impl Room {
    /// Seats a new human player. The first player to join becomes host.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        player_name: &str,
    ) -> GameResult<(PlayerId, Vec<Outbound>)> {
        if self.phase != RoomPhase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.player_by_connection(connection).is_some() {
            return Err(GameError::DuplicateJoin);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::CapacityReached);
        }

        let name = normalize_name(player_name, self.players.len() + 1);
        let player = Player::human(connection, name);
        let id = player.id.clone();
        let rejoin_token = player.rejoin_token.clone().unwrap_or_default();
        log::debug!("Room {}: {} joined as {}", self.code, id, player.name);
        self.players.push(player);
        if self.host_id.is_none() {
            self.host_id = Some(id.clone());
        }
        self.touch();

        let events = vec![
            Outbound::to(
                id.clone(),
                ServerEvent::PlayerId {
                    player_id: id.clone(),
                    rejoin_token,
                },
            ),
            self.room_joined(),
            self.game_state(),
        ];
        Ok((id, events))
    }

    /// Seats a bot. Host only, lobby only.
    pub fn add_bot(&mut self, requester: &PlayerId) -> GameResult<(PlayerId, Vec<Outbound>)> {
        self.require_member(requester)?;
        if self.phase != RoomPhase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if !self.is_host(requester) {
            return Err(GameError::NotHost);
        }
        if self.players.len() >= self.max_players {
            return Err(GameError::CapacityReached);
        }

        let bot = Player::bot(self.next_bot_number);
        self.next_bot_number += 1;
        let id = bot.id.clone();
        log::debug!("Room {}: added {}", self.code, bot.name);
        self.players.push(bot);
        self.touch();

        Ok((id, vec![self.room_joined(), self.game_state()]))
    }

    /// Deals a freshly shuffled deck and opens the match.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        requester: &PlayerId,
        rng: &mut R,
    ) -> GameResult<Vec<Outbound>> {
        self.require_member(requester)?;
        if self.phase != RoomPhase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if !self.is_host(requester) {
            return Err(GameError::NotHost);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers);
        }

        let deck = entities::shuffle(entities::new_deck(), rng);
        let hands = entities::deal(deck, self.players.len())?;
        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
            player.finished = false;
        }
        self.phase = RoomPhase::InProgress;
        self.current_player_index = 0;
        self.clear_round();
        self.finish_order.clear();
        self.leaderboard.clear();
        self.touch();
        log::info!(
            "Room {}: match started with {} players",
            self.code,
            self.players.len()
        );

        let mut events: Vec<Outbound> = self
            .players
            .iter()
            .filter(|p| !p.is_bot())
            .map(Self::cards_for)
            .collect();
        events.push(Outbound::broadcast(ServerEvent::GameStarted));
        events.push(self.game_state());
        Ok(events)
    }

    /// Surrenders `cards` face down while declaring `claimed_rank`.
    ///
    /// The claim is always filed under the round's rank. The declared rank only
    /// matters when it opens a round, though it is what `play-made` reports.
    pub fn play(
        &mut self,
        actor: &PlayerId,
        cards: &[Card],
        claimed_rank: Option<&str>,
    ) -> GameResult<Vec<Outbound>> {
        let actor_idx = self.require_turn(actor)?;
        let declared = claimed_rank
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<Rank>)
            .transpose()?;
        let rank = match (self.current_rank, declared) {
            (Some(rank), _) => rank,
            (None, Some(rank)) => rank,
            (None, None) => return Err(GameError::RankRequired),
        };
        if cards.is_empty() || !self.players[actor_idx].holds_all(cards) {
            return Err(GameError::InvalidCards);
        }
        for (i, card) in cards.iter().enumerate() {
            if cards[..i].contains(card) {
                return Err(GameError::InvalidCards);
            }
        }

        let player = &mut self.players[actor_idx];
        player.hand.retain(|card| !cards.contains(card));
        self.pile.extend_from_slice(cards);
        self.current_rank = Some(rank);
        self.last_play = Some(Claim {
            player_id: actor.clone(),
            cards: cards.to_vec(),
            claimed_rank: rank,
        });
        self.passed.clear();

        let player = &self.players[actor_idx];
        log::debug!(
            "Room {}: {} played {} card(s) as {}",
            self.code,
            player.name,
            cards.len(),
            declared.unwrap_or(rank)
        );
        let mut events = vec![
            Outbound::broadcast(ServerEvent::PlayMade {
                player_id: actor.clone(),
                player_name: player.name.clone(),
                count: cards.len(),
                rank: declared.unwrap_or(rank),
            }),
            Self::cards_for(player),
        ];

        if player.hand.is_empty() {
            let name = player.name.clone();
            self.players[actor_idx].finished = true;
            self.finish_order.push(actor.clone());
            events.push(Outbound::broadcast(ServerEvent::PlayerFinished {
                player_id: actor.clone(),
                player_name: name,
                position: self.finish_order.len(),
            }));
        }

        self.advance_turn(actor_idx);
        self.finish_transition(events)
    }

    /// Declines to play into the open round.
    pub fn pass(&mut self, actor: &PlayerId) -> GameResult<Vec<Outbound>> {
        let actor_idx = self.require_turn(actor)?;
        if self.current_rank.is_none() {
            return Err(GameError::CannotPassNow);
        }

        self.passed.insert(actor.clone());
        let mut events = vec![Outbound::broadcast(ServerEvent::PlayerPassed {
            player_id: actor.clone(),
            player_name: self.players[actor_idx].name.clone(),
        })];

        let claimant = self.last_play.as_ref().map(|claim| claim.player_id.clone());
        let everyone_passed = self
            .players
            .iter()
            .filter(|p| !p.finished && Some(&p.id) != claimant.as_ref())
            .all(|p| self.passed.contains(&p.id));

        if everyone_passed {
            let opener = match claimant.as_ref().and_then(|id| self.player_index(id)) {
                Some(idx) if !self.players[idx].finished => Some(idx),
                Some(idx) => self.next_active_after(idx),
                // The claimant left; whoever passed last keeps the turn.
                None => Some(actor_idx),
            };
            self.clear_round();
            if let Some(idx) = opener {
                self.current_player_index = idx;
                let starter = &self.players[idx];
                log::debug!("Room {}: round over, {} opens", self.code, starter.name);
                events.push(Outbound::broadcast(ServerEvent::RoundEnded {
                    starter_id: starter.id.clone(),
                    starter_name: starter.name.clone(),
                }));
            }
        } else {
            self.advance_turn(actor_idx);
        }

        self.finish_transition(events)
    }

    /// Challenges the outstanding claim. Whoever was wrong takes the pile.
    pub fn call_bluff(&mut self, caller: &PlayerId) -> GameResult<Vec<Outbound>> {
        let caller_idx = self.require_member(caller)?;
        if !self.is_started() {
            return Err(GameError::NotStarted);
        }
        let claim = self.last_play.clone().ok_or(GameError::NoActiveClaim)?;
        let claimant_idx = self
            .player_index(&claim.player_id)
            .ok_or(GameError::InternalState)?;
        if claimant_idx == caller_idx && !self.players[claimant_idx].finished {
            return Err(GameError::SelfChallengeForbidden);
        }

        let was_bluff = claim.is_bluff();
        let (loser_idx, winner_idx) = if was_bluff {
            (claimant_idx, caller_idx)
        } else {
            (caller_idx, claimant_idx)
        };

        let pile = std::mem::take(&mut self.pile);
        let loser = &mut self.players[loser_idx];
        loser.hand.extend(pile);
        if loser.finished {
            loser.finished = false;
            let loser_id = loser.id.clone();
            self.finish_order.retain(|id| id != &loser_id);
        }
        self.clear_round();
        if let Some(idx) = self.first_active_from(winner_idx) {
            self.current_player_index = idx;
        }

        let caller_name = self.players[caller_idx].name.clone();
        let claimant_name = self.players[claimant_idx].name.clone();
        let loser = &self.players[loser_idx];
        log::debug!(
            "Room {}: {} called bluff on {} ({}), {} takes the pile",
            self.code,
            caller_name,
            claimant_name,
            if was_bluff { "bluff" } else { "truthful" },
            loser.name
        );
        let mut events = vec![Outbound::broadcast(ServerEvent::BluffCalled {
            caller_name,
            last_player_name: claimant_name,
            was_bluff,
            penalized_player_name: loser.name.clone(),
            revealed: claim.cards,
        })];
        if !loser.is_bot() {
            events.push(Self::cards_for(loser));
        }

        self.finish_transition(events)
    }

    /// Removes the player bound to `connection`. Their hand leaves play.
    pub fn disconnect(&mut self, connection: ConnectionId) -> GameResult<Vec<Outbound>> {
        let idx = self
            .players
            .iter()
            .position(|p| p.connection() == Some(connection))
            .ok_or(GameError::NotInRoom)?;

        let removed = self.players.remove(idx);
        log::debug!("Room {}: {} left", self.code, removed.name);
        self.passed.remove(&removed.id);
        self.finish_order.retain(|id| id != &removed.id);
        if self
            .last_play
            .as_ref()
            .is_some_and(|claim| claim.player_id == removed.id)
        {
            self.last_play = None;
        }
        if self.host_id.as_ref() == Some(&removed.id) {
            self.host_id = self
                .players
                .iter()
                .find(|p| !p.is_bot())
                .map(|p| p.id.clone());
        }

        if self.players.is_empty() {
            self.touch();
            return Ok(Vec::new());
        }

        if self.is_started() {
            if self.current_player_index >= self.players.len() {
                self.current_player_index = 0;
            }
            if let Some(idx) = self.first_active_from(self.current_player_index) {
                self.current_player_index = idx;
            }
        }

        self.finish_transition(vec![self.room_joined()])
    }

    /// Finds the human seat `player_id` and checks the presented token
    /// against it.
    pub fn authorize_rejoin(
        &self,
        player_id: &PlayerId,
        rejoin_token: &str,
    ) -> GameResult<usize> {
        let idx = self
            .player_index(player_id)
            .filter(|&idx| !self.players[idx].is_bot())
            .ok_or(GameError::NotInRoom)?;
        if !self.players[idx].accepts_rejoin_token(rejoin_token) {
            log::warn!("Room {}: rejected rejoin attempt for {}", self.code, player_id);
            return Err(GameError::RejoinDenied);
        }
        Ok(idx)
    }

    /// Binds an existing human seat to a new connection, for clients coming
    /// back after their previous connection dropped. Whether that previous
    /// connection is really gone is for the caller to decide.
    pub fn rejoin(
        &mut self,
        player_id: &PlayerId,
        rejoin_token: &str,
        connection: ConnectionId,
    ) -> GameResult<Vec<Outbound>> {
        let idx = self.authorize_rejoin(player_id, rejoin_token)?;
        if self
            .player_by_connection(connection)
            .is_some_and(|p| &p.id != player_id)
        {
            return Err(GameError::DuplicateJoin);
        }

        let player = &mut self.players[idx];
        player.controller = entities::ControllerKind::Human(connection);
        log::debug!("Room {}: {} rejoined", self.code, player.name);
        self.touch();

        let player = &self.players[idx];
        Ok(vec![
            Outbound::to(
                player_id.clone(),
                ServerEvent::PlayerId {
                    player_id: player_id.clone(),
                    rejoin_token: rejoin_token.to_string(),
                },
            ),
            Self::cards_for(player),
            self.game_state(),
        ])
    }

    /// Applies a bot's chosen move. If the move is missing or rejected, the
    /// bot falls back to surrendering its first card under the round's rank
    /// (or that card's own rank when opening).
    pub fn apply_bot_move(
        &mut self,
        bot: &PlayerId,
        chosen: Option<BotMove>,
    ) -> GameResult<Vec<Outbound>> {
        if let Some(chosen) = chosen {
            let result = match &chosen {
                BotMove::Play {
                    cards,
                    claimed_rank,
                } => self.play(bot, cards, Some(claimed_rank.as_str())),
                BotMove::Pass => self.pass(bot),
                BotMove::CallBluff => self.call_bluff(bot),
            };
            match result {
                Ok(events) => return Ok(events),
                Err(e) => log::warn!(
                    "Room {}: bot {} move {:?} rejected ({}), falling back",
                    self.code,
                    bot,
                    chosen,
                    e
                ),
            }
        }

        let card = self
            .player(bot)
            .and_then(|p| p.hand.first().copied())
            .ok_or(GameError::InternalState)?;
        let rank = self.current_rank.unwrap_or(card.rank);
        self.play(bot, &[card], Some(rank.as_str()))
    }

    /// Bumps the version, runs the end-of-match check, and appends the
    /// closing `game-state` (plus `game-over` if the match just ended).
    fn finish_transition(&mut self, mut events: Vec<Outbound>) -> GameResult<Vec<Outbound>> {
        self.touch();
        let ended = self.is_started() && self.should_end();
        if ended {
            self.phase = RoomPhase::Ended;
            self.leaderboard = self.standings();
            log::info!(
                "Room {}: match over, winner {:?}",
                self.code,
                self.leaderboard.first()
            );
        }
        events.push(self.game_state());
        if ended {
            let leaderboard = self.leaderboard_entries();
            events.push(Outbound::broadcast(ServerEvent::GameOver {
                winner: leaderboard.first().cloned(),
                leaderboard,
            }));
        }
        Ok(events)
    }

    /// The match ends when nobody is left to play against, unless the last
    /// play came from a finished player and can still be challenged.
    fn should_end(&self) -> bool {
        match self.active_count() {
            0 => true,
            1 => !self.finished_claim_pending(),
            _ => false,
        }
    }

    fn advance_turn(&mut self, from: usize) {
        match self.next_active_after(from) {
            Some(idx) => self.current_player_index = idx,
            None => log::debug!("Room {}: no eligible player to advance to", self.code),
        }
    }

    fn clear_round(&mut self) {
        self.current_rank = None;
        self.pile.clear();
        self.last_play = None;
        self.passed.clear();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    fn require_member(&self, id: &PlayerId) -> GameResult<usize> {
        self.player_index(id).ok_or(GameError::NotInRoom)
    }

    fn require_turn(&self, actor: &PlayerId) -> GameResult<usize> {
        let idx = self.require_member(actor)?;
        if !self.is_started() {
            return Err(GameError::NotStarted);
        }
        if idx != self.current_player_index {
            return Err(GameError::NotYourTurn);
        }
        Ok(idx)
    }

    fn room_joined(&self) -> Outbound {
        Outbound::broadcast(ServerEvent::RoomJoined {
            players: self.player_infos(),
        })
    }

    fn game_state(&self) -> Outbound {
        Outbound::broadcast(ServerEvent::GameState(self.view()))
    }

    fn cards_for(player: &Player) -> Outbound {
        Outbound::to(
            player.id.clone(),
            ServerEvent::YourCards {
                cards: player.hand.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;
    use crate::game::Recipient;

    fn card(token: &str) -> Card {
        token.parse().unwrap()
    }

    fn cards(tokens: &[&str]) -> Vec<Card> {
        tokens.iter().map(|t| card(t)).collect()
    }

    fn lobby(names: &[&str]) -> (Room, Vec<PlayerId>) {
        let mut room = Room::with_default_capacity("TEST");
        let ids = names
            .iter()
            .map(|name| room.join(Uuid::new_v4(), name).unwrap().0)
            .collect();
        (room, ids)
    }

    /// A started room with hand-picked hands.
    fn rigged(hands: &[&[&str]]) -> (Room, Vec<PlayerId>) {
        let names: Vec<String> = (0..hands.len()).map(|i| format!("P{}", i + 1)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let (mut room, ids) = lobby(&names);
        room.start(&ids[0], &mut StdRng::seed_from_u64(1)).unwrap();
        for (player, hand) in room.players.iter_mut().zip(hands) {
            player.hand = cards(hand);
        }
        (room, ids)
    }

    fn event_names(events: &[Outbound]) -> Vec<&'static str> {
        events.iter().map(|o| o.event.name()).collect()
    }

    #[test]
    fn test_join_first_player_is_host() {
        let mut room = Room::with_default_capacity("R1");
        let (id, events) = room.join(Uuid::new_v4(), "alice").unwrap();
        assert!(room.is_host(&id));
        assert_eq!(
            event_names(&events),
            vec!["player-id", "room-joined", "game-state"]
        );
        assert_eq!(events[0].recipient, crate::game::Recipient::Player(id));
    }

    #[test]
    fn test_join_rejects_duplicate_and_full() {
        let mut room = Room::new("R1", 2);
        let conn = Uuid::new_v4();
        room.join(conn, "a").unwrap();
        assert_eq!(room.join(conn, "a").unwrap_err(), GameError::DuplicateJoin);
        room.join(Uuid::new_v4(), "b").unwrap();
        assert_eq!(
            room.join(Uuid::new_v4(), "c").unwrap_err(),
            GameError::CapacityReached
        );
    }

    #[test]
    fn test_join_after_start_rejected() {
        let (mut room, ids) = lobby(&["a", "b"]);
        room.start(&ids[0], &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(
            room.join(Uuid::new_v4(), "late").unwrap_err(),
            GameError::AlreadyStarted
        );
    }

    #[test]
    fn test_add_bot_host_only() {
        let (mut room, ids) = lobby(&["a", "b"]);
        assert_eq!(room.add_bot(&ids[1]).unwrap_err(), GameError::NotHost);
        let (bot, _) = room.add_bot(&ids[0]).unwrap();
        assert_eq!(bot.as_str(), "bot-1");
        let (bot, _) = room.add_bot(&ids[0]).unwrap();
        assert_eq!(room.player(&bot).unwrap().name, "Bot 2");
    }

    #[test]
    fn test_start_requires_host_and_two_players() {
        let (mut room, ids) = lobby(&["solo"]);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            room.start(&ids[0], &mut rng).unwrap_err(),
            GameError::InsufficientPlayers
        );
        let (guest, _) = room.join(Uuid::new_v4(), "guest").unwrap();
        assert_eq!(room.start(&guest, &mut rng).unwrap_err(), GameError::NotHost);
        let events = room.start(&ids[0], &mut rng).unwrap();
        assert_eq!(
            event_names(&events),
            vec!["your-cards", "your-cards", "game-started", "game-state"]
        );
        assert_eq!(room.total_cards(), 52);
        assert_eq!(room.players[0].hand.len(), 26);
        assert_eq!(
            room.start(&ids[0], &mut rng).unwrap_err(),
            GameError::AlreadyStarted
        );
    }

    #[test]
    fn test_play_validation_leaves_room_untouched() {
        let (mut room, ids) = rigged(&[&["AH", "2H"], &["3H"]]);
        let version = room.version;
        assert_eq!(
            room.play(&ids[1], &cards(&["3H"]), Some("3")).unwrap_err(),
            GameError::NotYourTurn
        );
        assert_eq!(
            room.play(&ids[0], &cards(&["AH"]), None).unwrap_err(),
            GameError::RankRequired
        );
        assert_eq!(
            room.play(&ids[0], &cards(&["3H"]), Some("3")).unwrap_err(),
            GameError::InvalidCards
        );
        assert_eq!(
            room.play(&ids[0], &cards(&["AH", "AH"]), Some("A"))
                .unwrap_err(),
            GameError::InvalidCards
        );
        assert_eq!(
            room.play(&ids[0], &[], Some("A")).unwrap_err(),
            GameError::InvalidCards
        );
        assert_eq!(
            room.play(&ids[0], &cards(&["AH"]), Some("Z")).unwrap_err(),
            GameError::InvalidRank
        );
        assert_eq!(room.version, version);
        assert_eq!(room.players[0].hand, cards(&["AH", "2H"]));
        assert!(room.pile.is_empty());
    }

    #[test]
    fn test_round_rank_binds_to_first_declaration() {
        let (mut room, ids) = rigged(&[&["AH", "2H"], &["3H", "4H"]]);
        room.play(&ids[0], &cards(&["AH"]), Some("a")).unwrap();
        assert_eq!(room.current_rank, Some(Rank::Ace));
        let events = room.play(&ids[1], &cards(&["3H"]), Some("K")).unwrap();
        assert_eq!(room.current_rank, Some(Rank::Ace));
        assert_eq!(room.last_play.as_ref().unwrap().claimed_rank, Rank::Ace);
        match &events[0].event {
            ServerEvent::PlayMade { rank, .. } => assert_eq!(*rank, Rank::King),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_pass_requires_open_round() {
        let (mut room, ids) = rigged(&[&["AH"], &["3H"]]);
        assert_eq!(room.pass(&ids[0]).unwrap_err(), GameError::CannotPassNow);
    }

    #[test]
    fn test_self_challenge_forbidden() {
        let (mut room, ids) = rigged(&[&["AH", "2H"], &["3H"], &["4H"]]);
        room.play(&ids[0], &cards(&["AH"]), Some("A")).unwrap();
        assert_eq!(
            room.call_bluff(&ids[0]).unwrap_err(),
            GameError::SelfChallengeForbidden
        );
        assert_eq!(room.call_bluff(&ids[2]).map(|_| ()), Ok(()));
    }

    #[test]
    fn test_call_bluff_without_claim() {
        let (mut room, ids) = rigged(&[&["AH"], &["3H"]]);
        assert_eq!(
            room.call_bluff(&ids[1]).unwrap_err(),
            GameError::NoActiveClaim
        );
    }

    #[test]
    fn test_disconnect_reassigns_host_and_clamps_turn() {
        let conns: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut room = Room::with_default_capacity("R");
        for (i, conn) in conns.iter().enumerate() {
            room.join(*conn, &format!("p{i}")).unwrap();
        }
        room.start(&room.players[0].id.clone(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        room.current_player_index = 2;

        room.disconnect(conns[2]).unwrap();
        assert_eq!(room.current_player_index, 0);
        assert_eq!(room.total_cards(), 52 - 17);

        room.disconnect(conns[0]).unwrap();
        assert_eq!(room.host_id, Some(PlayerId::human(conns[1])));
        assert_eq!(
            room.disconnect(conns[0]).unwrap_err(),
            GameError::NotInRoom
        );
    }

    #[test]
    fn test_disconnect_of_claimant_clears_last_play() {
        let (mut room, ids) = rigged(&[&["AH", "2H"], &["3H"], &["4H"]]);
        room.play(&ids[0], &cards(&["AH"]), Some("A")).unwrap();
        let conn = room.players[0].connection().unwrap();
        room.disconnect(conn).unwrap();
        assert!(room.last_play.is_none());
        assert_eq!(room.current_rank, Some(Rank::Ace));
        assert_eq!(room.pile.len(), 1);
        assert_eq!(
            room.call_bluff(&ids[1]).unwrap_err(),
            GameError::NoActiveClaim
        );
    }

    #[test]
    fn test_rejoin_rebinds_connection() {
        let (mut room, ids) = rigged(&[&["AH"], &["3H"]]);
        let token = room.players[1].rejoin_token.clone().unwrap();
        let fresh = Uuid::new_v4();
        let events = room.rejoin(&ids[1], &token, fresh).unwrap();
        assert_eq!(
            event_names(&events),
            vec!["player-id", "your-cards", "game-state"]
        );
        assert_eq!(room.players[1].connection(), Some(fresh));
        assert_eq!(room.players[1].id, ids[1]);
        let other = room.players[0].connection().unwrap();
        assert_eq!(
            room.rejoin(&ids[1], &token, other).unwrap_err(),
            GameError::DuplicateJoin
        );
        assert_eq!(
            room.rejoin(&PlayerId::from("nobody"), &token, Uuid::new_v4())
                .unwrap_err(),
            GameError::NotInRoom
        );
    }

    #[test]
    fn test_rejoin_requires_the_seat_token() {
        let (mut room, ids) = rigged(&[&["AH"], &["3H"]]);
        let before = room.clone();
        let alice_token = room.players[0].rejoin_token.clone().unwrap();

        // The public id and another seat's token are both refused.
        for presented in [ids[1].as_str(), alice_token.as_str(), ""] {
            assert_eq!(
                room.rejoin(&ids[1], presented, Uuid::new_v4()).unwrap_err(),
                GameError::RejoinDenied
            );
        }
        assert_eq!(
            serde_json::to_value(&room).unwrap(),
            serde_json::to_value(&before).unwrap()
        );
    }

    #[test]
    fn test_player_id_event_carries_token_privately() {
        let (mut room, _) = lobby(&[]);
        let (id, events) = room.join(Uuid::new_v4(), "alice").unwrap();
        let token = room.player(&id).unwrap().rejoin_token.clone().unwrap();

        let private = &events[0];
        assert_eq!(private.recipient, Recipient::Player(id.clone()));
        assert_eq!(
            private.event,
            ServerEvent::PlayerId {
                player_id: id,
                rejoin_token: token.clone(),
            }
        );
        for outbound in &events[1..] {
            let json = serde_json::to_string(&outbound.event).unwrap();
            assert!(!json.contains(&token));
        }
        assert!(!serde_json::to_string(&room.view()).unwrap().contains(&token));
    }

    #[test]
    fn test_bot_fallback_plays_first_card() {
        let (mut room, ids) = lobby(&["host"]);
        let (bot, _) = room.add_bot(&ids[0]).unwrap();
        room.start(&ids[0], &mut StdRng::seed_from_u64(2)).unwrap();
        room.players[0].hand = cards(&["KH"]);
        room.players[1].hand = cards(&["2S", "3S"]);
        room.current_player_index = 1;

        room.apply_bot_move(&bot, Some(BotMove::Pass)).unwrap();
        assert_eq!(room.pile, cards(&["2S"]));
        assert_eq!(room.current_rank, Some(Rank::Two));
        assert_eq!(room.current_player_index, 0);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{
    constants::DEFAULT_MAX_PLAYERS,
    entities::{Card, Claim, ConnectionId, Player, PlayerId, Rank},
    events::{GameStateView, LastPlaySummary, LeaderboardEntry, PlayerInfo},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    #[default]
    Waiting,
    InProgress,
    Ended,
}

/// All mutable state of one match.
///
/// Fields are public for inspection; mutation goes through the transitions
/// in [`super::engine`], which validate everything before touching state.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: String,
    /// Join order is turn order.
    pub players: Vec<Player>,
    pub current_player_index: usize,
    /// Rank the open round is bound to. Set iff the pile is non-empty.
    pub current_rank: Option<Rank>,
    pub pile: Vec<Card>,
    pub last_play: Option<Claim>,
    /// Players who passed since the last play. Serialized as a list.
    pub passed: BTreeSet<PlayerId>,
    pub finish_order: Vec<PlayerId>,
    pub phase: RoomPhase,
    pub host_id: Option<PlayerId>,
    pub max_players: usize,
    /// Frozen once the match ends.
    pub leaderboard: Vec<PlayerId>,
    pub next_bot_number: u32,
    /// Bumped by every successful transition.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(code: impl Into<String>, max_players: usize) -> Self {
        Self {
            code: code.into(),
            players: Vec::new(),
            current_player_index: 0,
            current_rank: None,
            pile: Vec::new(),
            last_play: None,
            passed: BTreeSet::new(),
            finish_order: Vec::new(),
            phase: RoomPhase::Waiting,
            host_id: None,
            max_players,
            leaderboard: Vec::new(),
            next_bot_number: 1,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn with_default_capacity(code: impl Into<String>) -> Self {
        Self::new(code, DEFAULT_MAX_PLAYERS)
    }

    pub fn is_started(&self) -> bool {
        self.phase == RoomPhase::InProgress
    }

    pub fn is_ended(&self) -> bool {
        self.phase == RoomPhase::Ended
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    pub fn player_by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection() == Some(connection))
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.host_id.as_ref() == Some(id)
    }

    /// Count of players who have not emptied their hand.
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.finished).count()
    }

    pub fn human_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_bot()).count()
    }

    /// Cards currently in play, hands plus pile.
    pub fn total_cards(&self) -> usize {
        self.pile.len() + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    /// The bot whose turn it is, if the match is running and a bot holds it.
    pub fn bot_to_act(&self) -> Option<PlayerId> {
        if !self.is_started() {
            return None;
        }
        self.current_player()
            .filter(|p| p.is_bot() && !p.finished)
            .map(|p| p.id.clone())
    }

    /// Whether the outstanding claim belongs to a player who has since
    /// finished. Such a claim keeps the match alive so it can be challenged.
    pub fn finished_claim_pending(&self) -> bool {
        self.last_play
            .as_ref()
            .and_then(|claim| self.player(&claim.player_id))
            .is_some_and(|p| p.finished)
    }

    /// Whether `actor` could pass right now.
    pub fn can_pass(&self, actor: &PlayerId) -> bool {
        self.is_started()
            && self.current_rank.is_some()
            && self.current_player().is_some_and(|p| &p.id == actor)
    }

    /// Whether `caller` could call bluff right now.
    pub fn can_call_bluff(&self, caller: &PlayerId) -> bool {
        if !self.is_started() {
            return false;
        }
        match &self.last_play {
            Some(claim) if &claim.player_id == caller => self.finished_claim_pending(),
            Some(_) => self.player(caller).is_some(),
            None => false,
        }
    }

    /// Next non-finished seat strictly after `from`, wrapping. A full cycle
    /// ends back at `from` itself.
    pub fn next_active_after(&self, from: usize) -> Option<usize> {
        let n = self.players.len();
        (1..=n)
            .map(|step| (from + step) % n)
            .find(|&idx| !self.players[idx].finished)
    }

    /// First non-finished seat at or after `from`, wrapping.
    pub fn first_active_from(&self, from: usize) -> Option<usize> {
        let n = self.players.len();
        (0..n)
            .map(|step| (from + step) % n)
            .find(|&idx| !self.players[idx].finished)
    }

    /// Finish order followed by the still-active players in seat order.
    pub fn standings(&self) -> Vec<PlayerId> {
        let mut standings = self.finish_order.clone();
        standings.extend(
            self.players
                .iter()
                .filter(|p| !p.finished)
                .map(|p| p.id.clone()),
        );
        standings
    }

    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|p| PlayerInfo {
                id: p.id.clone(),
                name: p.name.clone(),
                card_count: p.hand.len(),
                finished: p.finished,
                is_bot: p.is_bot(),
                is_host: self.is_host(&p.id),
            })
            .collect()
    }

    pub fn leaderboard_entries(&self) -> Vec<LeaderboardEntry> {
        self.leaderboard
            .iter()
            .filter_map(|id| self.player(id))
            .enumerate()
            .map(|(i, p)| LeaderboardEntry {
                place: i + 1,
                player_id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect()
    }

    /// Public view of the room. `canCallBluff` says whether a claim is open
    /// to challenge at all; `canPass` is computed for whoever holds the turn.
    pub fn view(&self) -> GameStateView {
        let current = if self.is_started() {
            self.current_player()
        } else {
            None
        };
        let leaderboard = self.leaderboard_entries();
        GameStateView {
            code: self.code.clone(),
            phase: self.phase,
            started: self.is_started(),
            players: self.player_infos(),
            current_player_index: self.current_player_index,
            current_player_id: current.map(|p| p.id.clone()),
            current_rank: self.current_rank,
            pile_count: self.pile.len(),
            last_play: self.last_play.as_ref().map(|claim| LastPlaySummary {
                player_id: claim.player_id.clone(),
                player_name: self
                    .player(&claim.player_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                count: claim.cards.len(),
                rank: claim.claimed_rank,
            }),
            can_call_bluff: self.is_started() && self.last_play.is_some(),
            can_pass: current.is_some_and(|p| self.can_pass(&p.id)),
            round_ended: self.is_started() && self.current_rank.is_none(),
            winner: leaderboard.first().cloned(),
            leaderboard,
        }
    }
}

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{collections::HashSet, fmt, str::FromStr};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{
    constants::{DECK_SIZE, MAX_NAME_LENGTH},
    errors::{GameError, GameResult},
};

/// Transport-supplied identifier for a single client connection.
pub type ConnectionId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    pub fn symbol(self) -> char {
        match self {
            Self::Heart => 'H',
            Self::Diamond => 'D',
            Self::Club => 'C',
            Self::Spade => 'S',
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'H' => Some(Self::Heart),
            'D' => Some(Self::Diamond),
            'C' => Some(Self::Club),
            'S' => Some(Self::Spade),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Card rank. Aces are low; order only matters for deck construction.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ace => "A",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Rank {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|rank| rank.as_str() == upper)
            .ok_or(GameError::InvalidRank)
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| de::Error::custom(format!("unknown rank `{raw}`")))
    }
}

/// A single playing card, written on the wire as rank followed by suit,
/// e.g. `10H` or `AS`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parses a selection of card tokens. Any malformed token, an empty
    /// selection, or a card listed twice rejects the whole selection.
    pub fn parse_selection<S: AsRef<str>>(tokens: &[S]) -> GameResult<Vec<Card>> {
        if tokens.is_empty() {
            return Err(GameError::InvalidCards);
        }
        let cards = tokens
            .iter()
            .map(|token| token.as_ref().parse())
            .collect::<GameResult<Vec<Card>>>()?;
        let unique: HashSet<&Card> = cards.iter().collect();
        if unique.len() != cards.len() {
            return Err(GameError::InvalidCards);
        }
        Ok(cards)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let suit = token
            .chars()
            .last()
            .and_then(Suit::from_symbol)
            .ok_or(GameError::InvalidCards)?;
        let rank = rank_of(token)
            .parse()
            .map_err(|_| GameError::InvalidCards)?;
        Ok(Self { rank, suit })
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| de::Error::custom(format!("unknown card `{raw}`")))
    }
}

/// The 52 canonical cards, rank-major.
pub fn new_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for rank in Rank::ALL {
        for suit in Suit::ALL {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

/// Uniform random permutation of `deck`.
pub fn shuffle<R: Rng + ?Sized>(mut deck: Vec<Card>, rng: &mut R) -> Vec<Card> {
    deck.shuffle(rng);
    deck
}

/// Round-robin deal: card `i` goes to hand `i % n`, so leftover cards land
/// with the earliest seats.
pub fn deal(deck: Vec<Card>, n: usize) -> GameResult<Vec<Vec<Card>>> {
    if n == 0 {
        return Err(GameError::InsufficientPlayers);
    }
    let mut hands = vec![Vec::with_capacity(deck.len() / n + 1); n];
    for (i, card) in deck.into_iter().enumerate() {
        hands[i % n].push(card);
    }
    Ok(hands)
}

/// Everything but the trailing suit character of a card token.
pub fn rank_of(token: &str) -> &str {
    match token.char_indices().last() {
        Some((idx, _)) => &token[..idx],
        None => "",
    }
}

/// Stable identity of a seat for the whole match.
///
/// Humans are identified by the connection that first joined; bots get
/// synthetic `bot-N` ids.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn human(connection: ConnectionId) -> Self {
        Self(connection.to_string())
    }

    pub fn bot(number: u32) -> Self {
        Self(format!("bot-{number}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who drives a seat.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "connection", rename_all = "lowercase")]
pub enum ControllerKind {
    Human(ConnectionId),
    Bot,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub controller: ControllerKind,
    /// Set the instant a play empties the hand; cleared if the player is
    /// later handed the pile.
    pub finished: bool,
    /// Secret a human needs to reclaim this seat from a new connection.
    /// Only ever sent to the seat's own connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejoin_token: Option<String>,
}

impl Player {
    pub fn human(connection: ConnectionId, name: String) -> Self {
        Self {
            id: PlayerId::human(connection),
            name,
            hand: Vec::new(),
            controller: ControllerKind::Human(connection),
            finished: false,
            rejoin_token: Some(Uuid::new_v4().simple().to_string()),
        }
    }

    pub fn bot(number: u32) -> Self {
        Self {
            id: PlayerId::bot(number),
            name: format!("Bot {number}"),
            hand: Vec::new(),
            controller: ControllerKind::Bot,
            finished: false,
            rejoin_token: None,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.controller, ControllerKind::Bot)
    }

    /// Constant-time check of a presented rejoin token.
    pub fn accepts_rejoin_token(&self, presented: &str) -> bool {
        self.rejoin_token
            .as_deref()
            .is_some_and(|token| bool::from(token.as_bytes().ct_eq(presented.as_bytes())))
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        match self.controller {
            ControllerKind::Human(connection) => Some(connection),
            ControllerKind::Bot => None,
        }
    }

    /// Number of cards of `rank` in hand.
    pub fn count_of(&self, rank: Rank) -> usize {
        self.hand.iter().filter(|card| card.rank == rank).count()
    }

    pub fn holds_all(&self, cards: &[Card]) -> bool {
        cards.iter().all(|card| self.hand.contains(card))
    }
}

/// Trims a requested display name, truncating it to the maximum length and
/// falling back to `Player N` when nothing is left.
pub fn normalize_name(requested: &str, seat: usize) -> String {
    let trimmed: String = requested.trim().chars().take(MAX_NAME_LENGTH).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        format!("Player {seat}")
    } else {
        trimmed.to_string()
    }
}

/// The outstanding face-down play that may still be challenged.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claim {
    pub player_id: PlayerId,
    pub cards: Vec<Card>,
    pub claimed_rank: Rank,
}

impl Claim {
    /// A claim is a bluff if any surrendered card differs from the claimed rank.
    pub fn is_bluff(&self) -> bool {
        self.cards.iter().any(|card| card.rank != self.claimed_rank)
    }
}

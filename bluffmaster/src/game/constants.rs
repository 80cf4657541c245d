/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Number of cards sharing a rank. A claim that would put more than this many
/// cards of one rank in play is necessarily a lie.
pub const CARDS_PER_RANK: usize = 4;

/// Minimum number of seated players before a match can start.
pub const MIN_PLAYERS: usize = 2;

/// Default room capacity.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Upper bound for room capacity; every player must be dealt at least one card.
pub const MAX_PLAYERS: usize = DECK_SIZE;

/// Display names longer than this are truncated on join.
pub const MAX_NAME_LENGTH: usize = 24;

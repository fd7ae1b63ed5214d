//! Match-related types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chess::Color;

/// Unique identifier for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Create a new random match ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a match ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Create a new random player ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a player ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Match is in progress; moves are accepted.
    Active,
    /// Match is paused; no moves until resumed.
    Paused,
    /// Match has ended. Terminal — no further mutation.
    Completed,
}

impl MatchStatus {
    /// Returns true if the match accepts moves.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the match is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Stable string form, used as the storage column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome token of a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    /// White player won.
    WhiteWins,
    /// Black player won.
    BlackWins,
    /// Match ended in a draw.
    Draw,
}

impl MatchResult {
    /// Returns the winning color if any.
    #[must_use]
    pub const fn winner(&self) -> Option<Color> {
        match self {
            Self::WhiteWins => Some(Color::White),
            Self::BlackWins => Some(Color::Black),
            Self::Draw => None,
        }
    }

    /// The PGN result token for this outcome.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WhiteWins => write!(f, "white_wins"),
            Self::BlackWins => write!(f, "black_wins"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// How a completed match reached its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultDetail {
    /// Checkmate.
    Checkmate,
    /// Stalemate.
    Stalemate,
    /// Insufficient material.
    InsufficientMaterial,
    /// Resignation.
    Resignation,
    /// Draw by agreement.
    DrawAgreement,
    /// Timeout, adjudicated by the caller.
    Timeout,
}

impl std::fmt::Display for ResultDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checkmate => write!(f, "checkmate"),
            Self::Stalemate => write!(f, "stalemate"),
            Self::InsufficientMaterial => write!(f, "insufficient_material"),
            Self::Resignation => write!(f, "resignation"),
            Self::DrawAgreement => write!(f, "draw_agreement"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Time control settings for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// Initial time in seconds.
    pub initial_seconds: u32,
    /// Increment per move in seconds.
    pub increment_seconds: u32,
}

impl TimeControl {
    /// Bullet time control: 1 minute, no increment.
    pub const BULLET: Self = Self {
        initial_seconds: 60,
        increment_seconds: 0,
    };

    /// Blitz time control: 5 minutes + 3 second increment.
    pub const BLITZ: Self = Self {
        initial_seconds: 300,
        increment_seconds: 3,
    };

    /// Rapid time control: 15 minutes + 10 second increment.
    pub const RAPID: Self = Self {
        initial_seconds: 900,
        increment_seconds: 10,
    };

    /// Create a custom time control.
    #[must_use]
    pub const fn new(initial_seconds: u32, increment_seconds: u32) -> Self {
        Self {
            initial_seconds,
            increment_seconds,
        }
    }

    /// Get the initial time as a Duration.
    #[must_use]
    pub const fn initial_time(&self) -> Duration {
        Duration::from_secs(self.initial_seconds as u64)
    }

    /// Get the increment as a Duration.
    #[must_use]
    pub const fn increment(&self) -> Duration {
        Duration::from_secs(self.increment_seconds as u64)
    }

    /// Parse time control from string like "5+3" (5 min + 3 sec increment).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('+').collect();
        if parts.len() != 2 {
            return None;
        }
        let initial: u32 = parts[0].trim().parse().ok()?;
        let increment: u32 = parts[1].trim().parse().ok()?;
        Some(Self::new(initial * 60, increment))
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}+{}",
            self.initial_seconds / 60,
            self.increment_seconds
        )
    }
}

/// Outstanding draw offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOffer {
    /// Participant who offered the draw.
    pub offered_by: PlayerId,
    /// When the offer was made.
    pub offered_at: DateTime<Utc>,
}

impl DrawOffer {
    /// Create a new draw offer.
    #[must_use]
    pub fn new(offered_by: PlayerId) -> Self {
        Self {
            offered_by,
            offered_at: Utc::now(),
        }
    }
}

/// Advisory draw bookkeeping for an active match.
///
/// These are signals for callers, not automatic draws; automatic draw
/// adjudication (stalemate, insufficient material) happens in the rules
/// engine at move time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStatus {
    /// Halfmoves since the last capture or pawn advance.
    pub halfmove_clock: u32,
    /// Full moves remaining until the fifty-move rule can be claimed.
    pub moves_until_fifty_move: u32,
    /// How many times the current position fingerprint has occurred.
    pub repetition_count: u32,
    /// The halfmove clock is within ten full moves of the fifty-move rule.
    pub is_approaching_fifty_move: bool,
    /// The current position has occurred at least twice.
    pub is_approaching_repetition: bool,
}

/// Outcome of a read-only move probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveValidation {
    /// Whether the move would be accepted.
    pub valid: bool,
    /// Why the move would be rejected.
    pub reason: Option<String>,
    /// A legal alternative in SAN, where one could be derived.
    pub suggestion: Option<String>,
}

impl MoveValidation {
    /// A passing validation.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
            suggestion: None,
        }
    }

    /// A failing validation with a reason and an optional suggestion.
    #[must_use]
    pub fn rejected(reason: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            suggestion,
        }
    }
}

//! Chess engine integration with shakmaty.
//!
//! This module is the boundary to the external rules capability:
//! - Position management and FEN parsing
//! - Move validation and application in SAN
//! - Legal move generation
//! - Game end detection (checkmate, stalemate, insufficient material)
//! - Repetition fingerprints (position encoding minus move counters)
//!
//! Everything above this module consumes verdicts; chess rules are never
//! reimplemented outside of it.

use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    uci::UciMove,
    CastlingMode, Chess, Move, Position, Role,
};
use thiserror::Error;

use crate::types::chess::{Color, LegalMove};
use crate::types::game::{MatchResult, ResultDetail};

/// Errors that can occur during chess operations.
#[derive(Debug, Error)]
pub enum ChessError {
    /// Invalid FEN string.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// Move text is not well-formed SAN.
    #[error("unreadable move: {0}")]
    InvalidSan(String),

    /// Move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Game is already over.
    #[error("game is already over")]
    GameOver,
}

/// The outcome of a chess game as reported by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Checkmate - the given color won.
    Checkmate(Color),
    /// Stalemate - draw.
    Stalemate,
    /// Insufficient material - draw.
    InsufficientMaterial,
}

impl Outcome {
    /// Convert the outcome to a match result and the specific detail.
    #[must_use]
    pub fn to_result_and_detail(self) -> (MatchResult, ResultDetail) {
        match self {
            Self::Checkmate(Color::White) => (MatchResult::WhiteWins, ResultDetail::Checkmate),
            Self::Checkmate(Color::Black) => (MatchResult::BlackWins, ResultDetail::Checkmate),
            Self::Stalemate => (MatchResult::Draw, ResultDetail::Stalemate),
            Self::InsufficientMaterial => {
                (MatchResult::Draw, ResultDetail::InsufficientMaterial)
            }
        }
    }
}

/// A successfully applied move, in every notation a caller may want.
#[derive(Debug, Clone)]
pub struct PlayedMove {
    /// Canonical SAN of the move as applied (e.g., "Nf3", "exd5", "O-O").
    pub san: String,
    /// UCI notation of the same move (e.g., "g1f3").
    pub uci: String,
    /// Whether the move captured a piece.
    pub is_capture: bool,
    /// Whether the move gives check.
    pub gives_check: bool,
}

/// A chess position with move validation and game state tracking.
///
/// This is the main interface to shakmaty, providing a clean API for
/// the match entity.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    position: Chess,
}

impl ChessPosition {
    /// Create a new position from the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Chess::default(),
        }
    }

    /// Create a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        Ok(Self { position })
    }

    /// Get the FEN string for the current position.
    #[must_use]
    pub fn to_fen(&self) -> String {
        Fen::from_position(self.position.clone(), shakmaty::EnPassantMode::Legal).to_string()
    }

    /// The repetition key for the current position: board placement, side to
    /// move, castling rights and en-passant target, with the move counters
    /// stripped. Two positions with equal fingerprints are "the same position"
    /// for repetition purposes regardless of the clocks.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let fen = self.to_fen();
        fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }

    /// Get whose turn it is to move.
    #[must_use]
    pub fn turn(&self) -> Color {
        self.position.turn().into()
    }

    /// Check if the current player is in check.
    #[must_use]
    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Check if the game is over (checkmate, stalemate, or insufficient material).
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        if self.position.is_checkmate() {
            // The player to move is checkmated, so the other color wins
            Some(Outcome::Checkmate(self.turn().opposite()))
        } else if self.position.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(Outcome::InsufficientMaterial)
        } else {
            None
        }
    }

    /// Check if the game is over.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Get all legal moves in the current position.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<LegalMove> {
        let legals = self.position.legal_moves();
        legals.iter().map(|m| self.move_to_legal_move(m)).collect()
    }

    /// Get the legal moves starting from a single square (e.g., "e2").
    #[must_use]
    pub fn legal_moves_from(&self, square: &str) -> Vec<LegalMove> {
        self.legal_moves()
            .into_iter()
            .filter(|m| m.from == square)
            .collect()
    }

    /// Validate and apply a move given in SAN.
    ///
    /// Returns the applied move (with its canonical SAN) if successful.
    pub fn apply_san(&mut self, move_text: &str) -> Result<PlayedMove, ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver);
        }

        let m = self.parse_san(move_text)?;

        let uci = UciMove::from_move(&m, CastlingMode::Standard).to_string();
        let is_capture = m.is_capture();

        // Rendering the canonical SAN plays the move; keep the played
        // position as the new state. SAN resolution only yields legal moves,
        // so this cannot fail.
        let mut next = self.position.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut next, &m).to_string();
        self.position = next;

        Ok(PlayedMove {
            san,
            uci,
            is_capture,
            gives_check: self.position.is_check(),
        })
    }

    /// Validate a SAN move without applying it.
    ///
    /// Returns the canonical SAN if the move would be legal.
    pub fn validate_san(&self, move_text: &str) -> Result<String, ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver);
        }

        let m = self.parse_san(move_text)?;
        Ok(SanPlus::from_move(self.position.clone(), &m).to_string())
    }

    /// Derive a legal alternative for a rejected move, if one exists.
    ///
    /// Preference order: a legal move to the same destination square, then a
    /// legal move by the same piece, then any legal move.
    #[must_use]
    pub fn suggest_alternative(&self, move_text: &str) -> Option<String> {
        let legals = self.position.legal_moves();
        let first = legals.first()?;

        let stripped = move_text
            .split('=')
            .next()
            .unwrap_or(move_text)
            .trim_end_matches(['+', '#', '!', '?']);

        if let Some(dest) = last_square_in(stripped) {
            if let Some(m) = legals.iter().find(|m| m.to().to_string() == dest) {
                return Some(San::from_move(&self.position, m).to_string());
            }
        }

        let role = leading_role(stripped);
        if let Some(m) = legals.iter().find(|m| m.role() == role) {
            return Some(San::from_move(&self.position, m).to_string());
        }

        Some(San::from_move(&self.position, first).to_string())
    }

    /// Get the halfmove clock (for the 50-move rule).
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.position.halfmoves()
    }

    /// Get the fullmove number.
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.position.fullmoves().get()
    }

    // --- Private helper methods ---

    /// Parse a SAN string into a shakmaty Move legal in this position.
    ///
    /// Check and mate suffixes ("+", "#") are accepted and ignored; legality
    /// is what the position says, not what the annotation claims.
    fn parse_san(&self, move_text: &str) -> Result<Move, ChessError> {
        let san_plus: SanPlus = move_text
            .trim()
            .parse()
            .map_err(|_| ChessError::InvalidSan(move_text.to_string()))?;

        san_plus
            .san
            .to_move(&self.position)
            .map_err(|_| ChessError::IllegalMove(move_text.to_string()))
    }

    /// Convert a shakmaty Move to our LegalMove type.
    fn move_to_legal_move(&self, m: &Move) -> LegalMove {
        let san = San::from_move(&self.position, m);
        let uci = UciMove::from_move(m, CastlingMode::Standard);

        // Check if this move would give check
        let mut pos_after = self.position.clone();
        pos_after.play_unchecked(m);
        let is_check = pos_after.is_check();

        LegalMove {
            san: san.to_string(),
            uci: uci.to_string(),
            from: m.from().map_or_else(String::new, |sq| sq.to_string()),
            to: m.to().to_string(),
            promotion: m.promotion().map(|r| r.into()),
            is_capture: m.is_capture(),
            is_check,
        }
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the last "file,rank" pair in the text (the destination square of most
/// SAN moves).
fn last_square_in(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    (1..bytes.len()).rev().find_map(|i| {
        let (file, rank) = (bytes[i - 1], bytes[i]);
        if (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank) {
            Some(format!("{}{}", file as char, rank as char))
        } else {
            None
        }
    })
}

/// The piece a SAN string names, pawn when unprefixed.
fn leading_role(text: &str) -> Role {
    match text.chars().next() {
        Some('N') => Role::Knight,
        Some('B') => Role::Bishop,
        Some('R') => Role::Rook,
        Some('Q') => Role::Queen,
        Some('K') | Some('O') => Role::King,
        _ => Role::Pawn,
    }
}

//! Type definitions for the arbiter.
//!
//! ## Modules
//!
//! - `chess` - Chess types wrapping shakmaty (Color, LegalMove, etc.)
//! - `game` - Match-related types (MatchId, MatchStatus, TimeControl)

pub mod chess;
pub mod game;

// Re-export commonly used types
pub use chess::{Color, LegalMove, PieceType};
pub use game::{
    DrawOffer, DrawStatus, MatchId, MatchResult, MatchStatus, MoveValidation, PlayerId,
    ResultDetail, TimeControl,
};

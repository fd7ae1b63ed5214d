//! Chess logic integration with shakmaty.
//!
//! This module provides a clean interface to the rules engine for:
//! - Move validation in SAN
//! - Game end detection
//! - FEN string handling and repetition fingerprints
//! - Legal move generation
//! - Game-notation transcripts

pub mod engine;
pub mod pgn;

pub use engine::{ChessError, ChessPosition, Outcome, PlayedMove};
pub use pgn::Transcript;

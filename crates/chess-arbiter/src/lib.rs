//! # Chess Arbiter
//!
//! Lifecycle management for turn-based two-player chess matches, built for
//! automated callers.
//!
//! ## Features
//!
//! - **Match entity**: `Match` - the turn-by-turn state machine with
//!   repetition and fifty-move bookkeeping for draw signaling
//! - **Session manager**: `MatchManager` - admission-controlled creation and
//!   mutate-and-persist orchestration with per-match locking
//! - **Storage contract**: `MatchStore` - pluggable persistence with
//!   in-memory and SQLite reference implementations
//! - **Rules boundary**: `ChessPosition` - move legality, application and
//!   notation via shakmaty; chess rules are never reimplemented here
//! - **Serialization**: `MatchDump` - full-fidelity dump/restore with
//!   replay-validated restoration

pub mod chess;
pub mod config;
pub mod error;
pub mod game;
pub mod manager;
pub mod store;
pub mod types;

pub use config::{ManagerConfig, DEFAULT_MAX_ACTIVE_MATCHES};
pub use error::ArbiterError;
pub use game::{
    AppliedMove, DetailedMove, HistoryFormat, Match, MatchDump, MoveHistory, MoveWithPosition,
    VerboseMove, STARTING_FEN,
};
pub use manager::MatchManager;
pub use store::{MatchStore, MemoryMatchStore, SqliteMatchStore};
pub use types::{
    Color, DrawOffer, DrawStatus, LegalMove, MatchId, MatchResult, MatchStatus, MoveValidation,
    PieceType, PlayerId, ResultDetail, TimeControl,
};

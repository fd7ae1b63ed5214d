//! Match persistence.
//!
//! [`MatchStore`] is the abstract contract the session manager depends on,
//! independent of backing technology. Two reference implementations ship
//! here: an ephemeral in-memory store and a SQLite-backed durable store.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::ArbiterError;
use crate::game::Match;
use crate::types::game::{MatchId, MatchStatus, PlayerId};

pub use memory::MemoryMatchStore;
pub use sqlite::SqliteMatchStore;

/// Abstract persistence contract for matches.
///
/// Every read returns a value independent of whatever the writer holds; there
/// is no shared-reference aliasing across this boundary. Mutating a returned
/// match never affects the stored version until it is saved again.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Persist a match, replacing any previous version.
    async fn save(&self, game: &Match) -> Result<(), ArbiterError>;

    /// Load a match by ID, or `None` if unknown.
    ///
    /// Fails with [`ArbiterError::CorruptState`] when the stored record can
    /// no longer be restored; the record stays in place for out-of-band
    /// repair.
    async fn load(&self, id: MatchId) -> Result<Option<Match>, ArbiterError>;

    /// Delete a match. Returns whether a record existed.
    async fn delete(&self, id: MatchId) -> Result<bool, ArbiterError>;

    /// Whether a record exists for the ID.
    async fn exists(&self, id: MatchId) -> Result<bool, ArbiterError>;

    /// Load every match. Corrupt records are skipped with a warning.
    async fn load_all(&self) -> Result<Vec<Match>, ArbiterError>;

    /// Load every match with the given status.
    async fn load_by_status(&self, status: MatchStatus) -> Result<Vec<Match>, ArbiterError>;

    /// Load every match a participant plays in.
    async fn load_by_participant(&self, player: PlayerId) -> Result<Vec<Match>, ArbiterError>;

    /// Count matches whose status is Active.
    async fn count_active(&self) -> Result<usize, ArbiterError>;

    /// Probe whether the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Release backend resources.
    async fn close(&self) -> Result<(), ArbiterError>;
}

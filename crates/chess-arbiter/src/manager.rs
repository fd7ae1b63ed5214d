//! The match manager.
//!
//! Orchestrates match creation under a global admission ceiling, retrieval,
//! and the mutate-and-persist wrappers around the match entity. The manager
//! never mutates match fields directly; every state transition lives in
//! [`Match`]. The storage contract is injected at construction, so its
//! lifecycle is owned by whoever builds the manager, not by module state.
//!
//! Each mutating wrapper holds a per-match async lock across its
//! load→mutate→persist sequence, so two concurrent operations against the
//! same match cannot interleave and lose an update. Admission control is
//! deliberately *not* serialized across matches: the active count and the
//! subsequent insert are two separate storage calls, and concurrent creations
//! can transiently admit past the ceiling. That matches the reference
//! behavior and is pinned by tests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::config::ManagerConfig;
use crate::error::ArbiterError;
use crate::game::{AppliedMove, HistoryFormat, Match, MoveHistory};
use crate::store::MatchStore;
use crate::types::game::{
    DrawStatus, MatchId, MatchResult, MatchStatus, MoveValidation, PlayerId, TimeControl,
};

/// Manages the lifecycle of all matches against a pluggable store.
pub struct MatchManager {
    store: Arc<dyn MatchStore>,
    config: ManagerConfig,
    /// Per-match mutation locks. Entries are created on first use and dropped
    /// when the match is deleted.
    locks: parking_lot::Mutex<HashMap<MatchId, Arc<AsyncMutex<()>>>>,
}

impl MatchManager {
    /// Create a manager over the given store.
    pub fn new(store: Arc<dyn MatchStore>, config: ManagerConfig) -> Result<Self, ArbiterError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            locks: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    /// Create a manager with the default configuration.
    pub fn with_default_config(store: Arc<dyn MatchStore>) -> Self {
        Self {
            store,
            config: ManagerConfig::default(),
            locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// The configured admission ceiling.
    #[must_use]
    pub const fn max_active_matches(&self) -> usize {
        self.config.max_active_matches
    }

    // --- Creation and retrieval ---

    /// Create a new match, subject to the admission ceiling.
    ///
    /// Reads the current active count first; at or above the ceiling nothing
    /// is created and the call fails with `CapacityExceeded`.
    pub async fn create(
        &self,
        white: PlayerId,
        black: PlayerId,
        time_control: Option<TimeControl>,
    ) -> Result<Match, ArbiterError> {
        let active = self.store.count_active().await?;
        let limit = self.config.max_active_matches;
        if active >= limit {
            return Err(ArbiterError::CapacityExceeded { active, limit });
        }

        let game = Match::new(MatchId::new(), white, black, time_control);
        self.store.save(&game).await?;
        tracing::info!(match_id = %game.id(), %white, %black, "match created");
        Ok(game)
    }

    /// Load a match by ID.
    pub async fn get(&self, id: MatchId) -> Result<Option<Match>, ArbiterError> {
        self.store.load(id).await
    }

    /// Delete a match. Returns whether a record existed.
    pub async fn delete(&self, id: MatchId) -> Result<bool, ArbiterError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            self.locks.lock().remove(&id);
            tracing::info!(match_id = %id, "match deleted");
        }
        Ok(deleted)
    }

    /// List every match.
    pub async fn list_all(&self) -> Result<Vec<Match>, ArbiterError> {
        self.store.load_all().await
    }

    /// List matches with the given status.
    pub async fn list_by_status(&self, status: MatchStatus) -> Result<Vec<Match>, ArbiterError> {
        self.store.load_by_status(status).await
    }

    /// List matches a participant plays in.
    pub async fn list_by_participant(&self, player: PlayerId) -> Result<Vec<Match>, ArbiterError> {
        self.store.load_by_participant(player).await
    }

    // --- Mutate-and-persist wrappers ---
    //
    // Load, invoke the entity operation (propagating its errors unchanged),
    // persist. Nothing is persisted when the operation fails.

    /// Apply a move to a match.
    pub async fn apply_move(
        &self,
        id: MatchId,
        move_text: &str,
    ) -> Result<AppliedMove, ArbiterError> {
        let applied = self
            .mutate(id, |game| game.apply_move(move_text))
            .await?;
        if applied.match_over {
            tracing::info!(match_id = %id, result = ?applied.result, "match completed by move");
        }
        Ok(applied)
    }

    /// Resign on behalf of a participant.
    pub async fn resign(&self, id: MatchId, player: PlayerId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.resign(player)).await
    }

    /// Record a draw offer.
    pub async fn offer_draw(&self, id: MatchId, player: PlayerId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.offer_draw(player))
            .await
    }

    /// Accept an outstanding draw offer.
    pub async fn accept_draw(&self, id: MatchId, player: PlayerId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.accept_draw(player))
            .await
    }

    /// Decline an outstanding draw offer.
    pub async fn decline_draw(&self, id: MatchId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.decline_draw()).await
    }

    /// Pause a match.
    pub async fn pause(&self, id: MatchId, player: PlayerId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.pause(player)).await
    }

    /// Resume a paused match.
    pub async fn resume(&self, id: MatchId) -> Result<Match, ArbiterError> {
        self.mutate_returning(id, |game| game.resume()).await
    }

    /// Complete a match with an explicit result.
    pub async fn complete(
        &self,
        id: MatchId,
        result: MatchResult,
    ) -> Result<Match, ArbiterError> {
        let game = self
            .mutate_returning(id, |game| game.complete_game(result))
            .await?;
        tracing::info!(match_id = %id, %result, "match completed");
        Ok(game)
    }

    // --- Read-only delegations ---

    /// Probe whether a move would be accepted, without mutating anything.
    pub async fn validate_move(
        &self,
        id: MatchId,
        move_text: &str,
    ) -> Result<MoveValidation, ArbiterError> {
        self.loaded(id).await?.validate_move(move_text)
    }

    /// Advisory draw bookkeeping for a match.
    pub async fn draw_status(&self, id: MatchId) -> Result<Option<DrawStatus>, ArbiterError> {
        self.loaded(id).await?.draw_status()
    }

    /// The move history of a match, in the requested shape.
    pub async fn move_history(
        &self,
        id: MatchId,
        format: HistoryFormat,
    ) -> Result<MoveHistory, ArbiterError> {
        self.loaded(id).await?.move_history(format)
    }

    /// The game-notation transcript of a match.
    pub async fn pgn(&self, id: MatchId) -> Result<String, ArbiterError> {
        Ok(self.loaded(id).await?.pgn())
    }

    /// Probe the storage backend.
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    /// Release storage resources.
    pub async fn close(&self) -> Result<(), ArbiterError> {
        self.store.close().await
    }

    // --- Private helpers ---

    fn lock_for(&self, id: MatchId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(id).or_default())
    }

    async fn loaded(&self, id: MatchId) -> Result<Match, ArbiterError> {
        self.store
            .load(id)
            .await?
            .ok_or(ArbiterError::MatchNotFound { id })
    }

    /// Load→mutate→persist under the match's lock, returning the operation's
    /// own result.
    async fn mutate<F, T>(&self, id: MatchId, op: F) -> Result<T, ArbiterError>
    where
        F: FnOnce(&mut Match) -> Result<T, ArbiterError>,
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut game = self.loaded(id).await?;
        let out = op(&mut game)?;
        self.store.save(&game).await?;
        Ok(out)
    }

    /// Like [`mutate`](Self::mutate), returning the updated match snapshot.
    async fn mutate_returning<F>(&self, id: MatchId, op: F) -> Result<Match, ArbiterError>
    where
        F: FnOnce(&mut Match) -> Result<(), ArbiterError>,
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut game = self.loaded(id).await?;
        op(&mut game)?;
        self.store.save(&game).await?;
        Ok(game)
    }
}

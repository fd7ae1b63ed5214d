//! In-memory match storage for tests and ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ArbiterError;
use crate::game::{Match, MatchDump};
use crate::store::MatchStore;
use crate::types::game::{MatchId, MatchStatus, PlayerId};

/// Ephemeral [`MatchStore`] backed by a mutex-guarded map.
///
/// Records are held as dumps, so reads go through the same restore path as
/// the durable stores and never alias the writer's copy.
pub struct MemoryMatchStore {
    inner: Mutex<HashMap<MatchId, MatchDump>>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Restore every dump that passes `filter`, skipping corrupt records.
    fn restore_where<F>(&self, filter: F) -> Vec<Match>
    where
        F: Fn(&MatchDump) -> bool,
    {
        let inner = self.inner.lock();
        let mut matches: Vec<Match> = inner
            .values()
            .filter(|dump| filter(dump))
            .filter_map(|dump| match Match::restore(dump.clone()) {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!(match_id = %dump.id, "skipping corrupt record: {e}");
                    None
                }
            })
            .collect();
        matches.sort_by_key(|m| std::cmp::Reverse(m.updated_at()));
        matches
    }
}

impl Default for MemoryMatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn save(&self, game: &Match) -> Result<(), ArbiterError> {
        let mut inner = self.inner.lock();
        inner.insert(game.id(), game.dump());
        Ok(())
    }

    async fn load(&self, id: MatchId) -> Result<Option<Match>, ArbiterError> {
        let dump = {
            let inner = self.inner.lock();
            inner.get(&id).cloned()
        };
        match dump {
            Some(dump) => Ok(Some(Match::restore(dump)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: MatchId) -> Result<bool, ArbiterError> {
        let mut inner = self.inner.lock();
        Ok(inner.remove(&id).is_some())
    }

    async fn exists(&self, id: MatchId) -> Result<bool, ArbiterError> {
        let inner = self.inner.lock();
        Ok(inner.contains_key(&id))
    }

    async fn load_all(&self) -> Result<Vec<Match>, ArbiterError> {
        Ok(self.restore_where(|_| true))
    }

    async fn load_by_status(&self, status: MatchStatus) -> Result<Vec<Match>, ArbiterError> {
        Ok(self.restore_where(|dump| dump.status == status))
    }

    async fn load_by_participant(&self, player: PlayerId) -> Result<Vec<Match>, ArbiterError> {
        Ok(self.restore_where(|dump| dump.white == player || dump.black == player))
    }

    async fn count_active(&self) -> Result<usize, ArbiterError> {
        let inner = self.inner.lock();
        Ok(inner
            .values()
            .filter(|dump| dump.status == MatchStatus::Active)
            .count())
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<(), ArbiterError> {
        Ok(())
    }
}

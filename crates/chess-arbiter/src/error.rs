use crate::types::MatchId;

/// Errors that can occur in the arbiter.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    #[error("match {id} not found")]
    MatchNotFound { id: MatchId },

    #[error("illegal state: {reason}")]
    IllegalState { reason: String },

    #[error("invalid move: {reason}")]
    InvalidMove {
        reason: String,
        /// A legal alternative in SAN, where one could be derived.
        suggestion: Option<String>,
    },

    #[error("capacity exceeded: {active} active matches at limit {limit}")]
    CapacityExceeded { active: usize, limit: usize },

    #[error("corrupt state for match {id}: {reason}")]
    CorruptState { id: MatchId, reason: String },

    #[error("persistence error: {reason}")]
    Persistence {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ArbiterError {
    /// Shorthand for an [`ArbiterError::IllegalState`].
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        Self::IllegalState {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`ArbiterError::Persistence`] without a source.
    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence {
            reason: reason.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let id = MatchId::new();
        let err = ArbiterError::MatchNotFound { id };
        assert_eq!(err.to_string(), format!("match {id} not found"));

        let err = ArbiterError::illegal_state("paused");
        assert_eq!(err.to_string(), "illegal state: paused");

        let err = ArbiterError::CapacityExceeded {
            active: 5,
            limit: 5,
        };
        assert_eq!(
            err.to_string(),
            "capacity exceeded: 5 active matches at limit 5"
        );
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArbiterError>();
    }
}

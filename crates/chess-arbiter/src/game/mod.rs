//! The match aggregate.
//!
//! `Match` owns identity, participants, the current position, the move log
//! and all draw/pause metadata, and exposes the turn-by-turn state machine:
//!
//! - states: Active, Paused, Completed (terminal)
//! - transitions: Active→Paused (pause), Paused→Active (resume),
//!   Active→Completed (terminal move, resignation, draw acceptance, explicit
//!   completion)
//!
//! There is deliberately no Paused→Completed transition: a paused match must
//! be resumed before it can complete.
//!
//! All state transitions live here; the session manager only loads, calls and
//! persists.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chess::{ChessPosition, Transcript};
use crate::error::ArbiterError;
use crate::types::chess::Color;
use crate::types::game::{
    DrawOffer, DrawStatus, MatchId, MatchResult, MatchStatus, MoveValidation, PlayerId,
    ResultDetail, TimeControl,
};

pub mod history;

pub use history::{DetailedMove, HistoryFormat, MoveHistory, MoveWithPosition, VerboseMove};

/// Standard starting FEN.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Response from applying a move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedMove {
    /// The move in canonical SAN (e.g., "e4").
    pub san: String,
    /// FEN after the move.
    pub position: String,
    /// Whether the match is now over.
    pub match_over: bool,
    /// Status after the move.
    pub status: MatchStatus,
    /// Final result if the match ended.
    pub result: Option<MatchResult>,
    /// How the match ended, if it did.
    pub result_detail: Option<ResultDetail>,
}

/// One game session between two participants.
///
/// The aggregate is exclusively owned by whichever layer holds a loaded copy;
/// snapshots handed to callers are independent clones and never alias the
/// stored version.
#[derive(Debug, Clone)]
pub struct Match {
    id: MatchId,
    white: PlayerId,
    black: PlayerId,
    status: MatchStatus,
    /// Current position in FEN; mutated only by a validated move.
    position: String,
    /// Applied moves in SAN. Append-only.
    move_log: Vec<String>,
    result: Option<MatchResult>,
    result_detail: Option<ResultDetail>,
    /// Position fingerprint -> occurrence count, seeded with the opening.
    position_history: HashMap<String, u32>,
    draw_offer: Option<DrawOffer>,
    pause_requested_by: Option<PlayerId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_move_at: Option<DateTime<Utc>>,
    time_control: Option<TimeControl>,
    white_time_remaining: Option<Duration>,
    black_time_remaining: Option<Duration>,
}

/// Full-fidelity serialized form of a [`Match`].
///
/// `dump`/`restore` round-trip every field; the side to move is never stored
/// because it is derived from the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDump {
    pub id: MatchId,
    pub white: PlayerId,
    pub black: PlayerId,
    pub status: MatchStatus,
    pub position: String,
    pub move_log: Vec<String>,
    pub result: Option<MatchResult>,
    pub result_detail: Option<ResultDetail>,
    pub position_history: HashMap<String, u32>,
    pub draw_offer: Option<DrawOffer>,
    pub pause_requested_by: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_move_at: Option<DateTime<Utc>>,
    pub time_control: Option<TimeControl>,
    pub white_time_remaining: Option<Duration>,
    pub black_time_remaining: Option<Duration>,
}

impl Match {
    /// Create a new active match between two participants.
    ///
    /// Clocks are present exactly when a time control is supplied; an absent
    /// clock is distinguishable from a clock at zero.
    #[must_use]
    pub fn new(
        id: MatchId,
        white: PlayerId,
        black: PlayerId,
        time_control: Option<TimeControl>,
    ) -> Self {
        let now = Utc::now();
        let initial_time = time_control.map(|tc| tc.initial_time());
        let mut position_history = HashMap::new();
        position_history.insert(ChessPosition::new().fingerprint(), 1);

        Self {
            id,
            white,
            black,
            status: MatchStatus::Active,
            position: STARTING_FEN.to_string(),
            move_log: Vec::new(),
            result: None,
            result_detail: None,
            position_history,
            draw_offer: None,
            pause_requested_by: None,
            created_at: now,
            updated_at: now,
            last_move_at: None,
            time_control,
            white_time_remaining: initial_time,
            black_time_remaining: initial_time,
        }
    }

    // --- Accessors ---

    /// The match ID.
    #[must_use]
    pub const fn id(&self) -> MatchId {
        self.id
    }

    /// The white participant.
    #[must_use]
    pub const fn white(&self) -> PlayerId {
        self.white
    }

    /// The black participant.
    #[must_use]
    pub const fn black(&self) -> PlayerId {
        self.black
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Current position in FEN.
    #[must_use]
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Applied moves in SAN.
    #[must_use]
    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    /// Final result, if the match is over.
    #[must_use]
    pub const fn result(&self) -> Option<MatchResult> {
        self.result
    }

    /// How the match ended, if it did.
    #[must_use]
    pub const fn result_detail(&self) -> Option<ResultDetail> {
        self.result_detail
    }

    /// Position fingerprint occurrence counts.
    #[must_use]
    pub const fn position_history(&self) -> &HashMap<String, u32> {
        &self.position_history
    }

    /// Outstanding draw offer, if any.
    #[must_use]
    pub const fn draw_offer(&self) -> Option<DrawOffer> {
        self.draw_offer
    }

    /// Who paused the match, while it is paused.
    #[must_use]
    pub const fn pause_requested_by(&self) -> Option<PlayerId> {
        self.pause_requested_by
    }

    /// When the match was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the match was last mutated.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// When the last move was applied.
    #[must_use]
    pub const fn last_move_at(&self) -> Option<DateTime<Utc>> {
        self.last_move_at
    }

    /// The time control, if one was supplied at creation.
    #[must_use]
    pub const fn time_control(&self) -> Option<TimeControl> {
        self.time_control
    }

    /// Remaining time for the given color; `None` when the match is untimed.
    #[must_use]
    pub const fn time_remaining(&self, color: Color) -> Option<Duration> {
        match color {
            Color::White => self.white_time_remaining,
            Color::Black => self.black_time_remaining,
        }
    }

    /// The color to move, read from the position encoding.
    #[must_use]
    pub fn turn_color(&self) -> Color {
        match self.position.split_whitespace().nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }

    /// The participant who moves next. Derived from the position, never
    /// stored separately.
    #[must_use]
    pub fn turn(&self) -> PlayerId {
        self.player_for_color(self.turn_color())
    }

    /// Get the color for a participant, if they are in this match.
    #[must_use]
    pub fn player_color(&self, player: PlayerId) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Get the participant for a given color.
    #[must_use]
    pub const fn player_for_color(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    // --- State machine ---

    /// Validate and apply a move in SAN.
    ///
    /// On rejection nothing is mutated. On acceptance the position, move log,
    /// fingerprint counts, clocks and timestamps all advance, and a terminal
    /// verdict from the rules engine completes the match in the same call.
    pub fn apply_move(&mut self, move_text: &str) -> Result<AppliedMove, ArbiterError> {
        self.ensure_active()?;

        let mut position = self.engine_position()?;
        let mover = position.turn();
        let played = match position.apply_san(move_text) {
            Ok(played) => played,
            Err(e) => {
                return Err(ArbiterError::InvalidMove {
                    reason: e.to_string(),
                    suggestion: position.suggest_alternative(move_text),
                });
            }
        };

        let now = Utc::now();
        self.charge_clock(mover, now);
        self.position = position.to_fen();
        self.move_log.push(played.san.clone());
        *self
            .position_history
            .entry(position.fingerprint())
            .or_insert(0) += 1;
        self.last_move_at = Some(now);
        self.updated_at = now;
        self.draw_offer = None;

        if let Some(outcome) = position.outcome() {
            let (result, detail) = outcome.to_result_and_detail();
            self.finish(result, Some(detail), now);
        }

        Ok(AppliedMove {
            san: played.san,
            position: self.position.clone(),
            match_over: self.status.is_over(),
            status: self.status,
            result: self.result,
            result_detail: self.result_detail,
        })
    }

    /// Probe whether a move would be accepted, without mutating anything.
    ///
    /// When the match is not active the probe reports the state instead of
    /// consulting the rules engine.
    pub fn validate_move(&self, move_text: &str) -> Result<MoveValidation, ArbiterError> {
        match self.status {
            MatchStatus::Paused => return Ok(MoveValidation::rejected("match is paused", None)),
            MatchStatus::Completed => {
                return Ok(MoveValidation::rejected("match is not active", None))
            }
            MatchStatus::Active => {}
        }

        let position = self.engine_position()?;
        Ok(match position.validate_san(move_text) {
            Ok(_) => MoveValidation::ok(),
            Err(e) => {
                MoveValidation::rejected(e.to_string(), position.suggest_alternative(move_text))
            }
        })
    }

    /// Advisory draw bookkeeping; `None` unless the match is active.
    pub fn draw_status(&self) -> Result<Option<DrawStatus>, ArbiterError> {
        if !self.status.is_active() {
            return Ok(None);
        }

        let position = self.engine_position()?;
        let halfmove_clock = position.halfmove_clock();
        let repetition_count = self
            .position_history
            .get(&position.fingerprint())
            .copied()
            .unwrap_or(0);

        Ok(Some(DrawStatus {
            halfmove_clock,
            moves_until_fifty_move: 50u32.saturating_sub(halfmove_clock / 2),
            repetition_count,
            is_approaching_fifty_move: halfmove_clock >= 80,
            is_approaching_repetition: repetition_count >= 2,
        }))
    }

    /// Complete the match with an explicit result.
    ///
    /// Not idempotent: completing twice fails. A paused match must be resumed
    /// first.
    pub fn complete_game(&mut self, result: MatchResult) -> Result<(), ArbiterError> {
        self.complete_with(result, None)
    }

    /// Resign: the other participant wins.
    pub fn resign(&mut self, player: PlayerId) -> Result<(), ArbiterError> {
        self.ensure_active()?;
        let color = self.ensure_participant(player)?;
        let result = match color {
            Color::White => MatchResult::BlackWins,
            Color::Black => MatchResult::WhiteWins,
        };
        self.complete_with(result, Some(ResultDetail::Resignation))
    }

    /// Record a draw offer from a participant.
    pub fn offer_draw(&mut self, player: PlayerId) -> Result<(), ArbiterError> {
        self.ensure_active()?;
        self.ensure_participant(player)?;
        self.draw_offer = Some(DrawOffer::new(player));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Accept an outstanding draw offer made by the other participant.
    pub fn accept_draw(&mut self, player: PlayerId) -> Result<(), ArbiterError> {
        let offer = self
            .draw_offer
            .ok_or_else(|| ArbiterError::illegal_state("no draw offer to accept"))?;
        self.ensure_participant(player)?;
        if offer.offered_by == player {
            return Err(ArbiterError::illegal_state("cannot accept own offer"));
        }
        self.complete_with(MatchResult::Draw, Some(ResultDetail::DrawAgreement))
    }

    /// Decline an outstanding draw offer, clearing it.
    pub fn decline_draw(&mut self) -> Result<(), ArbiterError> {
        if self.draw_offer.is_none() {
            return Err(ArbiterError::illegal_state("no draw offer to decline"));
        }
        self.draw_offer = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Pause an active match.
    ///
    /// Clears any outstanding draw offer: offers only exist on active matches.
    pub fn pause(&mut self, player: PlayerId) -> Result<(), ArbiterError> {
        match self.status {
            MatchStatus::Active => {}
            MatchStatus::Paused => return Err(ArbiterError::illegal_state("already paused")),
            MatchStatus::Completed => return Err(ArbiterError::illegal_state("inactive")),
        }
        self.ensure_participant(player)?;
        self.status = MatchStatus::Paused;
        self.pause_requested_by = Some(player);
        self.draw_offer = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Resume a paused match.
    pub fn resume(&mut self) -> Result<(), ArbiterError> {
        match self.status {
            MatchStatus::Paused => {}
            MatchStatus::Active => return Err(ArbiterError::illegal_state("not paused")),
            MatchStatus::Completed => return Err(ArbiterError::illegal_state("inactive")),
        }
        self.status = MatchStatus::Active;
        self.pause_requested_by = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    // --- Projections ---

    /// The full game-notation transcript, regenerated from the move log.
    #[must_use]
    pub fn pgn(&self) -> String {
        let result_token = self.result.map_or("*", |r| r.token());
        Transcript::new()
            .header("Event", "Arbitrated match")
            .header("Site", "chess-arbiter")
            .header("Date", self.created_at.format("%Y.%m.%d").to_string())
            .header("White", self.white.to_string())
            .header("Black", self.black.to_string())
            .header("Result", result_token)
            .render(&self.move_log, result_token)
    }

    /// The move history in the requested shape.
    pub fn move_history(&self, format: HistoryFormat) -> Result<MoveHistory, ArbiterError> {
        history::project(&self.move_log, format).map_err(|(index, e)| {
            ArbiterError::CorruptState {
                id: self.id,
                reason: format!(
                    "move log replay failed at halfmove {} ({}): {e}",
                    index + 1,
                    self.move_log[index]
                ),
            }
        })
    }

    // --- Serialization ---

    /// Produce the full-fidelity serialized form.
    #[must_use]
    pub fn dump(&self) -> MatchDump {
        MatchDump {
            id: self.id,
            white: self.white,
            black: self.black,
            status: self.status,
            position: self.position.clone(),
            move_log: self.move_log.clone(),
            result: self.result,
            result_detail: self.result_detail,
            position_history: self.position_history.clone(),
            draw_offer: self.draw_offer,
            pause_requested_by: self.pause_requested_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_move_at: self.last_move_at,
            time_control: self.time_control,
            white_time_remaining: self.white_time_remaining,
            black_time_remaining: self.black_time_remaining,
        }
    }

    /// Rebuild a match from its serialized form.
    ///
    /// The move log is replayed from the opening position to reconstruct the
    /// rules-engine state; a rejected move, a position mismatch or a
    /// cross-field inconsistency marks the record corrupt. The side to move
    /// is re-derived from the restored position, never trusted from storage.
    pub fn restore(dump: MatchDump) -> Result<Self, ArbiterError> {
        let id = dump.id;
        let corrupt = |reason: String| ArbiterError::CorruptState { id, reason };

        let (position, _) = history::replay(&dump.move_log).map_err(|(index, e)| {
            corrupt(format!(
                "replay failed at halfmove {} ({}): {e}",
                index + 1,
                dump.move_log[index]
            ))
        })?;
        if position.to_fen() != dump.position {
            return Err(corrupt(
                "replayed position does not match stored position".to_string(),
            ));
        }

        if dump.status.is_over() != dump.result.is_some() {
            return Err(corrupt(
                "completed status and result must be set together".to_string(),
            ));
        }
        if dump.draw_offer.is_some() && !dump.status.is_active() {
            return Err(corrupt("draw offer on a non-active match".to_string()));
        }
        if dump.pause_requested_by.is_some() != dump.status.is_paused() {
            return Err(corrupt("pause marker disagrees with status".to_string()));
        }
        let has_clocks =
            dump.white_time_remaining.is_some() && dump.black_time_remaining.is_some();
        if dump.time_control.is_some() != has_clocks {
            return Err(corrupt(
                "clock fields disagree with time control".to_string(),
            ));
        }

        Ok(Self {
            id: dump.id,
            white: dump.white,
            black: dump.black,
            status: dump.status,
            position: dump.position,
            move_log: dump.move_log,
            result: dump.result,
            result_detail: dump.result_detail,
            position_history: dump.position_history,
            draw_offer: dump.draw_offer,
            pause_requested_by: dump.pause_requested_by,
            created_at: dump.created_at,
            updated_at: dump.updated_at,
            last_move_at: dump.last_move_at,
            time_control: dump.time_control,
            white_time_remaining: dump.white_time_remaining,
            black_time_remaining: dump.black_time_remaining,
        })
    }

    // --- Private helpers ---

    fn ensure_active(&self) -> Result<(), ArbiterError> {
        match self.status {
            MatchStatus::Active => Ok(()),
            MatchStatus::Paused => Err(ArbiterError::illegal_state("paused")),
            MatchStatus::Completed => Err(ArbiterError::illegal_state("inactive")),
        }
    }

    fn ensure_participant(&self, player: PlayerId) -> Result<Color, ArbiterError> {
        self.player_color(player).ok_or_else(|| {
            ArbiterError::illegal_state(format!("player {player} is not in this match"))
        })
    }

    fn engine_position(&self) -> Result<ChessPosition, ArbiterError> {
        ChessPosition::from_fen(&self.position).map_err(|e| ArbiterError::CorruptState {
            id: self.id,
            reason: format!("stored position is unreadable: {e}"),
        })
    }

    fn complete_with(
        &mut self,
        result: MatchResult,
        detail: Option<ResultDetail>,
    ) -> Result<(), ArbiterError> {
        match self.status {
            MatchStatus::Active => {
                self.finish(result, detail, Utc::now());
                Ok(())
            }
            MatchStatus::Paused => Err(ArbiterError::illegal_state(
                "paused; resume before completing",
            )),
            MatchStatus::Completed => {
                Err(ArbiterError::illegal_state("match already completed"))
            }
        }
    }

    fn finish(&mut self, result: MatchResult, detail: Option<ResultDetail>, now: DateTime<Utc>) {
        self.status = MatchStatus::Completed;
        self.result = Some(result);
        self.result_detail = detail;
        self.draw_offer = None;
        self.pause_requested_by = None;
        self.updated_at = now;
    }

    /// Deduct elapsed thinking time from the mover's clock and add the
    /// increment. Untimed matches are untouched.
    fn charge_clock(&mut self, mover: Color, now: DateTime<Utc>) {
        let Some(tc) = self.time_control else {
            return;
        };
        let since = self.last_move_at.unwrap_or(self.created_at);
        let elapsed = (now - since).to_std().unwrap_or_default();
        let slot = match mover {
            Color::White => &mut self.white_time_remaining,
            Color::Black => &mut self.black_time_remaining,
        };
        if let Some(remaining) = slot {
            *remaining = remaining.saturating_sub(elapsed) + tc.increment();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_match() -> Match {
        Match::new(MatchId::new(), PlayerId::new(), PlayerId::new(), None)
    }

    #[test]
    fn test_new_match_initial_state() {
        let m = new_match();
        assert_eq!(m.status(), MatchStatus::Active);
        assert_eq!(m.turn(), m.white());
        assert_eq!(m.turn_color(), Color::White);
        assert!(m.move_log().is_empty());
        assert!(m.result().is_none());
        assert!(m.draw_offer().is_none());
        assert!(m.last_move_at().is_none());

        // Opening fingerprint seeded at 1
        let opening = ChessPosition::new().fingerprint();
        assert_eq!(m.position_history().get(&opening), Some(&1));
        assert_eq!(m.position_history().len(), 1);
    }

    #[test]
    fn test_untimed_match_has_no_clocks() {
        let m = new_match();
        assert!(m.time_control().is_none());
        assert!(m.time_remaining(Color::White).is_none());
        assert!(m.time_remaining(Color::Black).is_none());
    }

    #[test]
    fn test_timed_match_seeds_clocks() {
        let m = Match::new(
            MatchId::new(),
            PlayerId::new(),
            PlayerId::new(),
            Some(TimeControl::BLITZ),
        );
        assert_eq!(
            m.time_remaining(Color::White),
            Some(TimeControl::BLITZ.initial_time())
        );
        assert_eq!(
            m.time_remaining(Color::Black),
            Some(TimeControl::BLITZ.initial_time())
        );
    }

    #[test]
    fn test_apply_move_advances_state() {
        let mut m = new_match();
        let applied = m.apply_move("e4").unwrap();
        assert_eq!(applied.san, "e4");
        assert!(!applied.match_over);
        assert_eq!(m.move_log(), ["e4"]);
        assert_eq!(m.turn(), m.black());
        assert!(m.last_move_at().is_some());
        // The new position's fingerprint was counted
        let fp = ChessPosition::from_fen(m.position()).unwrap().fingerprint();
        assert_eq!(m.position_history().get(&fp), Some(&1));
    }

    #[test]
    fn test_rejected_move_mutates_nothing() {
        let mut m = new_match();
        let before = m.dump();
        let err = m.apply_move("Ke2").unwrap_err();
        assert!(matches!(err, ArbiterError::InvalidMove { .. }));
        assert_eq!(m.dump(), before);
    }

    #[test]
    fn test_invalid_move_carries_suggestion() {
        let mut m = new_match();
        let err = m.apply_move("Ne5").unwrap_err();
        let ArbiterError::InvalidMove { suggestion, .. } = err else {
            panic!("expected invalid move");
        };
        assert!(suggestion.is_some());
    }

    #[test]
    fn test_checkmate_completes_in_same_call() {
        let mut m = new_match();
        m.apply_move("f3").unwrap();
        m.apply_move("e5").unwrap();
        m.apply_move("g4").unwrap();
        let applied = m.apply_move("Qh4#").unwrap();

        assert!(applied.match_over);
        assert_eq!(applied.status, MatchStatus::Completed);
        assert_eq!(m.status(), MatchStatus::Completed);
        assert_eq!(m.result(), Some(MatchResult::BlackWins));
        assert_eq!(m.result_detail(), Some(ResultDetail::Checkmate));
    }

    #[test]
    fn test_completed_match_rejects_everything() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        let white = m.white();
        m.complete_game(MatchResult::Draw).unwrap();
        let before = m.dump();

        assert!(matches!(
            m.apply_move("e5").unwrap_err(),
            ArbiterError::IllegalState { .. }
        ));
        assert!(matches!(
            m.pause(white).unwrap_err(),
            ArbiterError::IllegalState { .. }
        ));
        assert!(matches!(
            m.resign(white).unwrap_err(),
            ArbiterError::IllegalState { .. }
        ));
        assert!(matches!(
            m.offer_draw(white).unwrap_err(),
            ArbiterError::IllegalState { .. }
        ));
        assert_eq!(m.dump(), before);
    }

    #[test]
    fn test_complete_game_is_not_idempotent() {
        let mut m = new_match();
        m.complete_game(MatchResult::WhiteWins).unwrap();
        assert!(m.complete_game(MatchResult::WhiteWins).is_err());
    }

    #[test]
    fn test_no_direct_paused_to_completed_transition() {
        let mut m = new_match();
        let white = m.white();
        m.pause(white).unwrap();
        assert!(m.complete_game(MatchResult::Draw).is_err());
        assert!(m.resign(white).is_err());

        m.resume().unwrap();
        m.complete_game(MatchResult::Draw).unwrap();
        assert_eq!(m.status(), MatchStatus::Completed);
    }

    #[test]
    fn test_pause_resume_cycle() {
        let mut m = new_match();
        let white = m.white();

        m.pause(white).unwrap();
        assert_eq!(m.status(), MatchStatus::Paused);
        assert_eq!(m.pause_requested_by(), Some(white));
        assert!(matches!(
            m.pause(white).unwrap_err(),
            ArbiterError::IllegalState { .. }
        ));

        m.resume().unwrap();
        assert_eq!(m.status(), MatchStatus::Active);
        assert!(m.pause_requested_by().is_none());
        assert!(m.resume().is_err());
    }

    #[test]
    fn test_pause_rejects_stranger() {
        let mut m = new_match();
        assert!(m.pause(PlayerId::new()).is_err());
        assert_eq!(m.status(), MatchStatus::Active);
    }

    #[test]
    fn test_paused_match_rejects_moves_with_reason() {
        let mut m = new_match();
        m.pause(m.white()).unwrap();
        let err = m.apply_move("e4").unwrap_err();
        let ArbiterError::IllegalState { reason } = err else {
            panic!("expected illegal state");
        };
        assert_eq!(reason, "paused");
    }

    #[test]
    fn test_resign_awards_other_side() {
        let mut m = new_match();
        m.resign(m.black()).unwrap();
        assert_eq!(m.result(), Some(MatchResult::WhiteWins));
        assert_eq!(m.result_detail(), Some(ResultDetail::Resignation));
    }

    #[test]
    fn test_resign_rejects_stranger() {
        let mut m = new_match();
        assert!(m.resign(PlayerId::new()).is_err());
        assert_eq!(m.status(), MatchStatus::Active);
    }

    #[test]
    fn test_draw_offer_flow() {
        let mut m = new_match();
        let (white, black) = (m.white(), m.black());

        // Accept with no offer fails
        assert!(m.accept_draw(black).is_err());
        assert!(m.decline_draw().is_err());

        m.offer_draw(white).unwrap();
        assert_eq!(m.draw_offer().unwrap().offered_by, white);

        // Offerer cannot accept their own offer
        let err = m.accept_draw(white).unwrap_err();
        let ArbiterError::IllegalState { reason } = err else {
            panic!("expected illegal state");
        };
        assert_eq!(reason, "cannot accept own offer");

        m.accept_draw(black).unwrap();
        assert_eq!(m.status(), MatchStatus::Completed);
        assert_eq!(m.result(), Some(MatchResult::Draw));
        assert_eq!(m.result_detail(), Some(ResultDetail::DrawAgreement));
        assert!(m.draw_offer().is_none());
    }

    #[test]
    fn test_decline_clears_offer() {
        let mut m = new_match();
        m.offer_draw(m.white()).unwrap();
        m.decline_draw().unwrap();
        assert!(m.draw_offer().is_none());
        assert!(m.decline_draw().is_err());
    }

    #[test]
    fn test_move_clears_draw_offer() {
        let mut m = new_match();
        m.offer_draw(m.black()).unwrap();
        m.apply_move("e4").unwrap();
        assert!(m.draw_offer().is_none());
    }

    #[test]
    fn test_pause_clears_draw_offer() {
        let mut m = new_match();
        m.offer_draw(m.white()).unwrap();
        m.pause(m.white()).unwrap();
        assert!(m.draw_offer().is_none());
    }

    #[test]
    fn test_validate_move_is_read_only() {
        let m = new_match();
        let before = m.dump();

        let probe = m.validate_move("e4").unwrap();
        assert!(probe.valid);

        let probe = m.validate_move("Ke2").unwrap();
        assert!(!probe.valid);
        assert!(probe.reason.is_some());
        assert!(probe.suggestion.is_some());

        assert_eq!(m.dump(), before);
    }

    #[test]
    fn test_validate_move_reports_state_without_engine() {
        let mut m = new_match();
        m.pause(m.white()).unwrap();
        let probe = m.validate_move("e4").unwrap();
        assert!(!probe.valid);
        assert_eq!(probe.reason.as_deref(), Some("match is paused"));
    }

    #[test]
    fn test_repetition_counting() {
        let mut m = new_match();
        // Knights out and back: returns to the opening fingerprint
        for san in ["Nf3", "Nf6", "Ng1", "Ng8"] {
            m.apply_move(san).unwrap();
        }
        let status = m.draw_status().unwrap().unwrap();
        assert_eq!(status.repetition_count, 2);
        assert!(status.is_approaching_repetition);

        for san in ["Nf3", "Nf6", "Ng1", "Ng8"] {
            m.apply_move(san).unwrap();
        }
        let status = m.draw_status().unwrap().unwrap();
        assert_eq!(status.repetition_count, 3);
    }

    #[test]
    fn test_draw_status_clock_fields() {
        let mut m = new_match();
        let status = m.draw_status().unwrap().unwrap();
        assert_eq!(status.halfmove_clock, 0);
        assert_eq!(status.moves_until_fifty_move, 50);
        assert!(!status.is_approaching_fifty_move);
        assert_eq!(status.repetition_count, 1);

        m.apply_move("Nf3").unwrap();
        m.apply_move("Nf6").unwrap();
        let status = m.draw_status().unwrap().unwrap();
        assert_eq!(status.halfmove_clock, 2);
        assert_eq!(status.moves_until_fifty_move, 49);
    }

    #[test]
    fn test_draw_status_none_when_not_active() {
        let mut m = new_match();
        m.pause(m.white()).unwrap();
        assert!(m.draw_status().unwrap().is_none());
    }

    #[test]
    fn test_dump_restore_round_trip() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        m.apply_move("e5").unwrap();
        m.offer_draw(m.white()).unwrap();

        let dump = m.dump();
        let restored = Match::restore(dump.clone()).unwrap();
        assert_eq!(restored.dump(), dump);
        assert_eq!(restored.turn(), m.turn());
        assert_eq!(restored.position_history(), m.position_history());
    }

    #[test]
    fn test_restore_rejects_bad_replay() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        let mut dump = m.dump();
        dump.move_log = vec!["e4".to_string(), "e4".to_string()];
        let err = Match::restore(dump).unwrap_err();
        assert!(matches!(err, ArbiterError::CorruptState { .. }));
    }

    #[test]
    fn test_restore_rejects_position_mismatch() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        let mut dump = m.dump();
        dump.position = STARTING_FEN.to_string();
        let err = Match::restore(dump).unwrap_err();
        assert!(matches!(err, ArbiterError::CorruptState { .. }));
    }

    #[test]
    fn test_restore_rejects_inconsistent_flags() {
        let m = new_match();
        let mut dump = m.dump();
        dump.pause_requested_by = Some(dump.white);
        let err = Match::restore(dump).unwrap_err();
        assert!(matches!(err, ArbiterError::CorruptState { .. }));
    }

    #[test]
    fn test_pgn_transcript() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        m.apply_move("e5").unwrap();
        let pgn = m.pgn();
        assert!(pgn.contains("[White \""));
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.ends_with("1. e4 e5 *\n"));

        m.resign(m.black()).unwrap();
        let pgn = m.pgn();
        assert!(pgn.contains("[Result \"1-0\"]"));
        assert!(pgn.ends_with("1. e4 e5 1-0\n"));
    }

    #[test]
    fn test_move_history_formats() {
        let mut m = new_match();
        m.apply_move("e4").unwrap();
        m.apply_move("e5").unwrap();

        let MoveHistory::Plain(plain) = m.move_history(HistoryFormat::Plain).unwrap() else {
            panic!("expected plain history");
        };
        assert_eq!(plain, ["e4", "e5"]);

        let MoveHistory::Detailed(detailed) = m.move_history(HistoryFormat::Detailed).unwrap()
        else {
            panic!("expected detailed history");
        };
        assert_eq!(detailed[1].uci, "e7e5");
        assert_eq!(detailed[1].color, Color::Black);
    }

    #[test]
    fn test_updated_at_refreshes_on_mutation() {
        let mut m = new_match();
        let created = m.updated_at();
        m.apply_move("e4").unwrap();
        assert!(m.updated_at() >= created);
        assert_eq!(m.last_move_at(), Some(m.updated_at()));

        let after_move = m.updated_at();
        m.offer_draw(m.white()).unwrap();
        assert!(m.updated_at() >= after_move);
        // Only moves stamp last_move_at
        assert_eq!(m.last_move_at(), Some(after_move));
    }
}

//! Move-history projections.
//!
//! A match keeps its move log as a plain SAN sequence; every richer view is
//! derived by replaying that log from the opening position. Each query format
//! is a closed variant with its own concrete payload type.

use serde::{Deserialize, Serialize};

use crate::chess::{ChessError, ChessPosition};
use crate::types::chess::Color;

/// Which shape of move history a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFormat {
    /// Bare SAN strings.
    Plain,
    /// SAN plus move number and color.
    Verbose,
    /// SAN plus the position after each move.
    WithPositions,
    /// Everything: SAN, UCI, capture/check flags and the position after.
    Detailed,
}

/// A move with its number and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerboseMove {
    /// Move number (1-indexed, same for both colors).
    pub number: u32,
    /// Color that made the move.
    pub color: Color,
    /// SAN notation.
    pub san: String,
}

/// A move with the position it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveWithPosition {
    /// SAN notation.
    pub san: String,
    /// FEN after the move.
    pub position: String,
}

/// A fully annotated move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedMove {
    /// Move number (1-indexed, same for both colors).
    pub number: u32,
    /// Color that made the move.
    pub color: Color,
    /// SAN notation.
    pub san: String,
    /// UCI notation.
    pub uci: String,
    /// Whether the move captured a piece.
    pub is_capture: bool,
    /// Whether the move gave check.
    pub gives_check: bool,
    /// FEN after the move.
    pub position: String,
}

/// Move history in the shape selected by a [`HistoryFormat`].
///
/// One concrete payload type per format; there is no polymorphic arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "moves", rename_all = "snake_case")]
pub enum MoveHistory {
    /// Bare SAN strings.
    Plain(Vec<String>),
    /// SAN plus move number and color.
    Verbose(Vec<VerboseMove>),
    /// SAN plus the position after each move.
    WithPositions(Vec<MoveWithPosition>),
    /// Fully annotated moves.
    Detailed(Vec<DetailedMove>),
}

impl MoveHistory {
    /// Number of moves in the projection.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Plain(moves) => moves.len(),
            Self::Verbose(moves) => moves.len(),
            Self::WithPositions(moves) => moves.len(),
            Self::Detailed(moves) => moves.len(),
        }
    }

    /// Whether the projection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One replayed halfmove.
#[derive(Debug, Clone)]
pub(crate) struct ReplayStep {
    pub san: String,
    pub uci: String,
    pub is_capture: bool,
    pub gives_check: bool,
    /// FEN after the move.
    pub position: String,
}

/// Replay a SAN move log from the opening position.
///
/// Returns the final position and every intermediate step, or the index of
/// the first move the rules engine rejected.
pub(crate) fn replay(
    moves: &[String],
) -> Result<(ChessPosition, Vec<ReplayStep>), (usize, ChessError)> {
    let mut position = ChessPosition::new();
    let mut steps = Vec::with_capacity(moves.len());

    for (index, san) in moves.iter().enumerate() {
        let played = position.apply_san(san).map_err(|e| (index, e))?;
        steps.push(ReplayStep {
            san: played.san,
            uci: played.uci,
            is_capture: played.is_capture,
            gives_check: played.gives_check,
            position: position.to_fen(),
        });
    }

    Ok((position, steps))
}

/// Project a SAN move log into the requested history shape.
pub(crate) fn project(
    moves: &[String],
    format: HistoryFormat,
) -> Result<MoveHistory, (usize, ChessError)> {
    // Number and color fall out of the index; only the position-bearing
    // formats pay for a replay.
    let numbered = |index: usize| {
        let number = (index / 2 + 1) as u32;
        let color = if index % 2 == 0 {
            Color::White
        } else {
            Color::Black
        };
        (number, color)
    };

    match format {
        HistoryFormat::Plain => Ok(MoveHistory::Plain(moves.to_vec())),
        HistoryFormat::Verbose => Ok(MoveHistory::Verbose(
            moves
                .iter()
                .enumerate()
                .map(|(i, san)| {
                    let (number, color) = numbered(i);
                    VerboseMove {
                        number,
                        color,
                        san: san.clone(),
                    }
                })
                .collect(),
        )),
        HistoryFormat::WithPositions => {
            let (_, steps) = replay(moves)?;
            Ok(MoveHistory::WithPositions(
                steps
                    .into_iter()
                    .map(|step| MoveWithPosition {
                        san: step.san,
                        position: step.position,
                    })
                    .collect(),
            ))
        }
        HistoryFormat::Detailed => {
            let (_, steps) = replay(moves)?;
            Ok(MoveHistory::Detailed(
                steps
                    .into_iter()
                    .enumerate()
                    .map(|(i, step)| {
                        let (number, color) = numbered(i);
                        DetailedMove {
                            number,
                            color,
                            san: step.san,
                            uci: step.uci,
                            is_capture: step.is_capture,
                            gives_check: step.gives_check,
                            position: step.position,
                        }
                    })
                    .collect(),
            ))
        }
    }
}

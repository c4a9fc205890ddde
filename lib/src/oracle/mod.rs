//! The opponent the learner trains against. An oracle is asked for a single
//! reply in a given position and answers with a legal move, or with nothing
//! when the position has no legal moves.
//!
//! The main implementation talks to a UCI chess engine like Stockfish over a
//! subprocess. A greedy one-ply opponent is available for tests and for
//! machines without an engine.

pub mod greedy;
pub mod uci;

use crate::{ChessBoard, ChessError, ChessMove};
use serde::{Deserialize, Serialize};

/// How much work the oracle may spend on a reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchLimit {
    /// Search depth in plies.
    pub depth: u8,
}

impl Default for SearchLimit {
    fn default() -> Self {
        SearchLimit { depth: 1 }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum OracleError {
    #[error("Could not start the engine at '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Communication with the engine failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("The engine closed its output unexpectedly.")]
    EngineExited,
    #[error("The engine violated the protocol: {0}")]
    Protocol(String),
    #[error("The engine answered with an unusable move: {0}")]
    Chess(#[from] ChessError),
}

pub trait OpponentOracle {
    /// Returns the reply for the player to move. `None` means there is no
    /// legal reply. The board is only borrowed for the duration of the call.
    fn play(
        &mut self,
        board: &ChessBoard,
        limit: SearchLimit,
    ) -> Result<Option<ChessMove>, OracleError>;

    /// Orderly shutdown. Implementations that hold external resources also
    /// release them when dropped, this only makes failures visible.
    fn shutdown(&mut self) -> Result<(), OracleError> {
        Ok(())
    }
}

impl<T: OpponentOracle + ?Sized> OpponentOracle for &mut T {
    fn play(
        &mut self,
        board: &ChessBoard,
        limit: SearchLimit,
    ) -> Result<Option<ChessMove>, OracleError> {
        (**self).play(board, limit)
    }

    fn shutdown(&mut self) -> Result<(), OracleError> {
        (**self).shutdown()
    }
}

impl<T: OpponentOracle + ?Sized> OpponentOracle for Box<T> {
    fn play(
        &mut self,
        board: &ChessBoard,
        limit: SearchLimit,
    ) -> Result<Option<ChessMove>, OracleError> {
        (**self).play(board, limit)
    }

    fn shutdown(&mut self) -> Result<(), OracleError> {
        (**self).shutdown()
    }
}

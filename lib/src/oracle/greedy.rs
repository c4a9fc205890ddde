//! An opponent that only looks at its own next move. It mates when it can,
//! otherwise it grabs the most material and likes to give check. Ties are
//! broken at random.

use super::{OpponentOracle, OracleError, SearchLimit};
use crate::{ChessBoard, ChessMove, PlayerColor};
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;

const MATE_SCORE: i32 = 10_000;

pub struct GreedyOracle<R: Rng> {
    rng: R,
}

impl<R: Rng> GreedyOracle<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

/// Material gain in half pawns, plus one for giving check.
fn score(board: &ChessBoard, mv: ChessMove) -> i32 {
    let mover = board.controlling_player;
    let mut after = board.clone();
    if after.execute_trusted(mv).is_err() {
        return i32::MIN;
    }
    if after.victory_state.winner() == Some(mover) {
        return MATE_SCORE;
    }
    let gain = after.material_balance() - board.material_balance();
    let gain = match mover {
        PlayerColor::White => gain,
        PlayerColor::Black => -gain,
    };
    2 * gain + after.is_check() as i32
}

impl<R: Rng> OpponentOracle for GreedyOracle<R> {
    /// The search limit is ignored, this oracle always looks one ply ahead.
    fn play(
        &mut self,
        board: &ChessBoard,
        _limit: SearchLimit,
    ) -> Result<Option<ChessMove>, OracleError> {
        let scored: SmallVec<[(ChessMove, i32); 64]> = board
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, score(board, mv)))
            .collect();
        let Some(best) = scored.iter().map(|(_, s)| *s).max() else {
            return Ok(None);
        };
        let candidates: SmallVec<[ChessMove; 64]> = scored
            .iter()
            .filter(|(_, s)| *s == best)
            .map(|(mv, _)| *mv)
            .collect();
        Ok(candidates.choose(&mut self.rng).copied())
    }
}

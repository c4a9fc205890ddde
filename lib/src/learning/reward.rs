//! Immediate rewards for single moves. The terminal payoffs dominate these
//! values, the shaping only guides the learner towards checks, material and
//! driving the opposing king to the edge.

use crate::{ChessBoard, ChessMove, PlayerColor};

pub const ILLEGAL_MOVE_PENALTY: f64 = -10.0;
const CHECK_BONUS: f64 = 2.0;
const EDGE_WEIGHT: f64 = 0.1;

/// Reward for `side` playing `mv` in `before`. `None` is worth nothing.
pub fn shaped_reward(before: &ChessBoard, mv: Option<&ChessMove>, side: PlayerColor) -> f64 {
    let Some(mv) = mv else {
        return 0.0;
    };
    if !before.is_legal(mv) {
        return ILLEGAL_MOVE_PENALTY;
    }
    let mut after = before.clone();
    if after.execute_trusted(*mv).is_err() {
        return ILLEGAL_MOVE_PENALTY;
    }

    let mut reward = 0.0;
    if after.is_check() {
        reward += CHECK_BONUS;
    }

    let material_change = (after.material_balance() - before.material_balance()) as f64;
    reward += match side {
        PlayerColor::White => material_change,
        PlayerColor::Black => -material_change,
    };

    if let Some(king) = after.king_position(side.other()) {
        reward += EDGE_WEIGHT * king.edge_closeness() as f64;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn reward(fen: &str, mv: &str, side: PlayerColor) -> f64 {
        let board = parse_fen(fen).unwrap();
        let mv = ChessMove::from_uci(mv).unwrap();
        shaped_reward(&board, Some(&mv), side)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn check_and_edge() {
        // Rook check along the eighth rank, the king stands on e8.
        assert_close(
            reward("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1a8", PlayerColor::White),
            2.4,
        );
    }

    #[test]
    fn capturing_a_queen() {
        assert_close(
            reward("4k3/8/8/8/8/8/3q4/R3K3 w - - 0 1", "e1d2", PlayerColor::White),
            9.4,
        );
    }

    #[test]
    fn material_counts_for_black() {
        // Takes the rook with check, the white king stands on e1.
        assert_close(
            reward("4k3/8/8/8/8/8/1q6/R3K3 b - - 0 1", "b2a1", PlayerColor::Black),
            7.4,
        );
    }

    #[test]
    fn quiet_move_in_the_center() {
        // Only the edge term remains: the black king on d5 is one step from
        // the center.
        assert_close(
            reward("8/8/8/3k4/8/8/8/R3K3 w - - 0 1", "e1f2", PlayerColor::White),
            0.1,
        );
    }

    #[test]
    fn illegal_move_is_penalized() {
        assert_eq!(
            reward("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1b2", PlayerColor::White),
            ILLEGAL_MOVE_PENALTY
        );
    }

    #[test]
    fn no_move_is_worth_nothing() {
        let board = parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(shaped_reward(&board, None, PlayerColor::White), 0.0);
    }
}

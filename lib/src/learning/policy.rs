//! Epsilon-greedy move selection.

use super::q_table::QTable;
use super::state_key::{ActionKey, StateKey};
use crate::{ChessBoard, ChessMove, MoveList};
use rand::seq::SliceRandom;
use rand::Rng;

/// With probability `epsilon` a uniformly random legal move, otherwise a
/// random move among those with the highest value. `None` if there are no
/// legal moves.
pub fn select_action<R: Rng + ?Sized>(
    board: &ChessBoard,
    q_table: &QTable,
    epsilon: f64,
    rng: &mut R,
) -> Option<ChessMove> {
    let moves = board.legal_moves();
    if moves.is_empty() {
        return None;
    }
    if rng.gen::<f64>() < epsilon {
        return moves.choose(rng).copied();
    }

    let state = StateKey::encode(board);
    let values: Vec<f64> = moves
        .iter()
        .map(|mv| q_table.get(&state, &ActionKey::encode(mv)))
        .collect();
    let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let candidates: MoveList = moves
        .iter()
        .zip(&values)
        .filter(|(_, value)| **value == best)
        .map(|(mv, _)| *mv)
        .collect();
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use fxhash::FxHashSet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ROOK_ENDGAME: &str = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";

    fn prepared_table(board: &ChessBoard, values: &[(&str, f64)]) -> QTable {
        let state = StateKey::encode(board);
        let mut table = QTable::new();
        // Everything we don't mention is clearly worse.
        for mv in board.legal_moves() {
            table.set(state.clone(), ActionKey::encode(&mv), -1.0);
        }
        for (mv, value) in values {
            let mv = ChessMove::from_uci(mv).unwrap();
            table.set(state.clone(), ActionKey::encode(&mv), *value);
        }
        table
    }

    #[test]
    fn greedy_choice_breaks_ties_at_random() {
        let board = parse_fen(ROOK_ENDGAME).unwrap();
        let table = prepared_table(&board, &[("a1a2", 1.0), ("a1a3", 1.0), ("a1a4", 0.5)]);
        let mut rng = StdRng::seed_from_u64(42);

        let mut chosen = FxHashSet::default();
        for _ in 0..200 {
            let mv = select_action(&board, &table, 0.0, &mut rng).unwrap();
            chosen.insert(mv.to_string());
        }
        let expected: FxHashSet<String> = ["a1a2", "a1a3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(chosen, expected);
    }

    #[test]
    fn full_exploration_reaches_every_move() {
        let board = parse_fen(ROOK_ENDGAME).unwrap();
        let table = prepared_table(&board, &[("a1a2", 100.0)]);
        let mut rng = StdRng::seed_from_u64(7);

        let chosen: FxHashSet<ChessMove> = (0..2000)
            .filter_map(|_| select_action(&board, &table, 1.0, &mut rng))
            .collect();
        assert_eq!(chosen.len(), board.legal_moves().len());
    }

    #[test]
    fn no_legal_moves_means_no_action() {
        let stalemate = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_action(&stalemate, &QTable::new(), 0.0, &mut rng), None);
        assert_eq!(select_action(&stalemate, &QTable::new(), 1.0, &mut rng), None);
    }
}

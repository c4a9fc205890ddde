//! All code related to checking draws that depend on the game history.
//! There are two types of draw checks:
//! - Game is drawn after 150 half-moves without "progress" (75-move rule).
//! - Game is drawn after 5-fold repetition.
//!
//! Neither of these needs to be claimed, they end the game automatically.

use std::hash::{Hash, Hasher};

use fxhash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::{ChessBoard, ChessMove, VictoryState};

/// Half-moves without capture or pawn move after which the game is drawn.
pub const NO_PROGRESS_LIMIT: u16 = 150;

/// Combines all the drawing logic into one struct.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawState {
    /// The half move counter counts up for every move that is done in the game.
    /// If the move made progress, then it is reset to 0 after the move.
    /// Progress is capturing a piece or moving a pawn.
    pub no_progress_half_moves: u16,
    /// How often a position must be seen before the game is drawn.
    /// 0 means that this never draws.
    pub draw_after_n_repetitions: u8,
    /// Positions that have been seen and how often they have been seen.
    /// Since we can never see a position again after an irreversible move,
    /// we can clear this map to save memory.
    /// The key is the hash of the board, the value is the number of times
    /// the board has been seen. This risks some bugs if the hash function
    /// is not perfect, but it should be good enough for real world use.
    ///
    /// This property is not included in the hash of the board, nor is it
    /// in equality checks.
    pub draw_check_map: FxHashMap<u64, u8>,
    /// FEN of the position after the last irreversible move. Together with
    /// `reversible_moves` this lets an engine see the repetitions as well.
    pub reversible_root: String,
    /// Moves played since `reversible_root`.
    pub reversible_moves: Vec<ChessMove>,
}

impl DrawState {
    /// Register that no progress was made in the move.
    pub fn half_move_with_no_progress(&mut self) {
        self.no_progress_half_moves = self.no_progress_half_moves.saturating_add(1);
    }

    /// Call this to reset the half move counter.
    /// This also clears the draw_check_map, as we can never see a position
    /// again after progress has been made.
    /// The allocated memory is kept for reuse.
    pub fn reset_half_move_counter(&mut self) {
        self.no_progress_half_moves = 0;
        self.forget_positions();
    }

    /// Losing a castling right is irreversible as well, but it does not reset
    /// the half move counter.
    pub fn forget_positions(&mut self) {
        self.draw_check_map.clear();
    }

    /// Starts the list of reversible moves again from the given position.
    pub fn restart_history(&mut self, root_fen: String) {
        self.reversible_root = root_fen;
        self.reversible_moves.clear();
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            no_progress_half_moves: 0,
            draw_after_n_repetitions: 5,
            draw_check_map: FxHashMap::default(),
            reversible_root: String::new(),
            reversible_moves: Vec::new(),
        }
    }
}

/// This records the current position in the draw_check_map.
/// This should be called after every move and once for the starting position.
///
/// We pass in the board instead of using the board in the state, because
/// otherwise the borrow checker would complain. (Pointer aliasing)
///
/// Returns true if the position has now been seen often enough to draw the game.
pub fn record_position(board: &mut ChessBoard) -> bool {
    // If the repetition is switched off, then we don't need to do anything.
    if board.draw_state.draw_after_n_repetitions == 0 {
        return false;
    }

    let hash = calculate_hash(board);
    let count = board.draw_state.draw_check_map.entry(hash).or_insert(0);
    *count = count.saturating_add(1);

    *count >= board.draw_state.draw_after_n_repetitions
}

/// Whether the 75-move rule applies. The caller makes sure this is only
/// consulted when the side to move is not checkmated.
pub fn no_progress_draw(board: &ChessBoard) -> bool {
    board.draw_state.no_progress_half_moves >= NO_PROGRESS_LIMIT
}

/// Returns the draw that ends the game, assuming it is not decided otherwise.
pub fn draw_verdict(board: &ChessBoard, repeated: bool) -> VictoryState {
    if no_progress_draw(board) {
        VictoryState::NoProgressDraw
    } else if repeated {
        VictoryState::RepetitionDraw
    } else {
        VictoryState::Running
    }
}

fn calculate_hash(board: &ChessBoard) -> u64 {
    let mut s = FxHasher::default();

    // We care about the board state.
    board.substrate.hash(&mut s);
    // We care about the current player.
    board.controlling_player.hash(&mut s);
    // We care about en passant and castling. En passant only counts when
    // the capture can actually be played.
    board.legal_en_passant().hash(&mut s);
    board.castling.hash(&mut s);

    s.finish()
}

// Hash is allowed to be more lenient than Eq.
impl std::hash::Hash for DrawState {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.no_progress_half_moves.hash(state);
    }
}

// Implement custom equality check, because we don't want to compare the
// draw_check_map.
impl PartialEq for DrawState {
    fn eq(&self, other: &Self) -> bool {
        self.no_progress_half_moves == other.no_progress_half_moves
    }
}

impl Eq for DrawState {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fen, ChessMove};

    /// Helper macro to execute moves in unit tests.
    macro_rules! execute_moves {
        ($board:expr, $($mv:literal),*) => {{
            $(
                $board
                    .execute(ChessMove::from_uci($mv).unwrap())
                    .unwrap();
            )*
        }};
    }

    /// Just moving knights back and forth should result in a draw on the
    /// fifth occurrence of the starting position.
    #[test]
    fn test_simple_knight_repetition() {
        let mut board = ChessBoard::new();

        for _ in 0..3 {
            execute_moves!(board, "g1f3", "b8c6", "f3g1", "c6b8");
        }
        execute_moves!(board, "g1f3", "b8c6", "f3g1");
        assert_eq!(board.victory_state, VictoryState::Running);

        execute_moves!(board, "c6b8");
        assert_eq!(board.victory_state, VictoryState::RepetitionDraw);
        assert!(board.legal_moves().is_empty());
    }

    /// A pawn move in between makes the earlier positions unreachable.
    #[test]
    fn test_pawn_move_resets_repetition() {
        let mut board = ChessBoard::new();

        for _ in 0..3 {
            execute_moves!(board, "g1f3", "b8c6", "f3g1", "c6b8");
        }
        execute_moves!(board, "e2e3", "g8f6");
        for _ in 0..3 {
            execute_moves!(board, "g1f3", "f6g8", "f3g1", "g8f6");
        }
        assert_eq!(board.victory_state, VictoryState::Running);
        assert_eq!(board.draw_state.no_progress_half_moves, 13);
    }

    /// Losing a castling right starts the list of reversible moves over.
    #[test]
    fn test_castling_right_loss_restarts_history() {
        let mut board = fen::parse_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert_eq!(board.draw_state.reversible_root, "4k3/8/8/8/8/8/8/4K2R w K - 0 1");

        execute_moves!(board, "e1d1", "e8d8");
        assert_eq!(board.draw_state.reversible_root, "4k3/8/8/8/8/8/8/3K3R b - - 1 1");
        assert_eq!(
            board.draw_state.reversible_moves,
            vec![ChessMove::from_uci("e8d8").unwrap()]
        );
    }

    /// 75 moves for each side without progress draws the game.
    #[test]
    fn test_no_progress_draw_after_75_moves() {
        let mut board = fen::parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 140 1").unwrap();
        board.draw_state.draw_after_n_repetitions = 0;

        execute_moves!(board, "a1a2", "e8d8", "a2a1", "d8e8", "a1a2", "e8d8", "a2a1", "d8e8", "a1a2");
        assert_eq!(board.draw_state.no_progress_half_moves, 149);
        assert_eq!(board.victory_state, VictoryState::Running);

        execute_moves!(board, "e8d8");
        assert_eq!(board.victory_state, VictoryState::NoProgressDraw);
        assert!(board.legal_moves().is_empty());
    }

    /// Checkmate on the move that reaches the limit still counts as a win.
    #[test]
    fn test_checkmate_beats_no_progress() {
        let mut board = fen::parse_fen("k7/8/1K6/8/8/8/8/7R w - - 149 80").unwrap();
        execute_moves!(board, "h1h8");
        assert_eq!(
            board.victory_state,
            VictoryState::CheckmateVictory(crate::PlayerColor::White)
        );
    }
}

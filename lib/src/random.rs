//! Random starting positions for the endgame scenarios.

use crate::scenario::Scenario;
use crate::PlayerColor::{Black, White};
use crate::{fen, BoardPosition, ChessBoard, PieceType, PlayerColor};
use fxhash::FxHashSet;
use log::warn;
use rand::distributions::Distribution;
use rand::Rng;

/// How many samples we draw per requested position before giving up.
const ATTEMPTS_PER_POSITION: usize = 100;

/// Defines a random generator for positions of a scenario. This works by
/// placing the pieces randomly on the board and rejecting the position until
/// it is a reasonable start:
///
/// - White is to move, there is no castling and no en passant.
/// - The kings are on different squares and not next to each other.
/// - Pawns stand on the ranks 2 to 7.
/// - Neither king is attacked.
/// - The game is not over yet.
impl Distribution<ChessBoard> for Scenario {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ChessBoard {
        let (white, black) = self.pieces();
        loop {
            let white_king = BoardPosition(rng.gen_range(0..64));
            let black_king = loop {
                let candidate = BoardPosition(rng.gen_range(0..64));
                if candidate.distance(white_king) > 1 {
                    break candidate;
                }
            };

            let mut pieces = vec![
                (White, PieceType::King, white_king),
                (Black, PieceType::King, black_king),
            ];
            let extra = white
                .iter()
                .map(|p| (White, *p))
                .chain(black.iter().map(|p| (Black, *p)));
            for (color, piece) in extra {
                let position = random_free_position(&pieces, piece, rng);
                pieces.push((color, piece, position));
            }

            let board = ChessBoard::from_pieces(&pieces, White);
            if is_reasonable_start(&board) {
                return board;
            }
        }
    }
}

fn random_free_position<R: Rng + ?Sized>(
    taken: &[(PlayerColor, PieceType, BoardPosition)],
    piece: PieceType,
    rng: &mut R,
) -> BoardPosition {
    loop {
        let candidate = BoardPosition(rng.gen_range(0..64));
        if piece == PieceType::Pawn && (candidate.y() == 0 || candidate.y() == 7) {
            continue;
        }
        if taken.iter().all(|(_, _, p)| *p != candidate) {
            return candidate;
        }
    }
}

fn is_reasonable_start(board: &ChessBoard) -> bool {
    if board.victory_state.is_over() {
        return false;
    }
    PlayerColor::all().all(|color| {
        board
            .king_position(color)
            .is_some_and(|king| !board.attacked_by(king, color.other()))
    })
}

/// Samples up to `count` distinct positions of a scenario. Positions are
/// compared by their FEN. If the scenario does not have enough distinct
/// positions within `100 * count` samples, fewer positions are returned and a
/// warning is logged.
pub fn sample_positions<R: Rng + ?Sized>(
    scenario: Scenario,
    count: usize,
    rng: &mut R,
) -> Vec<ChessBoard> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::with_capacity(count);

    for _ in 0..count.saturating_mul(ATTEMPTS_PER_POSITION) {
        if result.len() >= count {
            break;
        }
        let board: ChessBoard = scenario.sample(rng);
        if seen.insert(fen::write_fen(&board)) {
            result.push(board);
        }
    }

    if result.len() < count {
        warn!(
            "Only found {} unique positions for scenario {} ({}) out of {} requested.",
            result.len(),
            scenario.id(),
            scenario,
            count
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::Substrate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_scenario_positions_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for scenario in Scenario::all() {
            let (white, black) = scenario.pieces();
            for _ in 0..40 {
                let board: ChessBoard = scenario.sample(&mut rng);
                assert_eq!(board.controlling_player, White);
                assert!(board.castling.is_forfeit());
                assert_eq!(board.en_passant, None);
                assert!(!board.victory_state.is_over());
                assert!(!board.is_check());

                let white_king = board.king_position(White).unwrap();
                let black_king = board.king_position(Black).unwrap();
                assert!(white_king.distance(black_king) > 1);
                assert!(!board.attacked_by(black_king, White));

                for color in PlayerColor::all() {
                    for pawn in board.substrate.find_pieces(color, PieceType::Pawn) {
                        assert!((1..7).contains(&pawn.y()), "{}", fen::write_fen(&board));
                    }
                }
                assert_eq!(
                    board.substrate.bitboard_color(White).len() as usize,
                    white.len() + 1
                );
                assert_eq!(
                    board.substrate.bitboard_color(Black).len() as usize,
                    black.len() + 1
                );
            }
        }
    }

    #[test]
    fn sampled_positions_are_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let positions = sample_positions(Scenario::KingQueenRookVsKing, 50, &mut rng);
        assert_eq!(positions.len(), 50);
        let fens: FxHashSet<String> = positions.iter().map(fen::write_fen).collect();
        assert_eq!(fens.len(), 50);
    }

    #[test]
    fn sampling_the_same_seed_is_deterministic() {
        let a = sample_positions(Scenario::KingRookVsKing, 5, &mut StdRng::seed_from_u64(3));
        let b = sample_positions(Scenario::KingRookVsKing, 5, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}

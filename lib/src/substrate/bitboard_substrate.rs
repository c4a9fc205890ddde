//! A version of Substrate that is representing everything through bitboards.
//! This does not save a lot of space, but it makes attack detection and
//! piece lookup for move generation fast.

use crate::substrate::zobrist::Zobrist;
use crate::substrate::{BitBoard, Substrate};
use crate::PieceType::King;
use crate::{BoardPosition, ChessError, PieceType, PlayerColor};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BBSubstrate {
    pieces: [[BitBoard; 6]; 2],
    hash: Zobrist,
}

impl BBSubstrate {
    pub fn recompute_zobrist_hash(&self) -> Zobrist {
        let mut hash = Zobrist::default();
        for color in PlayerColor::all() {
            for piece in PieceType::all() {
                for pos in self.pieces[color as usize][piece as usize] {
                    hash ^= Zobrist::piece_on_square(color, pos, piece);
                }
            }
        }
        hash
    }

    /// Iterates over every piece on the board, white pieces first.
    pub fn pieces(&self) -> impl Iterator<Item = (PlayerColor, PieceType, BoardPosition)> + '_ {
        PlayerColor::all().flat_map(move |color| {
            PieceType::all().flat_map(move |piece| {
                self.pieces[color as usize][piece as usize]
                    .iter()
                    .map(move |pos| (color, piece, pos))
            })
        })
    }
}

impl Hash for BBSubstrate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash.as_u64());
    }
}

impl Substrate for BBSubstrate {
    fn get_piece(&self, player: PlayerColor, pos: BoardPosition) -> Option<PieceType> {
        if !self.bitboard_color(player).contains(pos) {
            return None;
        }
        PieceType::all().find(|piece| self.pieces[player as usize][*piece as usize].contains(pos))
    }

    fn is_empty(&self, pos: BoardPosition) -> bool {
        !self.occupied().contains(pos)
    }

    fn is_piece(&self, player: PlayerColor, pos: BoardPosition, piece: PieceType) -> bool {
        self.pieces[player as usize][piece as usize].contains(pos)
    }

    fn set_piece(&mut self, player: PlayerColor, pos: BoardPosition, piece: PieceType) {
        self.remove_piece(player, pos);
        self.pieces[player as usize][piece as usize].insert(pos);
        self.hash ^= Zobrist::piece_on_square(player, pos, piece);
    }

    fn remove_piece(&mut self, player: PlayerColor, pos: BoardPosition) -> Option<PieceType> {
        let result = self.get_piece(player, pos)?;
        self.pieces[player as usize][result as usize].remove(pos);
        self.hash ^= Zobrist::piece_on_square(player, pos, result);
        Some(result)
    }

    fn bitboard_color(&self, player: PlayerColor) -> BitBoard {
        self.pieces[player as usize]
            .iter()
            .fold(BitBoard::default(), |acc, bb| acc | *bb)
    }

    fn find_pieces(&self, player: PlayerColor, piece: PieceType) -> BitBoard {
        self.pieces[player as usize][piece as usize]
    }

    fn find_king(&self, player: PlayerColor) -> Result<BoardPosition, ChessError> {
        self.pieces[player as usize][King as usize]
            .iter()
            .next()
            .ok_or(ChessError::NoKingOnBoard(player))
    }

    fn get_zobrist_hash(&self) -> Zobrist {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen;
    use crate::PieceType::*;
    use crate::PlayerColor::{Black, White};

    fn pos(identifier: &str) -> BoardPosition {
        BoardPosition::try_from(identifier).unwrap()
    }

    // Test the size of a BBSubstrate
    #[test]
    fn test_size() {
        use std::mem::size_of;
        assert_eq!(size_of::<BBSubstrate>(), 2 * 6 * 8 + 8);
    }

    #[test]
    fn test_find_pieces() {
        let board = fen::parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .expect("Failed to parse FEN");

        let bb = board.substrate.find_pieces(White, Pawn);
        assert_eq!(bb.len(), 8);
        assert!(bb.contains(pos("d5")));
        assert!(bb.contains(pos("e4")));

        let bb = board.substrate.find_pieces(White, Knight);
        assert_eq!(bb.len(), 2);
        assert!(bb.contains(pos("c3")));
        assert!(bb.contains(pos("e5")));

        let bb = board.substrate.find_pieces(Black, Bishop);
        assert_eq!(bb.len(), 2);
        assert!(bb.contains(pos("a6")));
        assert!(bb.contains(pos("g7")));

        assert_eq!(board.substrate.find_king(Black).unwrap(), pos("e8"));
    }

    #[test]
    fn incremental_hash_matches_recomputed_hash() {
        let mut substrate = BBSubstrate::default();
        substrate.set_piece(White, pos("e1"), King);
        substrate.set_piece(White, pos("a1"), Rook);
        substrate.set_piece(Black, pos("e8"), King);
        substrate.remove_piece(White, pos("a1"));
        substrate.set_piece(White, pos("a7"), Rook);
        // Replace the rook by a queen on the same square.
        substrate.set_piece(White, pos("a7"), Queen);

        assert_eq!(substrate.get_zobrist_hash(), substrate.recompute_zobrist_hash());
        assert_eq!(substrate.get_piece(White, pos("a7")), Some(Queen));
        assert_eq!(substrate.pieces().count(), 3);
    }

    #[test]
    fn missing_king_is_an_error() {
        let substrate = BBSubstrate::default();
        assert!(matches!(
            substrate.find_king(White),
            Err(ChessError::NoKingOnBoard(White))
        ));
    }
}

//! Module for implementations of a board with only the resting pieces,
//! avoiding as much other logic as possible. Side to move, castling and the
//! clocks live on the `ChessBoard` that wraps a substrate.

use std::ops::{BitAnd, BitOr, Not};

use crate::{BoardPosition, ChessError, PieceType, PlayerColor};
pub mod bitboard_substrate;
pub mod constant_bitboards;
pub mod zobrist;

use zobrist::Zobrist;

pub trait Substrate {
    /// Returns the piece at the given position, if any.
    fn get_piece(&self, player: PlayerColor, pos: BoardPosition) -> Option<PieceType>;
    /// Returns whether the given position is occupied for the given player.
    fn has_piece(&self, player: PlayerColor, pos: BoardPosition) -> bool {
        self.get_piece(player, pos).is_some()
    }
    /// Returns whether the given position is empty for both players.
    fn is_empty(&self, pos: BoardPosition) -> bool {
        !self.has_piece(PlayerColor::White, pos) && !self.has_piece(PlayerColor::Black, pos)
    }
    /// Checks for a specific piece type
    fn is_piece(&self, player: PlayerColor, pos: BoardPosition, piece: PieceType) -> bool {
        self.get_piece(player, pos) == Some(piece)
    }
    /// Returns the piece on a square together with its owner.
    fn piece_at(&self, pos: BoardPosition) -> Option<(PlayerColor, PieceType)> {
        PlayerColor::all().find_map(|color| self.get_piece(color, pos).map(|p| (color, p)))
    }
    /// Sets the piece at the given position, replacing a piece of the same color.
    fn set_piece(&mut self, player: PlayerColor, pos: BoardPosition, piece: PieceType);
    /// Removes the piece at the given position.
    fn remove_piece(&mut self, player: PlayerColor, pos: BoardPosition) -> Option<PieceType>;
    /// Returns a bitboard with all pieces of the given player.
    /// We are already going via Bitboard here, as a substitute for an iterator.
    fn bitboard_color(&self, player: PlayerColor) -> BitBoard;
    /// All occupied squares.
    fn occupied(&self) -> BitBoard {
        self.bitboard_color(PlayerColor::White) | self.bitboard_color(PlayerColor::Black)
    }
    /// Returns all squares holding the given piece of the given player.
    fn find_pieces(&self, player: PlayerColor, piece: PieceType) -> BitBoard;
    /// Returns the position of the king of the given player.
    fn find_king(&self, player: PlayerColor) -> Result<BoardPosition, ChessError>;
    /// Hash of the piece placement, maintained incrementally.
    fn get_zobrist_hash(&self) -> Zobrist;
}

// Using a u64 as a [bool; 64]. This is known as a bitboard.
// This is a very common technique in chess programming.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct BitBoard(pub u64);

pub struct BitBoardIter {
    bits: u64,
}

impl BitBoard {
    pub fn iter(self) -> BitBoardIter {
        BitBoardIter { bits: self.0 }
    }
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
    pub fn contains(self, pos: BoardPosition) -> bool {
        (self.0 & (1u64 << pos.0)) != 0
    }
    pub fn insert(&mut self, pos: BoardPosition) -> bool {
        self.insert_all(BitBoard(1u64 << pos.0))
    }
    pub fn insert_all(&mut self, other: BitBoard) -> bool {
        let old = self.0;
        self.0 |= other.0;
        old != self.0
    }
    pub fn remove(&mut self, pos: BoardPosition) {
        self.0 &= !(1u64 << pos.0);
    }
    pub fn len(self) -> u8 {
        self.0.count_ones() as u8
    }
}

impl Iterator for BitBoardIter {
    type Item = BoardPosition;

    // Pops the lowest set bit, so iteration is in ascending square order.
    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros() as u8;
        self.bits &= self.bits - 1;
        Some(BoardPosition(index))
    }
}

impl IntoIterator for BitBoard {
    type Item = BoardPosition;
    type IntoIter = BitBoardIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<BoardPosition> for BitBoard {
    fn from_iter<T: IntoIterator<Item = BoardPosition>>(iter: T) -> Self {
        let mut result = BitBoard(0);
        for pos in iter {
            result.insert(pos);
        }
        result
    }
}

impl From<BoardPosition> for BitBoard {
    fn from(pos: BoardPosition) -> Self {
        BitBoard(1u64 << pos.0)
    }
}

impl BitAnd for BitBoard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        BitBoard(self.0 & rhs.0)
    }
}

impl BitOr for BitBoard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        BitBoard(self.0 | rhs.0)
    }
}

impl Not for BitBoard {
    type Output = Self;

    fn not(self) -> Self::Output {
        BitBoard(!self.0)
    }
}

//! The endgames the trainer knows how to set up. Every scenario lists the
//! pieces of both sides besides the kings; white is always the side that is
//! listed first in the name.

use crate::{ChessError, PieceType};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    KingPawnVsKing = 1,
    KingRookVsKing,
    KingQueenVsKing,
    KingQueenRookVsKing,
    KingTwoRooksVsKing,
    KingTwoBishopsVsKing,
    KingKnightBishopVsKing,
    KingQueenVsKingBishop,
    KingQueenVsKingKnight,
    KingQueenVsKingRook,
    KingQueenVsKingKnightBishop,
    KingQueenVsKingTwoKnights,
    KingQueenVsKingTwoBishops,
    KingTwoPawnsVsKing,
    KingBishopVsKingPawn,
    KingKnightVsKingPawn,
    KingRookVsKingPawn,
    KingQueenVsKingPawn,
    KingQueenPawnVsKingQueen,
    KingTwoPawnsVsKingPawn,
    KingPawnRookVsKingRook,
    KingTwoPawnsRookVsKingRook,
    KingRookVsKingBishop,
    KingRookVsKingKnight,
    KingRookVsKingTwoPawns,
}

impl Scenario {
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=25).filter_map(Self::from_id)
    }

    pub fn from_id(id: u8) -> Option<Self> {
        use Scenario::*;
        let scenario = match id {
            1 => KingPawnVsKing,
            2 => KingRookVsKing,
            3 => KingQueenVsKing,
            4 => KingQueenRookVsKing,
            5 => KingTwoRooksVsKing,
            6 => KingTwoBishopsVsKing,
            7 => KingKnightBishopVsKing,
            8 => KingQueenVsKingBishop,
            9 => KingQueenVsKingKnight,
            10 => KingQueenVsKingRook,
            11 => KingQueenVsKingKnightBishop,
            12 => KingQueenVsKingTwoKnights,
            13 => KingQueenVsKingTwoBishops,
            14 => KingTwoPawnsVsKing,
            15 => KingBishopVsKingPawn,
            16 => KingKnightVsKingPawn,
            17 => KingRookVsKingPawn,
            18 => KingQueenVsKingPawn,
            19 => KingQueenPawnVsKingQueen,
            20 => KingTwoPawnsVsKingPawn,
            21 => KingPawnRookVsKingRook,
            22 => KingTwoPawnsRookVsKingRook,
            23 => KingRookVsKingBishop,
            24 => KingRookVsKingKnight,
            25 => KingRookVsKingTwoPawns,
            _ => return None,
        };
        Some(scenario)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Pieces besides the kings, white first.
    pub fn pieces(self) -> (&'static [PieceType], &'static [PieceType]) {
        use PieceType::*;
        use Scenario::*;
        match self {
            KingPawnVsKing => (&[Pawn], &[]),
            KingRookVsKing => (&[Rook], &[]),
            KingQueenVsKing => (&[Queen], &[]),
            KingQueenRookVsKing => (&[Queen, Rook], &[]),
            KingTwoRooksVsKing => (&[Rook, Rook], &[]),
            KingTwoBishopsVsKing => (&[Bishop, Bishop], &[]),
            KingKnightBishopVsKing => (&[Knight, Bishop], &[]),
            KingQueenVsKingBishop => (&[Queen], &[Bishop]),
            KingQueenVsKingKnight => (&[Queen], &[Knight]),
            KingQueenVsKingRook => (&[Queen], &[Rook]),
            KingQueenVsKingKnightBishop => (&[Queen], &[Knight, Bishop]),
            KingQueenVsKingTwoKnights => (&[Queen], &[Knight, Knight]),
            KingQueenVsKingTwoBishops => (&[Queen], &[Bishop, Bishop]),
            KingTwoPawnsVsKing => (&[Pawn, Pawn], &[]),
            KingBishopVsKingPawn => (&[Bishop], &[Pawn]),
            KingKnightVsKingPawn => (&[Knight], &[Pawn]),
            KingRookVsKingPawn => (&[Rook], &[Pawn]),
            KingQueenVsKingPawn => (&[Queen], &[Pawn]),
            KingQueenPawnVsKingQueen => (&[Queen, Pawn], &[Queen]),
            KingTwoPawnsVsKingPawn => (&[Pawn, Pawn], &[Pawn]),
            KingPawnRookVsKingRook => (&[Pawn, Rook], &[Rook]),
            KingTwoPawnsRookVsKingRook => (&[Pawn, Pawn, Rook], &[Rook]),
            KingRookVsKingBishop => (&[Rook], &[Bishop]),
            KingRookVsKingKnight => (&[Rook], &[Knight]),
            KingRookVsKingTwoPawns => (&[Rook], &[Pawn, Pawn]),
        }
    }
}

impl TryFrom<u8> for Scenario {
    type Error = ChessError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Scenario::from_id(id).ok_or(ChessError::UnknownScenario(id))
    }
}

/// Short material signature like "KQR vs K".
impl Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (white, black) = self.pieces();
        let side = |pieces: &[PieceType]| -> String {
            std::iter::once("K")
                .chain(pieces.iter().map(|p| p.to_char()))
                .collect()
        };
        write!(f, "{} vs {}", side(white), side(black))
    }
}

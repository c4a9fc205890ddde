//! This module encapsulates data for castling and decisions for castling.
//! During castling the King moves from the E file into the C or G file.
//! The corresponding Rook moves into the D or F file.
//!
//! All squares the King passes through must be safe (non-threatened) and the
//! squares between King and Rook must be empty.

use crate::{const_tile::*, BoardPosition, ChessError, PlayerColor};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The Castling struct encodes the castling options left for the players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Castling {
    pub white_queen_side: bool,
    pub white_king_side: bool,
    pub black_queen_side: bool,
    pub black_king_side: bool,
}

/// One of the four ways to castle, with the squares involved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CastlingOption {
    pub king_from: BoardPosition,
    pub king_to: BoardPosition,
    pub rook_from: BoardPosition,
    pub rook_to: BoardPosition,
    /// Squares that must be empty.
    pub empty: &'static [BoardPosition],
    /// Squares the king starts on, passes through or lands on. None of them may be attacked.
    pub safe: [BoardPosition; 3],
}

const WHITE_QUEEN: CastlingOption = CastlingOption {
    king_from: E1,
    king_to: C1,
    rook_from: A1,
    rook_to: D1,
    empty: &[B1, C1, D1],
    safe: [E1, D1, C1],
};
const WHITE_KING: CastlingOption = CastlingOption {
    king_from: E1,
    king_to: G1,
    rook_from: H1,
    rook_to: F1,
    empty: &[F1, G1],
    safe: [E1, F1, G1],
};
const BLACK_QUEEN: CastlingOption = CastlingOption {
    king_from: E8,
    king_to: C8,
    rook_from: A8,
    rook_to: D8,
    empty: &[B8, C8, D8],
    safe: [E8, D8, C8],
};
const BLACK_KING: CastlingOption = CastlingOption {
    king_from: E8,
    king_to: G8,
    rook_from: H8,
    rook_to: F8,
    empty: &[F8, G8],
    safe: [E8, F8, G8],
};

impl Default for Castling {
    /// Returns an initial Castling where all castling options are possible
    /// This is for the default position.
    fn default() -> Self {
        Castling {
            white_queen_side: true,
            white_king_side: true,
            black_queen_side: true,
            black_king_side: true,
        }
    }
}

impl Castling {
    /// Returns a Castling where no castling is posible anymore.
    pub fn forfeit() -> Self {
        Castling {
            white_queen_side: false,
            white_king_side: false,
            black_queen_side: false,
            black_king_side: false,
        }
    }

    pub fn is_forfeit(&self) -> bool {
        *self == Castling::forfeit()
    }

    /// Returns the castling options that are still allowed for the given player.
    pub fn options(&self, color: PlayerColor) -> impl Iterator<Item = CastlingOption> {
        let candidates = match color {
            PlayerColor::White => [
                (self.white_queen_side, WHITE_QUEEN),
                (self.white_king_side, WHITE_KING),
            ],
            PlayerColor::Black => [
                (self.black_queen_side, BLACK_QUEEN),
                (self.black_king_side, BLACK_KING),
            ],
        };
        candidates
            .into_iter()
            .filter(|(allowed, _)| *allowed)
            .map(|(_, option)| option)
    }

    /// Finds the castling option a king move corresponds to, if any.
    /// This does not check whether castling is still allowed.
    pub fn option_for_king_move(from: BoardPosition, to: BoardPosition) -> Option<CastlingOption> {
        [WHITE_QUEEN, WHITE_KING, BLACK_QUEEN, BLACK_KING]
            .into_iter()
            .find(|o| o.king_from == from && o.king_to == to)
    }

    pub fn remove_rights_for_color(&mut self, current_player: PlayerColor) {
        match current_player {
            PlayerColor::White => {
                self.white_queen_side = false;
                self.white_king_side = false;
            }
            PlayerColor::Black => {
                self.black_queen_side = false;
                self.black_king_side = false;
            }
        }
    }

    /// Any move from or to a rook corner forfeits the castling right that
    /// belongs to it. This covers moving the rook as well as capturing it.
    pub fn forfeit_rights_for_square(&mut self, position: BoardPosition) {
        match position {
            A1 => self.white_queen_side = false,
            H1 => self.white_king_side = false,
            A8 => self.black_queen_side = false,
            H8 => self.black_king_side = false,
            _ => {}
        }
    }

    /// Expects a castling string like "KQkq" or "-".
    pub fn from_fen(fen: &str) -> Result<Castling, ChessError> {
        let mut castling = Castling::forfeit();
        if fen == "-" {
            return Ok(castling);
        }
        for char in fen.chars() {
            match char {
                'K' => castling.white_king_side = true,
                'Q' => castling.white_queen_side = true,
                'k' => castling.black_king_side = true,
                'q' => castling.black_queen_side = true,
                _ => {
                    return Err(ChessError::InputFenMalformed(format!(
                        "Invalid castling character '{char}'."
                    )))
                }
            }
        }
        Ok(castling)
    }
}

impl Display for Castling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_forfeit() {
            return write!(f, "-");
        }
        if self.white_king_side {
            write!(f, "K")?;
        }
        if self.white_queen_side {
            write!(f, "Q")?;
        }
        if self.black_king_side {
            write!(f, "k")?;
        }
        if self.black_queen_side {
            write!(f, "q")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_roundtrip() {
        for fen in ["KQkq", "Kq", "k", "-", "KQ"] {
            assert_eq!(Castling::from_fen(fen).unwrap().to_string(), fen);
        }
        assert!(Castling::from_fen("KX").is_err());
    }

    #[test]
    fn rook_corner_forfeits_one_side() {
        let mut castling = Castling::default();
        castling.forfeit_rights_for_square(H8);
        assert_eq!(castling.to_string(), "KQq");
        castling.forfeit_rights_for_square(E4_NOT_A_CORNER);
        assert_eq!(castling.to_string(), "KQq");
        castling.remove_rights_for_color(PlayerColor::White);
        assert_eq!(castling.to_string(), "q");
    }

    const E4_NOT_A_CORNER: BoardPosition = pos("e4");

    #[test]
    fn options_only_list_allowed_sides() {
        let castling = Castling::from_fen("Kq").unwrap();
        let white: Vec<_> = castling.options(PlayerColor::White).collect();
        assert_eq!(white, vec![WHITE_KING]);
        let black: Vec<_> = castling.options(PlayerColor::Black).collect();
        assert_eq!(black, vec![BLACK_QUEEN]);
        assert_eq!(Castling::option_for_king_move(E8, C8), Some(BLACK_QUEEN));
        assert_eq!(Castling::option_for_king_move(E8, D8), None);
    }
}

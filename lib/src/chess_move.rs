//! A single chess move, identified by origin, destination and an optional
//! promotion piece. Castling is written as the two-square king move, which
//! is how the UCI protocol writes it.

use crate::{BoardPosition, ChessError, PieceType};
use lazy_regex::regex_captures;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: BoardPosition,
    pub to: BoardPosition,
    pub promotion: Option<PieceType>,
}

impl ChessMove {
    pub fn new(from: BoardPosition, to: BoardPosition) -> Self {
        ChessMove {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promote(from: BoardPosition, to: BoardPosition, piece: PieceType) -> Self {
        ChessMove {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Parses UCI long algebraic notation like "e2e4" or "a7a8q".
    pub fn from_uci(input: &str) -> Result<Self, ChessError> {
        let Some((_, from, to, promotion)) = regex_captures!("^([a-h][1-8])([a-h][1-8])([qrbn]?)$", input)
        else {
            return Err(ChessError::InputMoveMalformed(input.to_owned()));
        };
        let from = BoardPosition::try_from(from)
            .map_err(|_| ChessError::InputMoveMalformed(input.to_owned()))?;
        let to = BoardPosition::try_from(to)
            .map_err(|_| ChessError::InputMoveMalformed(input.to_owned()))?;
        let promotion = promotion.chars().next().and_then(PieceType::from_char);
        Ok(ChessMove {
            from,
            to,
            promotion,
        })
    }
}

/// Writes the move in UCI notation, promotion letters are lowercase.
impl Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.to_char().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

impl FromStr for ChessMove {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_and_promotion_moves() {
        let mv: ChessMove = "e2e4".parse().unwrap();
        assert_eq!(mv.from, BoardPosition::try_from("e2").unwrap());
        assert_eq!(mv.to, BoardPosition::try_from("e4").unwrap());
        assert_eq!(mv.promotion, None);

        let mv = ChessMove::from_uci("a7a8q").unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Queen));
        assert_eq!(mv.to_string(), "a7a8q");

        let mv = ChessMove::from_uci("b2b1n").unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Knight));
    }

    #[test]
    fn reject_malformed_moves() {
        for input in ["", "e2", "e2e9", "e2e4k", "0000", "(none)", "e2e4 "] {
            assert!(ChessMove::from_uci(input).is_err(), "accepted {input:?}");
        }
    }
}

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::Debug;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Pawn = 0,
    Rook = 1,
    Knight = 2,
    Bishop = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub fn to_char(self) -> &'static str {
        use PieceType::*;

        match self {
            Pawn => "P",
            Rook => "R",
            Knight => "N",
            Bishop => "B",
            Queen => "Q",
            King => "K",
        }
    }

    /// Parses an uppercase or lowercase piece letter. The case is ignored,
    /// use `char::is_uppercase` to find the color in a FEN.
    pub fn from_char(c: char) -> Option<Self> {
        use PieceType::*;

        match c.to_ascii_uppercase() {
            'P' => Some(Pawn),
            'R' => Some(Rook),
            'N' => Some(Knight),
            'B' => Some(Bishop),
            'Q' => Some(Queen),
            'K' => Some(King),
            _ => None,
        }
    }

    /// Only valid for values in 0..6, every other value is a bug in the caller.
    pub fn from_u8(value: u8) -> Self {
        use PieceType::*;

        match value {
            0 => Pawn,
            1 => Rook,
            2 => Knight,
            3 => Bishop,
            4 => Queen,
            _ => King,
        }
    }

    /// Classic material value in pawns. The king has no material value.
    pub fn material_value(self) -> i32 {
        use PieceType::*;

        match self {
            Pawn => 1,
            Knight | Bishop => 3,
            Rook => 5,
            Queen => 9,
            King => 0,
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        use PieceType::*;
        [Pawn, Rook, Knight, Bishop, Queen, King].iter().copied()
    }

    /// The pieces a pawn may promote to, strongest first.
    pub fn promotion_targets() -> [Self; 4] {
        use PieceType::*;
        [Queen, Rook, Bishop, Knight]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn forward_direction(self) -> i8 {
        match self {
            PlayerColor::White => 1,
            PlayerColor::Black => -1,
        }
    }
    pub fn home_row(self) -> u8 {
        match self {
            PlayerColor::White => 0,
            PlayerColor::Black => 7,
        }
    }
    pub fn other(self) -> Self {
        use PlayerColor::*;
        match self {
            White => Black,
            Black => White,
        }
    }
    /// The side-to-move field of a FEN.
    pub fn fen_char(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [Self::White, Self::Black].iter().copied()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardPosition(pub u8);

impl Add<(i8, i8)> for BoardPosition {
    type Output = Option<Self>;

    fn add(self, rhs: (i8, i8)) -> Self::Output {
        Self::new_checked(self.x() as i8 + rhs.0, self.y() as i8 + rhs.1)
    }
}

impl BoardPosition {
    pub fn x(self) -> u8 {
        self.0 % 8
    }
    pub fn y(self) -> u8 {
        self.0 / 8
    }
    pub const fn new(x: u8, y: u8) -> Self {
        Self(x + 8 * y)
    }
    pub fn new_checked(x: i8, y: i8) -> Option<Self> {
        if x >= 0 && y >= 0 && x < 8 && y < 8 {
            Some(Self::new(x as u8, y as u8))
        } else {
            None
        }
    }

    /// Indicates whether the given position in on the pawn row of the `player` parameter.
    pub fn in_pawn_row(self, player: PlayerColor) -> bool {
        use PlayerColor::*;
        match player {
            White => self.y() == 1,
            Black => self.y() == 6,
        }
    }

    /// Returns the position where a pawn would be after moving forward by one step.
    /// This depends on the color of the active `player`.
    /// Returns `None` if the pawn is already on the home row of the other player.
    pub fn advance_pawn(self, player: PlayerColor) -> Option<Self> {
        use PlayerColor::*;
        match player {
            White => Self::new_checked(self.x() as i8, self.y() as i8 + 1),
            Black => Self::new_checked(self.x() as i8, self.y() as i8 - 1),
        }
    }

    /// The last rank from the perspective of `player`, where pawns promote.
    pub fn is_promotion_row(self, player: PlayerColor) -> bool {
        self.y() == player.other().home_row()
    }

    /// Chebyshev distance, i.e. the number of king steps between two squares.
    pub fn distance(self, other: Self) -> u8 {
        let dx = (self.x() as i8 - other.x() as i8).unsigned_abs();
        let dy = (self.y() as i8 - other.y() as i8).unsigned_abs();
        dx.max(dy)
    }

    /// How close this square is to the edge of the board, from 1 in the
    /// center to 7 in a corner.
    pub fn edge_closeness(self) -> u8 {
        let file_center = self.x().min(7 - self.x());
        let rank_center = self.y().min(7 - self.y());
        7 - file_center - rank_center
    }

    /// Returns all possible positions on the board.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..64).map(Self)
    }
}

/// The debug output for a position is a string like d4 that is easily human readable.
impl Debug for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            ["a", "b", "c", "d", "e", "f", "g", "h"][self.x() as usize],
            self.y() + 1
        )
    }
}

/// The display output for a position is a string like d4 that is easily human readable.
/// The Display implementation just wraps the Debug implementation.
impl Display for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TryFrom<&str> for BoardPosition {
    type Error = &'static str;

    fn try_from(string: &str) -> Result<Self, Self::Error> {
        const ERROR_TEXT: &str =
            "Error: I am looking for a board square coordinate like 'd5' or 'f2'.";

        let mut chars = string.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ERROR_TEXT);
        };
        let x = "abcdefgh".find(file);
        let y = "12345678".find(rank);
        if let (Some(x), Some(y)) = (x, y) {
            Self::new_checked(x as i8, y as i8).ok_or(ERROR_TEXT)
        } else {
            Err(ERROR_TEXT)
        }
    }
}

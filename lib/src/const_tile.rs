use crate::BoardPosition;

/// Const fn that takes a value like "c3" and returns a BoardPosition.
/// This panics if it is not a valid position. You should only use it on constants.
pub const fn pos(s: &'static str) -> BoardPosition {
    assert!(s.len() == 2);
    let file = s.as_bytes()[0] - b'a';
    let rank = s.as_bytes()[1] - b'1';
    assert!(file < 8 && rank < 8);
    BoardPosition::new(file, rank)
}

macro_rules! tiles {
    ($($name:ident => $square:literal),* $(,)?) => {
        $(pub const $name: BoardPosition = pos($square);)*
    };
}

// Only the squares that the rules refer to by name: the castling squares.
tiles! {
    A1 => "a1", B1 => "b1", C1 => "c1", D1 => "d1", E1 => "e1", F1 => "f1", G1 => "g1", H1 => "h1",
    A8 => "a8", B8 => "b8", C8 => "c8", D8 => "d8", E8 => "e8", F8 => "f8", G8 => "g8", H8 => "h8",
}

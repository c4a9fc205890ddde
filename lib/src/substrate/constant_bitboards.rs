//! Module for constant bitboards. These are computed at compile time from the
//! move offsets, so move generation only needs a table lookup.

use super::BitBoard;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const fn targets_from_offsets(offsets: &[(i8, i8); 8]) -> [BitBoard; 64] {
    let mut result = [BitBoard(0); 64];
    let mut from = 0;
    while from < 64 {
        let x = (from % 8) as i8;
        let y = (from / 8) as i8;
        let mut bits = 0u64;
        let mut i = 0;
        while i < 8 {
            let (dx, dy) = offsets[i];
            let (tx, ty) = (x + dx, y + dy);
            if tx >= 0 && tx < 8 && ty >= 0 && ty < 8 {
                bits |= 1u64 << (tx + 8 * ty);
            }
            i += 1;
        }
        result[from] = BitBoard(bits);
        from += 1;
    }
    result
}

pub const KNIGHT_TARGETS: [BitBoard; 64] = targets_from_offsets(&KNIGHT_OFFSETS);
pub const KING_TARGETS: [BitBoard; 64] = targets_from_offsets(&KING_OFFSETS);

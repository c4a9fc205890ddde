//! A zobrist hash implementation to be used by Substrate implementations.
//! See https://en.wikipedia.org/wiki/Zobrist_hashing for an introduction.

use crate::{BoardPosition, PieceType, PlayerColor};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Fixed seed so hashes are stable between runs.
const ZOBRIST_SEED: u64 = 0x5eed_c4e5_5e1d_6a3e;

lazy_static! {
    /// One key per (piece, color, square).
    static ref ZOBRIST: [u64; 6 * 2 * 64] = {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut keys = [0u64; 6 * 2 * 64];
        for key in keys.iter_mut() {
            *key = rng.gen();
        }
        keys
    };
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Zobrist(u64);

impl Zobrist {
    pub fn piece_on_square(player: PlayerColor, pos: BoardPosition, piece: PieceType) -> Zobrist {
        // By putting piece to the left, we avoid having to multiply by 6 which
        // doesn't compile to a single bit-shift.
        let index = ((piece as usize * 2) + player as usize) * 64 + pos.0 as usize;
        Zobrist(ZOBRIST[index])
    }
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::ops::BitXor for Zobrist {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl std::ops::BitXorAssign for Zobrist {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Debug for Zobrist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashSet;

    #[test]
    fn keys_are_distinct() {
        let keys: FxHashSet<u64> = ZOBRIST.iter().copied().collect();
        assert_eq!(keys.len(), ZOBRIST.len());
    }
}

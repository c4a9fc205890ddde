//! Keys of the q-table. Positions are identified by their FEN without the move
//! counters, so positions that only differ in how they were reached share
//! their values. Moves are identified by their UCI notation.

use crate::{fen, ChessBoard, ChessMove};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    pub fn encode(board: &ChessBoard) -> Self {
        StateKey(fen::write_position_fen(board))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionKey(String);

impl ActionKey {
    pub fn encode(mv: &ChessMove) -> Self {
        ActionKey(mv.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry of the q-table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QKey {
    pub state: StateKey,
    pub action: ActionKey,
}

impl QKey {
    pub fn new(state: StateKey, action: ActionKey) -> Self {
        QKey { state, action }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    #[test]
    fn counters_do_not_change_the_key() {
        let a = parse_fen("8/8/4k3/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let b = parse_fen("8/8/4k3/8/8/8/4P3/4K3 w - - 37 60").unwrap();
        assert_eq!(StateKey::encode(&a), StateKey::encode(&b));
        assert_eq!(StateKey::encode(&a).as_str(), "8/8/4k3/8/8/8/4P3/4K3 w - -");
    }

    #[test]
    fn side_to_move_changes_the_key() {
        let a = parse_fen("8/8/4k3/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let b = parse_fen("8/8/4k3/8/8/8/4P3/4K3 b - - 0 1").unwrap();
        assert_ne!(StateKey::encode(&a), StateKey::encode(&b));
    }

    #[test]
    fn unusable_en_passant_does_not_split_states() {
        let mut pushed = parse_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        pushed.execute(ChessMove::from_uci("e2e4").unwrap()).unwrap();
        let direct = parse_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(StateKey::encode(&pushed), StateKey::encode(&direct));
    }

    #[test]
    fn usable_en_passant_is_part_of_the_key() {
        let mut pushed = parse_fen("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1").unwrap();
        pushed.execute(ChessMove::from_uci("e2e4").unwrap()).unwrap();
        let direct = parse_fen("4k3/8/8/8/3pP3/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(StateKey::encode(&pushed), StateKey::encode(&direct));
        assert_eq!(
            StateKey::encode(&pushed).as_str(),
            "4k3/8/8/8/3pP3/8/8/4K3 b - e3"
        );
    }

    #[test]
    fn action_key_is_uci() {
        let mv = ChessMove::from_uci("a7a8q").unwrap();
        assert_eq!(ActionKey::encode(&mv).as_str(), "a7a8q");
    }
}

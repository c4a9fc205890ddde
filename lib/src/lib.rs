pub mod castling;
pub mod chess_move;
pub mod const_tile;
pub mod draw_state;
pub mod fen;
pub mod learning;
pub mod oracle;
pub mod progress;
pub mod random;
pub mod scenario;
pub mod substrate;
pub mod types;

use castling::Castling;
pub use chess_move::ChessMove;
use draw_state::DrawState;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::Add;
use substrate::bitboard_substrate::BBSubstrate;
use substrate::constant_bitboards::{KING_TARGETS, KNIGHT_TARGETS};
use substrate::{BitBoard, Substrate};
pub use types::{BoardPosition, PieceType, PlayerColor};
extern crate lazy_static;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ChessError {
    #[error("The input FEN is malformed: {0}")]
    InputFenMalformed(String),
    #[error("The input move is malformed: {0}")]
    InputMoveMalformed(String),
    #[error("You are trying to execute an illegal action: {0}")]
    ActionNotLegal(ChessMove),
    #[error("There is no king on the board.")]
    NoKingOnBoard(PlayerColor),
    #[error("The game is over.")]
    GameIsOver,
    #[error("There is no scenario {0}, scenarios are numbered 1 to 25.")]
    UnknownScenario(u8),
}

/// Legal moves of a position. Endgames rarely have more than a few dozen.
pub type MoveList = SmallVec<[ChessMove; 64]>;

/// Possible states a chess board can be in. Only draws which end the game
/// automatically are considered, draws that a player would need to claim
/// (threefold repetition, 50-move rule) keep the game running.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VictoryState {
    Running,
    CheckmateVictory(PlayerColor),
    StalemateDraw,
    /// Neither side can possibly deliver checkmate.
    MaterialDraw,
    NoProgressDraw,
    RepetitionDraw,
}

impl VictoryState {
    pub fn is_over(&self) -> bool {
        !matches!(self, VictoryState::Running)
    }

    pub fn winner(&self) -> Option<PlayerColor> {
        match self {
            VictoryState::CheckmateVictory(color) => Some(*color),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.is_over() && self.winner().is_none()
    }
}

/// A chess position together with the history needed to decide draws.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessBoard {
    pub substrate: BBSubstrate,
    pub controlling_player: PlayerColor,
    /// Stores castling information
    pub castling: Castling,
    /// When a pawn is moved two squares forward, the square in between is used to check en passant.
    pub en_passant: Option<BoardPosition>,
    /// Starts at 1 and is incremented after every move of black.
    pub fullmove_number: u16,
    pub victory_state: VictoryState,
    pub draw_state: DrawState,
}

impl ChessBoard {
    /// Creates a board with the standard starting position.
    pub fn new() -> Self {
        use PieceType::*;
        let mut result = Self::empty();
        result.castling = Castling::default();

        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for (x, piece) in back_rank.into_iter().enumerate() {
            let x = x as u8;
            result
                .substrate
                .set_piece(PlayerColor::White, BoardPosition::new(x, 0), piece);
            result
                .substrate
                .set_piece(PlayerColor::White, BoardPosition::new(x, 1), Pawn);
            result
                .substrate
                .set_piece(PlayerColor::Black, BoardPosition::new(x, 6), Pawn);
            result
                .substrate
                .set_piece(PlayerColor::Black, BoardPosition::new(x, 7), piece);
        }

        result.initialize_derived_state();
        result
    }

    /// A board without any pieces, white to move. Callers that place pieces
    /// must call `initialize_derived_state` afterwards.
    pub fn empty() -> Self {
        ChessBoard {
            substrate: BBSubstrate::default(),
            controlling_player: PlayerColor::White,
            castling: Castling::forfeit(),
            en_passant: None,
            fullmove_number: 1,
            victory_state: VictoryState::Running,
            draw_state: DrawState::default(),
        }
    }

    /// Builds a board from a list of pieces, without castling rights or
    /// en passant.
    pub fn from_pieces(
        pieces: &[(PlayerColor, PieceType, BoardPosition)],
        controlling_player: PlayerColor,
    ) -> Self {
        let mut result = Self::empty();
        for (color, piece, position) in pieces {
            result.substrate.set_piece(*color, *position, *piece);
        }
        result.controlling_player = controlling_player;
        result.initialize_derived_state();
        result
    }

    /// Records the current position as the first of the game and determines
    /// whether the game is already over.
    pub fn initialize_derived_state(&mut self) {
        self.draw_state.forget_positions();
        self.draw_state.restart_history(fen::write_fen(self));
        let repeated = draw_state::record_position(self);
        self.victory_state = self.determine_victory_state(repeated);
    }

    /// Check if a move is legal and execute it. Otherwise return an error.
    pub fn execute(&mut self, mv: ChessMove) -> Result<&mut Self, ChessError> {
        if self.victory_state.is_over() {
            return Err(ChessError::GameIsOver);
        }
        if !self.is_legal(&mv) {
            return Err(ChessError::ActionNotLegal(mv));
        }
        self.execute_trusted(mv)
    }

    /// Executes a move. This call may assume that the move is legal
    /// without checking it. Only call it when you generate the moves yourself.
    pub fn execute_trusted(&mut self, mv: ChessMove) -> Result<&mut Self, ChessError> {
        let mover = self.controlling_player;
        let piece = self
            .substrate
            .get_piece(mover, mv.from)
            .ok_or(ChessError::ActionNotLegal(mv))?;
        let is_pawn = piece == PieceType::Pawn;
        let is_capture = move_pieces(&mut self.substrate, mover, self.en_passant, mv, piece);

        let castling_before = self.castling;
        if piece == PieceType::King {
            self.castling.remove_rights_for_color(mover);
        }
        self.castling.forfeit_rights_for_square(mv.from);
        self.castling.forfeit_rights_for_square(mv.to);

        self.en_passant = if is_pawn && mv.from.y().abs_diff(mv.to.y()) == 2 {
            BoardPosition::new_checked(mv.from.x() as i8, (mv.from.y() + mv.to.y()) as i8 / 2)
        } else {
            None
        };

        let irreversible = is_capture || is_pawn || castling_before != self.castling;
        if is_capture || is_pawn {
            self.draw_state.reset_half_move_counter();
        } else {
            self.draw_state.half_move_with_no_progress();
            if irreversible {
                self.draw_state.forget_positions();
            }
        }

        if mover == PlayerColor::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.controlling_player = mover.other();

        if irreversible {
            self.draw_state.restart_history(fen::write_fen(self));
        } else {
            self.draw_state.reversible_moves.push(mv);
        }

        let repeated = draw_state::record_position(self);
        self.victory_state = self.determine_victory_state(repeated);
        Ok(self)
    }

    /// The player that gets to execute the next move.
    pub fn controlling_player(&self) -> PlayerColor {
        self.controlling_player
    }

    /// Returns the owner and type of the piece on a square.
    pub fn get_at(&self, position: BoardPosition) -> Option<(PlayerColor, PieceType)> {
        self.substrate.piece_at(position)
    }

    pub fn king_position(&self, color: PlayerColor) -> Option<BoardPosition> {
        self.substrate.find_king(color).ok()
    }

    /// Is the player to move in check?
    pub fn is_check(&self) -> bool {
        self.king_position(self.controlling_player)
            .is_some_and(|king| is_attacked(&self.substrate, king, self.controlling_player.other()))
    }

    /// Is the square attacked by any piece of the given color?
    pub fn attacked_by(&self, position: BoardPosition, attacker: PlayerColor) -> bool {
        is_attacked(&self.substrate, position, attacker)
    }

    /// Material balance from the perspective of white.
    pub fn material_balance(&self) -> i32 {
        self.substrate
            .pieces()
            .map(|(color, piece, _)| match color {
                PlayerColor::White => piece.material_value(),
                PlayerColor::Black => -piece.material_value(),
            })
            .sum()
    }

    /// List all legal moves in the current position. This is empty once the
    /// game is over, even for draws where moves would still be possible on
    /// the board.
    pub fn legal_moves(&self) -> MoveList {
        if self.victory_state.is_over() {
            return MoveList::new();
        }
        self.generate_legal_moves()
    }

    pub fn is_legal(&self, mv: &ChessMove) -> bool {
        self.legal_moves().contains(mv)
    }

    /// The en passant square if an en passant capture can actually be played.
    /// This is what a FEN writes and what counts for repetitions.
    pub fn legal_en_passant(&self) -> Option<BoardPosition> {
        let target = self.en_passant?;
        let pawns = self.substrate.find_pieces(self.controlling_player, PieceType::Pawn);
        let back = -self.controlling_player.forward_direction();
        let has_capture = [(-1, back), (1, back)]
            .iter()
            .filter_map(|d| target.add(*d))
            .filter(|from| pawns.contains(*from))
            .any(|from| !self.leaves_king_in_check(ChessMove::new(from, target), PieceType::Pawn));
        has_capture.then_some(target)
    }

    fn generate_legal_moves(&self) -> MoveList {
        let mut result = MoveList::new();
        for (piece, mv) in self.pseudo_legal_moves() {
            if !self.leaves_king_in_check(mv, piece) {
                result.push(mv);
            }
        }
        result
    }

    fn leaves_king_in_check(&self, mv: ChessMove, piece: PieceType) -> bool {
        let mover = self.controlling_player;
        let mut substrate = self.substrate.clone();
        move_pieces(&mut substrate, mover, self.en_passant, mv, piece);
        match substrate.find_king(mover) {
            Ok(king) => is_attacked(&substrate, king, mover.other()),
            // Without a king there is nothing to protect.
            Err(_) => false,
        }
    }

    /// All moves that follow the movement rules of the pieces, without
    /// considering whether the own king is left in check.
    fn pseudo_legal_moves(&self) -> SmallVec<[(PieceType, ChessMove); 64]> {
        let mut result = SmallVec::new();
        let mover = self.controlling_player;
        let own = self.substrate.bitboard_color(mover);

        for from in own {
            let Some(piece) = self.substrate.get_piece(mover, from) else {
                continue;
            };
            if piece == PieceType::Pawn {
                for to in self.targets_pawn(from) {
                    if to.is_promotion_row(mover) {
                        for promotion in PieceType::promotion_targets() {
                            result.push((piece, ChessMove::promote(from, to, promotion)));
                        }
                    } else {
                        result.push((piece, ChessMove::new(from, to)));
                    }
                }
                continue;
            }
            let targets = match piece {
                PieceType::Knight => KNIGHT_TARGETS[from.0 as usize] & !own,
                PieceType::Bishop => self.targets_bishop(from) & !own,
                PieceType::Rook => self.targets_rook(from) & !own,
                PieceType::Queen => (self.targets_rook(from) | self.targets_bishop(from)) & !own,
                PieceType::King => self.targets_king(from) & !own,
                PieceType::Pawn => BitBoard::default(),
            };
            for to in targets {
                result.push((piece, ChessMove::new(from, to)));
            }
        }
        result
    }

    /// Calculates all possible targets for a pawn at the given position.
    fn targets_pawn(&self, position: BoardPosition) -> BitBoard {
        let mut possible_moves = BitBoard::default();
        let player = self.controlling_player;
        let forward = player.forward_direction();

        // Striking left & right, this is only possible if there is a target.
        [(-1, forward), (1, forward)]
            .iter()
            .filter_map(|d| position.add(*d))
            .filter(|p| self.substrate.has_piece(player.other(), *p) || self.en_passant == Some(*p))
            .for_each(|p| {
                possible_moves.insert(p);
            });

        // Moving forward, the double step is only possible from the pawn row.
        if let Some(step) = position.advance_pawn(player) {
            if self.substrate.is_empty(step) {
                possible_moves.insert(step);
                if position.in_pawn_row(player) {
                    if let Some(step_2) = step.advance_pawn(player) {
                        if self.substrate.is_empty(step_2) {
                            possible_moves.insert(step_2);
                        }
                    }
                }
            }
        }

        possible_moves
    }

    fn targets_rook(&self, position: BoardPosition) -> BitBoard {
        slide_targets(&self.substrate, position, &ROOK_DIRECTIONS)
    }

    fn targets_bishop(&self, position: BoardPosition) -> BitBoard {
        slide_targets(&self.substrate, position, &BISHOP_DIRECTIONS)
    }

    /// Calculates all possible targets for a king at the given position,
    /// including castling.
    fn targets_king(&self, position: BoardPosition) -> BitBoard {
        let mover = self.controlling_player;
        let mut targets = KING_TARGETS[position.0 as usize];

        for option in self.castling.options(mover) {
            if option.king_from != position
                || !self.substrate.is_piece(mover, option.rook_from, PieceType::Rook)
            {
                continue;
            }
            // Check if the spaces are empty and that there are no threats.
            let is_free = option.empty.iter().all(|p| self.substrate.is_empty(*p));
            if is_free
                && !option
                    .safe
                    .iter()
                    .any(|p| is_attacked(&self.substrate, *p, mover.other()))
            {
                targets.insert(option.king_to);
            }
        }
        targets
    }

    /// Decides the state of the game after a move. This follows the usual
    /// order: checkmate, insufficient material, stalemate, 75-move rule and
    /// fivefold repetition.
    fn determine_victory_state(&self, repeated: bool) -> VictoryState {
        let has_moves = !self.generate_legal_moves().is_empty();
        if !has_moves && self.is_check() {
            VictoryState::CheckmateVictory(self.controlling_player.other())
        } else if self.is_insufficient_material() {
            VictoryState::MaterialDraw
        } else if !has_moves {
            VictoryState::StalemateDraw
        } else {
            draw_state::draw_verdict(self, repeated)
        }
    }

    /// Neither side can checkmate with any sequence of legal moves.
    pub fn is_insufficient_material(&self) -> bool {
        PlayerColor::all().all(|color| self.has_insufficient_material(color))
    }

    fn has_insufficient_material(&self, color: PlayerColor) -> bool {
        use PieceType::*;
        let s = &self.substrate;
        let own = s.bitboard_color(color);
        let heavy = s.find_pieces(color, Pawn) | s.find_pieces(color, Rook) | s.find_pieces(color, Queen);
        if !heavy.is_empty() {
            return false;
        }
        if !s.find_pieces(color, Knight).is_empty() {
            // A lone knight can only mate if the opponent has pieces that can block.
            let opponent = color.other();
            let blockers = s.bitboard_color(opponent)
                & !s.find_pieces(opponent, King)
                & !s.find_pieces(opponent, Queen);
            return own.len() <= 2 && blockers.is_empty();
        }
        let all_bishops = s.find_pieces(color, Bishop) | s.find_pieces(color.other(), Bishop);
        if !s.find_pieces(color, Bishop).is_empty() {
            let same_color = (all_bishops & DARK_SQUARES).is_empty()
                || (all_bishops & !DARK_SQUARES).is_empty();
            let pawns = s.find_pieces(PlayerColor::White, Pawn) | s.find_pieces(PlayerColor::Black, Pawn);
            let knights =
                s.find_pieces(PlayerColor::White, Knight) | s.find_pieces(PlayerColor::Black, Knight);
            return same_color && pawns.is_empty() && knights.is_empty();
        }
        true
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves the pieces of `mv` on `substrate`. Handles captures, en passant,
/// the rook of a castling move and promotion. Returns whether a piece was
/// captured.
fn move_pieces(
    substrate: &mut BBSubstrate,
    mover: PlayerColor,
    en_passant: Option<BoardPosition>,
    mv: ChessMove,
    piece: PieceType,
) -> bool {
    let mut is_capture = substrate.remove_piece(mover.other(), mv.to).is_some();

    if piece == PieceType::Pawn && Some(mv.to) == en_passant && mv.from.x() != mv.to.x() {
        // The captured pawn stands next to the origin, not on the target.
        let victim = BoardPosition::new(mv.to.x(), mv.from.y());
        is_capture |= substrate.remove_piece(mover.other(), victim).is_some();
    }

    if piece == PieceType::King && mv.from.x().abs_diff(mv.to.x()) == 2 {
        if let Some(option) = Castling::option_for_king_move(mv.from, mv.to) {
            if let Some(rook) = substrate.remove_piece(mover, option.rook_from) {
                substrate.set_piece(mover, option.rook_to, rook);
            }
        }
    }

    substrate.remove_piece(mover, mv.from);
    substrate.set_piece(mover, mv.to, mv.promotion.unwrap_or(piece));
    is_capture
}

/// a1, c1, e1, ... are dark squares.
const DARK_SQUARES: BitBoard = BitBoard(0xAA55_AA55_AA55_AA55);

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// Calculates all targets by sliding step by step in the given directions and
/// stopping at the first obstacle or at the end of the board. The obstacle
/// itself is included, the caller removes own pieces.
fn slide_targets(substrate: &BBSubstrate, start: BoardPosition, directions: &[(i8, i8)]) -> BitBoard {
    let mut possible_moves = BitBoard::default();
    for &(dx, dy) in directions {
        let mut slide = start.add((dx, dy));
        // This while loop leaves if we drop off the board or if we hit a piece.
        while let Some(target) = slide {
            possible_moves.insert(target);
            slide = if substrate.is_empty(target) {
                target.add((dx, dy))
            } else {
                None
            };
        }
    }
    possible_moves
}

/// Determines whether `attacker` attacks the `target` square. This works
/// backwards: it looks from the target square with the movement pattern of
/// each piece and checks whether it finds a matching attacking piece.
fn is_attacked(substrate: &BBSubstrate, target: BoardPosition, attacker: PlayerColor) -> bool {
    use PieceType::*;
    let find = |piece| substrate.find_pieces(attacker, piece);

    if !(KNIGHT_TARGETS[target.0 as usize] & find(Knight)).is_empty() {
        return true;
    }
    if !(KING_TARGETS[target.0 as usize] & find(King)).is_empty() {
        return true;
    }
    // A pawn attacks diagonally forward, so we look diagonally backward.
    let back = -attacker.forward_direction();
    let pawns = find(Pawn);
    if [(-1, back), (1, back)]
        .iter()
        .filter_map(|d| target.add(*d))
        .any(|p| pawns.contains(p))
    {
        return true;
    }
    let straight = find(Rook) | find(Queen);
    if !(slide_targets(substrate, target, &ROOK_DIRECTIONS) & straight).is_empty() {
        return true;
    }
    let diagonal = find(Bishop) | find(Queen);
    !(slide_targets(substrate, target, &BISHOP_DIRECTIONS) & diagonal).is_empty()
}

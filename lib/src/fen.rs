use crate::{
    castling::Castling, substrate::Substrate, BoardPosition, ChessBoard, ChessError, PieceType,
    PlayerColor,
};
use lazy_regex::regex_captures;
use std::fmt::Write as _;

/// This module reads and writes the Forsyth–Edwards Notation of a position.
///
/// Fen looks like this:
///
/// > rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1
/// > <pieces on board> <controlling player> <castling> <en passant> <half moves> <move number>
///
/// The two counters are optional when reading, they default to "0 1".
/// When writing, the en passant square is only given when an en passant
/// capture is actually possible.

// This needs its own method or rustfmt gets unhappy.
fn regex(input: &str) -> Option<(&str, &str, &str, &str, &str, &str, &str)> {
    regex_captures!(
        r"^((?:[pnbrqkPNBRQK1-8]+/){7}[pnbrqkPNBRQK1-8]+) ([wb]) ([KQkq]{1,4}|-) ([a-h][36]|-)(?: ([0-9]+) ([0-9]+))?$",
        input.trim()
    )
}

pub fn parse_fen(input: &str) -> Result<ChessBoard, ChessError> {
    let Some((_, pieces, player, castling, en_passant, half_moves, move_number)) = regex(input)
    else {
        return Err(ChessError::InputFenMalformed(
            "Regex didn't match fen string.".to_string(),
        ));
    };
    let mut result = ChessBoard::empty();

    // Iterate over all the rows and insert pieces.
    for (v, row) in pieces.split('/').enumerate() {
        let mut h = 0;
        for char in row.chars() {
            if let Some(n) = char.to_digit(10) {
                h += n as usize;
                continue;
            }
            if h >= 8 {
                return Err(ChessError::InputFenMalformed(format!(
                    "Line {} is too long",
                    v
                )));
            }
            let position = BoardPosition((56 + h - 8 * v) as u8);
            let color = if char.is_ascii_uppercase() {
                PlayerColor::White
            } else {
                PlayerColor::Black
            };
            // The regex only lets piece letters through.
            if let Some(piece) = PieceType::from_char(char) {
                result.substrate.set_piece(color, position, piece);
            }
            h += 1;
        }
        // Check if we are done.
        if h != 8 {
            return Err(ChessError::InputFenMalformed(format!(
                "Line {} has length {}",
                v, h
            )));
        }
    }

    // Set other metadata
    result.controlling_player = match player {
        "w" => PlayerColor::White,
        _ => PlayerColor::Black,
    };
    result.castling = Castling::from_fen(castling)?;
    result.en_passant = BoardPosition::try_from(en_passant).ok();
    if !half_moves.is_empty() {
        result.draw_state.no_progress_half_moves = half_moves
            .parse()
            .map_err(|_| ChessError::InputFenMalformed(format!("Bad half move count {half_moves}")))?;
    }
    if !move_number.is_empty() {
        result.fullmove_number = move_number
            .parse()
            .map_err(|_| ChessError::InputFenMalformed(format!("Bad move number {move_number}")))?;
    }

    result.initialize_derived_state();
    Ok(result)
}

/// Writes the full FEN including both counters.
pub fn write_fen(input: &ChessBoard) -> String {
    let mut result = write_position_fen(input);
    // Writing into a String can not fail.
    let _ = write!(
        result,
        " {} {}",
        input.draw_state.no_progress_half_moves, input.fullmove_number
    );
    result
}

/// Writes the first four fields of the FEN, without the two counters.
pub fn write_position_fen(input: &ChessBoard) -> String {
    let mut result = String::new();

    for v in 0..=7 {
        let mut running_empty_spaces = 0;
        for h in 0..=7 {
            let position = BoardPosition(56 + h - 8 * v);
            match input.substrate.piece_at(position) {
                None => running_empty_spaces += 1,
                Some((color, piece)) => {
                    if running_empty_spaces > 0 {
                        let _ = write!(result, "{}", running_empty_spaces);
                        running_empty_spaces = 0;
                    }
                    let letter = piece.to_char();
                    match color {
                        PlayerColor::White => result.push_str(letter),
                        PlayerColor::Black => result.push_str(&letter.to_ascii_lowercase()),
                    }
                }
            }
        }
        if running_empty_spaces > 0 {
            let _ = write!(result, "{}", running_empty_spaces);
        }
        if v != 7 {
            result.push('/');
        }
    }

    let _ = write!(
        result,
        " {} {} {}",
        input.controlling_player.fen_char(),
        input.castling,
        input
            .legal_en_passant()
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_owned()),
    );

    result
}

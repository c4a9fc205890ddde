//! Drives an external chess engine over the UCI protocol. The engine runs as a
//! subprocess for as long as the `UciEngine` value lives; it is told to quit
//! when the value is dropped and killed if it does not listen.
//!
//! Only the small part of the protocol we need is implemented:
//!
//! > uci / uciok, setoption, isready / readyok, position fen, go depth, bestmove

use super::{OpponentOracle, OracleError, SearchLimit};
use crate::{fen, ChessBoard, ChessError, ChessMove};
use log::{debug, trace, warn};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::space1,
    combinator::{map, opt, rest},
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

/// How long we give the engine to exit after "quit" before killing it.
const QUIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Where to find the engine and how strong it should play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub path: PathBuf,
    /// Stockfish skill level from 0 (weakest) to 20.
    pub skill_level: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: PathBuf::from("/usr/games/stockfish"),
            skill_level: 0,
        }
    }
}

/// The lines we care about in the output of the engine.
#[derive(Debug, PartialEq, Eq)]
enum EngineLine<'a> {
    UciOk,
    ReadyOk,
    IdName(&'a str),
    /// `None` for "bestmove (none)", which engines send without legal moves.
    BestMove(Option<&'a str>),
    Other,
}

fn token(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn best_move(input: &str) -> IResult<&str, EngineLine<'_>> {
    let (input, _) = tag("bestmove")(input)?;
    let (input, mv) = opt(preceded(space1, token))(input)?;
    let mv = mv.filter(|m| *m != "(none)" && *m != "0000");
    Ok((input, EngineLine::BestMove(mv)))
}

fn engine_line(input: &str) -> IResult<&str, EngineLine<'_>> {
    alt((
        best_move,
        map(tag("uciok"), |_| EngineLine::UciOk),
        map(tag("readyok"), |_| EngineLine::ReadyOk),
        map(preceded(tag("id name "), rest), EngineLine::IdName),
        map(rest, |_| EngineLine::Other),
    ))(input)
}

fn parse_line(line: &str) -> EngineLine<'_> {
    engine_line(line.trim())
        .map(|(_, parsed)| parsed)
        .unwrap_or(EngineLine::Other)
}

/// The engine gets the position after the last irreversible move and the
/// moves since, so it knows which positions already repeated.
fn position_command(board: &ChessBoard) -> String {
    let history = &board.draw_state;
    if history.reversible_root.is_empty() {
        return format!("position fen {}", fen::write_fen(board));
    }
    if history.reversible_moves.is_empty() {
        return format!("position fen {}", history.reversible_root);
    }
    let moves: Vec<String> = history.reversible_moves.iter().map(|mv| mv.to_string()).collect();
    format!("position fen {} moves {}", history.reversible_root, moves.join(" "))
}

pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    name: Option<String>,
    running: bool,
}

impl UciEngine {
    /// Starts the engine and waits until it is ready to search.
    pub fn spawn(config: &EngineConfig) -> Result<Self, OracleError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OracleError::Spawn {
                path: config.path.display().to_string(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OracleError::Protocol("engine pipes are not available".to_owned()));
        };

        // From here on, Drop takes care of the process if the handshake fails.
        let mut engine = UciEngine {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            name: None,
            running: true,
        };
        engine.handshake(config.skill_level)?;
        debug!(
            "Engine {} is ready at skill level {}",
            engine.name().unwrap_or("(unnamed)"),
            config.skill_level
        );
        Ok(engine)
    }

    /// The name the engine reported during the handshake.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn handshake(&mut self, skill_level: u8) -> Result<(), OracleError> {
        self.send("uci")?;
        loop {
            let line = self.read_line()?;
            match parse_line(&line) {
                EngineLine::IdName(name) => self.name = Some(name.to_owned()),
                EngineLine::UciOk => break,
                _ => {}
            }
        }
        self.send(&format!("setoption name Skill Level value {skill_level}"))?;
        self.wait_until_ready()
    }

    fn wait_until_ready(&mut self) -> Result<(), OracleError> {
        self.send("isready")?;
        loop {
            let line = self.read_line()?;
            if parse_line(&line) == EngineLine::ReadyOk {
                return Ok(());
            }
        }
    }

    fn send(&mut self, command: &str) -> Result<(), OracleError> {
        trace!("> {}", command);
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, OracleError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(OracleError::EngineExited);
        }
        trace!("< {}", line.trim_end());
        Ok(line)
    }

    /// Tells the engine to quit and waits for it. Dropping the engine does
    /// the same, but swallows errors.
    pub fn quit(mut self) -> Result<(), OracleError> {
        self.close()
    }

    fn close(&mut self) -> Result<(), OracleError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        let sent = self.send("quit");
        if sent.is_err() || !self.exited_within(QUIT_TIMEOUT) {
            warn!("The engine did not quit in time, killing it.");
            let _ = self.child.kill();
        }
        self.child.wait()?;
        sent
    }

    fn exited_within(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5))
                }
                _ => return false,
            }
        }
    }
}

impl OpponentOracle for UciEngine {
    fn play(
        &mut self,
        board: &ChessBoard,
        limit: SearchLimit,
    ) -> Result<Option<ChessMove>, OracleError> {
        // Engines disagree on what to do in finished games, so we don't ask.
        if board.legal_moves().is_empty() {
            return Ok(None);
        }

        self.send(&position_command(board))?;
        self.send(&format!("go depth {}", limit.depth))?;
        loop {
            let line = self.read_line()?;
            match parse_line(&line) {
                EngineLine::BestMove(None) => return Ok(None),
                EngineLine::BestMove(Some(token)) => {
                    let mv = ChessMove::from_uci(token)?;
                    if !board.is_legal(&mv) {
                        return Err(ChessError::ActionNotLegal(mv).into());
                    }
                    return Ok(Some(mv));
                }
                _ => {}
            }
        }
    }

    fn shutdown(&mut self) -> Result<(), OracleError> {
        self.close()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("Error while stopping the engine: {}", e);
        }
    }
}

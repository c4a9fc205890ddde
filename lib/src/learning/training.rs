//! The training loop. A session owns the q-table, the random number generator
//! and the opponent oracle and plays episodes one after another.
//!
//! Within an episode the learner and the oracle alternate. Whenever the
//! learner moves, the oracle is first asked for its reply on a scratch copy of
//! the position. The value of the position after that reply is the bootstrap
//! value of the update. Only then is the oracle asked again on the real board.
//! Moves that end the game overwrite their value with the terminal payoff.

use super::metrics::{EpisodeOutcome, EpisodeRecord, Tally, ROLLING_WINDOW};
use super::policy::select_action;
use super::q_table::QTable;
use super::reward::shaped_reward;
use super::state_key::{ActionKey, StateKey};
use super::TrainingError;
use crate::oracle::{OpponentOracle, SearchLimit};
use crate::progress::Progress;
use crate::{ChessBoard, PlayerColor};
use log::{info, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount of the bootstrap value.
    pub gamma: f64,
    /// Exploration rate at the start of a session.
    pub epsilon: f64,
    pub epsilon_min: f64,
    /// Subtracted from epsilon after every episode that was won.
    pub epsilon_decay: f64,
    /// Episodes are cut off after this many half moves.
    pub max_half_moves: u32,
    pub search_depth: u8,
    /// Log a progress line every n episodes. 0 only logs the last one.
    pub progress_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            alpha: 0.05,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_min: 0.0,
            epsilon_decay: 0.003,
            max_half_moves: 150,
            search_depth: 1,
            progress_interval: 100,
        }
    }
}

/// Q(s,a) <- Q(s,a) + alpha * (r + gamma * bootstrap - Q(s,a))
pub fn td_update(q_old: f64, reward: f64, bootstrap: f64, alpha: f64, gamma: f64) -> f64 {
    q_old + alpha * (reward + gamma * bootstrap - q_old)
}

pub struct TrainingSession<O: OpponentOracle, R: Rng> {
    config: TrainingConfig,
    learner: PlayerColor,
    q_table: QTable,
    oracle: O,
    rng: R,
    epsilon: f64,
    tally: Tally,
    /// Win count when epsilon was last considered for decay.
    wins_at_last_check: u32,
    history: Vec<EpisodeRecord>,
}

impl<O: OpponentOracle, R: Rng> TrainingSession<O, R> {
    pub fn new(
        config: TrainingConfig,
        learner: PlayerColor,
        q_table: QTable,
        oracle: O,
        rng: R,
    ) -> Self {
        let epsilon = config.epsilon;
        TrainingSession {
            config,
            learner,
            q_table,
            oracle,
            rng,
            epsilon,
            tally: Tally::default(),
            wins_at_last_check: 0,
            history: Vec::new(),
        }
    }

    pub fn learner(&self) -> PlayerColor {
        self.learner
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn history(&self) -> &[EpisodeRecord] {
        &self.history
    }

    /// Ends the session and hands out what it learned.
    pub fn into_parts(self) -> (QTable, Vec<EpisodeRecord>) {
        (self.q_table, self.history)
    }

    fn limit(&self) -> SearchLimit {
        SearchLimit {
            depth: self.config.search_depth,
        }
    }

    /// Plays `episodes` episodes, each from a start position drawn uniformly
    /// from `starts`. Returns the cumulative results of the session.
    pub fn train(&mut self, starts: &[ChessBoard], episodes: usize) -> Result<Tally, TrainingError> {
        if starts.is_empty() {
            return Err(TrainingError::NoStartPositions);
        }
        info!(
            "Training {:?} for {} episodes from {} start positions.",
            self.learner,
            episodes,
            starts.len()
        );

        for i in 1..=episodes {
            let start = starts
                .choose(&mut self.rng)
                .ok_or(TrainingError::NoStartPositions)?;
            self.run_episode(start)?;

            let progress = Progress::new("Ep", episodes, i);
            if progress.is_due(self.config.progress_interval) {
                info!("{}", self.progress_line(progress));
            }
        }

        info!(
            "Training done. Wins={}, Losses={}, Draws={}",
            self.tally.wins, self.tally.losses, self.tally.draws
        );
        info!("Q-table size at end: {} entries", self.q_table.len());
        Ok(self.tally)
    }

    fn progress_line(&self, progress: Progress) -> String {
        let recent = &self.history[self.history.len().saturating_sub(ROLLING_WINDOW)..];
        let average_length = if recent.is_empty() {
            0.0
        } else {
            recent.iter().map(|r| r.length as f64).sum::<f64>() / recent.len() as f64
        };
        let win_rate = if self.history.is_empty() {
            0.0
        } else {
            self.tally.wins as f64 / self.history.len() as f64
        };
        format!(
            "{} | ε={:.3} | W={} L={} D={} | WR={:.1}% | AvgLen={:.1}",
            progress,
            self.epsilon,
            self.tally.wins,
            self.tally.losses,
            self.tally.draws,
            win_rate * 100.0,
            average_length
        )
    }

    /// Plays a single episode from `start` and records it.
    pub fn run_episode(&mut self, start: &ChessBoard) -> Result<EpisodeRecord, TrainingError> {
        let epsilon = self.epsilon;
        let limit = self.limit();
        let mut position = start.clone();
        let mut moves_count: u32 = 0;
        let mut total_reward = 0.0;
        let mut outcome = None;

        while moves_count < self.config.max_half_moves {
            if position.controlling_player == self.learner {
                let state = StateKey::encode(&position);
                let Some(action) = select_action(&position, &self.q_table, epsilon, &mut self.rng)
                else {
                    break;
                };
                let action_key = ActionKey::encode(&action);
                // Computed on the position before the move.
                let immediate = shaped_reward(&position, Some(&action), self.learner);

                position.execute_trusted(action)?;
                moves_count += 1;
                trace!("Learner plays {}", action);

                if let Some(result) = EpisodeOutcome::for_player(position.victory_state, self.learner)
                {
                    let reward = result.terminal_reward();
                    self.q_table.set(state, action_key, reward);
                    total_reward += reward;
                    outcome = Some(result);
                    break;
                }

                let bootstrap = self.bootstrap_value(&position)?;
                total_reward += immediate;
                let q_old = self.q_table.get(&state, &action_key);
                let q_new = td_update(
                    q_old,
                    immediate,
                    bootstrap,
                    self.config.alpha,
                    self.config.gamma,
                );
                self.q_table.set(state, action_key, q_new);

                if let Some(reply) = self.oracle.play(&position, limit)? {
                    trace!("Oracle plays {}", reply);
                    position.execute(reply)?;
                    moves_count += 1;
                }
            } else {
                let Some(reply) = self.oracle.play(&position, limit)? else {
                    break;
                };
                trace!("Oracle plays {}", reply);
                position.execute(reply)?;
                moves_count += 1;
            }

            // Games the oracle ends are only counted, nothing is learned.
            if let Some(result) = EpisodeOutcome::for_player(position.victory_state, self.learner) {
                outcome = Some(result);
                break;
            }
        }

        if let Some(result) = outcome {
            self.tally.record(result);
        }
        let record = EpisodeRecord {
            episode: self.history.len() + 1,
            total_reward,
            length: moves_count,
            outcome,
            tally: self.tally,
            epsilon,
            table_size: self.q_table.len(),
        };
        self.history.push(record.clone());
        self.decay_epsilon();
        Ok(record)
    }

    /// Value of the position the oracle would leave behind, looked up on a
    /// copy so the real position is untouched.
    fn bootstrap_value(&mut self, position: &ChessBoard) -> Result<f64, TrainingError> {
        let limit = self.limit();
        let mut scratch = position.clone();
        let Some(reply) = self.oracle.play(&scratch, limit)? else {
            return Ok(0.0);
        };
        scratch.execute(reply)?;
        Ok(
            match EpisodeOutcome::for_player(scratch.victory_state, self.learner) {
                Some(result) => result.terminal_reward(),
                None => self.q_table.max_over_legal_actions(&scratch),
            },
        )
    }

    /// Epsilon only decays after episodes that added a win.
    fn decay_epsilon(&mut self) {
        if self.tally.wins > self.wins_at_last_check && self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon - self.config.epsilon_decay).max(self.config.epsilon_min);
        }
        self.wins_at_last_check = self.tally.wins;
    }
}

//! Per-episode records and the series derived from them. The records are
//! appended once per episode and never changed afterwards.

use super::TrainingError;
use crate::{PlayerColor, VictoryState};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Window size of the rolling series and of the progress line.
pub const ROLLING_WINDOW: usize = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    Win,
    Draw,
    Loss,
}

impl EpisodeOutcome {
    /// Classifies a finished game from the perspective of the learner.
    /// Returns `None` while the game is still running.
    pub fn for_player(victory: VictoryState, learner: PlayerColor) -> Option<Self> {
        if !victory.is_over() {
            return None;
        }
        Some(match victory.winner() {
            Some(winner) if winner == learner => EpisodeOutcome::Win,
            Some(_) => EpisodeOutcome::Loss,
            None => EpisodeOutcome::Draw,
        })
    }

    /// The fixed payoff written into the q-table for a game ending move.
    pub fn terminal_reward(self) -> f64 {
        match self {
            EpisodeOutcome::Win => 100.0,
            EpisodeOutcome::Draw => -20.0,
            EpisodeOutcome::Loss => -100.0,
        }
    }
}

/// Cumulative wins, losses and draws of a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: EpisodeOutcome) {
        match outcome {
            EpisodeOutcome::Win => self.wins += 1,
            EpisodeOutcome::Draw => self.draws += 1,
            EpisodeOutcome::Loss => self.losses += 1,
        }
    }

    pub fn decided(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

impl std::ops::Add for Tally {
    type Output = Tally;

    fn add(self, other: Tally) -> Tally {
        Tally {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Starts at 1.
    pub episode: usize,
    pub total_reward: f64,
    /// Number of half moves played, by both sides.
    pub length: u32,
    /// `None` if the episode was cut off or nobody could move.
    pub outcome: Option<EpisodeOutcome>,
    /// Cumulative results including this episode.
    pub tally: Tally,
    /// Exploration rate in effect during the episode.
    pub epsilon: f64,
    pub table_size: usize,
}

fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            f(&values[start..=i])
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, zero for fewer than two values.
fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

fn indicator(history: &[EpisodeRecord], outcome: EpisodeOutcome) -> Vec<f64> {
    history
        .iter()
        .map(|r| if r.outcome == Some(outcome) { 1.0 } else { 0.0 })
        .collect()
}

/// Share of the episodes so far that ended with `outcome`.
pub fn cumulative_rate(history: &[EpisodeRecord], outcome: EpisodeOutcome) -> Vec<f64> {
    let mut count = 0.0;
    indicator(history, outcome)
        .into_iter()
        .enumerate()
        .map(|(i, hit)| {
            count += hit;
            count / (i + 1) as f64
        })
        .collect()
}

/// Share of the last `window` episodes that ended with `outcome`. Early on
/// the window is shorter.
pub fn rolling_rate(history: &[EpisodeRecord], outcome: EpisodeOutcome, window: usize) -> Vec<f64> {
    rolling(&indicator(history, outcome), window, mean)
}

pub fn rolling_mean_length(history: &[EpisodeRecord], window: usize) -> Vec<f64> {
    let lengths: Vec<f64> = history.iter().map(|r| r.length as f64).collect();
    rolling(&lengths, window, mean)
}

pub fn rolling_reward_variance(history: &[EpisodeRecord], window: usize) -> Vec<f64> {
    let rewards: Vec<f64> = history.iter().map(|r| r.total_reward).collect();
    rolling(&rewards, window, variance)
}

/// Everything the trainer exports about one session.
#[derive(Clone, Debug, Serialize)]
pub struct SessionMetrics<'a> {
    pub scenario: u8,
    pub learner: PlayerColor,
    pub tally: Tally,
    pub episodes: &'a [EpisodeRecord],
    pub cumulative_win_rate: Vec<f64>,
    pub cumulative_draw_rate: Vec<f64>,
    pub rolling_win_rate: Vec<f64>,
    pub rolling_loss_rate: Vec<f64>,
    pub rolling_draw_rate: Vec<f64>,
    pub rolling_mean_length: Vec<f64>,
    pub rolling_reward_variance: Vec<f64>,
}

impl<'a> SessionMetrics<'a> {
    pub fn new(scenario: u8, learner: PlayerColor, episodes: &'a [EpisodeRecord]) -> Self {
        use EpisodeOutcome::*;
        SessionMetrics {
            scenario,
            learner,
            tally: episodes.last().map(|r| r.tally).unwrap_or_default(),
            episodes,
            cumulative_win_rate: cumulative_rate(episodes, Win),
            cumulative_draw_rate: cumulative_rate(episodes, Draw),
            rolling_win_rate: rolling_rate(episodes, Win, ROLLING_WINDOW),
            rolling_loss_rate: rolling_rate(episodes, Loss, ROLLING_WINDOW),
            rolling_draw_rate: rolling_rate(episodes, Draw, ROLLING_WINDOW),
            rolling_mean_length: rolling_mean_length(episodes, ROLLING_WINDOW),
            rolling_reward_variance: rolling_reward_variance(episodes, ROLLING_WINDOW),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), TrainingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}

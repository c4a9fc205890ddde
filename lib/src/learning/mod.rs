//! Tabular Q-learning against an opponent oracle.
//!
//! The learner keeps one value per (position, move) pair. After each of its
//! own moves the value is pulled towards the shaped reward of the move plus
//! the discounted value of the position the opponent leaves behind. Terminal
//! positions overwrite the value with a fixed payoff instead.

pub mod curriculum;
pub mod metrics;
pub mod policy;
pub mod q_table;
pub mod reward;
pub mod state_key;
pub mod training;

use crate::oracle::OracleError;
use crate::ChessError;

pub use q_table::QTable;
pub use state_key::{ActionKey, QKey, StateKey};
pub use training::{TrainingConfig, TrainingSession};

#[derive(thiserror::Error, Debug)]
pub enum TrainingError {
    #[error(transparent)]
    Chess(#[from] ChessError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("Could not access the q-table file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not encode the q-table: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("Could not write metrics: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Training needs at least one start position.")]
    NoStartPositions,
}

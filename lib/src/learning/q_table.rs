//! The q-table maps (state, action) pairs to their learned value. Pairs that
//! were never written have the value 0.0.

use super::state_key::{ActionKey, QKey, StateKey};
use super::TrainingError;
use crate::ChessBoard;
use fxhash::FxHashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    entries: FxHashMap<QKey, f64>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &StateKey, action: &ActionKey) -> f64 {
        // Building the key clones both strings. The map is keyed by the pair,
        // so there is no borrowed form we could look up with.
        self.entries
            .get(&QKey::new(state.clone(), action.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: StateKey, action: ActionKey, value: f64) {
        self.entries.insert(QKey::new(state, action), value);
    }

    /// The best value of any legal move in the position, 0.0 if there is none.
    pub fn max_over_legal_actions(&self, board: &ChessBoard) -> f64 {
        let state = StateKey::encode(board);
        board
            .legal_moves()
            .iter()
            .map(|mv| self.get(&state, &ActionKey::encode(mv)))
            .fold(None, |best: Option<f64>, value| {
                Some(best.map_or(value, |b| b.max(value)))
            })
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QKey, f64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Writes a snapshot of the table, creating missing parent directories.
    pub fn save(&self, path: &Path) -> Result<(), TrainingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &self.entries)?;
        info!("Saved q-table with {} entries to {}", self.len(), path.display());
        Ok(())
    }

    pub fn try_load(path: &Path) -> Result<Self, TrainingError> {
        let reader = BufReader::new(File::open(path)?);
        let entries = bincode::deserialize_from(reader)?;
        Ok(QTable { entries })
    }

    /// Loads a table, falling back to an empty one if the file is missing or
    /// can not be read.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(table) => {
                info!("Loaded q-table with {} entries from {}", table.len(), path.display());
                table
            }
            Err(e) => {
                warn!(
                    "Could not load q-table from {}, starting empty: {}",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }
}

/// Every scenario has its own table file in the agents directory.
pub fn scenario_table_path(dir: &Path, scenario_id: u8) -> PathBuf {
    dir.join(format!("q_table_scenario_{scenario_id}.bin"))
}

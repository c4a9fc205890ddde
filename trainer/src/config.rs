//! This module is in charge of defining the configuration format with types
//! and reading the configuration. Every value has a default, so an empty file
//! or no file at all is a valid configuration.

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use endgame::learning::curriculum::Side;
use endgame::learning::TrainingConfig;
use endgame::oracle::uci::EngineConfig;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Stockfish accepts skill levels from 0 to 20.
const MAX_SKILL_LEVEL: u8 = 20;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub training: TrainingConfig,
    pub engine: EngineConfig,
    pub run: RunConfig,
}

/// Who the learner plays against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// A UCI engine, configured in the `engine` table.
    Stockfish,
    /// The built in one ply opponent. Needs no external program.
    Greedy,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub scenarios: Vec<u8>,
    /// Number of distinct start positions sampled per scenario.
    pub positions: usize,
    /// Episodes per side and scenario.
    pub episodes: usize,
    /// Where q-tables and metrics are written.
    pub agents_dir: PathBuf,
    pub side: Side,
    pub opponent: OpponentKind,
    /// Random seed. A random seed is chosen and logged if this is missing.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            scenarios: vec![4],
            positions: 50,
            episodes: 20_000,
            agents_dir: PathBuf::from("agents"),
            side: Side::Both,
            opponent: OpponentKind::Stockfish,
            seed: None,
        }
    }
}

/// Loads the config file if one is given, otherwise uses the defaults.
pub fn load_config(path: Option<&Path>) -> Result<TrainerConfig> {
    let Some(path) = path else {
        return Ok(TrainerConfig::default());
    };

    let config_file = fs::read_to_string(path)
        .with_context(|| format!("Could not read config file at path: {}", path.display()))?;
    let config = parse_config(&config_file)
        .with_context(|| format!("Could not parse config file at path: {}", path.display()))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<TrainerConfig> {
    let config: TrainerConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Rejects values that break the learning rules, like a negative decay
/// that would let epsilon grow.
pub fn validate(config: &TrainerConfig) -> Result<()> {
    let training = &config.training;
    for (name, value) in [
        ("alpha", training.alpha),
        ("gamma", training.gamma),
        ("epsilon", training.epsilon),
        ("epsilon_min", training.epsilon_min),
    ] {
        ensure!(
            (0.0..=1.0).contains(&value),
            "training.{} must be between 0 and 1, got {}",
            name,
            value
        );
    }
    ensure!(
        training.epsilon_decay >= 0.0 && training.epsilon_decay.is_finite(),
        "training.epsilon_decay must not be negative, got {}",
        training.epsilon_decay
    );
    ensure!(
        training.max_half_moves > 0,
        "training.max_half_moves must be at least 1"
    );
    ensure!(
        config.engine.skill_level <= MAX_SKILL_LEVEL,
        "engine.skill_level must be between 0 and {}, got {}",
        MAX_SKILL_LEVEL,
        config.engine.skill_level
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.training.alpha, 0.05);
        assert_eq!(config.training.max_half_moves, 150);
        assert_eq!(config.engine.path, PathBuf::from("/usr/games/stockfish"));
        assert_eq!(config.run.scenarios, vec![4]);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = parse_config(
            r#"
[training]
alpha = 0.1
epsilon_decay = 0.01

[engine]
path = "/opt/stockfish"
skill_level = 5

[run]
scenarios = [2, 3, 4]
side = "black"
opponent = "greedy"
seed = 42
"#,
        )
        .unwrap();
        assert_eq!(config.training.alpha, 0.1);
        assert_eq!(config.training.gamma, 0.95);
        assert_eq!(config.training.epsilon_decay, 0.01);
        assert_eq!(config.engine.path, PathBuf::from("/opt/stockfish"));
        assert_eq!(config.engine.skill_level, 5);
        assert_eq!(config.run.scenarios, vec![2, 3, 4]);
        assert_eq!(config.run.side, Side::Black);
        assert_eq!(config.run.opponent, OpponentKind::Greedy);
        assert_eq!(config.run.seed, Some(42));
        assert_eq!(config.run.episodes, 20_000);
    }

    #[test]
    fn unknown_side_is_rejected() {
        assert!(parse_config("[run]\nside = \"purple\"\n").is_err());
    }

    #[test]
    fn out_of_range_training_values_are_rejected() {
        let error = parse_config("[training]\nepsilon_decay = -0.01\n").unwrap_err();
        assert!(error.to_string().contains("epsilon_decay"), "{error}");
        let error = parse_config("[training]\nalpha = 1.5\n").unwrap_err();
        assert!(error.to_string().contains("alpha"), "{error}");
        let error = parse_config("[training]\ngamma = -0.1\n").unwrap_err();
        assert!(error.to_string().contains("gamma"), "{error}");
        assert!(parse_config("[training]\nmax_half_moves = 0\n").is_err());
        assert!(parse_config("[engine]\nskill_level = 21\n").is_err());
    }

    #[test]
    fn boundary_values_are_accepted() {
        let config = parse_config(
            "[training]\nalpha = 0.0\ngamma = 1.0\nepsilon = 1.0\nepsilon_min = 1.0\nepsilon_decay = 0.0\n\n[engine]\nskill_level = 20\n",
        )
        .unwrap();
        assert_eq!(config.training.gamma, 1.0);
        assert!(validate(&TrainerConfig::default()).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let error = load_config(Some(Path::new("/does/not/exist.toml"))).unwrap_err();
        assert!(error.to_string().contains("/does/not/exist.toml"));
    }
}

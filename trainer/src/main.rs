mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::{OpponentKind, TrainerConfig};
use endgame::fen::{parse_fen, write_fen};
use endgame::learning::curriculum::{train_both_sides, CurriculumReport, Side};
use endgame::learning::metrics::{SessionMetrics, Tally};
use endgame::learning::q_table::scenario_table_path;
use endgame::learning::{ActionKey, QTable, StateKey};
use endgame::oracle::greedy::GreedyOracle;
use endgame::oracle::uci::UciEngine;
use endgame::oracle::OracleError;
use endgame::random::sample_positions;
use endgame::scenario::Scenario;
use endgame::{ChessBoard, PlayerColor};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "endgame-trainer")]
#[command(about = "Learns to play chess endgames against an engine with tabular Q-learning")]
struct Cli {
    /// TOML file with [training], [engine] and [run] tables. Flags override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Debug output of the run is written here.
    #[arg(long, global = true, default_value = "trainer.log")]
    log_file: PathBuf,
    /// Show debug output on the terminal as well.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train white, then black on the same table, for each scenario.
    Train {
        /// Scenario number from 1 to 25. Can be given more than once.
        #[arg(long = "scenario")]
        scenarios: Vec<u8>,
        /// Number of distinct start positions per scenario.
        #[arg(long)]
        positions: Option<usize>,
        /// Episodes per side.
        #[arg(long)]
        episodes: Option<usize>,
        #[arg(long)]
        side: Option<SideArg>,
        #[arg(long)]
        opponent: Option<OpponentKind>,
        /// Path of the UCI engine binary.
        #[arg(long)]
        stockfish: Option<PathBuf>,
        /// Engine skill level, 0 to 20.
        #[arg(long)]
        skill: Option<u8>,
        /// Search depth of the opponent.
        #[arg(long)]
        depth: Option<u8>,
        /// Directory for q-tables and metrics.
        #[arg(long)]
        agents_dir: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print random start positions of a scenario.
    Sample {
        #[arg(long)]
        scenario: u8,
        #[arg(long, default_value_t = 10)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show what a stored q-table knows.
    Inspect {
        #[arg(long)]
        table: PathBuf,
        /// List the values of all legal moves in this position.
        #[arg(long)]
        fen: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SideArg {
    White,
    Black,
    Both,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::White => Side::White,
            SideArg::Black => Side::Black,
            SideArg::Both => Side::Both,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_file, cli.verbose)?;
    let mut config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            scenarios,
            positions,
            episodes,
            side,
            opponent,
            stockfish,
            skill,
            depth,
            agents_dir,
            seed,
        } => {
            if !scenarios.is_empty() {
                config.run.scenarios = scenarios;
            }
            override_with(&mut config.run.positions, positions);
            override_with(&mut config.run.episodes, episodes);
            override_with(&mut config.run.side, side.map(Side::from));
            override_with(&mut config.run.opponent, opponent);
            override_with(&mut config.engine.path, stockfish);
            override_with(&mut config.engine.skill_level, skill);
            override_with(&mut config.training.search_depth, depth);
            override_with(&mut config.run.agents_dir, agents_dir);
            if seed.is_some() {
                config.run.seed = seed;
            }
            config::validate(&config)?;
            run_train(&config)
        }
        Commands::Sample {
            scenario,
            count,
            seed,
        } => run_sample(scenario, count, seed),
        Commands::Inspect { table, fen } => run_inspect(&table, fen.as_deref()),
    }
}

fn override_with<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn init_logger(log_file: &Path, verbose: bool) -> Result<()> {
    use simplelog::*;

    let terminal_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let file = File::create(log_file)
        .with_context(|| format!("Could not create log file {}", log_file.display()))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            terminal_level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Debug, Config::default(), file),
    ])?;

    debug!("Logger successfully initialized");
    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("Using random seed {}", seed);
    StdRng::seed_from_u64(seed)
}

fn color_name(color: PlayerColor) -> &'static str {
    match color {
        PlayerColor::White => "white",
        PlayerColor::Black => "black",
    }
}

////////////////////////////////////////////////////////////////////////////////
// Training ////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

fn run_train(config: &TrainerConfig) -> Result<()> {
    let mut rng = seeded_rng(config.run.seed);
    let mut total = Tally::default();

    for &id in &config.run.scenarios {
        let scenario = Scenario::try_from(id)?;
        info!("Scenario {}: {}", id, scenario);

        let starts = sample_positions(scenario, config.run.positions, &mut rng);
        let table_path = scenario_table_path(&config.run.agents_dir, id);
        let report = train_scenario(config, &starts, &table_path, &mut rng)
            .with_context(|| format!("Training scenario {id} failed"))?;

        for side in report.sides() {
            let path = config.run.agents_dir.join(format!(
                "metrics_scenario_{}_{}.json",
                id,
                color_name(side.learner)
            ));
            SessionMetrics::new(id, side.learner, &side.history)
                .write_json(&path)
                .with_context(|| format!("Could not write metrics to {}", path.display()))?;
            info!("Wrote metrics to {}", path.display());
        }

        print_summary(id, scenario, &report, config.run.episodes);
        total = report.sides().fold(total, |sum, side| sum + side.tally);
    }

    if config.run.scenarios.len() > 1 {
        println!(
            "All scenarios: Wins={} Losses={} Draws={}",
            total.wins, total.losses, total.draws
        );
    }
    Ok(())
}

fn train_scenario(
    config: &TrainerConfig,
    starts: &[ChessBoard],
    table_path: &Path,
    rng: &mut StdRng,
) -> Result<CurriculumReport> {
    let report = match config.run.opponent {
        OpponentKind::Stockfish => train_both_sides(
            &config.training,
            config.run.side,
            starts,
            config.run.episodes,
            table_path,
            || UciEngine::spawn(&config.engine),
            rng,
        )?,
        OpponentKind::Greedy => {
            let mut oracle_seeds = StdRng::seed_from_u64(rng.gen());
            train_both_sides(
                &config.training,
                config.run.side,
                starts,
                config.run.episodes,
                table_path,
                || Ok::<_, OracleError>(GreedyOracle::new(StdRng::seed_from_u64(oracle_seeds.gen()))),
                rng,
            )?
        }
    };
    Ok(report)
}

fn percent(count: u32, episodes: usize) -> f64 {
    if episodes == 0 {
        0.0
    } else {
        count as f64 / episodes as f64 * 100.0
    }
}

fn print_summary(id: u8, scenario: Scenario, report: &CurriculumReport, episodes: usize) {
    println!("Scenario {id} ({scenario}) - final summary");
    let mut total = Tally::default();
    for side in report.sides() {
        let t = side.tally;
        println!("{} agent:", color_name(side.learner));
        println!("  Wins:   {:5} ({:.1}%)", t.wins, percent(t.wins, episodes));
        println!("  Losses: {:5} ({:.1}%)", t.losses, percent(t.losses, episodes));
        println!("  Draws:  {:5} ({:.1}%)", t.draws, percent(t.draws, episodes));
        println!("  Q-table entries: {}", side.table_size);
        total = total + t;
    }
    println!("Total:");
    println!("  Wins:   {:5}", total.wins);
    println!("  Losses: {:5}", total.losses);
    println!("  Draws:  {:5}", total.draws);
}

////////////////////////////////////////////////////////////////////////////////
// Utilities ///////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////

fn run_sample(id: u8, count: usize, seed: Option<u64>) -> Result<()> {
    let scenario = Scenario::try_from(id)?;
    let mut rng = seeded_rng(seed);
    for board in sample_positions(scenario, count, &mut rng) {
        println!("{}", write_fen(&board));
    }
    Ok(())
}

fn run_inspect(table: &Path, fen: Option<&str>) -> Result<()> {
    let q_table = QTable::try_load(table)
        .with_context(|| format!("Could not read q-table {}", table.display()))?;
    println!("{} entries in {}", q_table.len(), table.display());

    let Some(fen) = fen else {
        return Ok(());
    };
    let board = parse_fen(fen)?;
    let state = StateKey::encode(&board);
    let mut values: Vec<(String, f64)> = board
        .legal_moves()
        .iter()
        .map(|mv| (mv.to_string(), q_table.get(&state, &ActionKey::encode(mv))))
        .collect();
    values.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!("{state}");
    for (mv, value) in values {
        println!("  {mv:6} {value:10.3}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn train_flags() {
        let cli = Cli::try_parse_from([
            "endgame-trainer",
            "--verbose",
            "train",
            "--scenario",
            "2",
            "--scenario",
            "3",
            "--side",
            "black",
            "--opponent",
            "greedy",
            "--episodes",
            "10",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Train {
                scenarios,
                side,
                opponent,
                episodes,
                positions,
                ..
            } => {
                assert_eq!(scenarios, vec![2, 3]);
                assert_eq!(side, Some(SideArg::Black));
                assert_eq!(opponent, Some(OpponentKind::Greedy));
                assert_eq!(episodes, Some(10));
                assert_eq!(positions, None);
            }
            _ => panic!("expected the train command"),
        }
    }

    #[test]
    fn overrides_only_replace_given_values() {
        let mut value = 5;
        override_with(&mut value, None);
        assert_eq!(value, 5);
        override_with(&mut value, Some(7));
        assert_eq!(value, 7);
    }

    #[test]
    fn greedy_training_writes_tables() {
        let dir = std::env::temp_dir().join(format!("endgame-trainer-{}", std::process::id()));
        let mut config = TrainerConfig::default();
        config.run.scenarios = vec![2];
        config.run.positions = 3;
        config.run.episodes = 5;
        config.run.opponent = OpponentKind::Greedy;
        config.run.agents_dir = dir.clone();
        config.run.seed = Some(1);

        run_train(&config).unwrap();
        assert!(scenario_table_path(&dir, 2).exists());
        assert!(dir.join("metrics_scenario_2_white.json").exists());
        assert!(dir.join("metrics_scenario_2_black.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
